//! # mdpages CLI
//!
//! Command-line interface for the mdpages page generator.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mdpages")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "mdpages.yml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new mdpages project
    Init {
        /// Target directory (defaults to current directory)
        path: Option<PathBuf>,
    },

    /// Generate page artifacts and the page index
    Generate {
        /// Fail when any source file could not be generated
        #[arg(long)]
        strict: bool,
    },

    /// List the routes of the generated pages
    Routes {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,

        /// Derive routes from the sources instead of reading the index
        #[arg(long)]
        recompute: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Init { path } => commands::init_project(path.as_deref()),
        Commands::Generate { strict } => commands::generate_pages(&cli.config, strict),
        Commands::Routes { json, recompute } => commands::list_routes(&cli.config, json, recompute),
    }
}
