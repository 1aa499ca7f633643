//! Routes command implementation.

use anyhow::{Context, Result};
use mdpages_core::{GeneratorConfig, PageDiscovery};
use std::path::Path;

/// Print the source-to-route mapping a host would see
pub fn list_routes(config_path: &Path, json: bool, recompute: bool) -> Result<()> {
    let config = GeneratorConfig::from_file(config_path).context("Failed to load configuration")?;
    let discovery = PageDiscovery::new(config);

    let index = if recompute {
        discovery.recompute()
    } else {
        discovery.pages()
    };

    if index.is_empty() {
        tracing::info!("No pages found");
    }

    if json {
        let routes = index.route_map();
        println!(
            "{}",
            serde_json::to_string_pretty(&routes).context("Failed to serialize routes")?
        );
        return Ok(());
    }

    for entry in &index.pages {
        println!("{}\t{}", entry.route, entry.source);
    }

    Ok(())
}
