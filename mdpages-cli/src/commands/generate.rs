//! Generate command implementation.

use anyhow::{bail, Context, Result};
use mdpages_core::{GeneratorConfig, PageGenerator, RunStatus};
use mdpages_render::TemplateRenderer;
use std::path::Path;

/// Generate every page described by the config file
pub fn generate_pages(config_path: &Path, strict: bool) -> Result<()> {
    tracing::info!("Loading config from {:?}", config_path);
    let config = GeneratorConfig::from_file(config_path).context("Failed to load configuration")?;

    let generator = PageGenerator::new(config, TemplateRenderer::new());
    let summary = generator.generate().context("Failed to generate pages")?;

    for failure in &summary.failures {
        eprintln!("  ✗ {}", failure);
    }

    println!(
        "Generation {}: {} generated, {} failed, {} skipped",
        summary.status(),
        summary.succeeded,
        summary.failed,
        summary.skipped
    );
    println!("Index written to {:?}", summary.index_path);

    if strict && summary.status() == RunStatus::CompletedWithErrors {
        bail!(
            "{} of {} source files were not generated",
            summary.failures.len(),
            summary.total()
        );
    }

    Ok(())
}
