//! Per-file planning shared by generation and route recomputation.
//!
//! Both the generator and [`crate::discovery::recompute_index`] go through
//! [`plan_page`] and a [`RouteTable`], so a persisted index and a recomputed
//! one agree as long as every planned page was rendered and written.

use crate::config::GeneratorConfig;
use crate::metadata::{parse_metadata, MetadataError};
use crate::models::PageMetadata;
use crate::route::derive_route;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A document whose configuration and route are known
#[derive(Debug, Clone)]
pub struct PlannedPage {
    pub relative_path: PathBuf,
    pub metadata: PageMetadata,
    pub body: String,
    pub route: String,
    pub warnings: Vec<String>,
}

/// Parse the configuration of one document and derive its route
pub fn plan_page(
    relative_path: &Path,
    content: &str,
    config: &GeneratorConfig,
) -> Result<PlannedPage, MetadataError> {
    let parsed = parse_metadata(content, &config.metadata_options(), relative_path)?;
    let route = derive_route(relative_path, &parsed.metadata, config.base_prefix());

    Ok(PlannedPage {
        relative_path: relative_path.to_path_buf(),
        metadata: parsed.metadata,
        body: parsed.body,
        route,
        warnings: parsed.warnings,
    })
}

/// Routes assigned so far in one run; the first file to claim a route keeps it
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<String, PathBuf>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `route` for `source`.
    ///
    /// On collision the table is unchanged and the current owner is returned.
    pub fn claim(&mut self, route: &str, source: &Path) -> Result<(), PathBuf> {
        if let Some(owner) = self.routes.get(route) {
            return Err(owner.clone());
        }
        self.routes.insert(route.to_string(), source.to_path_buf());
        Ok(())
    }

    pub fn owner(&self, route: &str) -> Option<&Path> {
        self.routes.get(route).map(|p| p.as_path())
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
