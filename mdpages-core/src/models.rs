//! Content model structs for source documents, page metadata and the generated index.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One Markdown file read from the content source
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Path as seen by the content source (absolute for filesystem sources)
    pub path: PathBuf,

    /// Path relative to the source root
    pub relative_path: PathBuf,

    /// Raw text
    pub content: String,
}

/// Metadata values from a single configuration mechanism.
///
/// Every field is optional so that sources can be folded together with
/// [`PartialMetadata::merge`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialMetadata {
    pub route: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub layout: Option<String>,
    pub show_title: Option<bool>,
    pub tags: Option<Vec<String>>,
}

impl PartialMetadata {
    /// Overlay `other` on top of `self`; fields `other` leaves unset are kept.
    pub fn merge(self, other: PartialMetadata) -> PartialMetadata {
        PartialMetadata {
            route: other.route.or(self.route),
            title: other.title.or(self.title),
            description: other.description.or(self.description),
            layout: other.layout.or(self.layout),
            show_title: other.show_title.or(self.show_title),
            tags: other.tags.or(self.tags),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == PartialMetadata::default()
    }

    /// Apply defaults for every unset field
    pub fn resolve(self) -> PageMetadata {
        PageMetadata {
            route: self.route,
            title: self.title,
            description: self.description,
            layout: self.layout,
            show_title: self.show_title.unwrap_or(true),
            tags: self.tags.unwrap_or_default(),
        }
    }
}

/// Resolved per-document configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub route: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub layout: Option<String>,
    pub show_title: bool,
    pub tags: Vec<String>,
}

impl Default for PageMetadata {
    fn default() -> Self {
        PartialMetadata::default().resolve()
    }
}

/// A page ready to be rendered and written
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedPage {
    /// Source path relative to the source root
    pub source_path: PathBuf,

    /// Artifact path relative to the output root
    pub output_path: PathBuf,

    pub route: String,
    pub title: String,
    pub description: Option<String>,
    pub layout: Option<String>,
    pub show_title: bool,
    pub tags: Vec<String>,

    /// Converted body markup
    pub content_html: String,
}

/// One `(source, route)` pair of the generated index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedIndexEntry {
    /// Source file path relative to the source root, `/`-separated
    pub source: String,
    pub route: String,
}

pub const INDEX_VERSION: u32 = 1;

/// Ordered collection of index entries, persisted next to the artifacts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedIndex {
    pub version: u32,
    pub pages: Vec<GeneratedIndexEntry>,
}

impl GeneratedIndex {
    pub fn new() -> Self {
        Self {
            version: INDEX_VERSION,
            pages: Vec::new(),
        }
    }

    pub fn push(&mut self, source: &Path, route: &str) {
        self.pages.push(GeneratedIndexEntry {
            source: source_key(source),
            route: route.to_string(),
        });
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Map from source file to route
    pub fn route_map(&self) -> BTreeMap<String, String> {
        self.pages
            .iter()
            .map(|e| (e.source.clone(), e.route.clone()))
            .collect()
    }

    /// Find the route for a source file
    pub fn route_for(&self, source: &str) -> Option<&str> {
        self.pages
            .iter()
            .find(|e| e.source == source)
            .map(|e| e.route.as_str())
    }

    /// Find the source file serving a route
    pub fn source_for(&self, route: &str) -> Option<&str> {
        self.pages
            .iter()
            .find(|e| e.route == route)
            .map(|e| e.source.as_str())
    }
}

impl Default for GeneratedIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a relative path with `/` separators regardless of platform
pub fn source_key(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
