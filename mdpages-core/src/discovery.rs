//! Runtime discovery of generated pages.
//!
//! Hosts read the index persisted by the generator, or recompute it from the
//! sources when generation has not run. Both paths share the per-file
//! planning code, so they derive the same routes.

use crate::config::GeneratorConfig;
use crate::discover::discover;
use crate::models::{source_key, GeneratedIndex, INDEX_VERSION};
use crate::plan::{plan_page, RouteTable};
use crate::source::{ContentSource, FsContentSource};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// File name of the persisted index inside the output directory
pub const INDEX_FILE_NAME: &str = "_pages.json";

pub fn index_path(output_dir: &Path) -> PathBuf {
    output_dir.join(INDEX_FILE_NAME)
}

/// Read a persisted index.
///
/// Returns `None` when the index is missing, unreadable, or written by an
/// incompatible version. Entries whose source files no longer exist are
/// returned as they are.
pub fn load_index<S: ContentSource + ?Sized>(source: &S, path: &Path) -> Option<GeneratedIndex> {
    let text = match source.read(path) {
        Ok(text) => text,
        Err(err) if err.is_not_found() => {
            tracing::debug!("No generated index at {:?}", source.locate(path));
            return None;
        }
        Err(err) => {
            tracing::warn!("Failed to read generated index: {}", err);
            return None;
        }
    };

    match serde_json::from_str::<GeneratedIndex>(&text) {
        Ok(index) if index.version == INDEX_VERSION => Some(index),
        Ok(index) => {
            tracing::warn!(
                "Ignoring generated index with version {} (expected {})",
                index.version,
                INDEX_VERSION
            );
            None
        }
        Err(err) => {
            tracing::warn!("Failed to parse generated index: {}", err);
            None
        }
    }
}

/// Derive the index from the sources without writing anything.
///
/// Files that fail to read or parse and later files whose route is already
/// taken are left out, as a generation run would. Nothing is rendered, so a
/// page whose render or write failed during generation is still listed.
pub fn recompute_index<S: ContentSource + ?Sized>(
    config: &GeneratorConfig,
    source: &S,
) -> GeneratedIndex {
    let mut index = GeneratedIndex::new();
    let pattern = match config.pattern() {
        Ok(pattern) => pattern,
        Err(err) => {
            tracing::warn!("Cannot recompute routes: {}", err);
            return index;
        }
    };

    let mut routes = RouteTable::new();
    for relative_path in discover(source, &pattern, config.search_recursively) {
        let planned = source
            .read(&relative_path)
            .map_err(|e| e.to_string())
            .and_then(|content| {
                plan_page(&relative_path, &content, config).map_err(|e| e.to_string())
            });

        match planned {
            Ok(planned) => match routes.claim(&planned.route, &relative_path) {
                Ok(()) => index.push(&relative_path, &planned.route),
                Err(first) => tracing::warn!(
                    "Skipping {}: route {} is already used by {}",
                    source_key(&relative_path),
                    planned.route,
                    source_key(&first)
                ),
            },
            Err(err) => tracing::warn!("Skipping {}: {}", source_key(&relative_path), err),
        }
    }

    index
}

/// Read-only view of the pages a host can serve
pub struct PageDiscovery {
    config: GeneratorConfig,
}

impl PageDiscovery {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    /// Pages listed in the persisted index; empty when there is none
    pub fn pages(&self) -> GeneratedIndex {
        self.persisted().unwrap_or_default()
    }

    /// Pages derived from the current sources
    pub fn recompute(&self) -> GeneratedIndex {
        let source = FsContentSource::new(self.config.source_dir());
        recompute_index(&self.config, &source)
    }

    /// Persisted index if present, otherwise a recomputation
    pub fn pages_or_recompute(&self) -> GeneratedIndex {
        match self.persisted() {
            Some(index) => index,
            None => {
                tracing::info!("No generated index found; recomputing routes from sources");
                self.recompute()
            }
        }
    }

    /// Source file to route, from the persisted index
    pub fn routes(&self) -> BTreeMap<String, String> {
        self.pages().route_map()
    }

    fn persisted(&self) -> Option<GeneratedIndex> {
        let output = FsContentSource::new(self.config.output_dir());
        load_index(&output, Path::new(INDEX_FILE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{PageGenerator, PageRenderer};
    use crate::models::GeneratedPage;
    use crate::source::MemoryContentSource;
    use std::fs;

    struct BodyRenderer;

    impl PageRenderer for BodyRenderer {
        fn render(&self, page: &GeneratedPage) -> anyhow::Result<String> {
            Ok(page.content_html.clone())
        }
    }

    fn config_in(dir: &Path) -> GeneratorConfig {
        GeneratorConfig::new(dir.join("content"), dir.join("out"))
    }

    #[test]
    fn test_missing_index_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let discovery = PageDiscovery::new(config_in(dir.path()));
        assert!(discovery.pages().is_empty());
        assert!(discovery.routes().is_empty());
    }

    #[test]
    fn test_corrupt_index_is_empty() {
        let source = MemoryContentSource::new().with(INDEX_FILE_NAME, "{ not json");
        assert_eq!(load_index(&source, Path::new(INDEX_FILE_NAME)), None);

        let wrong_version = MemoryContentSource::new()
            .with(INDEX_FILE_NAME, r#"{"version": 99, "pages": []}"#);
        assert_eq!(load_index(&wrong_version, Path::new(INDEX_FILE_NAME)), None);
    }

    #[test]
    fn test_stale_entries_are_kept() {
        let source = MemoryContentSource::new().with(
            INDEX_FILE_NAME,
            r#"{"version": 1, "pages": [{"source": "deleted.md", "route": "/deleted"}]}"#,
        );
        let index = load_index(&source, Path::new(INDEX_FILE_NAME)).unwrap();
        assert_eq!(index.route_for("deleted.md"), Some("/deleted"));
    }

    #[test]
    fn test_persisted_and_recomputed_agree() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.base_route_path = Some("/kb".to_string());

        let content = config.source_dir();
        fs::create_dir_all(content.join("team")).unwrap();
        fs::write(content.join("index.md"), "# Home").unwrap();
        fs::write(content.join("Release_Notes.md"), "---\nroute: /changelog\n---\n").unwrap();
        fs::write(content.join("team/index.md"), "collides with the root index").unwrap();
        fs::write(content.join("bad.md"), "---\nroute: [oops\n---\n").unwrap();

        PageGenerator::new(config.clone(), BodyRenderer).generate().unwrap();

        let discovery = PageDiscovery::new(config.clone());
        let persisted = discovery.pages();
        let recomputed = discovery.recompute();
        assert_eq!(persisted, recomputed);
        assert_eq!(
            persisted.route_map(),
            BTreeMap::from([
                ("Release_Notes.md".to_string(), "/kb/changelog".to_string()),
                ("index.md".to_string(), "/kb".to_string()),
            ])
        );
    }

    #[test]
    fn test_pages_or_recompute_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        fs::create_dir_all(config.source_dir()).unwrap();
        fs::write(config.source_dir().join("hello world.md"), "hi").unwrap();

        let discovery = PageDiscovery::new(config);
        assert!(discovery.pages().is_empty());
        assert_eq!(
            discovery.pages_or_recompute().route_for("hello world.md"),
            Some("/hello-world")
        );
    }

    #[test]
    fn test_recompute_from_memory_source() {
        let config = GeneratorConfig::new("content", "out");
        let source = MemoryContentSource::new()
            .with("a.md", "A")
            .with("nested/A.md", "dupe");
        let index = recompute_index(&config, &source);
        assert_eq!(index.len(), 1);
        assert_eq!(index.source_for("/a"), Some("a.md"));
    }
}
