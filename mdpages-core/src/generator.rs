//! Page generation - orchestrates discovery, parsing, routing, conversion and output.
//!
//! One run goes `Init -> Discover -> for each file (Parse -> Route -> Convert -> Emit)
//! -> Finalize`.
//! Only configuration problems and an unusable output directory abort a run;
//! everything that goes wrong with a single file is recorded in the
//! [`GenerationSummary`] and the run moves on to the next file.

use crate::config::{ConfigError, GeneratorConfig};
use crate::discover::discover;
use crate::discovery::{index_path, INDEX_FILE_NAME};
use crate::markdown::MarkdownConverter;
use crate::metadata::MetadataError;
use crate::models::{source_key, GeneratedIndex, GeneratedPage};
use crate::plan::{plan_page, PlannedPage, RouteTable};
use crate::source::{read_document, ContentSource, FsContentSource, SourceError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that abort a whole run
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to create output directory {path}: {source}")]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize index: {0}")]
    SerializeIndex(#[from] serde_json::Error),

    #[error("Failed to write index {path}: {source}")]
    WriteIndex {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors confined to one source file
#[derive(Error, Debug)]
pub enum PageError {
    #[error("Failed to read source: {0}")]
    Read(#[from] SourceError),

    #[error("Configuration parse error: {0}")]
    Parse(#[from] MetadataError),

    #[error("Route collision: {route} is already used by {first}")]
    RouteCollision { route: String, first: PathBuf },

    #[error("Failed to render page: {0}")]
    Render(#[source] anyhow::Error),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PageError {
    /// Collisions skip a file on purpose; everything else is a failure.
    pub fn is_skip(&self) -> bool {
        matches!(self, PageError::RouteCollision { .. })
    }
}

/// Turns a generated page into the text of its artifact.
///
/// The artifact format belongs to the host application, so the generator
/// only depends on this trait.
pub trait PageRenderer {
    fn render(&self, page: &GeneratedPage) -> anyhow::Result<String>;
}

impl<R: PageRenderer + ?Sized> PageRenderer for &R {
    fn render(&self, page: &GeneratedPage) -> anyhow::Result<String> {
        (**self).render(page)
    }
}

/// A source file that did not produce an artifact
#[derive(Debug)]
pub struct PageFailure {
    /// Source path relative to the source root
    pub source: PathBuf,
    pub error: PageError,
}

impl fmt::Display for PageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", source_key(&self.source), self.error)
    }
}

/// Overall outcome of a run that was not aborted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    CompletedWithErrors,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Completed => f.write_str("completed"),
            RunStatus::CompletedWithErrors => f.write_str("completed with errors"),
        }
    }
}

/// Result of a generation run
#[derive(Debug)]
pub struct GenerationSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,

    /// Every file that produced no artifact, in discovery order
    pub failures: Vec<PageFailure>,

    pub warnings: Vec<String>,
    pub index: GeneratedIndex,
    pub index_path: PathBuf,
}

impl GenerationSummary {
    fn new(index_path: PathBuf) -> Self {
        Self {
            succeeded: 0,
            failed: 0,
            skipped: 0,
            failures: Vec::new(),
            warnings: Vec::new(),
            index: GeneratedIndex::new(),
            index_path,
        }
    }

    pub fn status(&self) -> RunStatus {
        if self.failures.is_empty() {
            RunStatus::Completed
        } else {
            RunStatus::CompletedWithErrors
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.skipped
    }

    fn record(&mut self, source: &Path, error: PageError) {
        if error.is_skip() {
            tracing::warn!("Skipping {}: {}", source_key(source), error);
            self.skipped += 1;
        } else {
            tracing::error!("Failed to generate {}: {}", source_key(source), error);
            self.failed += 1;
        }
        self.failures.push(PageFailure {
            source: source.to_path_buf(),
            error,
        });
    }
}

/// Main page generator
pub struct PageGenerator<R> {
    config: GeneratorConfig,
    renderer: R,
    converter: MarkdownConverter,
}

impl<R: PageRenderer> PageGenerator<R> {
    pub fn new(config: GeneratorConfig, renderer: R) -> Self {
        Self {
            config,
            renderer,
            converter: MarkdownConverter::new(),
        }
    }

    /// Use a differently configured Markdown converter
    pub fn with_converter(mut self, converter: MarkdownConverter) -> Self {
        self.converter = converter;
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate pages from the configured source directory
    pub fn generate(&self) -> Result<GenerationSummary, GenerateError> {
        let source = FsContentSource::new(self.config.source_dir());
        self.generate_from(&source)
    }

    /// Generate pages from an arbitrary content source
    pub fn generate_from<S: ContentSource + ?Sized>(
        &self,
        source: &S,
    ) -> Result<GenerationSummary, GenerateError> {
        // Init
        self.config.validate()?;
        let pattern = self.config.pattern()?;
        let output_dir = self.config.output_dir();
        fs::create_dir_all(&output_dir).map_err(|source| GenerateError::OutputDirectory {
            path: output_dir.clone(),
            source,
        })?;

        // Discover
        let files = discover(source, &pattern, self.config.search_recursively);
        tracing::info!("Found {} source files", files.len());

        let mut summary = GenerationSummary::new(index_path(&output_dir));
        let mut routes = RouteTable::new();

        for relative_path in &files {
            let result = self.generate_page(
                source,
                relative_path,
                &output_dir,
                &mut routes,
                &mut summary.warnings,
            );
            match result {
                Ok(page) => {
                    tracing::debug!("Generated {} -> {}", source_key(relative_path), page.route);
                    summary.index.push(relative_path, &page.route);
                    summary.succeeded += 1;
                }
                Err(error) => summary.record(relative_path, error),
            }
        }

        // Finalize
        let mut json = serde_json::to_string_pretty(&summary.index)?;
        json.push('\n');
        fs::write(&summary.index_path, json).map_err(|source| GenerateError::WriteIndex {
            path: summary.index_path.clone(),
            source,
        })?;

        tracing::info!(
            "Generated {} pages ({} failed, {} skipped); index written to {}",
            summary.succeeded,
            summary.failed,
            summary.skipped,
            INDEX_FILE_NAME
        );

        Ok(summary)
    }

    fn generate_page<S: ContentSource + ?Sized>(
        &self,
        source: &S,
        relative_path: &Path,
        output_dir: &Path,
        routes: &mut RouteTable,
        warnings: &mut Vec<String>,
    ) -> Result<GeneratedPage, PageError> {
        let document = read_document(source, relative_path)?;
        tracing::debug!("Processing {:?}", document.path);
        let planned = plan_page(&document.relative_path, &document.content, &self.config)?;

        for warning in &planned.warnings {
            tracing::warn!("{}", warning);
        }
        warnings.extend(planned.warnings.iter().cloned());

        if let Some(first) = routes.owner(&planned.route) {
            return Err(PageError::RouteCollision {
                route: planned.route.clone(),
                first: first.to_path_buf(),
            });
        }

        let page = self.assemble(planned);
        let rendered = self.renderer.render(&page).map_err(PageError::Render)?;

        let target = output_dir.join(&page.output_path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|source| PageError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&target, rendered).map_err(|source| PageError::Write {
            path: target.clone(),
            source,
        })?;

        // Only pages with an artifact hold their route
        routes
            .claim(&page.route, relative_path)
            .map_err(|first| PageError::RouteCollision {
                route: page.route.clone(),
                first,
            })?;
        Ok(page)
    }

    /// Convert the body and resolve defaults into a page
    fn assemble(&self, planned: PlannedPage) -> GeneratedPage {
        let PlannedPage {
            relative_path,
            metadata,
            body,
            route,
            ..
        } = planned;

        // Fall back to the first heading, then the file name
        let title = metadata
            .title
            .or_else(|| self.converter.first_heading(&body))
            .unwrap_or_else(|| {
                relative_path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "Untitled".to_string())
            });

        let layout = metadata.layout.or_else(|| self.config.default_layout.clone());

        GeneratedPage {
            output_path: relative_path.with_extension(self.config.page_extension()),
            source_path: relative_path,
            route,
            title,
            description: metadata.description,
            layout,
            show_title: metadata.show_title,
            tags: metadata.tags,
            content_html: self.converter.convert(&body),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::load_index;
    use crate::source::MemoryContentSource;

    /// Minimal line-based artifact format for tests
    struct PlainRenderer;

    impl PageRenderer for PlainRenderer {
        fn render(&self, page: &GeneratedPage) -> anyhow::Result<String> {
            Ok(format!(
                "route: {}\ntitle: {}\nlayout: {}\nshow_title: {}\ntags: {}\n\n{}",
                page.route,
                page.title,
                page.layout.as_deref().unwrap_or(""),
                page.show_title,
                page.tags.join(","),
                page.content_html
            ))
        }
    }

    struct FailingRenderer;

    impl PageRenderer for FailingRenderer {
        fn render(&self, page: &GeneratedPage) -> anyhow::Result<String> {
            if page.content_html.contains("boom") {
                anyhow::bail!("template exploded");
            }
            PlainRenderer.render(page)
        }
    }

    fn setup() -> (tempfile::TempDir, GeneratorConfig) {
        let dir = tempfile::tempdir().unwrap();
        let config = GeneratorConfig::new(dir.path().join("content"), dir.path().join("out"));
        fs::create_dir_all(config.source_dir()).unwrap();
        (dir, config)
    }

    fn write(config: &GeneratorConfig, name: &str, content: &str) {
        let path = config.source_dir().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn read_output(config: &GeneratorConfig, name: &str) -> String {
        fs::read_to_string(config.output_dir().join(name)).unwrap()
    }

    #[test]
    fn test_generates_pages_and_index() {
        let (_dir, config) = setup();
        write(&config, "index.md", "# Welcome\n\nHello.");
        write(&config, "My_Post Name.md", "---\ntitle: My Post\ntags: [a, b]\n---\nBody");
        write(&config, "guides/Setup.md", "<!-- layout: Wide -->\n# Setup guide");

        let summary = PageGenerator::new(config.clone(), PlainRenderer).generate().unwrap();
        assert_eq!(summary.status(), RunStatus::Completed);
        assert_eq!(summary.succeeded, 3);
        assert_eq!(summary.total(), 3);

        let routes: Vec<(&str, &str)> = summary
            .index
            .pages
            .iter()
            .map(|e| (e.source.as_str(), e.route.as_str()))
            .collect();
        assert_eq!(
            routes,
            vec![
                ("My_Post Name.md", "/my-post-name"),
                ("guides/Setup.md", "/setup"),
                ("index.md", "/"),
            ]
        );

        let post = read_output(&config, "My_Post Name.html");
        assert!(post.contains("title: My Post"));
        assert!(post.contains("tags: a,b"));

        let setup_page = read_output(&config, "guides/Setup.html");
        assert!(setup_page.contains("layout: Wide"));
        assert!(setup_page.contains("title: Setup guide"));

        let output = FsContentSource::new(config.output_dir());
        let persisted = load_index(&output, Path::new(INDEX_FILE_NAME));
        assert_eq!(persisted, Some(summary.index));
    }

    #[test]
    fn test_defaults_only_document() {
        let (_dir, mut config) = setup();
        config.default_layout = Some("MainLayout".to_string());
        write(&config, "plain-notes.md", "Just some text, no heading.");
        write(&config, "headed.md", "# From Heading\n\ntext");

        PageGenerator::new(config.clone(), PlainRenderer).generate().unwrap();

        let plain = read_output(&config, "plain-notes.html");
        assert!(plain.contains("title: plain-notes"));
        assert!(plain.contains("show_title: true"));
        assert!(plain.contains("tags: \n"));
        assert!(plain.contains("layout: MainLayout"));

        let headed = read_output(&config, "headed.html");
        assert!(headed.contains("title: From Heading"));
    }

    #[test]
    fn test_route_collision_keeps_first() {
        let (_dir, config) = setup();
        write(&config, "about.md", "first");
        write(&config, "team/About.md", "second");

        let summary = PageGenerator::new(config.clone(), PlainRenderer).generate().unwrap();
        assert_eq!(summary.status(), RunStatus::CompletedWithErrors);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failures.len(), 1);

        let failure = &summary.failures[0];
        assert_eq!(failure.source, PathBuf::from("team/About.md"));
        match &failure.error {
            PageError::RouteCollision { route, first } => {
                assert_eq!(route, "/about");
                assert_eq!(first, &PathBuf::from("about.md"));
            }
            other => panic!("Expected RouteCollision, got {:?}", other),
        }

        assert!(config.output_dir().join("about.html").exists());
        assert!(!config.output_dir().join("team/About.html").exists());
        assert_eq!(summary.index.len(), 1);
    }

    #[test]
    fn test_malformed_yaml_among_valid_files() {
        let (_dir, config) = setup();
        for i in 0..9 {
            let content = format!("---\ntitle: Page {}\n---\nBody", i);
            write(&config, &format!("page-{}.md", i), &content);
        }
        write(&config, "broken.md", "---\ntitle: [unclosed\n---\nBody");

        let summary = PageGenerator::new(config.clone(), PlainRenderer).generate().unwrap();
        assert_eq!(summary.succeeded, 9);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.status(), RunStatus::CompletedWithErrors);
        assert_eq!(summary.status().to_string(), "completed with errors");
        assert!(matches!(summary.failures[0].error, PageError::Parse(_)));
        assert_eq!(summary.index.len(), 9);
    }

    #[test]
    fn test_idempotent_runs() {
        let (_dir, config) = setup();
        write(&config, "index.md", "# Home");
        write(&config, "b.md", "---\ntags: x\n---\n## B");
        write(&config, "nested/c.md", "<!-- title: C -->\nC body");

        let generator = PageGenerator::new(config.clone(), PlainRenderer);
        let first = generator.generate().unwrap();
        let outputs = ["index.html", "b.html", "nested/c.html", INDEX_FILE_NAME];
        let snapshot: Vec<(String, String)> = outputs
            .iter()
            .map(|name| (name.to_string(), read_output(&config, name)))
            .collect();

        let second = generator.generate().unwrap();
        assert_eq!(first.index, second.index);
        for (name, content) in snapshot {
            assert_eq!(read_output(&config, &name), content, "{} changed", name);
        }
    }

    #[test]
    fn test_missing_source_directory_is_empty_success() {
        let dir = tempfile::tempdir().unwrap();
        let config = GeneratorConfig::new(dir.path().join("nope"), dir.path().join("out"));

        let summary = PageGenerator::new(config.clone(), PlainRenderer).generate().unwrap();
        assert_eq!(summary.status(), RunStatus::Completed);
        assert_eq!(summary.total(), 0);
        assert!(summary.index.is_empty());
        assert!(config.output_dir().join(INDEX_FILE_NAME).exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subtree_does_not_abort() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, config) = setup();
        write(&config, "a.md", "# A");
        write(&config, "private/secret.md", "# Secret");
        write(&config, "z.md", "# Z");
        let locked = config.source_dir().join("private");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Permissions do not apply to root
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let result = PageGenerator::new(config.clone(), PlainRenderer).generate();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let summary = result.unwrap();
        assert_eq!(summary.status(), RunStatus::Completed);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.index.route_for("a.md"), Some("/a"));
        assert_eq!(summary.index.route_for("z.md"), Some("/z"));
    }

    #[test]
    fn test_invalid_config_aborts_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = GeneratorConfig::new(dir.path().join("src"), dir.path().join("out"));
        config.enable_html_comment_configuration = false;
        config.enable_yaml_frontmatter = false;

        let result = PageGenerator::new(config.clone(), PlainRenderer).generate();
        assert!(matches!(result, Err(GenerateError::Config(_))));
        assert!(!config.output_dir().exists());
    }

    #[test]
    fn test_unusable_output_directory_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "not a directory").unwrap();
        let config = GeneratorConfig::new(dir.path().join("src"), blocker.join("out"));

        let result = PageGenerator::new(config, PlainRenderer).generate();
        assert!(matches!(result, Err(GenerateError::OutputDirectory { .. })));
    }

    #[test]
    fn test_render_failure_is_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let config = GeneratorConfig::new("content", dir.path().join("out"));
        let source = MemoryContentSource::new()
            .with("broken.md", "boom")
            .with("fine.md", "y");

        let summary = PageGenerator::new(config, FailingRenderer)
            .generate_from(&source)
            .unwrap();
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert!(matches!(summary.failures[0].error, PageError::Render(_)));
    }

    #[test]
    fn test_failed_page_does_not_hold_its_route() {
        let dir = tempfile::tempdir().unwrap();
        let config = GeneratorConfig::new("content", dir.path().join("out"));
        let source = MemoryContentSource::new()
            .with("about.md", "boom")
            .with("team/About.md", "the real page");

        let summary = PageGenerator::new(config.clone(), FailingRenderer)
            .generate_from(&source)
            .unwrap();
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.failures[0].source, PathBuf::from("about.md"));
        assert!(matches!(summary.failures[0].error, PageError::Render(_)));

        assert_eq!(summary.index.route_for("team/About.md"), Some("/about"));
        assert!(config.output_dir().join("team/About.html").exists());
    }

    #[test]
    fn test_base_prefix_and_extension() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = GeneratorConfig::new("content", dir.path().join("out"));
        config.base_route_path = Some("/docs/".to_string());
        config.page_extension = "razor".to_string();
        let source = MemoryContentSource::new()
            .with("index.md", "# Docs")
            .with("Intro Page.md", "# Intro");

        let summary = PageGenerator::new(config.clone(), PlainRenderer)
            .generate_from(&source)
            .unwrap();
        assert_eq!(summary.index.route_for("index.md"), Some("/docs"));
        assert_eq!(summary.index.route_for("Intro Page.md"), Some("/docs/intro-page"));
        assert!(config.output_dir().join("Intro Page.razor").exists());
    }

    #[test]
    fn test_warnings_are_collected() {
        let dir = tempfile::tempdir().unwrap();
        let config = GeneratorConfig::new("content", dir.path().join("out"));
        let source = MemoryContentSource::new().with("a.md", "---\nshowTitle: perhaps\n---\nA");

        let summary = PageGenerator::new(config, PlainRenderer)
            .generate_from(&source)
            .unwrap();
        assert_eq!(summary.status(), RunStatus::Completed);
        assert_eq!(summary.warnings.len(), 1);
    }
}
