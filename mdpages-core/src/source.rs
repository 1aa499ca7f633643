//! Content sources: where documents are read from.
//!
//! Discovery and generation only see the [`ContentSource`] trait. Build time
//! uses [`FsContentSource`]; a runtime host can serve the same documents over
//! HTTP (feature `http`) wrapped in a [`CachedContentSource`].

use crate::models::SourceDocument;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "http")]
    #[error("Request for {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request for {url} returned status {status}")]
    Status { url: String, status: u16 },
}

impl SourceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, SourceError::NotFound(_))
    }
}

/// Read access to a tree of documents.
///
/// Paths are relative to the source root.
pub trait ContentSource {
    /// Read a document as text
    fn read(&self, path: &Path) -> Result<String, SourceError>;

    /// All files under the root, in no particular order.
    ///
    /// A missing root or an unreadable subtree contributes nothing.
    fn list(&self, recursive: bool) -> Vec<PathBuf>;

    /// Location of `path` for log and error messages
    fn locate(&self, path: &Path) -> PathBuf {
        path.to_path_buf()
    }
}

impl<S: ContentSource + ?Sized> ContentSource for &S {
    fn read(&self, path: &Path) -> Result<String, SourceError> {
        (**self).read(path)
    }

    fn list(&self, recursive: bool) -> Vec<PathBuf> {
        (**self).list(recursive)
    }

    fn locate(&self, path: &Path) -> PathBuf {
        (**self).locate(path)
    }
}

/// Read a document together with its location
pub fn read_document<S: ContentSource + ?Sized>(
    source: &S,
    relative_path: &Path,
) -> Result<SourceDocument, SourceError> {
    let content = source.read(relative_path)?;
    Ok(SourceDocument {
        path: source.locate(relative_path),
        relative_path: relative_path.to_path_buf(),
        content,
    })
}

/// Documents on the local filesystem
#[derive(Debug, Clone)]
pub struct FsContentSource {
    root: PathBuf,
}

impl FsContentSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ContentSource for FsContentSource {
    fn read(&self, path: &Path) -> Result<String, SourceError> {
        let full = self.root.join(path);
        std::fs::read_to_string(&full).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SourceError::NotFound(full)
            } else {
                SourceError::Io {
                    path: full,
                    source: e,
                }
            }
        })
    }

    fn list(&self, recursive: bool) -> Vec<PathBuf> {
        if !self.root.is_dir() {
            tracing::debug!("Source directory {:?} does not exist", self.root);
            return Vec::new();
        }

        let max_depth = if recursive { usize::MAX } else { 1 };
        let mut files = Vec::new();

        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(max_depth) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!("Skipping unreadable entry: {}", err);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if let Ok(rel) = entry.path().strip_prefix(&self.root) {
                files.push(rel.to_path_buf());
            }
        }

        files
    }

    fn locate(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

/// Documents held in memory, keyed by relative path
#[derive(Debug, Clone, Default)]
pub struct MemoryContentSource {
    files: BTreeMap<PathBuf, String>,
}

impl MemoryContentSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }

    pub fn with(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }

    pub fn remove(&mut self, path: &Path) -> Option<String> {
        self.files.remove(path)
    }
}

impl ContentSource for MemoryContentSource {
    fn read(&self, path: &Path) -> Result<String, SourceError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(path.to_path_buf()))
    }

    fn list(&self, recursive: bool) -> Vec<PathBuf> {
        self.files
            .keys()
            .filter(|p| recursive || p.components().count() == 1)
            .cloned()
            .collect()
    }
}

/// Memoizes successful reads of an inner source.
///
/// The cache lives as long as this value; listings are not cached.
#[derive(Debug)]
pub struct CachedContentSource<S> {
    inner: S,
    cache: Mutex<HashMap<PathBuf, String>>,
}

impl<S: ContentSource> CachedContentSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Drop a single cached document
    pub fn invalidate(&self, path: &Path) {
        self.cache.lock().remove(path);
    }

    pub fn clear(&self) {
        self.cache.lock().clear();
    }

    pub fn cached_len(&self) -> usize {
        self.cache.lock().len()
    }
}

impl<S: ContentSource> ContentSource for CachedContentSource<S> {
    fn read(&self, path: &Path) -> Result<String, SourceError> {
        if let Some(text) = self.cache.lock().get(path) {
            return Ok(text.clone());
        }

        let text = self.inner.read(path)?;
        self.cache.lock().insert(path.to_path_buf(), text.clone());
        Ok(text)
    }

    fn list(&self, recursive: bool) -> Vec<PathBuf> {
        self.inner.list(recursive)
    }

    fn locate(&self, path: &Path) -> PathBuf {
        self.inner.locate(path)
    }
}

#[cfg(feature = "http")]
pub use http::HttpContentSource;

#[cfg(feature = "http")]
mod http {
    use super::{ContentSource, SourceError};
    use crate::models::source_key;
    use reqwest::blocking::Client;
    use reqwest::StatusCode;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Documents served over HTTP below a base URL.
    ///
    /// HTTP has no directory listing, so [`ContentSource::list`] is always
    /// empty; hosts read the generated index instead. Wrap in
    /// [`super::CachedContentSource`] to avoid refetching.
    #[derive(Debug, Clone)]
    pub struct HttpContentSource {
        base_url: String,
        client: Client,
    }

    impl HttpContentSource {
        pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
            let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
            Ok(Self {
                base_url: base_url.into(),
                client,
            })
        }

        fn url(&self, path: &Path) -> String {
            format!("{}/{}", self.base_url.trim_end_matches('/'), source_key(path))
        }
    }

    impl ContentSource for HttpContentSource {
        fn read(&self, path: &Path) -> Result<String, SourceError> {
            let url = self.url(path);
            let response = self
                .client
                .get(&url)
                .send()
                .map_err(|source| SourceError::Http {
                    url: url.clone(),
                    source,
                })?;

            match response.status() {
                StatusCode::NOT_FOUND => Err(SourceError::NotFound(path.to_path_buf())),
                status if !status.is_success() => Err(SourceError::Status {
                    url,
                    status: status.as_u16(),
                }),
                _ => response
                    .text()
                    .map_err(|source| SourceError::Http { url, source }),
            }
        }

        fn list(&self, _recursive: bool) -> Vec<PathBuf> {
            tracing::debug!("Listing is not supported for {}", self.base_url);
            Vec::new()
        }

        fn locate(&self, path: &Path) -> PathBuf {
            PathBuf::from(self.url(path))
        }
    }

}
