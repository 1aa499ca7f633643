//! # mdpages-core
//!
//! Core library for mdpages.
//!
//! Turns a directory of Markdown documents into routed page artifacts: it
//! discovers sources, parses per-document configuration, derives routes,
//! converts Markdown, writes one artifact per document and a companion index
//! that hosts read back at runtime.

pub mod config;
pub mod discover;
pub mod discovery;
pub mod generator;
pub mod markdown;
pub mod metadata;
pub mod models;
pub mod plan;
pub mod route;
pub mod source;

pub use config::{ConfigError, GeneratorConfig};
pub use discover::discover;
pub use discovery::{load_index, recompute_index, PageDiscovery, INDEX_FILE_NAME};
pub use generator::{
    GenerateError, GenerationSummary, PageError, PageFailure, PageGenerator, PageRenderer,
    RunStatus,
};
pub use markdown::{markdown_to_html, MarkdownConverter, MarkdownOptions};
pub use metadata::{parse_metadata, MetadataError, MetadataOptions};
pub use models::{
    GeneratedIndex, GeneratedIndexEntry, GeneratedPage, PageMetadata, PartialMetadata,
    SourceDocument,
};
pub use plan::RouteTable;
pub use route::derive_route;
pub use source::{
    read_document, CachedContentSource, ContentSource, FsContentSource, MemoryContentSource,
    SourceError,
};
