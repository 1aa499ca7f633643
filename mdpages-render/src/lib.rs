//! # mdpages-render
//!
//! Template rendering library for mdpages.
//!
//! This crate turns generated pages into their on-disk artifacts using Askama.

pub mod templates;

pub use templates::{PageTemplate, TemplateRenderer};
