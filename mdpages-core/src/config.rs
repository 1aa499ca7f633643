//! Configuration parsing and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::metadata::MetadataOptions;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Generation options, matching the mdpages.yml schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub source_directory: PathBuf,
    pub output_directory: PathBuf,

    #[serde(default = "default_file_pattern")]
    pub file_pattern: String,

    #[serde(default = "default_true")]
    pub search_recursively: bool,

    #[serde(default = "default_true")]
    pub enable_html_comment_configuration: bool,

    #[serde(default = "default_true")]
    pub enable_yaml_frontmatter: bool,

    #[serde(default)]
    pub base_route_path: Option<String>,

    #[serde(default)]
    pub default_layout: Option<String>,

    /// Extension of the generated page artifacts (without the dot)
    #[serde(default = "default_page_extension")]
    pub page_extension: String,

    // Internal: path to config file (for relative path resolution)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

fn default_file_pattern() -> String {
    String::from("*.md")
}

fn default_page_extension() -> String {
    String::from("html")
}

fn default_true() -> bool {
    true
}

impl GeneratorConfig {
    /// Config with defaults for everything but the two directories
    pub fn new(source_directory: impl Into<PathBuf>, output_directory: impl Into<PathBuf>) -> Self {
        Self {
            source_directory: source_directory.into(),
            output_directory: output_directory.into(),
            file_pattern: default_file_pattern(),
            search_recursively: true,
            enable_html_comment_configuration: true,
            enable_yaml_frontmatter: true,
            base_route_path: None,
            default_layout: None,
            page_extension: default_page_extension(),
            config_path: None,
        }
    }

    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config: GeneratorConfig = serde_yaml::from_str(&contents)?;

        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Check the settings before any file is touched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source_directory.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("source_directory must not be empty".to_string()));
        }
        if self.output_directory.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("output_directory must not be empty".to_string()));
        }
        if !self.enable_yaml_frontmatter && !self.enable_html_comment_configuration {
            return Err(ConfigError::Invalid(
                "enable_yaml_frontmatter and enable_html_comment_configuration \
                 cannot both be disabled"
                    .to_string(),
            ));
        }
        if self.page_extension.trim_matches('.').trim().is_empty() {
            return Err(ConfigError::Invalid("page_extension must not be empty".to_string()));
        }
        self.pattern()?;
        Ok(())
    }

    /// Compiled file pattern
    pub fn pattern(&self) -> Result<glob::Pattern, ConfigError> {
        glob::Pattern::new(&self.file_pattern).map_err(|e| {
            ConfigError::Invalid(format!("invalid file_pattern '{}': {}", self.file_pattern, e))
        })
    }

    /// Source directory, resolved relative to the config file
    pub fn source_dir(&self) -> PathBuf {
        self.resolve_path(&self.source_directory)
    }

    /// Output directory, resolved relative to the config file
    pub fn output_dir(&self) -> PathBuf {
        self.resolve_path(&self.output_directory)
    }

    /// Page extension without any leading dot
    pub fn page_extension(&self) -> &str {
        self.page_extension.trim().trim_start_matches('.')
    }

    /// Base route prefix, `None` when unset, empty, or just "/"
    pub fn base_prefix(&self) -> Option<&str> {
        self.base_route_path.as_deref().and_then(normalize_base_prefix)
    }

    pub fn metadata_options(&self) -> MetadataOptions {
        MetadataOptions {
            yaml_frontmatter: self.enable_yaml_frontmatter,
            html_comment: self.enable_html_comment_configuration,
        }
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(parent) = self.config_path.as_ref().and_then(|p| p.parent()) {
            parent.join(path)
        } else {
            path.to_path_buf()
        }
    }
}

/// Trim whitespace and trailing slashes from a base prefix.
///
/// Returns `None` when nothing meaningful is left.
pub fn normalize_base_prefix(raw: &str) -> Option<&str> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
