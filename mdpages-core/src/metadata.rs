//! Per-document configuration from YAML frontmatter and HTML comment blocks.
//!
//! Each enabled mechanism yields a [`PartialMetadata`]. The partials are folded
//! in the order returned by [`MetadataOptions::sources`], so a later source
//! overrides an earlier one only for the fields it actually sets. YAML
//! frontmatter comes last and therefore wins over HTML-comment configuration.

use crate::models::{PageMetadata, PartialMetadata};
use regex::Regex;
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

/// A malformed configuration block in a single document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{path}{}: {message}", line_suffix(.line))]
pub struct MetadataError {
    pub path: PathBuf,

    /// 1-based line in the source file, when known
    pub line: Option<usize>,

    pub message: String,
}

fn line_suffix(line: &Option<usize>) -> String {
    line.map(|l| format!(":{}", l)).unwrap_or_default()
}

/// Which configuration mechanisms are enabled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataOptions {
    pub yaml_frontmatter: bool,
    pub html_comment: bool,
}

impl Default for MetadataOptions {
    fn default() -> Self {
        Self {
            yaml_frontmatter: true,
            html_comment: true,
        }
    }
}

/// A configuration mechanism
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataSource {
    HtmlComment,
    YamlFrontmatter,
}

impl MetadataOptions {
    /// Enabled sources in merge order; later entries take precedence.
    pub fn sources(&self) -> Vec<MetadataSource> {
        let mut sources = Vec::with_capacity(2);
        if self.html_comment {
            sources.push(MetadataSource::HtmlComment);
        }
        if self.yaml_frontmatter {
            sources.push(MetadataSource::YamlFrontmatter);
        }
        sources
    }
}

/// Result of parsing one document
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub metadata: PageMetadata,

    /// Markdown with every recognized configuration block removed
    pub body: String,

    /// Recoverable problems (e.g. unparseable booleans that fell back to defaults)
    pub warnings: Vec<String>,
}

static FRONTMATTER_REGEX: OnceLock<Regex> = OnceLock::new();

fn frontmatter_regex() -> &'static Regex {
    FRONTMATTER_REGEX.get_or_init(|| {
        Regex::new(r"(?s)\A---[ \t]*\r?\n(?:(.*?)\r?\n)?---[ \t]*(?:\r?\n|\z)").unwrap()
    })
}

/// Parse the configuration of a document and return it with the remaining body.
///
/// # Example
///
/// ```
/// use mdpages_core::metadata::{parse_metadata, MetadataOptions};
/// use std::path::Path;
///
/// let content = "---\ntitle: My Post\ntags: [a, b]\n---\n# Hello World\n";
/// let options = MetadataOptions::default();
/// let parsed = parse_metadata(content, &options, Path::new("post.md")).unwrap();
///
/// assert_eq!(parsed.metadata.title.as_deref(), Some("My Post"));
/// assert_eq!(parsed.metadata.tags, vec!["a", "b"]);
/// assert!(parsed.body.starts_with("# Hello World"));
/// ```
pub fn parse_metadata(
    content: &str,
    options: &MetadataOptions,
    path: &Path,
) -> Result<ParsedDocument, MetadataError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut warnings = Vec::new();

    let mut body = content;
    let mut body_line = 1;
    let mut yaml = None;
    if options.yaml_frontmatter {
        if let Some(captures) = frontmatter_regex().captures(content) {
            let block = captures.get(1).map(|m| m.as_str()).unwrap_or("");
            yaml = Some(parse_yaml_block(block, path, &mut warnings)?);

            let end = captures.get(0).map(|m| m.end()).unwrap_or(0);
            body_line += content[..end].matches('\n').count();
            body = &content[end..];
        }
    }

    let mut comment = None;
    if options.html_comment {
        if let Some((partial, rest)) = split_comment_block(body, body_line, path, &mut warnings)? {
            comment = Some(partial);
            body = rest;
        }
    }

    let mut merged = PartialMetadata::default();
    for source in options.sources() {
        let partial = match source {
            MetadataSource::HtmlComment => comment.take(),
            MetadataSource::YamlFrontmatter => yaml.take(),
        };
        if let Some(partial) = partial {
            merged = merged.merge(partial);
        }
    }

    Ok(ParsedDocument {
        metadata: merged.resolve(),
        body: body.to_string(),
        warnings,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    Route,
    Title,
    Description,
    Layout,
    Tags,
    ShowTitle,
}

impl Key {
    fn parse(raw: &str) -> Option<Key> {
        let normalized: String = raw
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "route" => Some(Key::Route),
            "title" => Some(Key::Title),
            "description" => Some(Key::Description),
            "layout" => Some(Key::Layout),
            "tags" => Some(Key::Tags),
            "showtitle" => Some(Key::ShowTitle),
            _ => None,
        }
    }
}

fn parse_yaml_block(
    yaml: &str,
    path: &Path,
    warnings: &mut Vec<String>,
) -> Result<PartialMetadata, MetadataError> {
    if yaml.trim().is_empty() {
        return Ok(PartialMetadata::default());
    }

    let value: Value = serde_yaml::from_str(yaml).map_err(|e| MetadataError {
        path: path.to_path_buf(),
        // YAML starts on the line after the opening delimiter
        line: e.location().map(|loc| loc.line() + 1),
        message: format!("invalid YAML frontmatter: {}", e),
    })?;

    let mapping = match value {
        Value::Null => return Ok(PartialMetadata::default()),
        Value::Mapping(mapping) => mapping,
        _ => {
            return Err(MetadataError {
                path: path.to_path_buf(),
                line: Some(2),
                message: "YAML frontmatter must be a mapping of keys to values".to_string(),
            })
        }
    };

    let mut partial = PartialMetadata::default();
    for (key, value) in mapping {
        let Some(key) = key.as_str().and_then(Key::parse) else {
            continue;
        };
        match key {
            Key::Tags => partial.tags = yaml_tags(value, path, warnings),
            Key::ShowTitle => partial.show_title = yaml_bool(&value, path, warnings),
            _ => {
                let text = yaml_scalar(&value);
                if text.is_none() && !value.is_null() {
                    warnings.push(format!(
                        "{}: ignoring non-scalar value for '{:?}'",
                        path.display(),
                        key
                    ));
                }
                set_text(&mut partial, key, text);
            }
        }
    }
    Ok(partial)
}

fn set_text(partial: &mut PartialMetadata, key: Key, value: Option<String>) {
    let value = value.filter(|v| !v.trim().is_empty());
    match key {
        Key::Route => partial.route = value,
        Key::Title => partial.title = value,
        Key::Description => partial.description = value,
        Key::Layout => partial.layout = value,
        Key::Tags | Key::ShowTitle => {}
    }
}

fn yaml_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn yaml_tags(value: Value, path: &Path, warnings: &mut Vec<String>) -> Option<Vec<String>> {
    match value {
        Value::Null => None,
        Value::Sequence(items) => Some(
            items
                .iter()
                .filter_map(yaml_scalar)
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
        ),
        Value::String(s) => Some(split_tags(&s)),
        other => {
            warnings.push(format!(
                "{}: ignoring tags value {:?} (expected a list or a string)",
                path.display(),
                other
            ));
            None
        }
    }
}

fn yaml_bool(value: &Value, path: &Path, warnings: &mut Vec<String>) -> Option<bool> {
    let parsed = match value {
        Value::Null => return None,
        Value::Bool(b) => Some(*b),
        Value::String(s) => parse_bool(s),
        _ => None,
    };
    if parsed.is_none() {
        warnings.push(format!(
            "{}: ignoring showTitle value {:?} (expected true/false/yes/no)",
            path.display(),
            value
        ));
    }
    parsed
}

/// Case-insensitive `true`/`false`/`yes`/`no`
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" => Some(true),
        "false" | "no" => Some(false),
        _ => None,
    }
}

/// Split a tag string on commas, trimming and dropping empty items
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|t| unquote(t.trim()).trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Look for a configuration comment at the top of `body`.
///
/// Returns the parsed values and the body with the comment removed, or `None`
/// when the body does not start with a comment carrying recognized keys.
fn split_comment_block<'a>(
    body: &'a str,
    body_line: usize,
    path: &Path,
    warnings: &mut Vec<String>,
) -> Result<Option<(PartialMetadata, &'a str)>, MetadataError> {
    let trimmed = body.trim_start();
    let Some(after_open) = trimmed.strip_prefix("<!--") else {
        return Ok(None);
    };
    let line = body_line + body[..body.len() - trimmed.len()].matches('\n').count();

    let Some(end) = after_open.find("-->") else {
        // Only the leading paragraph can be a config block
        let has_config = after_open
            .lines()
            .enumerate()
            .take_while(|(i, line)| *i == 0 || !line.trim().is_empty())
            .any(|(_, line)| is_config_line(line));
        if has_config {
            return Err(MetadataError {
                path: path.to_path_buf(),
                line: Some(line),
                message: "unterminated HTML comment configuration block".to_string(),
            });
        }
        return Ok(None);
    };

    let inner = &after_open[..end];
    if !inner.lines().any(is_config_line) {
        return Ok(None);
    }

    let partial = parse_comment_lines(inner, path, warnings);
    let rest = &after_open[end + 3..];
    let rest = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);
    Ok(Some((partial, rest)))
}

fn is_config_line(line: &str) -> bool {
    line.split_once(':')
        .is_some_and(|(key, _)| Key::parse(key).is_some())
}

fn parse_comment_lines(inner: &str, path: &Path, warnings: &mut Vec<String>) -> PartialMetadata {
    let mut partial = PartialMetadata::default();
    let mut in_tag_list = false;

    for line in inner.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if in_tag_list {
            if let Some(item) = trimmed.strip_prefix('-') {
                let item = unquote(item.trim()).trim();
                if !item.is_empty() {
                    partial.tags.get_or_insert_with(Vec::new).push(item.to_string());
                }
                continue;
            }
            in_tag_list = false;
        }

        let Some((raw_key, raw_value)) = trimmed.split_once(':') else {
            continue;
        };
        let Some(key) = Key::parse(raw_key) else {
            continue;
        };
        let value = unquote(raw_value.trim());

        match key {
            Key::Tags => {
                if value.is_empty() {
                    in_tag_list = true;
                    partial.tags = Some(Vec::new());
                } else if let Some(list) =
                    value.strip_prefix('[').and_then(|v| v.strip_suffix(']'))
                {
                    partial.tags = Some(split_tags(list));
                } else {
                    partial.tags = Some(split_tags(value));
                }
            }
            Key::ShowTitle => match parse_bool(value) {
                Some(b) => partial.show_title = Some(b),
                None => warnings.push(format!(
                    "{}: ignoring showTitle value '{}' (expected true/false/yes/no)",
                    path.display(),
                    value
                )),
            },
            _ => set_text(&mut partial, key, Some(value.to_string())),
        }
    }

    partial
}
