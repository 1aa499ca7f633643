//! Route derivation from source file names.
//!
//! Only the file name takes part in a derived route: `guides/Setup.md` and
//! `Setup.md` both map to `/setup`. Nested directories are flattened, and two
//! files that flatten onto the same route are reported by the generator as a
//! collision.

use crate::config::normalize_base_prefix;
use crate::models::PageMetadata;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

static HYPHEN_RUNS: OnceLock<Regex> = OnceLock::new();

fn hyphen_runs() -> &'static Regex {
    HYPHEN_RUNS.get_or_init(|| Regex::new(r"-+").unwrap())
}

/// Derive the canonical route of a source file.
///
/// An explicit `route` in the metadata is used verbatim. Otherwise the route
/// comes from the file stem, see [`normalize_stem`]. The base prefix, when
/// set, is prepended in both cases.
///
/// # Examples
///
/// ```
/// use mdpages_core::models::PageMetadata;
/// use mdpages_core::route::derive_route;
/// use std::path::Path;
///
/// let meta = PageMetadata::default();
/// assert_eq!(derive_route(Path::new("index.md"), &meta, None), "/");
/// assert_eq!(derive_route(Path::new("My_Post Name.md"), &meta, None), "/my-post-name");
/// assert_eq!(derive_route(Path::new("a---b.md"), &meta, Some("/docs")), "/docs/a-b");
/// ```
pub fn derive_route(
    relative_path: &Path,
    metadata: &PageMetadata,
    base_prefix: Option<&str>,
) -> String {
    let base = base_prefix.and_then(normalize_base_prefix);

    if let Some(route) = &metadata.route {
        return match base {
            Some(base) if route.starts_with('/') => format!("{}{}", base, route),
            Some(base) => format!("{}/{}", base, route),
            None => route.clone(),
        };
    }

    let stem = relative_path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();

    if stem.eq_ignore_ascii_case("index") {
        return base.unwrap_or("/").to_string();
    }

    format!("{}/{}", base.unwrap_or(""), normalize_stem(&stem))
}

/// Turn a file stem into a route segment.
///
/// Rules:
/// - Lowercase
/// - Spaces and underscores become hyphens
/// - Runs of hyphens collapse into one
/// - Leading/trailing hyphens are trimmed
///
/// Other characters are kept as they are.
pub fn normalize_stem(stem: &str) -> String {
    let hyphenated: String = stem
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '_' { '-' } else { c })
        .collect();

    hyphen_runs()
        .replace_all(&hyphenated, "-")
        .trim_matches('-')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(path: &str) -> String {
        derive_route(Path::new(path), &PageMetadata::default(), None)
    }

    fn with_route(route: &str) -> PageMetadata {
        PageMetadata {
            route: Some(route.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_index_is_root() {
        assert_eq!(route("index.md"), "/");
        assert_eq!(route("INDEX.md"), "/");
        assert_eq!(route("Index.md"), "/");
    }

    #[test]
    fn test_normalization() {
        assert_eq!(route("My_Post Name.md"), "/my-post-name");
        assert_eq!(route("a---b.md"), "/a-b");
        assert_eq!(route("__leading and trailing__.md"), "/leading-and-trailing");
        assert_eq!(route("Mixed_ _Separators.md"), "/mixed-separators");
    }

    #[test]
    fn test_other_characters_are_kept() {
        assert_eq!(route("Q&A.md"), "/q&a");
        assert_eq!(route("release.notes.md"), "/release.notes");
        assert_eq!(route("Café Menu.md"), "/café-menu");
    }

    #[test]
    fn test_directories_are_flattened() {
        assert_eq!(route("guides/deep/Getting Started.md"), "/getting-started");
        assert_eq!(route("guides/index.md"), "/");
    }

    #[test]
    fn test_deterministic() {
        for name in ["index.md", "My_Post Name.md", "x.md", "a---b.md"] {
            assert_eq!(route(name), route(name));
        }
    }

    #[test]
    fn test_base_prefix() {
        let meta = PageMetadata::default();
        assert_eq!(derive_route(Path::new("index.md"), &meta, Some("/docs")), "/docs");
        assert_eq!(derive_route(Path::new("intro.md"), &meta, Some("/docs/")), "/docs/intro");
        assert_eq!(derive_route(Path::new("intro.md"), &meta, Some("/")), "/intro");
        assert_eq!(derive_route(Path::new("index.md"), &meta, Some("")), "/");
    }

    #[test]
    fn test_explicit_route_is_verbatim() {
        let path = Path::new("whatever.md");
        assert_eq!(derive_route(path, &with_route("/custom/path"), None), "/custom/path");
        assert_eq!(derive_route(path, &with_route("No Slash_Here"), None), "No Slash_Here");
        assert_eq!(derive_route(path, &with_route("//double//"), None), "//double//");
    }

    #[test]
    fn test_explicit_route_with_base_prefix() {
        let path = Path::new("whatever.md");
        assert_eq!(
            derive_route(path, &with_route("/custom/path"), Some("/docs")),
            "/docs/custom/path"
        );
        assert_eq!(
            derive_route(path, &with_route("relative"), Some("/docs")),
            "/docs/relative"
        );
    }

    #[test]
    fn test_normalize_stem() {
        assert_eq!(normalize_stem("Hello World"), "hello-world");
        assert_eq!(normalize_stem("---"), "");
        assert_eq!(normalize_stem(""), "");
    }
}
