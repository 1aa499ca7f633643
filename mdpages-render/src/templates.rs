//! Askama template definitions.

use anyhow::Context;
use askama::Template;
use mdpages_core::{GeneratedPage, PageRenderer};

/// Generated page artifact template
#[derive(Template)]
#[template(path = "page.html")]
pub struct PageTemplate<'a> {
    pub route: &'a str,

    /// Route as it appears in the `@page` comment, see [`directive_literal`]
    pub directive_route: String,

    pub title: &'a str,
    pub description: Option<&'a str>,

    /// Host layout hint; the attribute is left out when unset
    pub layout: Option<&'a str>,

    pub show_title: bool,
    pub tags: &'a [String],

    /// Converted Markdown, inserted without escaping
    pub content_html: &'a str,
}

impl<'a> PageTemplate<'a> {
    pub fn from_page(page: &'a GeneratedPage) -> Self {
        Self {
            route: &page.route,
            directive_route: directive_literal(&page.route),
            title: &page.title,
            description: page.description.as_deref(),
            layout: page.layout.as_deref(),
            show_title: page.show_title,
            tags: &page.tags,
            content_html: &page.content_html,
        }
    }
}

/// Quote a route for the `@page` directive.
///
/// Entities are not decoded inside HTML comments, so the route is written as
/// a JSON string literal instead of being HTML-escaped. `>` is escaped as
/// `\u003e` only where it would close the comment.
pub fn directive_literal(route: &str) -> String {
    let quoted = serde_json::Value::String(route.to_string()).to_string();
    quoted.replace("-->", "--\\u003e")
}

/// Renders every page with the built-in `page.html` template
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateRenderer;

impl TemplateRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl PageRenderer for TemplateRenderer {
    fn render(&self, page: &GeneratedPage) -> anyhow::Result<String> {
        PageTemplate::from_page(page)
            .render()
            .with_context(|| format!("Failed to render page template for {}", page.route))
    }
}
