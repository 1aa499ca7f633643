//! Markdown to HTML conversion.
//!
//! The converter is a pure function of its input: no filesystem access and
//! identical output for identical text, so hosts can use it at build time and
//! when re-rendering at runtime.

use crate::route::normalize_stem;
use pulldown_cmark::{html, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

/// Extended syntax switches, mapped onto pulldown-cmark options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkdownOptions {
    pub tables: bool,
    pub footnotes: bool,
    pub strikethrough: bool,
    pub task_lists: bool,
    pub heading_attributes: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            tables: true,
            footnotes: true,
            strikethrough: true,
            task_lists: true,
            heading_attributes: true,
        }
    }
}

impl MarkdownOptions {
    fn to_cmark(self) -> Options {
        let mut options = Options::empty();
        options.set(Options::ENABLE_TABLES, self.tables);
        options.set(Options::ENABLE_FOOTNOTES, self.footnotes);
        options.set(Options::ENABLE_STRIKETHROUGH, self.strikethrough);
        options.set(Options::ENABLE_TASKLISTS, self.task_lists);
        options.set(Options::ENABLE_HEADING_ATTRIBUTES, self.heading_attributes);
        options
    }
}

/// A heading of the document outline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: u32,
    pub title: String,
    pub id: String,
}

/// Markdown converter with a fixed set of extensions
#[derive(Debug, Clone)]
pub struct MarkdownConverter {
    options: Options,
}

impl MarkdownConverter {
    pub fn new() -> Self {
        Self::with_options(MarkdownOptions::default())
    }

    pub fn with_options(options: MarkdownOptions) -> Self {
        Self {
            options: options.to_cmark(),
        }
    }

    /// Convert markdown to embeddable HTML.
    ///
    /// Fenced code keeps its language as a `language-*` class, inline HTML is
    /// passed through, and every heading gets a unique `id`.
    pub fn convert(&self, markdown: &str) -> String {
        let events: Vec<Event> = Parser::new_ext(markdown, self.options).collect();
        let headings = collect_headings(&events);
        let events = attach_heading_ids(events, &headings);

        let mut html_output = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut html_output, events.into_iter());
        html_output
    }

    /// Outline of the document, with the ids `convert` assigns
    pub fn headings(&self, markdown: &str) -> Vec<Heading> {
        let events: Vec<Event> = Parser::new_ext(markdown, self.options).collect();
        collect_headings(&events)
    }

    /// Text of the first level-1 heading
    pub fn first_heading(&self, markdown: &str) -> Option<String> {
        self.headings(markdown)
            .into_iter()
            .find(|h| h.level == 1)
            .map(|h| h.title.trim().to_string())
            .filter(|t| !t.is_empty())
    }
}

impl Default for MarkdownConverter {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert markdown with the default extensions
pub fn markdown_to_html(markdown: &str) -> String {
    MarkdownConverter::new().convert(markdown)
}

fn collect_headings(events: &[Event]) -> Vec<Heading> {
    let mut headings = Vec::new();
    let mut used: HashSet<String> = HashSet::new();
    let mut current: Option<(HeadingLevel, Option<String>, String)> = None;

    for event in events {
        match event {
            Event::Start(Tag::Heading { level, id, .. }) => {
                current = Some((*level, id.as_ref().map(|s| s.to_string()), String::new()));
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, _, ref mut title)) = current {
                    title.push_str(text.as_ref());
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, explicit_id, title)) = current.take() {
                    let id = match explicit_id {
                        Some(id) => {
                            used.insert(id.clone());
                            id
                        }
                        None => unique_id(&heading_slug(&title), &mut used),
                    };
                    headings.push(Heading {
                        level: level as u32,
                        title,
                        id,
                    });
                }
            }
            _ => {}
        }
    }

    headings
}

/// `base`, or `base-N` with the smallest N not used yet
fn unique_id(base: &str, used: &mut HashSet<String>) -> String {
    let mut id = base.to_string();
    let mut n = 0;
    while used.contains(&id) {
        n += 1;
        id = format!("{}-{}", base, n);
    }
    used.insert(id.clone());
    id
}

fn heading_slug(title: &str) -> String {
    let kept: String = title
        .graphemes(true)
        .filter_map(|g| {
            let c = g.chars().next()?;
            if c.is_whitespace() {
                Some(" ")
            } else if c.is_alphanumeric() || c == '-' || c == '_' {
                Some(g)
            } else {
                None
            }
        })
        .collect();

    let slug = normalize_stem(&kept);
    if slug.is_empty() {
        "section".to_string()
    } else {
        slug
    }
}

fn attach_heading_ids<'a>(events: Vec<Event<'a>>, headings: &[Heading]) -> Vec<Event<'a>> {
    let mut heading_iter = headings.iter();
    let mut result = Vec::with_capacity(events.len());

    for event in events {
        match event {
            Event::Start(Tag::Heading {
                level,
                id,
                classes,
                attrs,
            }) => {
                let next = heading_iter.next();
                let id = id.or_else(|| next.map(|h| CowStr::from(h.id.clone())));
                result.push(Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                }));
            }
            _ => result.push(event),
        }
    }

    result
}
