// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Markdown and HTML rendering for parsed WordPress items.
//!
//! This module turns an [`Item`] into a Markdown document with front matter
//! for Hugo/Jekyll-style generators, and a comment forest into a nested HTML
//! list.
//!
//! # Output Format
//!
//! Articles start with a `---` delimited front matter block:
//! - `title`, `date`, `author`, `original`, `slug` and `url`
//! - `categories` and `tags`, only when the item has any
//!
//! followed by a blank line and the rewritten body.
//!
//! Comment threads are rendered as one `<li>` per comment holding the author,
//! date and body, with replies in a nested `<ul>`. Threads are HTML rather
//! than Markdown because Markdown's indentation rules make deep nesting
//! fragile.
//!
//! # Example
//!
//! ```
//! use wp2md::config::SiteConfig;
//! use wp2md::parser::{Encoded, Item, Namespace};
//! use wp2md::renderer::{RenderOptions, Renderer};
//!
//! let item = Item {
//!     title: "Hola".into(),
//!     slug: "hola".into(),
//!     link: "http://plazamoyua.com/2007/01/20/hola/".into(),
//!     encoded: vec![Encoded {
//!         namespace: Namespace::Content,
//!         data: "Hola :)".into(),
//!     }],
//!     ..Default::default()
//! };
//!
//! let config = SiteConfig::new("plazamoyua");
//! let renderer = Renderer::for_site(&config, RenderOptions::default()).unwrap();
//! let article = renderer.render_article(&item);
//!
//! assert!(article.markdown.starts_with("---\ntitle: \"Hola\"\n"));
//! assert!(article.markdown.contains("url: \"/2007/01/20/hola/\""));
//! assert!(article.markdown.ends_with("Hola 🙂"));
//! ```

use crate::config::SiteConfig;
use crate::parser::{Comment, Item, Namespace};
use crate::thread::CommentThread;
use crate::transform::{LinkCleaner, Linkifier, SiteRewriter, Transform, TransformError};
use quick_xml::escape::escape;
use std::fmt::{self, Write};
use tracing::warn;

/// Configuration options for comment rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Whether to turn bare URLs in comment bodies into links.
    pub linkify_comments: bool,

    /// Whether to link comment author names to the URL they left.
    pub link_authors: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            linkify_comments: true,
            link_authors: false,
        }
    }
}

/// A rendered article and any problems noticed while rendering it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    /// The complete Markdown document.
    pub markdown: String,

    /// Non-fatal problems with the item's data.
    pub diagnostics: Vec<Diagnostic>,
}

/// A non-fatal problem found while rendering an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The item had no `content:encoded` body; the article body is empty.
    MissingContent,

    /// The URL derived from the item link did not contain the slug, so the
    /// slug was used instead.
    UrlFallback {
        /// The URL derived from the link.
        derived: String,
        /// The slug used in its place.
        slug: String,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingContent => write!(f, "no content body"),
            Self::UrlFallback { derived, slug } => {
                write!(f, "disregarding item URL {derived:?}, using slug {slug:?}")
            }
        }
    }
}

/// Renders items and comment threads.
///
/// A renderer holds only compiled, read-only tables and can be reused for
/// every item of an export.
#[derive(Debug, Clone)]
pub struct Renderer<T = SiteRewriter> {
    transform: T,
    links: LinkCleaner,
    linkifier: Linkifier,
    options: RenderOptions,
}

impl Renderer<SiteRewriter> {
    /// Creates a renderer that rewrites bodies for the given site.
    ///
    /// # Errors
    ///
    /// Returns an error if a rewrite table or the URL matcher fails to compile.
    pub fn for_site(config: &SiteConfig, options: RenderOptions) -> Result<Self, TransformError> {
        Self::new(SiteRewriter::new(config)?, LinkCleaner::new(config), options)
    }
}

impl<T: Transform> Renderer<T> {
    /// Creates a renderer with a custom body transform.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL matcher fails to compile.
    pub fn new(
        transform: T,
        links: LinkCleaner,
        options: RenderOptions,
    ) -> Result<Self, TransformError> {
        Ok(Self {
            transform,
            links,
            linkifier: Linkifier::new()?,
            options,
        })
    }

    /// Returns the options this renderer was built with.
    #[must_use]
    pub const fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Renders an item as a Markdown document with front matter.
    #[must_use]
    pub fn render_article(&self, item: &Item) -> Article {
        let mut diagnostics = Vec::new();

        let body = if let Some(encoded) = item
            .encoded
            .iter()
            .find(|e| e.namespace == Namespace::Content)
        {
            self.transform.transform(&encoded.data)
        } else {
            warn!(id = item.id, slug = %item.slug, "item has no content body");
            diagnostics.push(Diagnostic::MissingContent);
            String::new()
        };

        let derived = self.links.relative(&item.link);
        let url = if derived.contains(item.slug.as_str()) {
            derived
        } else {
            warn!(
                id = item.id,
                url = %derived,
                slug = %item.slug,
                "disregarding item URL, using slug"
            );
            diagnostics.push(Diagnostic::UrlFallback {
                derived,
                slug: item.slug.clone(),
            });
            item.slug.clone()
        };

        let (categories, tags) = partition_terms(item);

        let mut out = String::new();
        out.push_str("---\n");
        writeln!(out, "title: \"{}\"", escape_title_quotes(&item.title)).unwrap();
        writeln!(out, "date: \"{}\"", item.pub_date).unwrap();
        writeln!(out, "author: \"{}\"", item.author).unwrap();
        writeln!(out, "original: {}", item.link).unwrap();
        writeln!(out, "slug: \"{}\"", item.slug).unwrap();
        writeln!(out, "url: \"{url}\"").unwrap();
        if !categories.is_empty() {
            writeln!(out, "categories: {}", quoted_list(&categories)).unwrap();
        }
        if !tags.is_empty() {
            writeln!(out, "tags: {}", quoted_list(&tags)).unwrap();
        }
        out.push_str("---\n\n");
        out.push_str(&body);

        Article {
            markdown: out,
            diagnostics,
        }
    }

    /// Renders a comment and its replies as an HTML list item.
    ///
    /// Replies are nested in a list inside their parent's item, in sibling
    /// order; comments without replies get no nested list at all. The thread
    /// is walked with an explicit stack, so depth is not limited by the call
    /// stack.
    #[must_use]
    pub fn render_thread(&self, node: &CommentThread<'_>) -> String {
        let mut out = String::new();
        self.open_node(&mut out, node);
        // (node, next child to render)
        let mut stack = vec![(node, 0)];

        while let Some((current, next)) = stack.last_mut() {
            let current: &CommentThread<'_> = *current;
            if let Some(child) = current.children.get(*next) {
                *next += 1;
                self.open_node(&mut out, child);
                stack.push((child, 0));
            } else {
                if !current.children.is_empty() {
                    out.push_str("</ul>\n</div>\n");
                }
                out.push_str("</div>\n</li>\n");
                stack.pop();
            }
        }

        out
    }

    /// Renders a comment forest as one HTML fragment.
    ///
    /// The result is always wrapped in `<div class="comments"><ul>`, even for
    /// an empty forest.
    #[must_use]
    pub fn render_forest(&self, forest: &[CommentThread<'_>]) -> String {
        let mut out = String::from("<div class=\"comments\"><ul>\n");
        for thread in forest {
            out.push_str(&self.render_thread(thread));
        }
        out.push_str("</ul></div>\n");
        out
    }

    /// Writes a comment's item up to where its replies go.
    fn open_node(&self, out: &mut String, node: &CommentThread<'_>) {
        let comment = node.comment;
        out.push_str("<li>\n<div class=\"comment\">\n");
        writeln!(out, "<span class=\"author\">{}</span>", self.author(comment)).unwrap();
        writeln!(
            out,
            "<span class=\"date\">{}</span>",
            escape(comment.date.as_str())
        )
        .unwrap();
        writeln!(out, "<div>\n{}\n</div>", self.comment_body(&comment.content)).unwrap();
        if !node.children.is_empty() {
            out.push_str("<div class=\"children\">\n<ul>\n");
        }
    }

    fn comment_body(&self, content: &str) -> String {
        if self.options.linkify_comments {
            self.transform.transform(&self.linkifier.linkify(content))
        } else {
            self.transform.transform(content)
        }
    }

    fn author(&self, comment: &Comment) -> String {
        let name = escape(comment.author_name.as_str());
        if self.options.link_authors && !comment.author_url.is_empty() {
            format!(
                "<a href=\"{}\" rel=\"nofollow\">{name}</a>",
                escape(comment.author_url.as_str())
            )
        } else {
            name.into_owned()
        }
    }
}

/// Splits an item's terms into category and tag nice-names.
fn partition_terms(item: &Item) -> (Vec<&str>, Vec<&str>) {
    let mut categories = Vec::new();
    let mut tags = Vec::new();
    for term in &item.categories {
        match term.domain.as_str() {
            "category" => categories.push(term.nicename.as_str()),
            "post_tag" => tags.push(term.nicename.as_str()),
            _ => {}
        }
    }
    (categories, tags)
}

/// Formats names as a front matter list: `["a", "b"]`.
fn quoted_list(names: &[&str]) -> String {
    format!("[\"{}\"]", names.join("\", \""))
}

/// Escapes double quotes so the title fits in a quoted front matter string.
fn escape_title_quotes(title: &str) -> String {
    title.replace('"', "\\\"")
}
