// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! XML parsing for WordPress exports.
//!
//! This module reads the WordPress eXtended RSS (WXR) format produced by the
//! "Tools → Export" screen. A WXR file is an RSS 2.0 channel whose items carry
//! extra fields in the `wp:`, `content:`, `excerpt:` and `dc:` namespaces.
//!
//! # Format Overview
//!
//! Each `<item>` in the channel is a post, page, attachment or navigation
//! entry and contains:
//! - Basic RSS fields (title, link, publication date)
//! - One or more encoded bodies (`content:encoded`, `excerpt:encoded`)
//! - Category and tag references
//! - Zero or more `wp:comment` records, each pointing at its parent comment
//!
//! Only the fields the converter uses are kept; post metadata, GUIDs and
//! comment metadata are skipped.
//!
//! # Example
//!
//! ```
//! use wp2md::parser::{PostType, parse_export};
//!
//! let xml = r#"<rss xmlns:wp="http://wordpress.org/export/1.2/">
//!   <channel>
//!     <item>
//!       <title>Hello</title>
//!       <wp:post_name>hello</wp:post_name>
//!       <wp:post_type>post</wp:post_type>
//!     </item>
//!   </channel>
//! </rss>"#;
//!
//! let export = parse_export(xml).unwrap();
//! assert_eq!(export.items.len(), 1);
//! assert_eq!(export.items[0].post_type, PostType::Post);
//! ```

use quick_xml::Reader;
use quick_xml::events::{BytesRef, BytesStart, Event};
use snafu::prelude::*;

/// Error type for WXR parsing failures.
#[derive(Debug, Snafu)]
pub enum ParseError {
    /// The document is not well-formed XML.
    #[snafu(display("failed to parse XML: {source}"))]
    Xml {
        /// The underlying XML reader error.
        source: quick_xml::Error,
    },

    /// A numeric identifier field did not hold an unsigned integer.
    #[snafu(display("invalid {field} value {value:?}: {source}"))]
    InvalidNumber {
        /// The element name of the offending field.
        field: &'static str,
        /// The raw field text.
        value: String,
        /// The underlying integer parsing error.
        source: std::num::ParseIntError,
    },

    /// The document ended while an element was still open.
    #[snafu(display("unexpected end of document inside <{element}>"))]
    Truncated {
        /// The innermost element left open.
        element: String,
    },
}

/// The channel of a WordPress export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Export {
    /// The site title.
    pub title: String,

    /// The site's base URL.
    pub link: String,

    /// Posts, pages, attachments and other entries, in document order.
    pub items: Vec<Item>,
}

/// A single exported content unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Item {
    /// The WordPress post ID (`wp:post_id`).
    pub id: u64,

    /// The item title.
    pub title: String,

    /// The canonical link to the item on the original site.
    pub link: String,

    /// The RSS publication date, kept exactly as written.
    pub pub_date: String,

    /// The author login (`dc:creator`).
    pub author: String,

    /// The local post date (`wp:post_date`), formatted `YYYY-MM-DD HH:MM:SS`.
    pub post_date: String,

    /// The URL-safe path segment (`wp:post_name`).
    pub slug: String,

    /// The publication status (`publish`, `draft`, `trash`, ...).
    pub status: String,

    /// The kind of entry.
    pub post_type: PostType,

    /// The encoded payloads, distinguished by namespace.
    pub encoded: Vec<Encoded>,

    /// Category and tag references.
    pub categories: Vec<Category>,

    /// Comments attached to this item, in document order.
    pub comments: Vec<Comment>,
}

/// The kind of an exported item (`wp:post_type`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PostType {
    /// A blog post.
    #[default]
    Post,
    /// A static page.
    Page,
    /// An uploaded media file.
    Attachment,
    /// A navigation menu entry.
    NavMenuItem,
    /// Any other (usually plugin-defined) post type.
    Other(String),
}

impl PostType {
    /// Returns the post type name as it appears in the export.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Post => "post",
            Self::Page => "page",
            Self::Attachment => "attachment",
            Self::NavMenuItem => "nav_menu_item",
            Self::Other(name) => name,
        }
    }
}

impl From<&str> for PostType {
    fn from(name: &str) -> Self {
        match name {
            "post" => Self::Post,
            "page" => Self::Page,
            "attachment" => Self::Attachment,
            "nav_menu_item" => Self::NavMenuItem,
            other => Self::Other(other.to_owned()),
        }
    }
}

/// An encoded payload of an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    /// Which payload this is.
    pub namespace: Namespace,

    /// The raw HTML payload.
    pub data: String,
}

/// The namespace an [`Encoded`] payload was found in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Namespace {
    /// The full body (`content:encoded`).
    Content,
    /// The summary (`excerpt:encoded`).
    Excerpt,
    /// Any other prefix.
    Other(String),
}

impl Namespace {
    fn from_prefix(prefix: &str) -> Self {
        match prefix {
            "content" => Self::Content,
            "excerpt" => Self::Excerpt,
            other => Self::Other(other.to_owned()),
        }
    }
}

/// A category or tag reference on an item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Category {
    /// The taxonomy: `category` or `post_tag`.
    pub domain: String,

    /// The URL-safe name.
    pub nicename: String,

    /// The display name.
    pub name: String,
}

/// A reader comment on an item.
///
/// The content may contain embedded HTML and is assumed to be safe for
/// inclusion into an HTML document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comment {
    /// The comment ID, unique within the item.
    pub id: u64,

    /// The ID of the comment this one replies to, `None` for top-level comments.
    pub parent: Option<u64>,

    /// The commenter's display name.
    pub author_name: String,

    /// The commenter's email address.
    pub author_email: String,

    /// The commenter's website.
    pub author_url: String,

    /// The comment body (HTML).
    pub content: String,

    /// The local comment date, kept exactly as written.
    pub date: String,

    /// The UTC comment date, kept exactly as written.
    pub date_gmt: String,

    /// The moderation state.
    pub approval: Approval,
}

/// The moderation state of a comment (`wp:comment_approved`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Approval {
    /// Published (`1`, or no marker at all).
    #[default]
    Approved,
    /// Awaiting moderation (`0` and unrecognised markers).
    Pending,
    /// Marked as spam.
    Spam,
    /// Deleted (`trash` or `post-trashed`).
    Trash,
}

impl Approval {
    /// Returns `true` if the comment is publicly visible.
    #[must_use]
    pub const fn is_approved(self) -> bool {
        matches!(self, Self::Approved)
    }
}

impl From<&str> for Approval {
    fn from(marker: &str) -> Self {
        match marker {
            "" | "1" | "approve" => Self::Approved,
            "spam" => Self::Spam,
            "trash" | "post-trashed" => Self::Trash,
            _ => Self::Pending,
        }
    }
}

/// Parses a WXR document into an [`Export`].
///
/// # Errors
///
/// Returns an error if the XML is malformed, ends inside an open element, or
/// carries a non-numeric post or comment identifier.
pub fn parse_export(xml: &str) -> Result<Export, ParseError> {
    let mut reader = Reader::from_str(xml);
    let mut builder = Builder::default();

    loop {
        match reader.read_event().context(XmlSnafu)? {
            Event::Start(start) => builder.open(&start).context(XmlSnafu)?,
            Event::Empty(start) => {
                builder.open(&start).context(XmlSnafu)?;
                builder.close()?;
            }
            Event::End(_) => builder.close()?,
            Event::Text(text) => {
                let text = text.decode().map_err(quick_xml::Error::from);
                builder.text.push_str(&text.context(XmlSnafu)?);
            }
            Event::CData(data) => {
                let data = data.decode().map_err(quick_xml::Error::from);
                builder.text.push_str(&data.context(XmlSnafu)?);
            }
            Event::GeneralRef(reference) => {
                let resolved = resolve_reference(&reference).context(XmlSnafu)?;
                builder.text.push_str(&resolved);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(element) = builder.stack.pop() {
        return TruncatedSnafu { element }.fail();
    }

    Ok(builder.export)
}

/// Expands an entity reference found in text content.
///
/// Unknown named entities are passed through unchanged so that HTML entities
/// in non-CDATA bodies survive.
fn resolve_reference(reference: &BytesRef<'_>) -> Result<String, quick_xml::Error> {
    if let Some(ch) = reference.resolve_char_ref()? {
        return Ok(ch.to_string());
    }
    let name = reference.decode()?;
    Ok(quick_xml::escape::resolve_predefined_entity(&name)
        .map_or_else(|| format!("&{name};"), str::to_owned))
}

/// Incremental state while walking the event stream.
#[derive(Default)]
struct Builder {
    export: Export,
    stack: Vec<String>,
    text: String,
    item: Option<Item>,
    comment: Option<Comment>,
    category: Option<Category>,
}

impl Builder {
    fn parent(&self) -> Option<String> {
        self.stack.last().cloned()
    }

    fn open(&mut self, start: &BytesStart<'_>) -> Result<(), quick_xml::Error> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        self.text.clear();

        match (self.parent().as_deref(), name.as_str()) {
            (Some("channel"), "item") => self.item = Some(Item::default()),
            (Some("item"), "wp:comment") if self.item.is_some() => {
                self.comment = Some(Comment::default());
            }
            (Some("item"), "category") if self.item.is_some() => {
                self.category = Some(parse_category_attrs(start)?);
            }
            _ => {}
        }

        self.stack.push(name);
        Ok(())
    }

    fn close(&mut self) -> Result<(), ParseError> {
        let Some(name) = self.stack.pop() else {
            return Ok(());
        };
        let text = std::mem::take(&mut self.text);

        match (self.parent().as_deref(), name.as_str()) {
            (Some("channel"), "item") => {
                if let Some(item) = self.item.take() {
                    self.export.items.push(item);
                }
            }
            (Some("channel"), "title") => self.export.title = text.trim().to_owned(),
            (Some("channel"), "link") => self.export.link = text.trim().to_owned(),
            (Some("item"), "wp:comment") => {
                if let (Some(item), Some(comment)) = (self.item.as_mut(), self.comment.take()) {
                    item.comments.push(comment);
                }
            }
            (Some("item"), "category") => {
                if let (Some(item), Some(mut category)) = (self.item.as_mut(), self.category.take())
                {
                    category.name = text.trim().to_owned();
                    item.categories.push(category);
                }
            }
            (Some("item"), field) => {
                if let Some(item) = self.item.as_mut() {
                    assign_item_field(item, field, text)?;
                }
            }
            (Some("wp:comment"), field) => {
                if let Some(comment) = self.comment.as_mut() {
                    assign_comment_field(comment, field, text)?;
                }
            }
            _ => {}
        }

        Ok(())
    }
}

fn parse_category_attrs(start: &BytesStart<'_>) -> Result<Category, quick_xml::Error> {
    let mut category = Category::default();
    for attr in start.attributes() {
        let attr = attr?;
        match attr.key.as_ref() {
            b"domain" => category.domain = attr.unescape_value()?.into_owned(),
            b"nicename" => category.nicename = attr.unescape_value()?.into_owned(),
            _ => {}
        }
    }
    Ok(category)
}

fn assign_item_field(item: &mut Item, field: &str, text: String) -> Result<(), ParseError> {
    match field {
        "title" => item.title = text.trim().to_owned(),
        "link" => item.link = text.trim().to_owned(),
        "pubDate" => item.pub_date = text.trim().to_owned(),
        "dc:creator" => item.author = text.trim().to_owned(),
        "wp:post_id" => item.id = parse_number("wp:post_id", &text)?,
        "wp:post_date" => item.post_date = text.trim().to_owned(),
        "wp:post_name" => item.slug = text.trim().to_owned(),
        "wp:status" => item.status = text.trim().to_owned(),
        "wp:post_type" => item.post_type = PostType::from(text.trim()),
        _ => {
            if let Some(prefix) = field.strip_suffix(":encoded") {
                item.encoded.push(Encoded {
                    namespace: Namespace::from_prefix(prefix),
                    data: text,
                });
            }
        }
    }
    Ok(())
}

fn assign_comment_field(comment: &mut Comment, field: &str, text: String) -> Result<(), ParseError> {
    match field {
        "wp:comment_id" => comment.id = parse_number("wp:comment_id", &text)?,
        "wp:comment_parent" => {
            let parent = parse_number("wp:comment_parent", &text)?;
            comment.parent = (parent != 0).then_some(parent);
        }
        "wp:comment_author" => comment.author_name = text.trim().to_owned(),
        "wp:comment_author_email" => comment.author_email = text.trim().to_owned(),
        "wp:comment_author_url" => comment.author_url = text.trim().to_owned(),
        "wp:comment_content" => comment.content = text,
        "wp:comment_date" => comment.date = text.trim().to_owned(),
        "wp:comment_date_gmt" => comment.date_gmt = text.trim().to_owned(),
        "wp:comment_approved" => comment.approval = Approval::from(text.trim()),
        _ => {}
    }
    Ok(())
}

/// Parses an identifier field; an empty field reads as 0.
fn parse_number(field: &'static str, text: &str) -> Result<u64, ParseError> {
    let value = text.trim();
    if value.is_empty() {
        return Ok(0);
    }
    value
        .parse()
        .context(InvalidNumberSnafu { field, value })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wxr(items: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" ?>
<rss version="2.0"
    xmlns:excerpt="http://wordpress.org/export/1.2/excerpt/"
    xmlns:content="http://purl.org/rss/1.0/modules/content/"
    xmlns:dc="http://purl.org/dc/elements/1.1/"
    xmlns:wp="http://wordpress.org/export/1.2/">
<channel>
    <title>Plaza Moyua</title>
    <link>http://plazamoyua.com</link>
    {items}
</channel>
</rss>"#
        )
    }

    fn comment_xml(id: u64, parent: u64, approved: &str, body: &str) -> String {
        format!(
            r"<wp:comment>
                <wp:comment_id>{id}</wp:comment_id>
                <wp:comment_author><![CDATA[Author {id}]]></wp:comment_author>
                <wp:comment_author_email>a{id}@example.com</wp:comment_author_email>
                <wp:comment_author_url>http://example.com/{id}</wp:comment_author_url>
                <wp:comment_date>2007-01-20 08:00:00</wp:comment_date>
                <wp:comment_date_gmt>2007-01-20 07:00:00</wp:comment_date_gmt>
                <wp:comment_content><![CDATA[{body}]]></wp:comment_content>
                <wp:comment_approved>{approved}</wp:comment_approved>
                <wp:comment_parent>{parent}</wp:comment_parent>
            </wp:comment>"
        )
    }

    #[test]
    fn parses_channel_metadata() {
        let export = parse_export(&wxr("")).unwrap();

        assert_eq!(export.title, "Plaza Moyua");
        assert_eq!(export.link, "http://plazamoyua.com");
        assert!(export.items.is_empty());
    }

    #[test]
    fn parses_item_fields() {
        let export = parse_export(&wxr(
            r#"<item>
                <title>Lástima por los "fans" de Wilkins</title>
                <link>http://plazamoyua.com/2007/01/20/lastima/</link>
                <pubDate>Sat, 20 Jan 2007 06:36:31 +0000</pubDate>
                <dc:creator><![CDATA[soil]]></dc:creator>
                <guid isPermaLink="false">http://plazamoyua.com/?p=12</guid>
                <content:encoded><![CDATA[<p>Body</p>]]></content:encoded>
                <excerpt:encoded><![CDATA[Summary]]></excerpt:encoded>
                <wp:post_id>12</wp:post_id>
                <wp:post_date>2007-01-20 07:36:31</wp:post_date>
                <wp:post_name>lastima</wp:post_name>
                <wp:status>publish</wp:status>
                <wp:post_type>post</wp:post_type>
            </item>"#,
        ))
        .unwrap();

        let item = &export.items[0];
        assert_eq!(item.id, 12);
        assert_eq!(item.title, r#"Lástima por los "fans" de Wilkins"#);
        assert_eq!(item.link, "http://plazamoyua.com/2007/01/20/lastima/");
        assert_eq!(item.pub_date, "Sat, 20 Jan 2007 06:36:31 +0000");
        assert_eq!(item.author, "soil");
        assert_eq!(item.post_date, "2007-01-20 07:36:31");
        assert_eq!(item.slug, "lastima");
        assert_eq!(item.status, "publish");
        assert_eq!(item.post_type, PostType::Post);
    }

    #[test]
    fn distinguishes_content_from_excerpt() {
        let export = parse_export(&wxr(
            r"<item>
                <excerpt:encoded><![CDATA[Summary]]></excerpt:encoded>
                <content:encoded><![CDATA[<p>Full body</p>]]></content:encoded>
            </item>",
        ))
        .unwrap();

        let encoded = &export.items[0].encoded;
        assert_eq!(encoded.len(), 2);
        assert_eq!(encoded[0].namespace, Namespace::Excerpt);
        assert_eq!(encoded[0].data, "Summary");
        assert_eq!(encoded[1].namespace, Namespace::Content);
        assert_eq!(encoded[1].data, "<p>Full body</p>");
    }

    #[test]
    fn keeps_body_whitespace_verbatim() {
        let export = parse_export(&wxr(
            "<item><content:encoded><![CDATA[  line one\n\nline two\n]]></content:encoded></item>",
        ))
        .unwrap();

        assert_eq!(export.items[0].encoded[0].data, "  line one\n\nline two\n");
    }

    #[test]
    fn parses_categories_and_tags() {
        let export = parse_export(&wxr(
            r#"<item>
                <category domain="category" nicename="politica"><![CDATA[Política]]></category>
                <category domain="post_tag" nicename="bilbao"><![CDATA[Bilbao]]></category>
                <category domain="post_format" nicename="aside"/>
            </item>"#,
        ))
        .unwrap();

        let categories = &export.items[0].categories;
        assert_eq!(categories.len(), 3);
        assert_eq!(categories[0].domain, "category");
        assert_eq!(categories[0].nicename, "politica");
        assert_eq!(categories[0].name, "Política");
        assert_eq!(categories[1].domain, "post_tag");
        assert_eq!(categories[2].nicename, "aside");
        assert_eq!(categories[2].name, "");
    }

    #[test]
    fn parses_comments() {
        let items = format!(
            "<item>{}{}</item>",
            comment_xml(1, 0, "1", "paco <i>pecho</i> chico rico"),
            comment_xml(2, 1, "trash", "reply"),
        );
        let export = parse_export(&wxr(&items)).unwrap();

        let comments = &export.items[0].comments;
        assert_eq!(comments.len(), 2);

        assert_eq!(comments[0].id, 1);
        assert_eq!(comments[0].parent, None);
        assert_eq!(comments[0].author_name, "Author 1");
        assert_eq!(comments[0].author_email, "a1@example.com");
        assert_eq!(comments[0].author_url, "http://example.com/1");
        assert_eq!(comments[0].content, "paco <i>pecho</i> chico rico");
        assert_eq!(comments[0].date, "2007-01-20 08:00:00");
        assert_eq!(comments[0].date_gmt, "2007-01-20 07:00:00");
        assert_eq!(comments[0].approval, Approval::Approved);

        assert_eq!(comments[1].parent, Some(1));
        assert_eq!(comments[1].approval, Approval::Trash);
    }

    #[test]
    fn missing_approval_marker_means_approved() {
        let export = parse_export(&wxr(
            "<item><wp:comment><wp:comment_id>7</wp:comment_id></wp:comment></item>",
        ))
        .unwrap();

        assert_eq!(export.items[0].comments[0].approval, Approval::Approved);
        assert_eq!(export.items[0].comments[0].parent, None);
    }

    #[test]
    fn empty_parent_element_means_root() {
        let export = parse_export(&wxr(
            "<item><wp:comment><wp:comment_id>7</wp:comment_id><wp:comment_parent/></wp:comment></item>",
        ))
        .unwrap();

        assert_eq!(export.items[0].comments[0].parent, None);
    }

    #[test]
    fn resolves_entity_references_in_text() {
        let export = parse_export(&wxr(
            "<item><title>Tom &amp; Jerry &#8217;07</title></item>",
        ))
        .unwrap();

        assert_eq!(export.items[0].title, "Tom & Jerry \u{2019}07");
    }

    #[test]
    fn ignores_nested_metadata() {
        let export = parse_export(&wxr(
            r"<item>
                <title>Real title</title>
                <wp:postmeta>
                    <wp:meta_key>_edit_last</wp:meta_key>
                    <wp:meta_value><![CDATA[1]]></wp:meta_value>
                </wp:postmeta>
                <wp:comment>
                    <wp:comment_id>3</wp:comment_id>
                    <wp:commentmeta>
                        <wp:meta_key>akismet_result</wp:meta_key>
                        <wp:meta_value><![CDATA[false]]></wp:meta_value>
                    </wp:commentmeta>
                </wp:comment>
            </item>",
        ))
        .unwrap();

        let item = &export.items[0];
        assert_eq!(item.title, "Real title");
        assert_eq!(item.comments.len(), 1);
        assert_eq!(item.comments[0].id, 3);
    }

    #[test]
    fn parses_post_types() {
        assert_eq!(PostType::from("page"), PostType::Page);
        assert_eq!(PostType::from("attachment"), PostType::Attachment);
        assert_eq!(PostType::from("nav_menu_item"), PostType::NavMenuItem);
        assert_eq!(
            PostType::from("feedback"),
            PostType::Other("feedback".into())
        );
        assert_eq!(PostType::from("feedback").as_str(), "feedback");
    }

    #[test]
    fn parses_approval_markers() {
        assert_eq!(Approval::from("1"), Approval::Approved);
        assert_eq!(Approval::from("0"), Approval::Pending);
        assert_eq!(Approval::from("spam"), Approval::Spam);
        assert_eq!(Approval::from("post-trashed"), Approval::Trash);
        assert_eq!(Approval::from("something-new"), Approval::Pending);
        assert!(!Approval::Pending.is_approved());
    }

    #[test]
    fn rejects_non_numeric_ids() {
        let err = parse_export(&wxr("<item><wp:post_id>twelve</wp:post_id></item>")).unwrap_err();

        assert!(matches!(
            err,
            ParseError::InvalidNumber {
                field: "wp:post_id",
                ..
            }
        ));
    }

    #[test]
    fn rejects_truncated_document() {
        let result = parse_export("<rss><channel><item><title>Cut off");

        assert!(result.is_err());
    }

    #[test]
    fn rejects_mismatched_tags() {
        let result = parse_export("<rss><channel></item></channel></rss>");

        assert!(matches!(result, Err(ParseError::Xml { .. })));
    }
}
