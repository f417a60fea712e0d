// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Text transformations for article and comment bodies.
//!
//! Bodies exported from WordPress refer to the old site by absolute URL and
//! use WordPress emoticon shortcodes. Before they can be served by a static
//! site generator these are rewritten:
//!
//! - Media, tag, category and page URLs of the old site become relative paths
//! - Emoticon shortcodes become Unicode emoji
//! - Bare URLs in comments become links
//!
//! URL rewriting and emoticon substitution share one [`Substitutions`] table
//! and run as a single pass. Linkification ([`Linkifier`]) runs before that
//! pass so it sees URLs exactly as the commenter wrote them.
//!
//! # Example
//!
//! ```
//! use wp2md::config::SiteConfig;
//! use wp2md::transform::{SiteRewriter, Transform};
//!
//! let rewriter = SiteRewriter::new(&SiteConfig::new("plazamoyua")).unwrap();
//! let body = r#"<img src="http://plazamoyua.files.wordpress.com/2007/01/moyua6.jpg"> :)"#;
//!
//! assert_eq!(
//!     rewriter.transform(body),
//!     r#"<img src="/media/2007/01/moyua6.jpg"> 🙂"#
//! );
//! ```

use crate::config::SiteConfig;
use regex::{Captures, Regex};
use snafu::prelude::*;
use std::cmp::Reverse;
use std::collections::HashMap;

/// Error type for transformation setup failures.
#[derive(Debug, Snafu)]
pub enum TransformError {
    /// A generated regular expression failed to compile.
    #[snafu(display("failed to compile {what} pattern: {source}"))]
    Pattern {
        /// Which pattern failed.
        what: &'static str,
        /// The underlying regex error.
        source: regex::Error,
    },
}

/// A text-to-text body transformation.
///
/// The renderer depends on this trait rather than on a concrete rewriter, so
/// deployments can plug in their own URL logic and tests can pass text
/// through unchanged with [`Identity`].
pub trait Transform {
    /// Returns the transformed text.
    fn transform(&self, text: &str) -> String;
}

impl<F> Transform for F
where
    F: Fn(&str) -> String,
{
    fn transform(&self, text: &str) -> String {
        self(text)
    }
}

/// A transform that returns its input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Transform for Identity {
    fn transform(&self, text: &str) -> String {
        text.to_owned()
    }
}

/// Matches an HTML character reference such as `&quot;` or `&#8217;`.
const CHARACTER_REFERENCE: &str = r"&(?:[A-Za-z][A-Za-z0-9]*|#[0-9]+|#[xX][0-9A-Fa-f]+);";

/// A fixed table of literal replacements applied in one left-to-right pass.
///
/// At each position the longest matching key wins and is replaced as a unit;
/// replaced text is never scanned again. HTML character references are
/// treated as opaque tokens, so `;)` inside `&quot;)` is not a match.
#[derive(Debug, Clone)]
pub struct Substitutions {
    pattern: Regex,
    table: HashMap<String, String>,
}

impl Substitutions {
    /// Builds a table from `(from, to)` pairs.
    ///
    /// Empty keys are ignored. If a key appears twice, the first pair wins.
    ///
    /// # Errors
    ///
    /// Returns an error if the combined pattern is too large to compile.
    pub fn new<I, K, V>(pairs: I) -> Result<Self, TransformError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut table = HashMap::new();
        let mut keys = Vec::new();
        for (from, to) in pairs {
            let from = from.into();
            if from.is_empty() || table.contains_key(&from) {
                continue;
            }
            keys.push(from.clone());
            table.insert(from, to.into());
        }

        // The regex alternation is leftmost-first, so longer keys must come
        // before their prefixes.
        keys.sort_by_key(|key| Reverse(key.len()));
        let pattern = keys
            .iter()
            .map(|key| regex::escape(key))
            .chain(std::iter::once(CHARACTER_REFERENCE.to_owned()))
            .collect::<Vec<_>>()
            .join("|");

        let pattern = Regex::new(&pattern).context(PatternSnafu {
            what: "substitution",
        })?;
        Ok(Self { pattern, table })
    }

    /// Applies every replacement to `text`.
    #[must_use]
    pub fn apply(&self, text: &str) -> String {
        if self.table.is_empty() {
            return text.to_owned();
        }
        self.pattern
            .replace_all(text, |caps: &Captures<'_>| {
                let matched = &caps[0];
                self.table
                    .get(matched)
                    .map_or_else(|| matched.to_owned(), Clone::clone)
            })
            .into_owned()
    }

    /// Returns the number of entries in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// WordPress emoticon shortcodes and their emoji.
pub const EMOTICONS: &[(&str, &str)] = &[
    (":cry:", "😥"),
    (":shock:", "😯"),
    (":grin:", "😀"),
    (":razz:", "😛"),
    (":P", "😛"),
    (":)", "🙂"),
    (";)", "😉"),
    (":wink:", "😉"),
    (":lol:", "😆"),
    (":arrow:", "➡"),
    (":twisted:", "😈"),
    (":idea:", "💡"),
    (":evil:", "👿"),
    (":oops:", "😳"),
    (":roll:", "🙄"),
    (":mrgreen:", "😁"),
    (":neutral:", "😐"),
    (":?:", "❓"),
    (":!:", "❗"),
];

const SCHEMES: [&str; 2] = ["http", "https"];

/// Rewrites references to the old site and replaces emoticon shortcodes.
#[derive(Debug, Clone)]
pub struct SiteRewriter {
    substitutions: Substitutions,
}

impl SiteRewriter {
    /// Builds the rewrite table for a site.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be compiled.
    pub fn new(config: &SiteConfig) -> Result<Self, TransformError> {
        let mut pairs = url_rewrites(config);
        if config.emoticons {
            pairs.extend(
                EMOTICONS
                    .iter()
                    .map(|&(code, emoji)| (code.to_owned(), emoji.to_owned())),
            );
        }
        Ok(Self {
            substitutions: Substitutions::new(pairs)?,
        })
    }
}

impl Transform for SiteRewriter {
    fn transform(&self, text: &str) -> String {
        self.substitutions.apply(text)
    }
}

fn url_rewrites(config: &SiteConfig) -> Vec<(String, String)> {
    let media_host = config.media_host();
    let site_hosts = config.site_hosts();
    let mut pairs = Vec::new();

    for scheme in SCHEMES {
        pairs.push((
            format!("{scheme}://{media_host}"),
            config.media_prefix().to_owned(),
        ));
        for host in &site_hosts {
            pairs.push((format!("{scheme}://{host}/tag/"), "/tags/".to_owned()));
            pairs.push((
                format!("{scheme}://{host}/category/"),
                "/categories/".to_owned(),
            ));
            pairs.push((format!("{scheme}://{host}/"), "/".to_owned()));
        }
    }

    pairs
}

/// Strips the old site's host from the start of item links.
#[derive(Debug, Clone)]
pub struct LinkCleaner {
    hosts: Vec<String>,
}

/// Forms a site link may start with, tried in order.
const LINK_PREFIXES: [&str; 4] = ["https://", "http://", "//", ""];

impl LinkCleaner {
    /// Builds the host list for a site.
    #[must_use]
    pub fn new(config: &SiteConfig) -> Self {
        let mut hosts = config.site_hosts();
        hosts.sort_by_key(|host| Reverse(host.len()));
        Self { hosts }
    }

    /// Returns `link` with a leading site host removed.
    ///
    /// The host must be followed by a path, query, fragment or nothing, so
    /// links to other hosts that merely contain the site's name are kept.
    #[must_use]
    pub fn relative(&self, link: &str) -> String {
        for prefix in LINK_PREFIXES {
            let Some(rest) = link.strip_prefix(prefix) else {
                continue;
            };
            for host in &self.hosts {
                if let Some(path) = rest.strip_prefix(host.as_str())
                    && (path.is_empty() || path.starts_with(['/', '?', '#']))
                {
                    return path.to_owned();
                }
            }
        }
        link.to_owned()
    }
}

/// Matches a bare URL preceded by whitespace.
const BARE_URL: &str = r"(\s+)((?:https?|ftp)://[\w\-]+(?:\.[\w\-]+)+(?:[\w\-.,@?^=%&;:/~+#]*[\w\-@?^=%&;/~+#])?)";

/// Turns bare URLs in comment text into links.
///
/// A URL is only linked when preceded by whitespace. URLs inside an existing
/// anchor follow a quote or `>` and are left alone; so is a URL at the very
/// start of the text.
#[derive(Debug, Clone)]
pub struct Linkifier {
    pattern: Regex,
}

impl Linkifier {
    /// Compiles the URL matcher.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern fails to compile.
    pub fn new() -> Result<Self, TransformError> {
        let pattern = Regex::new(BARE_URL).context(PatternSnafu { what: "bare URL" })?;
        Ok(Self { pattern })
    }

    /// Wraps every bare URL in `text` in an anchor.
    #[must_use]
    pub fn linkify(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, r#"${1}<a href="${2}">${2}</a>"#)
            .into_owned()
    }
}

impl Transform for Linkifier {
    fn transform(&self, text: &str) -> String {
        self.linkify(text)
    }
}
