// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Output layout and file writing.
//!
//! Each renderable item gets its own directory under the output root, named
//! after its post type, publication date and slug:
//!
//! ```text
//! post/2007/01/20/moyua/index.md
//! post/2007/01/20/moyua/comments.html
//! page/about/index.md
//! ```
//!
//! `comments.html` is only written when the item has visible comments; a
//! forced rewrite removes one left over from an earlier run.

use crate::parser::{Item, PostType};
use crate::renderer::Renderer;
use crate::thread::build_forest;
use crate::transform::Transform;
use chrono::NaiveDateTime;
use snafu::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File name of the rendered article inside an item directory.
pub const ARTICLE_FILE: &str = "index.md";

/// File name of the rendered comment forest inside an item directory.
pub const COMMENTS_FILE: &str = "comments.html";

const POST_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Error type for output failures.
#[derive(Debug, Snafu)]
pub enum WriteError {
    /// An item directory could not be created.
    #[snafu(display("failed to create {}: {source}", path.display()))]
    CreateDir {
        /// The directory path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// An output file could not be written.
    #[snafu(display("failed to write {}: {source}", path.display()))]
    Write {
        /// The file path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// An outdated output file could not be removed.
    #[snafu(display("failed to remove {}: {source}", path.display()))]
    Remove {
        /// The file path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// Controls how [`write_item`] treats the filesystem.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Overwrite existing output.
    pub force: bool,

    /// Report what would be written without touching the filesystem.
    pub dry_run: bool,
}

/// What [`write_item`] did with an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The item was written to `dir`.
    Written {
        /// The item directory.
        dir: PathBuf,
        /// Whether a comments file was written.
        comments: bool,
    },

    /// Dry run: the item would have been written to `dir`.
    DryRun {
        /// The item directory.
        dir: PathBuf,
        /// Whether a comments file would have been written.
        comments: bool,
    },

    /// The article already exists and `force` was not set.
    Skipped {
        /// The item directory.
        dir: PathBuf,
    },

    /// The item is not rendered: an attachment, a menu entry, or an item
    /// without a usable slug or post type.
    Excluded,
}

/// Returns `true` if items of this type are rendered as articles.
#[must_use]
pub const fn is_renderable(post_type: &PostType) -> bool {
    !matches!(post_type, PostType::Attachment | PostType::NavMenuItem)
}

/// Returns `true` if `name` can be used as a single path component.
fn is_safe_segment(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\', ':']) && !name.contains("..")
}

/// Returns the item's directory relative to the output root.
///
/// Returns `None` if the slug or post type is empty or could escape its
/// directory.
#[must_use]
pub fn item_dir(item: &Item) -> Option<PathBuf> {
    let slug = item.slug.as_str();
    let kind = item.post_type.as_str();
    if !is_safe_segment(slug) || !is_safe_segment(kind) {
        return None;
    }

    let mut dir = PathBuf::from(kind);
    if item.post_type == PostType::Post
        && let Ok(date) = NaiveDateTime::parse_from_str(item.post_date.trim(), POST_DATE_FORMAT)
    {
        dir.push(date.format("%Y").to_string());
        dir.push(date.format("%m").to_string());
        dir.push(date.format("%d").to_string());
    }
    dir.push(slug);
    Some(dir)
}

/// Renders an item and writes it below `root`.
///
/// # Errors
///
/// Returns an error if a directory or file cannot be written.
pub fn write_item<T: Transform>(
    root: &Path,
    item: &Item,
    renderer: &Renderer<T>,
    options: &WriteOptions,
) -> Result<Outcome, WriteError> {
    if !is_renderable(&item.post_type) {
        debug!(id = item.id, post_type = item.post_type.as_str(), "skipping item type");
        return Ok(Outcome::Excluded);
    }
    let Some(relative) = item_dir(item) else {
        warn!(
            id = item.id,
            slug = %item.slug,
            post_type = item.post_type.as_str(),
            "skipping item without a usable slug or post type"
        );
        return Ok(Outcome::Excluded);
    };

    let dir = root.join(relative);
    let article_path = dir.join(ARTICLE_FILE);
    let forest = build_forest(&item.comments);
    let comments = !forest.is_empty();

    if options.dry_run {
        return Ok(Outcome::DryRun { dir, comments });
    }
    if article_path.exists() && !options.force {
        return Ok(Outcome::Skipped { dir });
    }

    let article = renderer.render_article(item);
    std::fs::create_dir_all(&dir).context(CreateDirSnafu { path: &dir })?;
    std::fs::write(&article_path, &article.markdown).context(WriteSnafu {
        path: &article_path,
    })?;

    let comments_path = dir.join(COMMENTS_FILE);
    if comments {
        let html = renderer.render_forest(&forest);
        std::fs::write(&comments_path, html).context(WriteSnafu {
            path: &comments_path,
        })?;
    } else if comments_path.exists() {
        debug!(path = %comments_path.display(), "removing stale comments");
        std::fs::remove_file(&comments_path).context(RemoveSnafu {
            path: &comments_path,
        })?;
    }

    Ok(Outcome::Written { dir, comments })
}
