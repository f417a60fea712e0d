// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Site configuration.
//!
//! The rewrite tables are derived from the name of the WordPress.com site the
//! export came from, plus an optional custom domain. The configuration can be
//! built in code or read from a TOML file:
//!
//! ```toml
//! site = "plazamoyua"
//! domain = "plazamoyua.com"
//! media_path = "/media"
//! emoticons = true
//! ```
//!
//! Only `site` is required.

use serde::Deserialize;
use snafu::prelude::*;
use std::path::{Path, PathBuf};

/// Error type for configuration loading failures.
#[derive(Debug, Snafu)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[snafu(display("failed to read {}: {source}", path.display()))]
    Read {
        /// The configuration file path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML or has unexpected keys.
    #[snafu(display("failed to parse {}: {source}", path.display()))]
    Parse {
        /// The configuration file path.
        path: PathBuf,
        /// The underlying TOML error.
        source: toml::de::Error,
    },
}

/// Describes the WordPress site an export came from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// The WordPress.com site name (the `plazamoyua` in
    /// `plazamoyua.wordpress.com`).
    pub site: String,

    /// The custom domain the site was served from.
    ///
    /// Defaults to `<site>.com` when not set.
    #[serde(default)]
    pub domain: Option<String>,

    /// The path that replaces the media host in rewritten URLs.
    #[serde(default = "default_media_path")]
    pub media_path: String,

    /// Whether to replace emoticon shortcodes with emoji.
    #[serde(default = "default_emoticons")]
    pub emoticons: bool,
}

fn default_media_path() -> String {
    "/media".to_owned()
}

const fn default_emoticons() -> bool {
    true
}

impl SiteConfig {
    /// Creates a configuration for `site` with default settings.
    #[must_use]
    pub fn new(site: impl Into<String>) -> Self {
        Self {
            site: site.into(),
            domain: None,
            media_path: default_media_path(),
            emoticons: default_emoticons(),
        }
    }

    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML, lacks `site`, or has
    /// unknown keys.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Reads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).context(ReadSnafu { path })?;
        Self::from_toml_str(&text).context(ParseSnafu { path })
    }

    /// Returns the host WordPress.com served uploads from.
    #[must_use]
    pub fn media_host(&self) -> String {
        format!("{}.files.wordpress.com", self.site)
    }

    /// Returns every host the site's pages were served from.
    #[must_use]
    pub fn site_hosts(&self) -> Vec<String> {
        let domain = self
            .domain
            .clone()
            .unwrap_or_else(|| format!("{}.com", self.site));
        vec![
            format!("www.{domain}"),
            domain,
            format!("{}.wordpress.com", self.site),
        ]
    }

    /// Returns the media path without a trailing slash.
    #[must_use]
    pub fn media_prefix(&self) -> &str {
        self.media_path.trim_end_matches('/')
    }
}
