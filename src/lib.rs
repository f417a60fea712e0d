// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Convert WordPress exports to static-site Markdown.
//!
//! This crate reads a WordPress eXtended RSS (WXR) export and produces, for
//! every post and page, a Markdown document with front matter plus an HTML
//! fragment holding its threaded comments.
//!
//! # Overview
//!
//! 1. Parse the export into typed items and flat comment lists
//! 2. Rebuild each item's reply forest from the comments' parent links
//! 3. Rewrite bodies so they no longer point at the old site
//! 4. Render articles and comment forests, and lay them out on disk
//!
//! # Example
//!
//! ```no_run
//! use wp2md::config::SiteConfig;
//! use wp2md::renderer::{RenderOptions, Renderer};
//! use wp2md::{parser, thread};
//!
//! let xml = std::fs::read_to_string("export.xml").unwrap();
//! let export = parser::parse_export(&xml).unwrap();
//!
//! let config = SiteConfig::new("plazamoyua");
//! let renderer = Renderer::for_site(&config, RenderOptions::default()).unwrap();
//!
//! for item in &export.items {
//!     println!("{}", renderer.render_article(item).markdown);
//!     let forest = thread::build_forest(&item.comments);
//!     println!("{}", renderer.render_forest(&forest));
//! }
//! ```
//!
//! # Modules
//!
//! - [`parser`]: WXR parsing and type definitions
//! - [`thread`]: Comment forest reconstruction
//! - [`transform`]: URL rewriting, emoticons and linkification
//! - [`renderer`]: Markdown and HTML generation
//! - [`config`]: Site configuration
//! - [`site`]: Output layout and file writing

#![deny(missing_docs)]

pub mod config;
pub mod parser;
pub mod renderer;
pub mod site;
pub mod thread;
pub mod transform;
