// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Command-line interface for wp2md.
//!
//! This binary provides the `wp2md` command for converting WordPress WXR
//! exports into a directory tree of Markdown articles and comment fragments.

use lexopt::prelude::*;
use snafu::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;
use wp2md::config::{ConfigError, SiteConfig};
use wp2md::renderer::{RenderOptions, Renderer};
use wp2md::site::{self, Outcome, WriteOptions};
use wp2md::{parser, transform};

#[allow(clippy::struct_excessive_bools)]
struct Cli {
    input: Vec<PathBuf>,
    output: PathBuf,
    config: Option<PathBuf>,
    site: Option<String>,
    domain: Option<String>,
    media_path: Option<String>,
    no_emoticons: bool,
    no_linkify: bool,
    link_authors: bool,
    quiet: bool,
    dry_run: bool,
    force: bool,
}

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("failed to parse arguments: {source}"))]
    ParseArgs { source: lexopt::Error },

    #[snafu(display("a site name is required (use --site or a config file)"))]
    MissingSite,

    #[snafu(display("at least one input file or directory is required"))]
    NoInputFiles,

    #[snafu(display("failed to load configuration: {source}"))]
    LoadConfig { source: ConfigError },

    #[snafu(display("failed to build renderer: {source}"))]
    BuildRenderer { source: transform::TransformError },

    #[snafu(display("failed to read {}: {source}", path.display()))]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("failed to parse {}: {source}", path.display()))]
    ParseFile {
        path: PathBuf,
        source: parser::ParseError,
    },

    #[snafu(display("failed to write item {id}: {source}"))]
    WriteItem { id: u64, source: site::WriteError },
}

fn print_help() {
    println!(
        "\
{name} {version}
Convert WordPress exports to Markdown and threaded comment HTML

Usage: {name} [OPTIONS] -o <OUTDIR> <INPUT>...

Arguments:
  <INPUT>...  WXR export files or directories containing exports

Options:
  -o, --output <DIR>        Output root directory
  -c, --config <FILE>       Site configuration (TOML)
  -s, --site <NAME>         WordPress.com site name (overrides config)
      --domain <HOST>       Custom domain (default: <site>.com)
      --media-path <PATH>   Replacement for the media host (default: /media)

Rendering:
      --no-emoticons        Keep emoticon shortcodes as written
      --no-linkify          Do not link bare URLs in comments
      --link-authors        Link comment author names to their website

Other options:
  -q, --quiet               Only log warnings and errors
  -n, --dry-run             Show what would be written without writing
  -f, --force               Overwrite existing output files
  -h, --help                Print help
  -V, --version             Print version

Logging can be tuned with RUST_LOG, e.g. RUST_LOG=wp2md=debug.",
        name = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION"),
    );
}

fn parse_args() -> Result<Cli, lexopt::Error> {
    if std::env::args().len() == 1 {
        print_help();
        std::process::exit(0);
    }

    let mut input = Vec::new();
    let mut output: Option<PathBuf> = None;
    let mut config = None;
    let mut site = None;
    let mut domain = None;
    let mut media_path = None;
    let mut no_emoticons = false;
    let mut no_linkify = false;
    let mut link_authors = false;
    let mut quiet = false;
    let mut dry_run = false;
    let mut force = false;

    let mut parser = lexopt::Parser::from_env();
    while let Some(arg) = parser.next()? {
        match arg {
            Short('o') | Long("output") => output = Some(parser.value()?.parse()?),
            Short('c') | Long("config") => config = Some(parser.value()?.parse()?),
            Short('s') | Long("site") => site = Some(parser.value()?.string()?),
            Long("domain") => domain = Some(parser.value()?.string()?),
            Long("media-path") => media_path = Some(parser.value()?.string()?),
            Long("no-emoticons") => no_emoticons = true,
            Long("no-linkify") => no_linkify = true,
            Long("link-authors") => link_authors = true,
            Short('q') | Long("quiet") => quiet = true,
            Short('n') | Long("dry-run") => dry_run = true,
            Short('f') | Long("force") => force = true,
            Short('h') | Long("help") => {
                print_help();
                std::process::exit(0);
            }
            Short('V') | Long("version") => {
                println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            Value(val) => input.push(val.parse()?),
            _ => return Err(arg.unexpected()),
        }
    }

    Ok(Cli {
        input,
        output: output.ok_or("missing required option: --output")?,
        config,
        site,
        domain,
        media_path,
        no_emoticons,
        no_linkify,
        link_authors,
        quiet,
        dry_run,
        force,
    })
}

/// Installs the log subscriber; `RUST_LOG` overrides the default level.
fn init_logging(quiet: bool) {
    let default = if quiet { "wp2md=warn" } else { "wp2md=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Combines the configuration file with command-line overrides.
fn load_site_config(cli: &Cli) -> Result<SiteConfig, Error> {
    let mut config = match (&cli.config, &cli.site) {
        (Some(path), _) => SiteConfig::load(path).context(LoadConfigSnafu)?,
        (None, Some(site)) => SiteConfig::new(site.as_str()),
        (None, None) => return MissingSiteSnafu.fail(),
    };

    if let Some(site) = &cli.site {
        config.site.clone_from(site);
    }
    if let Some(domain) = &cli.domain {
        config.domain = Some(domain.clone());
    }
    if let Some(media_path) = &cli.media_path {
        config.media_path.clone_from(media_path);
    }
    if cli.no_emoticons {
        config.emoticons = false;
    }
    Ok(config)
}

#[allow(clippy::missing_const_for_fn)]
fn make_render_options(cli: &Cli) -> RenderOptions {
    RenderOptions {
        linkify_comments: !cli.no_linkify,
        link_authors: cli.link_authors,
    }
}

fn main() -> Result<(), Error> {
    let cli = parse_args().context(ParseArgsSnafu)?;
    init_logging(cli.quiet);

    ensure!(!cli.input.is_empty(), NoInputFilesSnafu);

    let config = load_site_config(&cli)?;
    let renderer =
        Renderer::for_site(&config, make_render_options(&cli)).context(BuildRendererSnafu)?;

    let files = collect_input_files(&cli.input);
    let options = WriteOptions {
        force: cli.force,
        dry_run: cli.dry_run,
    };

    let mut totals = Totals::default();
    for file in &files {
        process_file(file, &cli.output, &renderer, &options, &mut totals)?;
    }

    info!(
        written = totals.written,
        skipped = totals.skipped,
        excluded = totals.excluded,
        "done"
    );
    Ok(())
}

/// Collects all XML files from the given inputs (files and directories).
fn collect_input_files(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            for entry in WalkDir::new(input)
                .sort_by_file_name()
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.path().extension().is_some_and(|ext| ext == "xml"))
            {
                files.push(entry.path().to_path_buf());
            }
        } else {
            files.push(input.clone());
        }
    }
    files
}

#[derive(Default)]
struct Totals {
    written: usize,
    skipped: usize,
    excluded: usize,
}

/// Converts every item of one export file.
fn process_file(
    input: &Path,
    root: &Path,
    renderer: &Renderer,
    options: &WriteOptions,
    totals: &mut Totals,
) -> Result<(), Error> {
    let xml = std::fs::read_to_string(input).context(ReadFileSnafu { path: input })?;
    let export = parser::parse_export(&xml).context(ParseFileSnafu { path: input })?;
    info!(
        file = %input.display(),
        site = %export.title,
        items = export.items.len(),
        "read export"
    );

    for item in &export.items {
        let outcome =
            site::write_item(root, item, renderer, options).context(WriteItemSnafu { id: item.id })?;
        match outcome {
            Outcome::Written { dir, comments } => {
                totals.written += 1;
                info!(dir = %dir.display(), comments, "wrote item");
            }
            Outcome::DryRun { dir, comments } => {
                totals.written += 1;
                info!(dir = %dir.display(), comments, "would write item");
            }
            Outcome::Skipped { dir } => {
                totals.skipped += 1;
                warn!(
                    "Skipping {} (already exists, use --force to overwrite)",
                    dir.display()
                );
            }
            Outcome::Excluded => {
                totals.excluded += 1;
                debug!(id = item.id, "item not rendered");
            }
        }
    }
    Ok(())
}
