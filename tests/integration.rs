// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Integration tests for wp2md parsing, threading and rendering.

use std::fs;
use std::path::Path;
use wp2md::config::SiteConfig;
use wp2md::parser::{self, Export, Namespace, PostType};
use wp2md::renderer::{RenderOptions, Renderer};
use wp2md::site::{self, ARTICLE_FILE, COMMENTS_FILE, Outcome, WriteOptions};
use wp2md::thread;

const POST_DIR: &str = "post/2007/01/22/lastima-por-los-fans-de-wilkins";

fn load_fixture() -> Export {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/export.xml");
    let xml = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {e}", path.display()));
    parser::parse_export(&xml).unwrap_or_else(|e| panic!("Failed to parse {}: {e}", path.display()))
}

fn renderer() -> Renderer {
    Renderer::for_site(&SiteConfig::new("plazamoyua"), RenderOptions::default()).unwrap()
}

/// Checks the fixture's items against what WordPress exported.
#[test]
fn parses_fixture_items() {
    let export = load_fixture();

    assert_eq!(export.title, "Plaza Moyua");
    assert_eq!(export.items.len(), 4);

    let attachment = &export.items[0];
    assert_eq!(attachment.post_type, PostType::Attachment);
    assert_eq!(attachment.title, "moyua6.jpg");
    assert_eq!(attachment.author, "soil");
    assert_eq!(attachment.pub_date, "Sat, 20 Jan 2007 06:36:31 +0000");
    assert_eq!(
        attachment.encoded[0].data,
        "http://plazamoyua.files.wordpress.com/2007/01/moyua6.jpg"
    );

    let post = &export.items[2];
    assert_eq!(post.id, 12);
    assert_eq!(post.post_type, PostType::Post);
    assert_eq!(post.categories.len(), 3);
    assert_eq!(post.comments.len(), 6);
    assert!(
        post.encoded
            .iter()
            .any(|e| e.namespace == Namespace::Excerpt && e.data == "Resumen")
    );
}

/// Threads the post's comments: trash and spam go, and so does the reply to
/// the trashed comment.
#[test]
fn threads_fixture_comments() {
    let export = load_fixture();
    let forest = thread::build_forest(&export.items[2].comments);

    assert_eq!(forest.len(), 1);
    let root = &forest[0];
    assert_eq!(root.comment.author_name, "MOY");
    assert_eq!(root.node_count(), 3);
    assert_eq!(root.depth(), 3);
    assert_eq!(root.children[0].comment.id, 102);
    assert_eq!(root.children[0].children[0].comment.id, 103);
}

#[test]
fn renders_fixture_post() {
    let export = load_fixture();
    let article = renderer().render_article(&export.items[2]);

    assert!(article.diagnostics.is_empty());
    let markdown = &article.markdown;
    assert!(markdown.starts_with("---\n"));
    assert!(markdown.contains("title: \"Lástima por los \\\"fans\\\" de Wilkins\"\n"));
    assert!(markdown.contains("date: \"Mon, 22 Jan 2007 18:12:05 +0000\"\n"));
    assert!(markdown.contains("author: \"soil\"\n"));
    assert!(markdown.contains(
        "original: http://plazamoyua.com/2007/01/22/lastima-por-los-fans-de-wilkins/\n"
    ));
    assert!(markdown.contains("slug: \"lastima-por-los-fans-de-wilkins\"\n"));
    assert!(markdown.contains("url: \"/2007/01/22/lastima-por-los-fans-de-wilkins/\"\n"));
    assert!(markdown.contains("categories: [\"politica\"]\n"));
    assert!(markdown.contains("tags: [\"bilbao\", \"wilkins\"]\n"));

    assert!(markdown.contains(r#"<img src="/media/2007/01/moyua6.jpg" alt="Moyua" />"#));
    assert!(markdown.contains(r#"<a href="/tags/bilbao/">Bilbao</a> 😉"#));
    assert!(!markdown.contains("wordpress.com"));
}

#[test]
fn renders_fixture_comments() {
    let export = load_fixture();
    let forest = thread::build_forest(&export.items[2].comments);
    let html = renderer().render_forest(&forest);

    assert!(html.starts_with("<div class=\"comments\"><ul>\n"));
    assert!(html.contains("<div class=\"comment\">"));
    assert!(html.contains("<span class=\"author\">MOY</span>"));
    assert!(html.contains("paco <i>pecho</i> chico rico"));
    assert!(html.contains("insultaba como loco"));
    assert!(html.contains("<span class=\"author\">Foo</span>"));
    assert!(html.contains("<span class=\"author\">Bar &amp; Co</span>"));
    assert!(html.contains(
        r#"<a href="http://www.elcorreo.com/bizkaia/">http://www.elcorreo.com/bizkaia/</a> 🙂"#
    ));
    assert_eq!(html.matches("<div class=\"children\">").count(), 2);

    for hidden in ["Troll", "respuesta al troll", "Spammer", "cheap pills"] {
        assert!(!html.contains(hidden), "{hidden} should not be rendered");
    }
}

/// Writes the whole fixture and checks the resulting tree.
#[test]
fn writes_fixture_tree() {
    let export = load_fixture();
    let renderer = renderer();
    let root = tempfile::tempdir().unwrap();
    let options = WriteOptions::default();

    let outcomes: Vec<Outcome> = export
        .items
        .iter()
        .map(|item| site::write_item(root.path(), item, &renderer, &options).unwrap())
        .collect();

    assert_eq!(outcomes[0], Outcome::Excluded);
    assert_eq!(
        outcomes[1],
        Outcome::Written {
            dir: root.path().join("page/about"),
            comments: false
        }
    );
    assert_eq!(
        outcomes[2],
        Outcome::Written {
            dir: root.path().join(POST_DIR),
            comments: true
        }
    );
    assert_eq!(outcomes[3], Outcome::Excluded);

    let page = fs::read_to_string(root.path().join("page/about").join(ARTICLE_FILE)).unwrap();
    assert!(page.contains(r#"<a href="/categories/politica/">política</a> 🙂"#));
    assert!(!root.path().join("page/about").join(COMMENTS_FILE).exists());

    let comments = fs::read_to_string(root.path().join(POST_DIR).join(COMMENTS_FILE)).unwrap();
    assert!(comments.contains("<span class=\"author\">MOY</span>"));

    assert!(!root.path().join("attachment").exists());
}

/// Rerunning leaves existing output alone unless forced.
#[test]
fn rerun_skips_then_force_overwrites() {
    let export = load_fixture();
    let renderer = renderer();
    let root = tempfile::tempdir().unwrap();
    let post = &export.items[2];
    let article_path = root.path().join(POST_DIR).join(ARTICLE_FILE);

    site::write_item(root.path(), post, &renderer, &WriteOptions::default()).unwrap();
    fs::write(&article_path, "edited by hand").unwrap();

    let second = site::write_item(root.path(), post, &renderer, &WriteOptions::default()).unwrap();
    assert_eq!(
        second,
        Outcome::Skipped {
            dir: root.path().join(POST_DIR)
        }
    );
    assert_eq!(fs::read_to_string(&article_path).unwrap(), "edited by hand");

    let force = WriteOptions {
        force: true,
        dry_run: false,
    };
    site::write_item(root.path(), post, &renderer, &force).unwrap();
    assert!(
        fs::read_to_string(&article_path)
            .unwrap()
            .starts_with("---\n")
    );
}

#[test]
fn dry_run_writes_nothing() {
    let export = load_fixture();
    let renderer = renderer();
    let root = tempfile::tempdir().unwrap();
    let options = WriteOptions {
        force: false,
        dry_run: true,
    };

    for item in &export.items {
        site::write_item(root.path(), item, &renderer, &options).unwrap();
    }

    assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
}

/// Settings read from a config file reach the body rewriter.
#[test]
fn config_file_drives_rewriting() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("wp2md.toml");
    fs::write(
        &config_path,
        "site = \"plazamoyua\"\nmedia_path = \"/static/img\"\nemoticons = false\n",
    )
    .unwrap();

    let config = SiteConfig::load(&config_path).unwrap();
    let renderer = Renderer::for_site(&config, RenderOptions::default()).unwrap();
    let export = load_fixture();
    let markdown = renderer.render_article(&export.items[2]).markdown;

    assert!(markdown.contains(r#"<img src="/static/img/2007/01/moyua6.jpg""#));
    assert!(markdown.contains("</a> ;)"));
}
