#![cfg(unix)]

mod common;

use common::{Site, COPY_CONVERTER, FAILING_CONVERTER};
use sitegen::config::Config;
use sitegen::error::Error;
use sitegen::processor::{generate_site, BuildSummary, PageOutcome, Processor};
use sitegen::rebuild::{modified_seconds, BuildClock};
use sitegen::renderer::MiniJinjaRenderer;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, UNIX_EPOCH};

const BLOG_LISTING: &str =
    "{% for c in __children__ %}<li>{{ c.title }} {{ c[\"__filename__\"] }}</li>\n{% endfor %}";

fn blog_site(converter: &str) -> Site {
    let site = Site::new(converter);
    site.page("home.md", "title: Home", "Welcome to {{ title }}\n");
    site.page("blog.md", "title: Blog\n__index__: true", BLOG_LISTING);
    site.page("blog.b.md", "title: B", "Second post\n");
    site.page("blog.a.md", "title: A", "First post\n");
    site
}

fn write_config(site: &Site, extra: &str) -> PathBuf {
    let path = site.root().join("config.yml");
    fs::write(&path, site.config_text(extra)).unwrap();
    path
}

fn build(site: &Site, extra: &str, force: bool) -> sitegen::error::Result<BuildSummary> {
    let config = Config::load(write_config(site, extra)).unwrap();
    generate_site(&config, &MiniJinjaRenderer::new(), force)
}

#[test_log::test]
fn test_generates_every_page_and_cleans_up() {
    let site = blog_site(COPY_CONVERTER);

    let summary = build(&site, "", false).unwrap();

    assert_eq!(summary, BuildSummary { generated: 4, skipped: 0 });
    for page in ["home.html", "blog.html", "blog.a.html", "blog.b.html"] {
        assert!(site.public().join(page).is_file(), "{} missing", page);
    }

    let blog = site.read_public("blog.html");
    let a = blog.find("<li>A blog.a.html</li>").unwrap();
    let b = blog.find("<li>B blog.b.html</li>").unwrap();
    assert!(a < b);
    assert!(blog.contains("AUTOMATICALLY GENERATED PAGE"));

    assert!(site.files_ending_with(site.root(), "._index.md").is_empty());
    assert!(site.root().join(".build_time").is_file());
}

#[test]
fn test_converter_receives_synthetic_document_for_index() {
    let site = blog_site(COPY_CONVERTER);
    build(&site, "", false).unwrap();

    let log = site.converter_log();
    assert!(log.lines().any(|l| l.ends_with("blog._index.md")));
    assert!(log.lines().any(|l| l.ends_with("home.md")));
    assert!(log.contains("--output"));
}

#[test]
fn test_rerender_resolves_frontmatter_and_globals() {
    let site = Site::new(COPY_CONVERTER);
    site.page(
        "about.md",
        "title: About {{ __globals__.site }}",
        "{{ title }} | {{ __globals__.site }} | {{ __filename__ }}\n",
    );

    build(&site, "extras_data:\n  site: Example", false).unwrap();

    let about = site.read_public("about.html");
    assert!(about.contains("About Example | Example | about.html"));
}

#[test]
fn test_rerender_disabled_keeps_template_syntax() {
    let site = Site::new(COPY_CONVERTER);
    site.page("about.md", "title: About", "{{ title }}\n");

    build(&site, "mustache_rerender: false", false).unwrap();

    assert!(site.read_public("about.html").contains("{{ title }}"));
}

#[test]
fn test_nested_pages_keep_their_directories() {
    let site = Site::new(COPY_CONVERTER);
    site.page("docs.md", "title: Docs\n__index__: true", BLOG_LISTING);
    site.page("docs/intro.md", "title: Intro", "hello\n");

    build(&site, "dotlist_hierarchy: false", false).unwrap();

    assert!(site.public().join("docs/intro.html").is_file());
    assert!(site.read_public("docs.html").contains("<li>Intro docs/intro.html</li>"));
}

#[test]
fn test_index_flag_ignored_when_index_files_disabled() {
    let site = blog_site(COPY_CONVERTER);
    build(&site, "make_index_files: false", false).unwrap();

    let blog = site.read_public("blog.html");
    assert!(!blog.contains("<li>"));
    assert!(!blog.contains("AUTOMATICALLY GENERATED PAGE"));
}

#[test]
fn test_unchanged_sources_are_skipped() {
    let site = blog_site(COPY_CONVERTER);
    let newest = site
        .files_ending_with(&site.content(), ".md")
        .iter()
        .map(|p| modified_seconds(p).unwrap())
        .fold(0.0_f64, f64::max);
    fs::write(site.root().join(".build_time"), (newest + 1.0).to_string()).unwrap();

    let summary = build(&site, "", false).unwrap();

    assert_eq!(summary, BuildSummary { generated: 0, skipped: 4 });
    assert!(!site.public().join("home.html").exists());
}

#[test]
fn test_force_rebuild_ignores_timestamp() {
    let site = blog_site(COPY_CONVERTER);
    fs::write(site.root().join(".build_time"), "1e12").unwrap();

    let summary = build(&site, "", true).unwrap();

    assert_eq!(summary.generated, 4);
    let stored: f64 = fs::read_to_string(site.root().join(".build_time")).unwrap().parse().unwrap();
    assert!(stored < 1e12);
}

#[test]
fn test_index_is_rebuilt_when_a_descendant_changes() {
    let site = blog_site(COPY_CONVERTER);
    let config = Config::load(write_config(&site, "")).unwrap();
    let engine = MiniJinjaRenderer::new();

    let stamp = modified_seconds(&site.content().join("blog.md")).unwrap() + 1.0;
    let post = site.page("blog.c.md", "title: C", "new\n");
    let later = UNIX_EPOCH + Duration::from_secs_f64(stamp + 10.0);
    fs::File::options().write(true).open(&post).unwrap().set_modified(later).unwrap();
    fs::write(site.root().join(".build_time"), stamp.to_string()).unwrap();

    let clock = BuildClock::load(&config.rebuild.timestamp_file, true, false);
    let processor = Processor::new(&config, &engine, &clock);

    let blog = processor.process(&config.content_dir.join("blog.md")).unwrap();
    assert!(matches!(blog, PageOutcome::Generated(_)));
    let home = processor.process(&config.content_dir.join("home.md")).unwrap();
    assert_eq!(home, PageOutcome::Skipped);
}

#[test]
fn test_failing_converter_aborts_without_timestamp() {
    let site = blog_site(FAILING_CONVERTER);

    let result = build(&site, "", false);

    match result {
        Err(Error::ConverterInvocationError { stderr, .. }) => {
            assert!(stderr.contains("cannot convert"))
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(!site.root().join(".build_time").exists());
    assert!(site.files_ending_with(site.root(), "._index.md").is_empty());
}

#[test]
fn test_missing_resources_fails_before_any_work() {
    let site = blog_site(COPY_CONVERTER);
    fs::remove_dir_all(site.root().join("resources")).unwrap();

    let result = build(&site, "", false);

    assert!(matches!(result, Err(Error::ConfigValidationError(_))));
    assert!(!site.public().exists());
    assert!(site.converter_log().is_empty());
}

#[test]
fn test_malformed_source_aborts_run() {
    let site = Site::new(COPY_CONVERTER);
    fs::write(site.content().join("bad.md"), "title: no delimiters\n").unwrap();

    let result = build(&site, "", false);
    assert!(matches!(result, Err(Error::MalformedDocument { .. })));
    assert!(!site.root().join(".build_time").exists());
}

#[test]
fn test_page_converter_options_override_config() {
    let site = Site::new(COPY_CONVERTER);
    site.page("a.md", "title: A\n__converter_options__:\n  toc: true", "a\n");
    site.page("b.md", "title: B", "b\n");

    build(&site, "", false).unwrap();

    let log = site.converter_log();
    let a = log.lines().find(|l| l.ends_with("a.md")).unwrap();
    let b = log.lines().find(|l| l.ends_with("b.md")).unwrap();
    assert!(a.starts_with("--toc --output"));
    assert!(b.starts_with("--output"));
}

#[test]
fn test_feed_written_for_index_pages() {
    let site = blog_site(COPY_CONVERTER);

    build(&site, "make_rss: true\nsite_link: https://example.com/", false).unwrap();

    let feed = fs::read_to_string(site.public().join("blog.rss")).unwrap();
    assert!(feed.contains("https://example.com/blog.a.html"));
    assert!(feed.contains("https://example.com/blog.b.html"));
    assert!(!site.public().join("home.rss").exists());
}

#[test]
fn test_feed_requires_site_link() {
    let site = blog_site(COPY_CONVERTER);
    let result = build(&site, "make_rss: true", false);
    assert!(matches!(result, Err(Error::ConfigValidationError(_))));
}

#[test]
fn test_index_frontmatter_is_resolved_before_conversion() {
    let site = Site::new(COPY_CONVERTER);
    site.page(
        "blog.md",
        "title: \"{{ __globals__.site }} blog\"\n__index__: true\n__sort_key__: \"{{ __globals__.order }}\"",
        BLOG_LISTING,
    );
    site.page("blog.a.md", "title: A\nrank: 2", "");
    site.page("blog.b.md", "title: B\nrank: 1", "");

    build(&site, "mustache_rerender: false\nextras_data:\n  site: Example\n  order: rank", false)
        .unwrap();

    let blog = site.read_public("blog.html");
    assert!(blog.contains("title: Example blog"));
    assert!(!blog.contains("__globals__.site"));
    let a = blog.find("<li>A blog.a.html</li>").unwrap();
    let b = blog.find("<li>B blog.b.html</li>").unwrap();
    assert!(b < a);
}

#[test]
fn test_orphaned_synthetic_documents_are_removed() {
    let site = blog_site(COPY_CONVERTER);
    site.page("old._index.md", "title: Old", "");
    site.page("nested/gone._index.md", "title: Gone", "");

    build(&site, "", false).unwrap();

    assert!(site.files_ending_with(&site.content(), "._index.md").is_empty());
    assert!(!site.public().join("old._index.html").exists());
}

#[test]
fn test_page_descriptor() {
    let site = Site::new(COPY_CONVERTER);
    let source = site.page("docs/intro.md", "__index__: true", "");
    let config = Config::load(write_config(&site, "")).unwrap();
    let engine = MiniJinjaRenderer::new();
    let clock = BuildClock::load(config.rebuild.timestamp_file.clone(), true, false);
    let processor = Processor::new(&config, &engine, &clock);

    let source = fs::canonicalize(source).unwrap();
    let doc = sitegen::document::Document::load(&source).unwrap();
    let page = processor.describe(&source, &doc).unwrap();

    assert_eq!(page.plain_path, PathBuf::from("docs/intro"));
    assert_eq!(page.output_path, config.public_dir.join("docs/intro.html"));
    assert_eq!(page.link(), "docs/intro.html");
    assert!(page.is_index);
    assert!(processor.plain_path(&site.root().join("elsewhere.md")).is_err());
}
