//! RSS feed generation for index pages.
//!
//! Each index page gets one feed listing its descendants in sorted order.

use crate::config::FeedSettings;
use crate::constants::ReservedKey;
use crate::data::Mapping;
use crate::error::{Error, Result};
use log::info;
use rss::{validation::Validate, ChannelBuilder, GuidBuilder, ItemBuilder};
use std::fs;
use std::path::{Path, PathBuf};

/// Feed file written next to a page output, e.g. `public/blog.rss`.
pub fn feed_path(page_output: &Path, extension: &str) -> PathBuf {
    page_output.with_extension(extension)
}

/// Joins the site link and a relative page path with exactly one slash.
pub fn join_link(site_link: &str, path: &str) -> String {
    format!("{}/{}", site_link.trim_end_matches('/'), path.trim_start_matches('/'))
}

fn text(frontmatter: &Mapping, key: &str) -> Option<String> {
    match frontmatter.get(key)? {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Renders the feed XML.
///
/// # Arguments
/// * `settings` - Feed settings holding the site link
/// * `page` - Resolved front matter of the index page
/// * `page_link` - Path of the index page output relative to the site root
/// * `children` - Sorted descendant front matter carrying `__filename__`
pub fn render_feed(
    settings: &FeedSettings,
    page: &Mapping,
    page_link: &str,
    children: &[Mapping],
) -> Result<String> {
    let channel_link = join_link(&settings.site_link, page_link);
    url::Url::parse(&channel_link)
        .map_err(|e| Error::FeedError(format!("invalid link '{}': {}", channel_link, e)))?;

    let base = Path::new(page_link)
        .parent()
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .unwrap_or_default();

    let items: Vec<rss::Item> = children
        .iter()
        .map(|child| {
            let filename = text(child, ReservedKey::Filename.as_str()).unwrap_or_default();
            let relative =
                if base.is_empty() { filename } else { format!("{}/{}", base, filename) };
            let link = join_link(&settings.site_link, &relative);
            ItemBuilder::default()
                .title(text(child, "title"))
                .link(Some(link.clone()))
                .guid(Some(GuidBuilder::default().permalink(true).value(link).build()))
                .description(text(child, "description"))
                .build()
        })
        .collect();

    let channel = ChannelBuilder::default()
        .title(text(page, "title").unwrap_or_default())
        .link(channel_link)
        .description(text(page, "description").unwrap_or_default())
        .generator(Some("sitegen".to_string()))
        .items(items)
        .build();

    channel.validate().map_err(|e| Error::FeedError(format!("validation failed: {}", e)))?;
    Ok(channel.to_string())
}

/// Writes the feed for an index page next to its output.
pub fn write_feed(
    settings: &FeedSettings,
    page: &Mapping,
    page_output: &Path,
    page_link: &str,
    children: &[Mapping],
) -> Result<PathBuf> {
    let xml = render_feed(settings, page, page_link, children)?;
    let path = feed_path(page_output, &settings.extension);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, xml)?;
    info!("Wrote feed {}", path.display());
    Ok(path)
}
