//! Index page aggregation.
//! An index page lists the front matter of its descendant documents. The
//! page body is rendered against that list and written to a transient
//! synthetic document, which the converter consumes in place of the source.

use crate::config::{Config, HierarchyMode};
use crate::constants::{
    ReservedKey, GENERATED_WARNING, OUTPUT_EXTENSION, SOURCE_EXTENSION, TEMPLATE_FILE_KEY,
};
use crate::data::Mapping;
use crate::document::{is_truthy, Document};
use crate::error::Result;
use crate::renderer::TemplateRenderer;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A generated document that is deleted when dropped.
#[derive(Debug)]
pub struct SyntheticDocument {
    path: PathBuf,
}

impl SyntheticDocument {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SyntheticDocument {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed synthetic document {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove {}: {}", self.path.display(), e),
        }
    }
}

/// Result of expanding an index page.
#[derive(Debug)]
pub struct IndexExpansion {
    /// The document to convert instead of the source
    pub synthetic: SyntheticDocument,
    /// Descendant front matter in sorted order, each with `__filename__`
    pub children: Vec<Mapping>,
}

/// File name of a source document without its extension.
fn base_name(path: &Path) -> String {
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    match name.strip_suffix(&format!(".{}", SOURCE_EXTENSION)) {
        Some(stripped) => stripped.to_string(),
        None => name,
    }
}

fn is_source_document(name: &str, suffix: &str) -> bool {
    name.ends_with(&format!(".{}", SOURCE_EXTENSION)) && !name.ends_with(suffix)
}

/// Path of the synthetic document generated for `source`.
///
/// `content/blog.md` with suffix `._index.md` becomes `content/blog._index.md`.
pub fn synthetic_path(source: &Path, suffix: &str) -> PathBuf {
    source.with_file_name(format!("{}{}", base_name(source), suffix))
}

/// Deletes synthetic documents left in the content directory, such as those
/// of an index page that was since renamed or removed.
pub fn remove_stale_synthetic(config: &Config) -> Result<usize> {
    let mut removed = 0;
    for entry in WalkDir::new(&config.content_dir) {
        let entry = entry?;
        if entry.file_type().is_file()
            && entry.file_name().to_string_lossy().ends_with(&config.generated_suffix)
        {
            warn!("Removing stale synthetic document {}", entry.path().display());
            fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Finds the descendants of the index page at `source`, sorted by path.
///
/// Directories, the index itself and generated documents are excluded.
pub fn discover_descendants(source: &Path, config: &Config) -> Result<Vec<PathBuf>> {
    let parent = source.parent().unwrap_or(Path::new("."));
    let base = base_name(source);
    let suffix = config.generated_suffix.as_str();

    let mut found = Vec::new();
    match config.hierarchy {
        HierarchyMode::Dotlist => {
            let prefix = format!("{}.", base);
            for entry in fs::read_dir(parent)? {
                let path = entry?.path();
                let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
                let Some(name) = name else { continue };
                if path.is_file()
                    && name.starts_with(&prefix)
                    && path != source
                    && is_source_document(&name, suffix)
                {
                    found.push(path);
                }
            }
        }
        HierarchyMode::Nested => {
            let dir = parent.join(&base);
            if dir.is_dir() {
                for entry in WalkDir::new(&dir).sort_by_file_name() {
                    let entry = entry?;
                    let name = entry.file_name().to_string_lossy();
                    if entry.file_type().is_file() && is_source_document(&name, suffix) {
                        found.push(entry.into_path());
                    }
                }
            }
        }
    }

    found.sort();
    debug!("Found {} descendants of {}", found.len(), source.display());
    Ok(found)
}

/// Output file name of `descendant`, relative to the directory of the index page.
pub fn descendant_filename(index_source: &Path, descendant: &Path) -> String {
    let parent = index_source.parent().unwrap_or(Path::new("."));
    let relative = descendant.strip_prefix(parent).unwrap_or(descendant);
    let mut parts: Vec<String> =
        relative.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect();
    if let Some(last) = parts.last_mut() {
        *last = format!("{}.{}", base_name(Path::new(last.as_str())), OUTPUT_EXTENSION);
    }
    parts.join("/")
}

fn sort_text(value: Option<&serde_json::Value>) -> String {
    match value {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Stable sort of descendant front matter by `key`.
///
/// When every entry holds a number for `key` the values compare numerically;
/// otherwise they compare by their text, with a missing key as `""`. Equal
/// keys keep their discovery order in both directions.
pub fn sort_children(children: &mut [Mapping], key: &str, reverse: bool) {
    let numeric = children.iter().all(|c| c.get(key).is_some_and(|v| v.is_number()));

    children.sort_by(|a, b| {
        let ordering = if numeric {
            let x = a.get(key).and_then(|v| v.as_f64()).unwrap_or_default();
            let y = b.get(key).and_then(|v| v.as_f64()).unwrap_or_default();
            x.total_cmp(&y)
        } else {
            sort_text(a.get(key)).cmp(&sort_text(b.get(key)))
        };
        if reverse {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

/// Reads the descendants of `source` and returns their sorted front matter.
///
/// `frontmatter` is the resolved front matter of the index page; its
/// `__sort_key__` and `__sort_reverse__` override the configured order.
pub fn collect_children(
    source: &Path,
    frontmatter: &Mapping,
    config: &Config,
) -> Result<Vec<Mapping>> {
    let mut children = Vec::new();
    for path in discover_descendants(source, config)? {
        let mut frontmatter = Document::load(&path)?.frontmatter;
        frontmatter.insert(
            ReservedKey::Filename.to_string(),
            serde_json::Value::String(descendant_filename(source, &path)),
        );
        children.push(frontmatter);
    }

    let sort_key = frontmatter
        .get(ReservedKey::SortKey.as_str())
        .and_then(|v| v.as_str())
        .unwrap_or(config.sort_key.as_str());
    let sort_reverse = frontmatter
        .get(ReservedKey::SortReverse.as_str())
        .map(is_truthy)
        .unwrap_or(config.sort_reverse);

    sort_children(&mut children, sort_key, sort_reverse);
    Ok(children)
}

/// Expands the index page at `source` into a synthetic document.
///
/// The index body (plus the contents of its `template_file`, if any) is
/// rendered with the sorted descendants under `__children__` and the
/// globals under the configured accessor key. The synthetic document
/// carries `frontmatter`, the already resolved front matter of the page.
pub fn expand_index(
    source: &Path,
    frontmatter: &Mapping,
    config: &Config,
    engine: &dyn TemplateRenderer,
) -> Result<IndexExpansion> {
    let mut doc = Document::new(frontmatter.clone(), Document::load(source)?.body);

    if let Some(template_file) = doc.get(TEMPLATE_FILE_KEY).and_then(|v| v.as_str()) {
        let template_path = config.root.join(template_file);
        debug!("Appending template {} to {}", template_path.display(), source.display());
        let template = fs::read_to_string(&template_path)?;
        doc.body.push_str(&template);
    }

    let children = collect_children(source, &doc.frontmatter, config)?;

    let mut context = config.globals_context();
    context.insert(
        ReservedKey::Children.to_string(),
        serde_json::Value::Array(
            children
                .iter()
                .map(|c| serde_json::Value::Object(c.clone().into_iter().collect()))
                .collect(),
        ),
    );
    let rendered = engine.render(&doc.body, &serde_json::Value::Object(context))?;
    doc.body = format!("\n\n{}\n\n{}", GENERATED_WARNING, rendered);

    let path = synthetic_path(source, &config.generated_suffix);
    doc.write(&path)?;
    debug!("Wrote synthetic document {}", path.display());

    Ok(IndexExpansion { synthetic: SyntheticDocument { path }, children })
}
