//! Page generation orchestration.
//! Each source document under the content directory goes through the same
//! sequence: skip check, front-matter resolution, optional index expansion,
//! feed emission, conversion and template rerendering. Any failure aborts
//! the whole run.

use crate::config::Config;
use crate::constants::{ReservedKey, OUTPUT_EXTENSION, SOURCE_EXTENSION};
use crate::converter::{merge_options, run_converter};
use crate::data::Mapping;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::feed::write_feed;
use crate::index::{discover_descendants, expand_index, remove_stale_synthetic};
use crate::rebuild::{latest_modified, modified_seconds, BuildClock};
use crate::renderer::{render_value, TemplateRenderer};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

/// Where a source document comes from and where its page goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDescriptor {
    pub source_path: PathBuf,
    /// Source path relative to the content directory, extension stripped
    pub plain_path: PathBuf,
    pub is_index: bool,
    pub output_path: PathBuf,
}

impl PageDescriptor {
    /// Output path relative to the public directory, with `/` separators.
    pub fn link(&self) -> String {
        let plain: Vec<String> = self
            .plain_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        format!("{}.{}", plain.join("/"), OUTPUT_EXTENSION)
    }
}

/// What happened to a single page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    Generated(PathBuf),
    Skipped,
}

/// Totals reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub generated: usize,
    pub skipped: usize,
}

/// Generates pages one at a time.
pub struct Processor<'a> {
    config: &'a Config,
    engine: &'a dyn TemplateRenderer,
    clock: &'a BuildClock,
}

impl<'a> Processor<'a> {
    pub fn new(config: &'a Config, engine: &'a dyn TemplateRenderer, clock: &'a BuildClock) -> Self {
        Self { config, engine, clock }
    }

    /// Lists every source document in the content directory, excluding
    /// generated synthetic documents.
    pub fn discover_sources(&self) -> Result<Vec<PathBuf>> {
        let mut sources = Vec::new();
        for entry in WalkDir::new(&self.config.content_dir) {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy();
            if entry.file_type().is_file()
                && name.ends_with(&format!(".{}", SOURCE_EXTENSION))
                && !name.ends_with(&self.config.generated_suffix)
            {
                sources.push(entry.into_path());
            }
        }
        Ok(sources)
    }

    /// Source path relative to the content directory, without the extension.
    pub fn plain_path(&self, source: &Path) -> Result<PathBuf> {
        let relative = source.strip_prefix(&self.config.content_dir).map_err(|_| {
            Error::ConfigValidationError(format!(
                "'{}' is not inside the content directory",
                source.display()
            ))
        })?;
        let relative = relative.to_string_lossy();
        let stripped =
            relative.strip_suffix(&format!(".{}", SOURCE_EXTENSION)).unwrap_or(relative.as_ref());
        Ok(PathBuf::from(stripped))
    }

    /// Public output path for a plain path.
    pub fn output_path(&self, plain_path: &Path) -> PathBuf {
        let mut name = plain_path.as_os_str().to_os_string();
        name.push(format!(".{}", OUTPUT_EXTENSION));
        self.config.public_dir.join(name)
    }

    /// True if index generation is on and the document carries the index flag.
    pub fn is_index(&self, doc: &Document) -> bool {
        self.config.make_index_files && doc.flag(&self.config.index_key)
    }

    pub fn describe(&self, source: &Path, doc: &Document) -> Result<PageDescriptor> {
        let plain_path = self.plain_path(source)?;
        Ok(PageDescriptor {
            source_path: source.to_path_buf(),
            output_path: self.output_path(&plain_path),
            plain_path,
            is_index: self.is_index(doc),
        })
    }

    /// Renders every string in the front matter against the globals.
    pub fn resolve_frontmatter(&self, frontmatter: &Mapping) -> Result<Mapping> {
        let context = serde_json::Value::Object(self.config.globals_context());
        frontmatter
            .iter()
            .map(|(k, v)| Ok((k.clone(), render_value(v, &context, self.engine)?)))
            .collect()
    }

    /// Modification time that decides whether the page is stale. An index
    /// page is as new as its newest descendant.
    fn source_modified(&self, page: &PageDescriptor) -> Result<f64> {
        if !page.is_index {
            return modified_seconds(&page.source_path);
        }
        let mut paths = discover_descendants(&page.source_path, self.config)?;
        paths.push(page.source_path.clone());
        latest_modified(paths.iter().map(PathBuf::as_path))
    }

    /// Context for the post-conversion template passes. Later layers win:
    /// template defaults, resolved front matter, globals, output name.
    pub fn rerender_context(&self, frontmatter: &Mapping, output: &Path) -> serde_json::Value {
        let mut context = serde_json::Map::new();
        for (k, v) in self.config.template_defaults.iter().chain(frontmatter.iter()) {
            context.insert(k.clone(), v.clone());
        }
        context.extend(self.config.globals_context());
        let filename = output.file_name().map(|n| n.to_string_lossy().into_owned());
        context.insert(
            ReservedKey::Filename.to_string(),
            serde_json::Value::String(filename.unwrap_or_default()),
        );
        serde_json::Value::Object(context)
    }

    /// Runs the configured number of template passes over a converted page.
    ///
    /// Each pass can resolve template syntax that the previous pass pulled in
    /// from the front matter. The pass count bounds this; it does not detect
    /// convergence.
    fn rerender(&self, output: &Path, frontmatter: &Mapping) -> Result<()> {
        let context = self.rerender_context(frontmatter, output);
        let mut content = fs::read_to_string(output)?;
        for pass in 0..self.config.rerender_passes {
            debug!("Rerender pass {} for {}", pass + 1, output.display());
            content = self.engine.render(&content, &context)?;
        }
        fs::write(output, content)?;
        Ok(())
    }

    /// Generates a single page.
    ///
    /// A synthetic index document, when one is created, is removed on every
    /// exit path.
    pub fn process(&self, source: &Path) -> Result<PageOutcome> {
        let doc = Document::load(source)?;
        let page = self.describe(source, &doc)?;

        if self.clock.should_skip(self.source_modified(&page)?) {
            debug!("Skipping unchanged {}", page.plain_path.display());
            return Ok(PageOutcome::Skipped);
        }

        let frontmatter = self.resolve_frontmatter(&doc.frontmatter)?;

        let expansion = if page.is_index {
            debug!("Expanding index page {}", page.plain_path.display());
            Some(expand_index(source, &frontmatter, self.config, self.engine)?)
        } else {
            None
        };
        let input = expansion.as_ref().map_or(source, |e| e.synthetic.path());

        let options = merge_options(&self.config.converter_options, &frontmatter)?;

        if let Some(expansion) = &expansion {
            if self.config.feed.enabled {
                write_feed(
                    &self.config.feed,
                    &frontmatter,
                    &page.output_path,
                    &page.link(),
                    &expansion.children,
                )?;
            }
        }

        if let Some(parent) = page.output_path.parent() {
            fs::create_dir_all(parent)?;
        }

        info!("Generating {}", page.plain_path.display());
        let label = page.plain_path.display().to_string();
        run_converter(self.config, &label, input, &page.output_path, &options)?;

        if self.config.rerender_passes > 0 {
            self.rerender(&page.output_path, &frontmatter)?;
        }

        drop(expansion);
        Ok(PageOutcome::Generated(page.output_path))
    }
}

/// Generates the whole site described by `config`.
///
/// The configuration is validated before any page is touched and leftover
/// synthetic documents are removed. The build timestamp is written only
/// after every page succeeded.
///
/// # Arguments
/// * `config` - Resolved configuration
/// * `engine` - Template engine for every substitution pass
/// * `force_rebuild` - Ignore the stored build timestamp for this run
pub fn generate_site(
    config: &Config,
    engine: &dyn TemplateRenderer,
    force_rebuild: bool,
) -> Result<BuildSummary> {
    config.validate()?;
    fs::create_dir_all(&config.public_dir)?;
    remove_stale_synthetic(config)?;

    let clock =
        BuildClock::load(&config.rebuild.timestamp_file, config.rebuild.smart, force_rebuild);
    let processor = Processor::new(config, engine, &clock);

    let sources = processor.discover_sources()?;
    info!("Found {} source documents", sources.len());

    let mut summary = BuildSummary::default();
    for source in &sources {
        match processor.process(source)? {
            PageOutcome::Generated(_) => summary.generated += 1,
            PageOutcome::Skipped => summary.skipped += 1,
        }
    }

    clock.record_build_completion(SystemTime::now())?;
    Ok(summary)
}
