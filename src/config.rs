//! Configuration handling for sitegen.
//! The built-in YAML defaults are merged with the user's configuration file,
//! deserialized into a typed [`Config`] and validated before any page is built.

use crate::constants::DEFAULT_CONFIG;
use crate::data::{load_globals, load_yaml, Mapping};
use crate::error::{Error, Result};
use indexmap::IndexMap;
use log::debug;
use serde::Deserialize;
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How index pages find their descendants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HierarchyMode {
    /// `blog.md` owns `blog.*.md` in the same directory
    Dotlist,
    /// `blog.md` owns every document below `blog/`
    Nested,
}

/// A single converter option after merging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConverterOption {
    /// Bare flag, emitted only when true
    Flag(bool),
    /// Flag followed by one value
    Value(String),
    /// Flag repeated once per element
    List(Vec<String>),
    /// Dropped entirely; used to switch off a default
    Disabled,
}

impl ConverterOption {
    /// Builds an option from a configuration or front-matter value.
    ///
    /// # Errors
    /// * `Error::ConfigValidationError` for mappings or nested sequences
    pub fn from_value(key: &str, value: &serde_json::Value) -> Result<Self> {
        use serde_json::Value as Json;

        match value {
            Json::Null => Ok(Self::Disabled),
            Json::Bool(b) => Ok(Self::Flag(*b)),
            Json::String(s) => Ok(Self::Value(s.clone())),
            Json::Number(n) => Ok(Self::Value(n.to_string())),
            Json::Array(items) => items
                .iter()
                .map(|item| match item {
                    Json::String(s) => Ok(s.clone()),
                    Json::Number(n) => Ok(n.to_string()),
                    Json::Bool(b) => Ok(b.to_string()),
                    _ => Err(Error::ConfigValidationError(format!(
                        "converter option '{}' must be a list of scalars",
                        key
                    ))),
                })
                .collect::<Result<Vec<_>>>()
                .map(Self::List),
            Json::Object(_) => Err(Error::ConfigValidationError(format!(
                "converter option '{}' cannot be a mapping",
                key
            ))),
        }
    }
}

/// Parses a mapping of raw values into converter options, keeping order.
pub fn parse_converter_options(raw: &Mapping) -> Result<IndexMap<String, ConverterOption>> {
    raw.iter()
        .map(|(key, value)| Ok((key.clone(), ConverterOption::from_value(key, value)?)))
        .collect()
}

/// `mustache_rerender` accepts either a boolean or a pass count.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum RerenderSetting {
    Enabled(bool),
    Passes(u32),
}

impl RerenderSetting {
    fn passes(self) -> u32 {
        match self {
            RerenderSetting::Enabled(enabled) => u32::from(enabled),
            RerenderSetting::Passes(n) => n,
        }
    }
}

/// `converter` is a program name or a program followed by leading arguments.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ConverterCommand {
    Program(String),
    Command(Vec<String>),
}

impl ConverterCommand {
    fn into_vec(self) -> Vec<String> {
        match self {
            ConverterCommand::Program(program) => vec![program],
            ConverterCommand::Command(command) => command,
        }
    }
}

/// Configuration as written in YAML, after layering.
#[derive(Debug, Deserialize)]
struct RawConfig {
    content: PathBuf,
    public: PathBuf,
    resources: PathBuf,
    converter: ConverterCommand,
    converter_timeout: Option<u64>,
    #[serde(default)]
    converter_options: Mapping,
    make_index_files: bool,
    index_key: String,
    generated_index_suffix: String,
    dotlist_hierarchy: bool,
    #[serde(default)]
    default_frontmatter: Mapping,
    mustache_rerender: RerenderSetting,
    globals_key: String,
    extras_path: Option<PathBuf>,
    #[serde(default)]
    extras_data: Mapping,
    smart_rebuild: bool,
    build_time_fname: PathBuf,
    make_rss: bool,
    #[serde(default)]
    site_link: String,
    feed_extension: String,
}

#[derive(Debug, Clone)]
pub struct RebuildSettings {
    /// Skip sources older than the stored build timestamp
    pub smart: bool,
    pub timestamp_file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct FeedSettings {
    pub enabled: bool,
    pub site_link: String,
    /// Extension of feed files written next to index pages
    pub extension: String,
}

/// Resolved generation options. Built once per run and passed by reference.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory containing the configuration file; relative paths resolve against it
    pub root: PathBuf,
    pub content_dir: PathBuf,
    pub public_dir: PathBuf,
    pub resources_dir: PathBuf,
    /// Converter program followed by any leading arguments
    pub converter: Vec<String>,
    pub converter_timeout: Option<Duration>,
    pub converter_options: IndexMap<String, ConverterOption>,
    pub make_index_files: bool,
    pub index_key: String,
    pub generated_suffix: String,
    pub hierarchy: HierarchyMode,
    /// Default front matter, also the lowest layer of every rerender context
    pub template_defaults: Mapping,
    pub sort_key: String,
    pub sort_reverse: bool,
    pub rerender_passes: u32,
    pub globals_key: String,
    pub globals: Mapping,
    pub rebuild: RebuildSettings,
    pub feed: FeedSettings,
}

/// Merges `overlay` over `base`.
///
/// Top-level keys are replaced one by one; when both sides hold a mapping
/// for the same key, that mapping is merged one level deep.
pub fn merge_layers(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Mapping(mut base), Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                if let Value::Mapping(over) = &value {
                    if let Some(Value::Mapping(inner)) = base.get_mut(&key) {
                        for (k, v) in over {
                            inner.insert(k.clone(), v.clone());
                        }
                        continue;
                    }
                }
                base.insert(key, value);
            }
            Value::Mapping(base)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

impl Config {
    /// Loads the configuration file at `path`, merged over the defaults.
    ///
    /// # Errors
    /// * `Error::ConfigValidationError` if the file does not exist or is not a mapping
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::ConfigValidationError(format!(
                "invalid configuration path: {}",
                path.display()
            )));
        }
        debug!("Loading configuration from {}", path.display());

        let root = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let root = std::fs::canonicalize(root)?;
        Self::from_yaml(&std::fs::read_to_string(path)?, root)
    }

    /// Builds a configuration from YAML text whose relative paths resolve against `root`.
    pub fn from_yaml(text: &str, root: impl Into<PathBuf>) -> Result<Self> {
        let user = load_yaml(text)?;
        if !matches!(user, Value::Mapping(_) | Value::Null) {
            return Err(Error::ConfigValidationError(
                "configuration must be a mapping".to_string(),
            ));
        }
        let merged = merge_layers(load_yaml(DEFAULT_CONFIG)?, user);
        let raw: RawConfig = serde_yaml::from_value(merged)?;
        Self::from_raw(raw, root.into())
    }

    fn from_raw(raw: RawConfig, root: PathBuf) -> Result<Self> {
        let resolve = |p: &Path| if p.is_absolute() { p.to_path_buf() } else { root.join(p) };

        let extras_path = raw.extras_path.as_deref().map(resolve);
        let globals = load_globals(&raw.extras_data, extras_path.as_deref())?;

        let sort_key = match raw.default_frontmatter.get("sort_key") {
            None | Some(serde_json::Value::Null) => "title".to_string(),
            Some(serde_json::Value::String(key)) => key.clone(),
            Some(other) => {
                return Err(Error::ConfigValidationError(format!(
                    "default_frontmatter.sort_key must be a string, got {}",
                    other
                )))
            }
        };
        let sort_reverse = match raw.default_frontmatter.get("sort_reverse") {
            None | Some(serde_json::Value::Null) => false,
            Some(serde_json::Value::Bool(reverse)) => *reverse,
            Some(other) => {
                return Err(Error::ConfigValidationError(format!(
                    "default_frontmatter.sort_reverse must be a boolean, got {}",
                    other
                )))
            }
        };

        Ok(Self {
            content_dir: resolve(&raw.content),
            public_dir: resolve(&raw.public),
            resources_dir: resolve(&raw.resources),
            converter: raw.converter.into_vec(),
            converter_timeout: raw.converter_timeout.map(Duration::from_secs),
            converter_options: parse_converter_options(&raw.converter_options)?,
            make_index_files: raw.make_index_files,
            index_key: raw.index_key,
            generated_suffix: raw.generated_index_suffix,
            hierarchy: if raw.dotlist_hierarchy {
                HierarchyMode::Dotlist
            } else {
                HierarchyMode::Nested
            },
            template_defaults: raw.default_frontmatter,
            sort_key,
            sort_reverse,
            rerender_passes: raw.mustache_rerender.passes(),
            globals_key: raw.globals_key,
            globals,
            rebuild: RebuildSettings {
                smart: raw.smart_rebuild,
                timestamp_file: resolve(&raw.build_time_fname),
            },
            feed: FeedSettings {
                enabled: raw.make_rss,
                site_link: raw.site_link,
                extension: raw.feed_extension,
            },
            root,
        })
    }

    /// Checks the invariants that must hold before generation starts.
    ///
    /// # Errors
    /// * `Error::ConfigValidationError` if the converter is empty, the content or
    ///   resources directory is missing, or feeds are enabled without index pages or a valid site link
    pub fn validate(&self) -> Result<()> {
        if self.converter.first().map_or(true, |p| p.trim().is_empty()) {
            return Err(Error::ConfigValidationError("converter must not be empty".to_string()));
        }

        for (name, dir) in [("content", &self.content_dir), ("resources", &self.resources_dir)] {
            if !dir.is_dir() {
                return Err(Error::ConfigValidationError(format!(
                    "{} directory '{}' does not exist",
                    name,
                    dir.display()
                )));
            }
        }

        if self.feed.enabled {
            if !self.make_index_files {
                return Err(Error::ConfigValidationError(
                    "make_rss requires make_index_files".to_string(),
                ));
            }
            if self.feed.site_link.trim().is_empty() {
                return Err(Error::ConfigValidationError(
                    "make_rss requires a non-empty site_link".to_string(),
                ));
            }
            url::Url::parse(&self.feed.site_link).map_err(|e| {
                Error::ConfigValidationError(format!(
                    "site_link '{}' is not a valid URL: {}",
                    self.feed.site_link, e
                ))
            })?;
        }

        Ok(())
    }

    /// Global template data wrapped under the configured accessor key.
    pub fn globals_context(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut context = serde_json::Map::new();
        context.insert(
            self.globals_key.clone(),
            serde_json::Value::Object(self.globals.clone().into_iter().collect()),
        );
        context
    }
}
