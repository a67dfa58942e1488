//! Common constants used throughout the sitegen application.

/// Delimiter line that opens and closes a front-matter block.
pub const FRONTMATTER_DELIM: &str = "---";

/// Extension of source documents inside the content directory.
pub const SOURCE_EXTENSION: &str = "md";

/// Extension of converted pages inside the public directory.
pub const OUTPUT_EXTENSION: &str = "html";

/// Comment prepended to the body of every synthetic index document.
pub const GENERATED_WARNING: &str =
    "<!-- THIS IS AN AUTOMATICALLY GENERATED PAGE, CHANGES WILL BE OVERWRITTEN -->";

/// Front-matter key naming a template file appended to an index body.
pub const TEMPLATE_FILE_KEY: &str = "template_file";

/// Reserved front-matter keys.
///
/// The index flag and the globals accessor are configurable, so only their
/// default names live here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservedKey {
    Index,
    SortKey,
    SortReverse,
    ConverterOptions,
    Filename,
    Children,
    Globals,
}

impl ReservedKey {
    pub const fn as_str(self) -> &'static str {
        match self {
            ReservedKey::Index => "__index__",
            ReservedKey::SortKey => "__sort_key__",
            ReservedKey::SortReverse => "__sort_reverse__",
            ReservedKey::ConverterOptions => "__converter_options__",
            ReservedKey::Filename => "__filename__",
            ReservedKey::Children => "__children__",
            ReservedKey::Globals => "__globals__",
        }
    }
}

impl std::fmt::Display for ReservedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Built-in configuration. User configuration files are merged on top of it.
pub const DEFAULT_CONFIG: &str = r#"# base directories, relative to the location of the config file
content: &CONTENT_DIR "./content/"
public: &PUBLIC_DIR "./public/"
resources: &RESOURCES_DIR "./resources/"

# converter program (or [program, leading args...]) and its options
# `!join` concatenates the elements of a list into one string
converter: "pandoc"
converter_timeout: null
converter_options:
  from: "markdown"
  to: "html5"
  standalone: true
  mathjax: true
  include-in-header: !join [*RESOURCES_DIR, "header.html"]
  include-before-body: !join [*RESOURCES_DIR, "before-body.html"]
  include-after-body: !join [*RESOURCES_DIR, "after-body.html"]
  filter: []

# index pages
make_index_files: true
index_key: "__index__"
generated_index_suffix: "._index.md"
dotlist_hierarchy: true
default_frontmatter:
  sort_key: "title"
  sort_reverse: false

# template passes over the converted HTML: false, true, or a pass count
mustache_rerender: true

# globals available to every template as `globals_key`
globals_key: "__globals__"
extras_path: null
extras_data: {}

# incremental builds
smart_rebuild: true
build_time_fname: ".build_time"

# feeds for index pages
make_rss: false
site_link: ""
feed_extension: "rss"
"#;
