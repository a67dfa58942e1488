#![allow(dead_code)]

use sitegen::config::Config;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Converter stand-in: copies the input (last argument) to the path after `--output`
/// and appends its arguments to `args.log` next to the script.
pub const COPY_CONVERTER: &str = r#"out=""
prev=""
input=""
for arg in "$@"; do
  if [ "$prev" = "--output" ]; then out="$arg"; fi
  prev="$arg"
  input="$arg"
done
echo "$@" >> "$(dirname "$0")/args.log"
cat "$input" > "$out"
"#;

pub const FAILING_CONVERTER: &str = r#"echo "cannot convert $#" >&2
exit 3
"#;

/// Turns off every default converter option so the stand-in sees only what a test sets.
pub const NO_DEFAULT_OPTIONS: &str = r#"converter_options:
  from: null
  to: null
  standalone: null
  mathjax: null
  include-in-header: null
  include-before-body: null
  include-after-body: null
  filter: null
"#;

pub struct Site {
    pub dir: TempDir,
}

impl Site {
    /// Creates `content/` and `resources/` and a converter script.
    pub fn new(converter: &str) -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("content")).unwrap();
        fs::create_dir_all(dir.path().join("resources")).unwrap();
        fs::write(dir.path().join("convert.sh"), converter).unwrap();
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn content(&self) -> PathBuf {
        self.root().join("content")
    }

    pub fn public(&self) -> PathBuf {
        self.root().join("public")
    }

    /// Writes a source document under `content/`.
    pub fn page(&self, name: &str, frontmatter: &str, body: &str) -> PathBuf {
        let path = self.content().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, format!("---\n{}\n---\n{}", frontmatter, body)).unwrap();
        path
    }

    /// Configuration text using the converter script plus `extra` YAML.
    pub fn config_text(&self, extra: &str) -> String {
        self.config_text_with_options("", extra)
    }

    /// Like `config_text`, with `options` lines added under `converter_options`.
    pub fn config_text_with_options(&self, options: &str, extra: &str) -> String {
        let options: String = options.lines().map(|l| format!("  {}\n", l)).collect();
        format!(
            "converter: [\"sh\", \"{}\"]\n{}{}{}\n",
            self.root().join("convert.sh").display(),
            NO_DEFAULT_OPTIONS,
            options,
            extra
        )
    }

    pub fn config(&self, extra: &str) -> Config {
        Config::from_yaml(&self.config_text(extra), self.root()).unwrap()
    }

    pub fn read_public(&self, name: &str) -> String {
        fs::read_to_string(self.public().join(name)).unwrap()
    }

    pub fn converter_log(&self) -> String {
        fs::read_to_string(self.root().join("args.log")).unwrap_or_default()
    }

    /// Every file below `dir` whose name ends with `suffix`.
    pub fn files_ending_with(&self, dir: &Path, suffix: &str) -> Vec<PathBuf> {
        walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(suffix))
            .map(|e| e.into_path())
            .collect()
    }
}
