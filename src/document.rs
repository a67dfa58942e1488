//! Front-matter document model.
//! A source document is a YAML metadata block between two `---` delimiters
//! followed by the body text handed to the converter.

use crate::constants::FRONTMATTER_DELIM;
use crate::data::{load_yaml, to_mapping, Mapping};
use crate::error::{Error, Result};
use std::fs;
use std::path::Path;

/// A parsed source document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    /// Ordered front-matter mapping
    pub frontmatter: Mapping,
    /// Everything after the closing delimiter
    pub body: String,
}

impl Document {
    pub fn new(frontmatter: Mapping, body: impl Into<String>) -> Self {
        Self { frontmatter, body: body.into() }
    }

    /// Reads and parses the document at `path`.
    ///
    /// # Errors
    /// * `Error::MissingSourceFile` if `path` is not a file
    /// * `Error::MalformedDocument` if the delimiters are missing or misplaced
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::MissingSourceFile { path: path.display().to_string() });
        }
        let text = fs::read_to_string(path)?;
        Self::parse(&text).map_err(|e| match e {
            Error::MalformedDocument { reason, .. } => {
                Error::MalformedDocument { path: path.display().to_string(), reason }
            }
            other => other,
        })
    }

    /// Parses document text.
    ///
    /// Only unindented lines holding just the delimiter are boundaries.
    /// Blank lines may precede the opening delimiter. The next delimiter line
    /// closes the front matter; everything after it is the body, including
    /// further delimiter lines.
    pub fn parse(text: &str) -> Result<Self> {
        let is_delimiter = |line: &str| line.trim_end() == FRONTMATTER_DELIM;
        let mut lines = text.split_inclusive('\n');
        let mut offset = 0;

        let mut opened = false;
        for line in lines.by_ref() {
            offset += line.len();
            if is_delimiter(line) {
                opened = true;
                break;
            }
            if !line.trim().is_empty() {
                return Err(malformed("content found before the front-matter delimiter"));
            }
        }
        if !opened {
            return Err(malformed("missing front-matter delimiters"));
        }

        let start = offset;
        let mut closing = None;
        for line in lines {
            if is_delimiter(line) {
                closing = Some((offset, offset + line.len()));
                break;
            }
            offset += line.len();
        }
        let (end, body_start) =
            closing.ok_or_else(|| malformed("missing closing front-matter delimiter"))?;

        let frontmatter = to_mapping(load_yaml(&text[start..end])?)?
            .ok_or_else(|| malformed("front matter is not a mapping"))?;

        Ok(Self { frontmatter, body: text[body_start..].to_string() })
    }

    /// Serializes the document back into delimited text.
    ///
    /// Not byte-identical to the original source, but every key/value pair
    /// and the body text survive a re-parse.
    pub fn dumps(&self) -> Result<String> {
        let yaml = serde_yaml::to_string(&self.frontmatter)?;
        Ok([FRONTMATTER_DELIM, yaml.trim(), FRONTMATTER_DELIM, self.body.trim_start()].join("\n"))
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.dumps()?)?;
        Ok(())
    }

    /// Looks up a front-matter value.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.frontmatter.get(key)
    }

    /// True when `key` is present and truthy.
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).is_some_and(is_truthy)
    }
}

/// Truthiness of a front-matter value: `false`, `null`, `0` and empty
/// strings, sequences and mappings are false.
pub fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(a) => !a.is_empty(),
        serde_json::Value::Object(o) => !o.is_empty(),
    }
}

fn malformed(reason: &str) -> Error {
    Error::MalformedDocument { path: "<text>".to_string(), reason: reason.to_string() }
}
