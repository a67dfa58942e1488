//! Structured-data loading shared by documents and configuration.
//! YAML is parsed with serde_yaml; the custom `!join` directive is resolved
//! before values reach the typed layers.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use log::debug;
use serde_yaml::value::TaggedValue;
use serde_yaml::Value;
use std::path::Path;

/// Ordered string-keyed mapping used for front matter, globals and template contexts.
pub type Mapping = IndexMap<String, serde_json::Value>;

/// Parses YAML text and resolves every custom tag in it.
pub fn load_yaml(text: &str) -> Result<Value> {
    let value: Value = serde_yaml::from_str(text)?;
    resolve_tags(value)
}

/// Resolves `!join [a, b, ...]` into the concatenation of its scalars.
///
/// Unknown tags are dropped and their inner value kept.
pub fn resolve_tags(value: Value) -> Result<Value> {
    match value {
        Value::Tagged(tagged) => {
            let TaggedValue { tag, value } = *tagged;
            let inner = resolve_tags(value)?;
            if tag == "join" {
                join_sequence(inner).map(Value::String)
            } else {
                debug!("Ignoring unknown YAML tag {}", tag);
                Ok(inner)
            }
        }
        Value::Sequence(seq) => {
            seq.into_iter().map(resolve_tags).collect::<Result<Vec<_>>>().map(Value::Sequence)
        }
        Value::Mapping(map) => {
            let mut resolved = serde_yaml::Mapping::new();
            for (k, v) in map {
                resolved.insert(k, resolve_tags(v)?);
            }
            Ok(Value::Mapping(resolved))
        }
        other => Ok(other),
    }
}

fn join_sequence(value: Value) -> Result<String> {
    let Value::Sequence(items) = value else {
        return Err(Error::ConfigValidationError(
            "!join expects a sequence of scalars".to_string(),
        ));
    };

    let mut joined = String::new();
    for item in items {
        match item {
            Value::String(s) => joined.push_str(&s),
            Value::Number(n) => joined.push_str(&n.to_string()),
            Value::Bool(b) => joined.push_str(&b.to_string()),
            Value::Null => {}
            _ => {
                return Err(Error::ConfigValidationError(
                    "!join expects a sequence of scalars".to_string(),
                ))
            }
        }
    }
    Ok(joined)
}

/// Converts a YAML value into an ordered mapping.
///
/// `null` is an empty mapping; any other non-mapping value yields `None`.
pub fn to_mapping(value: Value) -> Result<Option<Mapping>> {
    match value {
        Value::Null => Ok(Some(Mapping::new())),
        Value::Mapping(_) => Ok(Some(serde_yaml::from_value(value)?)),
        _ => Ok(None),
    }
}

/// Builds the global template data: inline `extras_data` overlaid by the
/// contents of `extras_path` when one is configured.
pub fn load_globals(extras_data: &Mapping, extras_path: Option<&Path>) -> Result<Mapping> {
    let mut globals = extras_data.clone();

    let Some(path) = extras_path else {
        return Ok(globals);
    };

    debug!("Loading globals from {}", path.display());
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    let loaded: Mapping = match extension {
        "yml" | "yaml" => {
            let text = std::fs::read_to_string(path)?;
            to_mapping(load_yaml(&text)?)?.ok_or_else(|| {
                Error::ConfigValidationError(format!(
                    "globals file '{}' must contain a mapping",
                    path.display()
                ))
            })?
        }
        "json" => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        _ => {
            return Err(Error::UnsupportedGlobalsFileFormat { path: path.display().to_string() })
        }
    };

    globals.extend(loaded);
    Ok(globals)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_concatenates_scalars() {
        let value = load_yaml("dir: &D ./res/\nheader: !join [*D, header.html, 2]").unwrap();
        assert_eq!(value["header"].as_str(), Some("./res/header.html2"));
    }

    #[test]
    fn test_join_rejects_nested_sequences() {
        assert!(load_yaml("x: !join [[a], b]").is_err());
    }

    #[test]
    fn test_unknown_tag_keeps_value() {
        let value = load_yaml("x: !other 5").unwrap();
        assert_eq!(value["x"].as_i64(), Some(5));
    }

    #[test]
    fn test_to_mapping_preserves_order() {
        let map = to_mapping(load_yaml("b: 1\na: 2\nc: 3").unwrap()).unwrap().unwrap();
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_to_mapping_null_and_scalar() {
        assert!(to_mapping(Value::Null).unwrap().unwrap().is_empty());
        assert!(to_mapping(Value::Bool(true)).unwrap().is_none());
    }
}
