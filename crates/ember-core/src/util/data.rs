//! YAML document handling utilities.

use crate::codec::{node_kind, scalar_text};
use crate::util::fs::slurp;
use ember_types::{ConfigName, Result};
use serde::de::{self, DeserializeSeed, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

/// Load YAML from string, resolving scalars to typed nodes.
pub fn load_yaml(content: &str) -> Result<Value> {
    serde_yaml::from_str(content).map_err(Into::into)
}

/// Load YAML from string, keeping the source text of numeric scalars.
///
/// Numbers come back as `Value::String` holding exactly what was written, so
/// `version: 1.10` yields `"1.10"` rather than `1.1`. Other nodes are the
/// same as with [`load_yaml`]. Tagged subtrees are not rewritten.
pub fn load_document(content: &str) -> Result<Value> {
    let shape = load_yaml(content)?;
    if !has_numbers(&shape) {
        return Ok(shape);
    }
    let node = SourceText(&shape).deserialize(serde_yaml::Deserializer::from_str(content))?;
    Ok(node)
}

/// Read a file and load it with [`load_document`].
pub fn load_document_file(path: impl AsRef<Path>) -> Result<Value> {
    load_document(&slurp(path)?)
}

fn has_numbers(node: &Value) -> bool {
    match node {
        Value::Number(_) => true,
        Value::Sequence(items) => items.iter().any(has_numbers),
        Value::Mapping(map) => map.iter().any(|(k, v)| has_numbers(k) || has_numbers(v)),
        _ => false,
    }
}

// Second pass over the source, guided by the already-parsed tree: where the
// tree has a number, the scalar is re-read as a string, which yields its text.
struct SourceText<'a>(&'a Value);

impl<'de, 'a> DeserializeSeed<'de> for SourceText<'a> {
    type Value = Value;

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        match self.0 {
            Value::Number(_) => String::deserialize(deserializer).map(Value::String),
            Value::Sequence(items) => deserializer.deserialize_seq(SequenceText(items)),
            Value::Mapping(map) => deserializer.deserialize_map(MappingText(map)),
            other => {
                IgnoredAny::deserialize(deserializer)?;
                Ok(other.clone())
            }
        }
    }
}

struct SequenceText<'a>(&'a [Value]);

impl<'de, 'a> Visitor<'de> for SequenceText<'a> {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a sequence")
    }

    fn visit_seq<A>(self, mut access: A) -> std::result::Result<Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::with_capacity(self.0.len());
        for shape in self.0 {
            match access.next_element_seed(SourceText(shape))? {
                Some(item) => items.push(item),
                None => return Err(de::Error::invalid_length(items.len(), &self)),
            }
        }
        while let Some(item) = access.next_element::<Value>()? {
            items.push(item);
        }
        Ok(Value::Sequence(items))
    }
}

struct MappingText<'a>(&'a Mapping);

impl<'de, 'a> Visitor<'de> for MappingText<'a> {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a mapping")
    }

    fn visit_map<A>(self, mut access: A) -> std::result::Result<Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut map = Mapping::new();
        for (key_shape, value_shape) in self.0 {
            let Some(key) = access.next_key_seed(SourceText(key_shape))? else {
                return Err(de::Error::invalid_length(map.len(), &self));
            };
            let value = access.next_value_seed(SourceText(value_shape))?;
            map.insert(key, value);
        }
        while let Some((key, value)) = access.next_entry::<Value, Value>()? {
            map.insert(key, value);
        }
        Ok(Value::Mapping(map))
    }
}

/// Flatten a document into `(dotted.name, leaf)` pairs.
///
/// Mappings are walked recursively; sequences are leaves and are never
/// indexed into, so `{a: {b: [1, 2]}}` yields only `("a.b", [1, 2])`. Names
/// are case-folded. A key whose accumulated name contains characters outside
/// `[A-Za-z0-9._]` is skipped together with its subtree.
pub fn flatten(value: &Value) -> Vec<(String, Value)> {
    let mut result = Vec::new();
    flatten_recursive(value, String::new(), false, &mut result);
    result
}

/// Like [`flatten`], but also emits every nested mapping under its own name.
///
/// `{a: {b: 1}}` yields `("a", {b: 1})` and `("a.b", 1)`, which lets
/// mapping-typed variables receive their whole subtree.
pub fn flatten_with_branches(value: &Value) -> Vec<(String, Value)> {
    let mut result = Vec::new();
    flatten_recursive(value, String::new(), true, &mut result);
    result
}

fn flatten_recursive(
    value: &Value,
    prefix: String,
    branches: bool,
    result: &mut Vec<(String, Value)>,
) {
    if !prefix.is_empty() && !ConfigName::is_valid(&prefix) {
        warn!("Config invalid name: {} : {}", prefix, node_kind(value));
        return;
    }

    match value {
        Value::Mapping(map) => {
            if branches && !prefix.is_empty() {
                result.push((prefix.clone(), value.clone()));
            }
            for (key, val) in map {
                let Some(key) = scalar_text(key) else {
                    warn!("Config skipping non-scalar key under '{}'", prefix);
                    continue;
                };
                let key = key.to_ascii_lowercase();
                let new_prefix = if prefix.is_empty() {
                    key
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_recursive(val, new_prefix, branches, result);
            }
        }
        Value::Tagged(tagged) => flatten_recursive(&tagged.value, prefix, branches, result),
        _ => {
            if prefix.is_empty() {
                debug!("Config document root is a {}, nothing to flatten", node_kind(value));
                return;
            }
            result.push((prefix, value.clone()));
        }
    }
}

/// Insert `value` at a dotted path, creating intermediate mappings.
///
/// A non-mapping value already sitting on the path is replaced by a mapping.
pub fn insert_path(root: &mut Value, path: &str, value: Value) {
    let parts: Vec<&str> = path.split('.').filter(|p| !p.is_empty()).collect();
    let Some((last, parents)) = parts.split_last() else {
        return;
    };

    let mut current = root;
    for part in parents {
        if !current.is_mapping() {
            *current = Value::Mapping(Mapping::new());
        }
        let Value::Mapping(map) = current else {
            return;
        };
        current = map
            .entry(Value::String(part.to_string()))
            .or_insert_with(|| Value::Mapping(Mapping::new()));
    }

    if !current.is_mapping() {
        *current = Value::Mapping(Mapping::new());
    }
    if let Value::Mapping(map) = current {
        map.insert(Value::String(last.to_string()), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(pairs: &[(String, Value)]) -> Vec<&str> {
        pairs.iter().map(|(name, _)| name.as_str()).collect()
    }

    #[test]
    fn test_flatten_sequences_are_leaves() {
        let doc = load_yaml("system:\n  port: 8080\n  tags: [a, b]\n").unwrap();
        let pairs = flatten(&doc);
        assert_eq!(names(&pairs), vec!["system.port", "system.tags"]);
        assert_eq!(pairs[0].1, Value::from(8080));
        assert_eq!(pairs[1].1, load_yaml("[a, b]").unwrap());
        assert!(!pairs.iter().any(|(name, _)| name == "system.tags.0"));
    }

    #[test]
    fn test_load_document_keeps_number_text() {
        let text = "app:\n  version: 1.10\n  zip: 1e3\n  port: 8080\n  on: true\n  tags: [1.10, 2.50]\n";
        let doc = load_document(text).unwrap();
        let pairs = flatten(&doc);
        assert_eq!(pairs[0], ("app.version".to_string(), Value::from("1.10")));
        assert_eq!(pairs[1], ("app.zip".to_string(), Value::from("1e3")));
        assert_eq!(pairs[2], ("app.port".to_string(), Value::from("8080")));
        assert_eq!(pairs[3], ("app.on".to_string(), Value::Bool(true)));
        assert_eq!(
            pairs[4].1,
            Value::Sequence(vec![Value::from("1.10"), Value::from("2.50")])
        );
    }

    #[test]
    fn test_load_document_without_numbers_matches_load_yaml() {
        let text = "a:\n  b: [x, y]\n  c: ~\n  d: 'quoted'\n";
        assert_eq!(load_document(text).unwrap(), load_yaml(text).unwrap());
    }

    #[test]
    fn test_load_document_number_keys_and_anchors() {
        let doc = load_document("base: &n 010\ncopy: *n\nmap:\n  1.50: x\n").unwrap();
        let pairs = flatten(&doc);
        assert_eq!(pairs[0].1, Value::from("010"));
        assert_eq!(pairs[1].1, Value::from("010"));
        assert_eq!(pairs[2].0, "map.1.50");
    }

    #[test]
    fn test_flatten_case_folds() {
        let doc = load_yaml("System:\n  Port: 1\n").unwrap();
        assert_eq!(names(&flatten(&doc)), vec!["system.port"]);
    }

    #[test]
    fn test_flatten_skips_invalid_names() {
        let doc = load_yaml("ok: 1\nbad key:\n  nested: 2\nalso-bad: 3\n").unwrap();
        assert_eq!(names(&flatten(&doc)), vec!["ok"]);
    }

    #[test]
    fn test_flatten_with_branches() {
        let doc = load_yaml("a:\n  b:\n    c: 1\n  d: [x]\n").unwrap();
        let pairs = flatten_with_branches(&doc);
        assert_eq!(names(&pairs), vec!["a", "a.b", "a.b.c", "a.d"]);
    }

    #[test]
    fn test_flatten_scalar_root() {
        let doc = load_yaml("42").unwrap();
        assert!(flatten(&doc).is_empty());
    }

    #[test]
    fn test_insert_path() {
        let mut root = Value::Mapping(Mapping::new());
        insert_path(&mut root, "system.port", Value::from(8080));
        insert_path(&mut root, "system.name", Value::from("web"));
        insert_path(&mut root, "logs", Value::Sequence(vec![]));

        let expected = load_yaml("system:\n  port: 8080\n  name: web\nlogs: []\n").unwrap();
        assert_eq!(root, expected);
    }

    #[test]
    fn test_insert_path_replaces_scalar_parent() {
        let mut root = load_yaml("a: 1").unwrap();
        insert_path(&mut root, "a.b", Value::from(2));
        assert_eq!(root, load_yaml("a:\n  b: 2\n").unwrap());
    }
}
