//! Conversion between typed configuration values and their text form.
//!
//! Every value stored in the registry implements [`ConfigValue`]. Scalars
//! convert lexically (`"8080"` <-> `8080`); containers go through a YAML
//! document node and delegate each element to the element type's own impl,
//! so `HashMap<String, Vec<BTreeSet<u16>>>` works without any impl knowing
//! about the others.

use crate::util::data::{load_document, load_yaml};
use ember_types::{bail, AppenderDefinition, EmberError, LoggerDefinition, Result};
use serde_yaml::{Mapping, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::Hash;

/// A value that can live in a config variable.
///
/// Implementors provide the document-node conversion; text conversion
/// defaults to parsing/serializing that node as YAML. Scalars override
/// `decode`/`encode` with plain lexical conversion.
pub trait ConfigValue: Sized + Clone + PartialEq + Send + Sync + 'static {
    /// Build a value from a document node.
    fn from_node(node: &Value) -> Result<Self>;

    /// Convert the value into a document node.
    fn to_node(&self) -> Result<Value>;

    /// Build a value from its text form.
    fn decode(text: &str) -> Result<Self> {
        Self::from_node(&parse_document(text)?)
    }

    /// Render the value as text.
    fn encode(&self) -> Result<String> {
        serialize_node(&self.to_node()?)
    }
}

/// Parse text as a single YAML document, unwrapping tags.
///
/// Numeric scalars keep their source text (see [`load_document`]).
pub fn parse_document(text: &str) -> Result<Value> {
    let node = load_document(text)
        .map_err(|e| EmberError::Conversion(format!("malformed document: {}", e)))?;
    Ok(untag(node))
}

/// Text form of a node: scalars verbatim, null as empty, composites as YAML.
pub fn serialize_node(node: &Value) -> Result<String> {
    if let Some(text) = scalar_text(node) {
        return Ok(text);
    }
    match node {
        Value::Null => Ok(String::new()),
        Value::Tagged(tagged) => serialize_node(&tagged.value),
        _ => {
            let text = serde_yaml::to_string(node)
                .map_err(|e| EmberError::Conversion(format!("cannot serialize document: {}", e)))?;
            Ok(text.trim_end_matches('\n').to_string())
        }
    }
}

/// Raw string of a scalar node, `None` for null and composites.
pub fn scalar_text(node: &Value) -> Option<String> {
    match node {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_text(&tagged.value),
        _ => None,
    }
}

/// Short description of a node kind, for error messages.
pub fn node_kind(node: &Value) -> &'static str {
    match node {
        Value::Null => "null",
        Value::Bool(_) | Value::Number(_) | Value::String(_) => "scalar",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(tagged) => node_kind(&tagged.value),
    }
}

fn untag(node: Value) -> Value {
    match node {
        Value::Tagged(tagged) => untag(tagged.value),
        other => other,
    }
}

fn sequence_items<'a>(node: &'a Value, target: &str) -> Result<&'a [Value]> {
    match node {
        Value::Sequence(items) => Ok(items),
        Value::Null => Ok(&[]),
        Value::Tagged(tagged) => sequence_items(&tagged.value, target),
        other => bail!(Conversion, "expected a sequence for {}, got {}", target, node_kind(other)),
    }
}

fn mapping_entries<'a>(node: &'a Value, target: &str) -> Result<Vec<(String, &'a Value)>> {
    match node {
        Value::Mapping(map) => map
            .iter()
            .map(|(key, value)| {
                scalar_text(key)
                    .map(|key| (key, value))
                    .ok_or_else(|| {
                        EmberError::Conversion(format!(
                            "mapping keys for {} must be scalars, got {}",
                            target,
                            node_kind(key)
                        ))
                    })
            })
            .collect(),
        Value::Null => Ok(Vec::new()),
        Value::Tagged(tagged) => mapping_entries(&tagged.value, target),
        other => bail!(Conversion, "expected a mapping for {}, got {}", target, node_kind(other)),
    }
}

macro_rules! lexical_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ConfigValue for $ty {
                fn from_node(node: &Value) -> Result<Self> {
                    match scalar_text(node) {
                        Some(text) => Self::decode(&text),
                        None => bail!(
                            Conversion,
                            "expected a scalar for {}, got {}",
                            stringify!($ty),
                            node_kind(node)
                        ),
                    }
                }

                fn to_node(&self) -> Result<Value> {
                    load_yaml(&self.encode()?)
                }

                fn decode(text: &str) -> Result<Self> {
                    text.trim().parse::<$ty>().map_err(|e| {
                        EmberError::Conversion(format!(
                            "cannot convert '{}' to {}: {}",
                            text,
                            stringify!($ty),
                            e
                        ))
                    })
                }

                fn encode(&self) -> Result<String> {
                    Ok(self.to_string())
                }
            }
        )*
    };
}

lexical_value!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, bool);

impl ConfigValue for String {
    fn from_node(node: &Value) -> Result<Self> {
        scalar_text(node).ok_or_else(|| {
            EmberError::Conversion(format!("expected a scalar for String, got {}", node_kind(node)))
        })
    }

    fn to_node(&self) -> Result<Value> {
        Ok(Value::String(self.clone()))
    }

    fn decode(text: &str) -> Result<Self> {
        Ok(text.to_string())
    }

    fn encode(&self) -> Result<String> {
        Ok(self.clone())
    }
}

impl ConfigValue for char {
    fn from_node(node: &Value) -> Result<Self> {
        match scalar_text(node) {
            Some(text) => Self::decode(&text),
            None => bail!(Conversion, "expected a scalar for char, got {}", node_kind(node)),
        }
    }

    fn to_node(&self) -> Result<Value> {
        Ok(Value::String(self.to_string()))
    }

    fn decode(text: &str) -> Result<Self> {
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => bail!(
                Conversion,
                "cannot convert '{}' to char: expected exactly one character",
                text
            ),
        }
    }

    fn encode(&self) -> Result<String> {
        Ok(self.to_string())
    }
}

impl<T: ConfigValue> ConfigValue for Vec<T> {
    fn from_node(node: &Value) -> Result<Self> {
        sequence_items(node, "Vec")?.iter().map(T::from_node).collect()
    }

    fn to_node(&self) -> Result<Value> {
        Ok(Value::Sequence(self.iter().map(T::to_node).collect::<Result<_>>()?))
    }
}

impl<T: ConfigValue> ConfigValue for VecDeque<T> {
    fn from_node(node: &Value) -> Result<Self> {
        sequence_items(node, "VecDeque")?.iter().map(T::from_node).collect()
    }

    fn to_node(&self) -> Result<Value> {
        Ok(Value::Sequence(self.iter().map(T::to_node).collect::<Result<_>>()?))
    }
}

impl<T: ConfigValue + Ord> ConfigValue for BTreeSet<T> {
    fn from_node(node: &Value) -> Result<Self> {
        sequence_items(node, "BTreeSet")?.iter().map(T::from_node).collect()
    }

    fn to_node(&self) -> Result<Value> {
        Ok(Value::Sequence(self.iter().map(T::to_node).collect::<Result<_>>()?))
    }
}

impl<T: ConfigValue + Eq + Hash> ConfigValue for HashSet<T> {
    fn from_node(node: &Value) -> Result<Self> {
        sequence_items(node, "HashSet")?.iter().map(T::from_node).collect()
    }

    fn to_node(&self) -> Result<Value> {
        Ok(Value::Sequence(self.iter().map(T::to_node).collect::<Result<_>>()?))
    }
}

impl<T: ConfigValue> ConfigValue for BTreeMap<String, T> {
    fn from_node(node: &Value) -> Result<Self> {
        mapping_entries(node, "BTreeMap")?
            .into_iter()
            .map(|(key, value)| Ok((key, T::from_node(value)?)))
            .collect()
    }

    fn to_node(&self) -> Result<Value> {
        let mut map = Mapping::new();
        for (key, value) in self {
            map.insert(Value::String(key.clone()), value.to_node()?);
        }
        Ok(Value::Mapping(map))
    }
}

impl<T: ConfigValue> ConfigValue for HashMap<String, T> {
    fn from_node(node: &Value) -> Result<Self> {
        mapping_entries(node, "HashMap")?
            .into_iter()
            .map(|(key, value)| Ok((key, T::from_node(value)?)))
            .collect()
    }

    fn to_node(&self) -> Result<Value> {
        let mut map = Mapping::new();
        for (key, value) in self {
            map.insert(Value::String(key.clone()), value.to_node()?);
        }
        Ok(Value::Mapping(map))
    }
}

impl ConfigValue for LoggerDefinition {
    fn from_node(node: &Value) -> Result<Self> {
        if !node.is_mapping() {
            bail!(
                Conversion,
                "expected a mapping for a logger definition, got {}",
                node_kind(node)
            );
        }
        serde_yaml::from_value(node.clone())
            .map_err(|e| EmberError::Conversion(format!("invalid logger definition: {}", e)))
    }

    fn to_node(&self) -> Result<Value> {
        serde_yaml::to_value(self).map_err(Into::into)
    }
}

impl ConfigValue for AppenderDefinition {
    fn from_node(node: &Value) -> Result<Self> {
        serde_yaml::from_value(node.clone())
            .map_err(|e| EmberError::Conversion(format!("invalid appender definition: {}", e)))
    }

    fn to_node(&self) -> Result<Value> {
        serde_yaml::to_value(self).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_types::LogLevel;
    use proptest::prelude::*;

    #[test]
    fn test_scalar_lexical_conversion() {
        assert_eq!(i32::decode("8080").unwrap(), 8080);
        assert_eq!(i32::decode(" 42 ").unwrap(), 42);
        assert!(i32::decode("80a").is_err());
        assert!(u8::decode("300").is_err());
        assert_eq!(f32::decode("1.5").unwrap(), 1.5);
        assert!(bool::decode("true").unwrap());
        assert_eq!(String::decode("  keep spaces ").unwrap(), "  keep spaces ");
        assert_eq!(8080i32.encode().unwrap(), "8080");
    }

    #[test]
    fn test_sequence_preserves_order() {
        let values = Vec::<i32>::decode("[3, 1, 2]").unwrap();
        assert_eq!(values, vec![3, 1, 2]);

        let values = Vec::<String>::decode("- b\n- a\n").unwrap();
        assert_eq!(values, vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_sequence_element_failure() {
        let err = Vec::<i32>::decode("[1, two, 3]").unwrap_err();
        assert!(matches!(err, EmberError::Conversion(_)));
    }

    #[test]
    fn test_sequence_rejects_mapping() {
        assert!(Vec::<i32>::decode("a: 1").is_err());
        assert!(Vec::<i32>::decode("[1, 2").is_err());
    }

    #[test]
    fn test_set_collapses_duplicates() {
        let set = BTreeSet::<i32>::decode("[2, 1, 2, 1]").unwrap();
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec![1, 2]);

        let set = HashSet::<String>::decode("[x, y, x]").unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_map_keys_verbatim() {
        let map = BTreeMap::<String, i32>::decode("Alpha: 1\nbeta: 2").unwrap();
        assert_eq!(map.get("Alpha"), Some(&1));
        assert_eq!(map.get("beta"), Some(&2));
    }

    #[test]
    fn test_nested_containers() {
        let text = "ports: [80, 443]\nadmin: [22]";
        let map = HashMap::<String, Vec<u16>>::decode(text).unwrap();
        assert_eq!(map["ports"], vec![80, 443]);
        assert_eq!(map["admin"], vec![22]);

        let encoded = map.encode().unwrap();
        assert_eq!(HashMap::<String, Vec<u16>>::decode(&encoded).unwrap(), map);

        let deep = Vec::<BTreeMap<String, BTreeSet<i64>>>::decode("- a: [3, 3, 1]\n- {}").unwrap();
        assert_eq!(deep.len(), 2);
        assert_eq!(deep[0]["a"].len(), 2);
        assert!(deep[1].is_empty());
    }

    #[test]
    fn test_empty_document_is_empty_container() {
        assert!(Vec::<i32>::decode("").unwrap().is_empty());
        assert_eq!(Vec::<i32>::new().encode().unwrap(), "[]");
        assert!(BTreeMap::<String, i32>::decode("{}").unwrap().is_empty());
    }

    #[test]
    fn test_string_elements_that_look_like_numbers() {
        let values = vec!["8080".to_string(), "true".to_string(), "".to_string()];
        let encoded = values.encode().unwrap();
        assert_eq!(Vec::<String>::decode(&encoded).unwrap(), values);
    }

    #[test]
    fn test_logger_definitions() {
        let text = r#"
- name: root
  level: info
  appender:
    - type: StdoutLogAppender
- name: system
  level: bogus
"#;
        let defs = BTreeSet::<LoggerDefinition>::decode(text).unwrap();
        assert_eq!(defs.len(), 2);
        let root = defs.iter().find(|d| d.name == "root").unwrap();
        assert_eq!(root.level, LogLevel::Info);
        assert_eq!(root.appenders, vec![AppenderDefinition::stdout()]);
        let system = defs.iter().find(|d| d.name == "system").unwrap();
        assert_eq!(system.level, LogLevel::Off);

        let encoded = defs.encode().unwrap();
        assert_eq!(BTreeSet::<LoggerDefinition>::decode(&encoded).unwrap(), defs);
    }

    #[test]
    fn test_logger_definition_requires_mapping() {
        assert!(LoggerDefinition::decode("just-a-name").is_err());
        assert!(LoggerDefinition::decode("level: INFO").is_err());
    }

    proptest! {
        #[test]
        fn prop_i64_round_trip(v in any::<i64>()) {
            prop_assert_eq!(i64::decode(&v.encode().unwrap()).unwrap(), v);
        }

        #[test]
        fn prop_f64_round_trip(v in -1.0e9f64..1.0e9f64) {
            prop_assert_eq!(f64::decode(&v.encode().unwrap()).unwrap(), v);
        }

        #[test]
        fn prop_vec_round_trip(v in proptest::collection::vec(any::<i32>(), 0..16)) {
            prop_assert_eq!(Vec::<i32>::decode(&v.encode().unwrap()).unwrap(), v);
        }

        #[test]
        fn prop_string_vec_round_trip(
            v in proptest::collection::vec("[a-z][a-z0-9_]{0,10}", 0..8)
        ) {
            prop_assert_eq!(Vec::<String>::decode(&v.encode().unwrap()).unwrap(), v);
        }

        #[test]
        fn prop_set_round_trip(v in proptest::collection::hash_set(any::<u32>(), 0..16)) {
            prop_assert_eq!(HashSet::<u32>::decode(&v.encode().unwrap()).unwrap(), v);
        }

        #[test]
        fn prop_map_of_vec_round_trip(
            v in proptest::collection::hash_map(
                "[a-z]{1,8}",
                proptest::collection::vec(any::<i16>(), 0..4),
                0..8,
            )
        ) {
            prop_assert_eq!(HashMap::<String, Vec<i16>>::decode(&v.encode().unwrap()).unwrap(), v);
        }
    }
}
