//! # Attribute Trees
//!
//! An [`AttributeTree`] is the value a single source offers for merging. It is
//! a closed two-variant type: a node is either a keyed [`Mapping`] of further
//! trees or an opaque scalar. Everything that is not a mapping is a scalar,
//! including lists, so the merge never has to probe value shapes at runtime.
//!
//! Scalars are stored as `serde_json::Value`, which gives the merge exact value
//! equality with no coercion between kinds: the string `"1"`, the integer `1`
//! and the float `1.0` are three different scalars.
//!
//! Trees can be built from JSON, YAML and TOML documents, so attribute files in
//! any of those formats feed the same checker.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value as JsonValue;
use serde_yaml::Value as YamlValue;

use crate::error::{Error, Result};
use crate::path::AttributePath;

/// Keyed children of a mapping node. Sorted keys keep traversal deterministic.
pub type Mapping = BTreeMap<String, AttributeTree>;

/// A recursive attribute value.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeTree {
    /// Any non-mapping value. Lists are compared as a whole.
    Scalar(JsonValue),
    /// Keyed sub-attributes.
    Mapping(Mapping),
}

impl AttributeTree {
    /// An empty mapping.
    pub fn empty() -> Self {
        AttributeTree::Mapping(Mapping::new())
    }

    /// Wrap a value as an opaque scalar.
    ///
    /// The value is stored as given, even a JSON object. Use
    /// [`AttributeTree::from_json`] to turn objects into mappings.
    pub fn scalar(value: impl Into<JsonValue>) -> Self {
        AttributeTree::Scalar(value.into())
    }

    /// Convert a JSON document. Objects become mappings at every depth,
    /// except inside arrays, which stay opaque.
    pub fn from_json(value: JsonValue) -> Self {
        match value {
            JsonValue::Object(map) => AttributeTree::Mapping(
                map.into_iter()
                    .map(|(key, value)| (key, AttributeTree::from_json(value)))
                    .collect(),
            ),
            other => AttributeTree::Scalar(other),
        }
    }

    /// Convert a YAML document.
    ///
    /// Non-string mapping keys are rendered to strings (`80: x` gets the key
    /// `"80"`). Tags are dropped in favour of the tagged value.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidAttributes` when two keys of one mapping render
    /// to the same string (`80:` and `"80":`) or when a float has no JSON
    /// representation (`.nan`, `.inf`).
    pub fn from_yaml(value: YamlValue) -> Result<Self> {
        yaml_to_tree(value, &mut AttributePath::root())
    }

    /// Convert a TOML document. Datetimes become strings.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidAttributes` for `nan` and `inf` floats.
    pub fn from_toml(value: toml::Value) -> Result<Self> {
        toml_to_tree(value, &mut AttributePath::root())
    }

    /// Convert back into a plain JSON value.
    pub fn to_json(&self) -> JsonValue {
        match self {
            AttributeTree::Scalar(value) => value.clone(),
            AttributeTree::Mapping(map) => JsonValue::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, AttributeTree::Mapping(_))
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            AttributeTree::Mapping(map) => Some(map),
            AttributeTree::Scalar(_) => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&JsonValue> {
        match self {
            AttributeTree::Scalar(value) => Some(value),
            AttributeTree::Mapping(_) => None,
        }
    }

    /// Look up the node at `path`. The root path returns `self`.
    pub fn get(&self, path: &AttributePath) -> Option<&AttributeTree> {
        path.keys()
            .iter()
            .try_fold(self, |node, key| node.as_mapping()?.get(key))
    }

    /// Number of scalar leaves. Empty mappings contribute nothing.
    pub fn leaf_count(&self) -> usize {
        match self {
            AttributeTree::Scalar(_) => 1,
            AttributeTree::Mapping(map) => map.values().map(AttributeTree::leaf_count).sum(),
        }
    }
}

impl Default for AttributeTree {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<JsonValue> for AttributeTree {
    fn from(value: JsonValue) -> Self {
        AttributeTree::from_json(value)
    }
}

impl From<Mapping> for AttributeTree {
    fn from(map: Mapping) -> Self {
        AttributeTree::Mapping(map)
    }
}

pub(crate) fn yaml_key_to_string(key: &YamlValue) -> String {
    match key {
        YamlValue::String(s) => s.clone(),
        YamlValue::Number(n) => n.to_string(),
        YamlValue::Bool(b) => b.to_string(),
        YamlValue::Null => "null".to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

fn location(path: &AttributePath) -> String {
    if path.is_empty() {
        "(root)".to_string()
    } else {
        path.to_string()
    }
}

fn duplicate_key(path: &AttributePath) -> Error {
    Error::InvalidAttributes {
        message: format!("duplicate key {}", location(path)),
    }
}

fn non_finite(value: impl std::fmt::Display, path: &AttributePath) -> Error {
    Error::InvalidAttributes {
        message: format!(
            "value '{}' at {} is not a finite number",
            value,
            location(path)
        ),
    }
}

fn yaml_to_tree(value: YamlValue, path: &mut AttributePath) -> Result<AttributeTree> {
    match value {
        YamlValue::Mapping(map) => {
            let mut children = Mapping::new();
            for (key, value) in map {
                let key = yaml_key_to_string(&key);
                path.push(&key);
                let child = yaml_to_tree(value, path)?;
                if children.insert(key, child).is_some() {
                    return Err(duplicate_key(path));
                }
                path.pop();
            }
            Ok(AttributeTree::Mapping(children))
        }
        YamlValue::Tagged(tagged) => yaml_to_tree(tagged.value, path),
        other => Ok(AttributeTree::Scalar(yaml_to_json(other, path)?)),
    }
}

// Values nested in lists report the path of the list itself.
fn yaml_to_json(value: YamlValue, path: &AttributePath) -> Result<JsonValue> {
    Ok(match value {
        YamlValue::Null => JsonValue::Null,
        YamlValue::Bool(b) => JsonValue::Bool(b),
        YamlValue::Number(n) => {
            if let Some(u) = n.as_u64() {
                JsonValue::from(u)
            } else if let Some(i) = n.as_i64() {
                JsonValue::from(i)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(JsonValue::Number)
                    .ok_or_else(|| non_finite(&n, path))?
            }
        }
        YamlValue::String(s) => JsonValue::String(s),
        YamlValue::Sequence(items) => JsonValue::Array(
            items
                .into_iter()
                .map(|item| yaml_to_json(item, path))
                .collect::<Result<_>>()?,
        ),
        YamlValue::Mapping(map) => {
            let mut object = serde_json::Map::new();
            for (key, value) in map {
                let key = yaml_key_to_string(&key);
                let value = yaml_to_json(value, path)?;
                if object.insert(key.clone(), value).is_some() {
                    return Err(duplicate_key(&path.child(&key)));
                }
            }
            JsonValue::Object(object)
        }
        YamlValue::Tagged(tagged) => yaml_to_json(tagged.value, path)?,
    })
}

fn toml_to_tree(value: toml::Value, path: &mut AttributePath) -> Result<AttributeTree> {
    match value {
        toml::Value::Table(table) => {
            let mut children = Mapping::new();
            for (key, value) in table {
                path.push(&key);
                let child = toml_to_tree(value, path)?;
                path.pop();
                children.insert(key, child);
            }
            Ok(AttributeTree::Mapping(children))
        }
        other => Ok(AttributeTree::Scalar(toml_to_json(other, path)?)),
    }
}

fn toml_to_json(value: toml::Value, path: &AttributePath) -> Result<JsonValue> {
    Ok(match value {
        toml::Value::String(s) => JsonValue::String(s),
        toml::Value::Integer(i) => JsonValue::from(i),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(JsonValue::Number)
            .ok_or_else(|| non_finite(f, path))?,
        toml::Value::Boolean(b) => JsonValue::Bool(b),
        toml::Value::Datetime(dt) => JsonValue::String(dt.to_string()),
        toml::Value::Array(items) => JsonValue::Array(
            items
                .into_iter()
                .map(|item| toml_to_json(item, path))
                .collect::<Result<_>>()?,
        ),
        toml::Value::Table(table) => JsonValue::Object(
            table
                .into_iter()
                .map(|(key, value)| toml_to_json(value, path).map(|value| (key, value)))
                .collect::<Result<_>>()?,
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_nests_objects() {
        let tree = AttributeTree::from_json(json!({"a": {"b": "c"}, "d": 1}));
        let a = tree.as_mapping().unwrap().get("a").unwrap();
        assert!(a.is_mapping());
        assert_eq!(
            tree.get(&AttributePath::new(["a", "b"])),
            Some(&AttributeTree::scalar("c"))
        );
        assert_eq!(tree.get(&AttributePath::new(["d"])), Some(&AttributeTree::scalar(1)));
    }

    #[test]
    fn test_arrays_stay_opaque() {
        let tree = AttributeTree::from_json(json!({"list": [{"x": 1}, 2]}));
        let list = tree.get(&AttributePath::new(["list"])).unwrap();
        assert_eq!(list.as_scalar(), Some(&json!([{"x": 1}, 2])));
        assert!(tree.get(&AttributePath::new(["list", "x"])).is_none());
    }

    #[test]
    fn test_get_root_returns_self() {
        let tree = AttributeTree::from_json(json!({"a": 1}));
        assert_eq!(tree.get(&AttributePath::root()), Some(&tree));
    }

    #[test]
    fn test_get_through_scalar_is_none() {
        let tree = AttributeTree::from_json(json!({"a": "b"}));
        assert!(tree.get(&AttributePath::new(["a", "b"])).is_none());
    }

    #[test]
    fn test_from_yaml_stringifies_keys_and_drops_tags() {
        let yaml: YamlValue = serde_yaml::from_str(
            r#"
ports:
  80: http
  443: https
enabled: !flag true
"#,
        )
        .unwrap();
        let tree = AttributeTree::from_yaml(yaml).unwrap();
        assert_eq!(
            tree.get(&AttributePath::new(["ports", "80"])),
            Some(&AttributeTree::scalar("http"))
        );
        assert_eq!(
            tree.get(&AttributePath::new(["enabled"])),
            Some(&AttributeTree::scalar(true))
        );
    }

    #[test]
    fn test_from_yaml_matches_from_json() {
        let yaml: YamlValue =
            serde_yaml::from_str("nginx:\n  port: 80\n  ratio: 0.5\n  hosts: [a, b]\n").unwrap();
        let json = json!({"nginx": {"port": 80, "ratio": 0.5, "hosts": ["a", "b"]}});
        assert_eq!(AttributeTree::from_yaml(yaml).unwrap(), AttributeTree::from_json(json));
    }

    #[test]
    fn test_from_toml_tables_and_datetimes() {
        let table: toml::Table = toml::from_str(
            r#"
[app]
name = "demo"
released = 1979-05-27T07:32:00Z
"#,
        )
        .unwrap();
        let tree = AttributeTree::from_toml(toml::Value::Table(table)).unwrap();
        assert_eq!(
            tree.get(&AttributePath::new(["app", "name"])),
            Some(&AttributeTree::scalar("demo"))
        );
        assert_eq!(
            tree.get(&AttributePath::new(["app", "released"])),
            Some(&AttributeTree::scalar("1979-05-27T07:32:00Z"))
        );
    }

    #[test]
    fn test_from_yaml_rejects_keys_that_collide_as_strings() {
        let yaml: YamlValue = serde_yaml::from_str("ports:\n  80: http\n  \"80\": https\n").unwrap();
        let err = AttributeTree::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, Error::InvalidAttributes { .. }));
        assert!(err.to_string().contains("[ports][80]"), "{err}");

        let yaml: YamlValue = serde_yaml::from_str("true: a\n\"true\": b\n").unwrap();
        assert!(AttributeTree::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_from_yaml_rejects_colliding_keys_inside_lists() {
        let yaml: YamlValue = serde_yaml::from_str("hosts:\n  - {1: a, \"1\": b}\n").unwrap();
        let err = AttributeTree::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("[hosts][1]"), "{err}");
    }

    #[test]
    fn test_from_yaml_rejects_non_finite_floats() {
        for text in ["x: .nan\n", "x: .inf\n", "x: -.inf\n", "x: [1, .nan]\n"] {
            let yaml: YamlValue = serde_yaml::from_str(text).unwrap();
            let err = AttributeTree::from_yaml(yaml).unwrap_err();
            assert!(err.to_string().contains("[x]"), "{text}: {err}");
        }

        let yaml: YamlValue = serde_yaml::from_str("x: \".nan\"\n").unwrap();
        assert_eq!(
            AttributeTree::from_yaml(yaml).unwrap().get(&AttributePath::new(["x"])),
            Some(&AttributeTree::scalar(".nan"))
        );
    }

    #[test]
    fn test_from_toml_rejects_non_finite_floats() {
        for text in ["x = inf\n", "x = nan\n", "[a]\nx = -inf\n"] {
            let table: toml::Table = toml::from_str(text).unwrap();
            let err = AttributeTree::from_toml(toml::Value::Table(table)).unwrap_err();
            assert!(matches!(err, Error::InvalidAttributes { .. }), "{text}");
        }

        let table: toml::Table = toml::from_str("x = \"inf\"\n").unwrap();
        assert!(AttributeTree::from_toml(toml::Value::Table(table)).is_ok());
    }

    #[test]
    fn test_no_coercion_between_scalar_kinds() {
        assert_ne!(AttributeTree::scalar("1"), AttributeTree::scalar(1));
        assert_ne!(AttributeTree::scalar(1), AttributeTree::scalar(1.0));
        assert_ne!(AttributeTree::scalar(true), AttributeTree::scalar("true"));
    }

    #[test]
    fn test_to_json_round_trips_structure() {
        let value = json!({"a": {"b": [1, 2]}, "c": null});
        assert_eq!(AttributeTree::from_json(value.clone()).to_json(), value);
    }

    #[test]
    fn test_serialize_is_untagged() {
        let tree = AttributeTree::from_json(json!({"a": {"b": true}}));
        assert_eq!(serde_json::to_string(&tree).unwrap(), r#"{"a":{"b":true}}"#);
    }

    #[test]
    fn test_leaf_count() {
        let tree = AttributeTree::from_json(json!({"a": {"b": 1, "c": {}}, "d": [1, 2]}));
        assert_eq!(tree.leaf_count(), 2);
        assert_eq!(AttributeTree::empty().leaf_count(), 0);
    }
}
