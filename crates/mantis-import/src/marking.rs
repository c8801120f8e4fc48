//! Marking objects defined in JSON.
//!
//! ```json
//! {
//!   "identifier": {"namespace": "http://example.com", "uid": "{{source}}-marking"},
//!   "type": "Marking",
//!   "timestamp": "2014-01-01T00:00:00Z",
//!   "content": {"Marking_Structure": {"@type": "TLP", "Color": "{{color}}"}}
//! }
//! ```
//!
//! `{{key}}` placeholders in any string are filled from key/value pairs.
//! Objects become elements, arrays repeated elements, `@key` attributes and
//! `_value` the element text. The marking is stored like any other object
//! and its id can then be attached to imported objects.

use std::path::Path;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use mantis_core::constants::{
    DEFAULT_MARKING_TYPE_NAME, MARKING_FAMILY_NAME, MARKING_TYPE_NAMESPACE_URI,
};
use mantis_core::errors::ImportError;
use mantis_core::types::{IdentifierKey, IobjectTypeKey};
use mantis_storage::DatabaseManager;
use regex::{Captures, Regex};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use serde_json::Value;

use crate::hooks::{DefaultHooks, TypeInfo};
use crate::persist::{create_iobject, NewIobject, PersistOutcome};
use crate::xml::{NamespaceMap, XmlElement};

static PLACEHOLDER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Za-z0-9_.\-]+)\s*\}\}").ok());

#[derive(Debug, Deserialize)]
struct RawIdentifier {
    namespace: String,
    uid: String,
}

#[derive(Debug, Deserialize)]
struct RawMarking {
    identifier: RawIdentifier,
    #[serde(rename = "type", default)]
    type_name: Option<String>,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
    content: Value,
}

/// A marking ready to be stored.
#[derive(Debug, Clone)]
pub struct MarkingDefinition {
    pub identifier: IdentifierKey,
    pub type_name: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub element: XmlElement,
}

/// Split a `KEY=VALUE` placeholder assignment.
pub fn parse_pfill(pair: &str) -> Result<(String, String), ImportError> {
    match pair.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(ImportError::InvalidMarking {
            message: format!("placeholder assignment '{pair}' is not KEY=VALUE"),
        }),
    }
}

pub fn parse_marking(json: &str, pfill: &[(String, String)]) -> Result<MarkingDefinition, ImportError> {
    let mut value: Value = serde_json::from_str(json).map_err(|e| ImportError::InvalidMarking {
        message: e.to_string(),
    })?;

    let fill: FxHashMap<&str, &str> = pfill
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    fill_placeholders(&mut value, &fill)?;

    let raw: RawMarking = serde_json::from_value(value).map_err(|e| ImportError::InvalidMarking {
        message: e.to_string(),
    })?;
    if !raw.content.is_object() {
        return Err(ImportError::InvalidMarking {
            message: "marking content must be a JSON object".to_string(),
        });
    }
    if raw.identifier.namespace.is_empty() || raw.identifier.uid.is_empty() {
        return Err(ImportError::InvalidMarking {
            message: "marking identifier needs a namespace and a uid".to_string(),
        });
    }

    let type_name = raw
        .type_name
        .unwrap_or_else(|| DEFAULT_MARKING_TYPE_NAME.to_string());
    Ok(MarkingDefinition {
        identifier: IdentifierKey::new(raw.identifier.namespace, raw.identifier.uid),
        element: json_to_element(&type_name, &raw.content),
        type_name,
        timestamp: raw.timestamp,
    })
}

pub fn load_marking(path: &Path, pfill: &[(String, String)]) -> Result<MarkingDefinition, ImportError> {
    let json = std::fs::read_to_string(path).map_err(|e| ImportError::SourceUnreadable {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    parse_marking(&json, pfill)
}

/// Store a marking. Without a timestamp of its own the marking is stamped
/// with `create_timestamp`.
pub fn create_marking(
    db: &DatabaseManager,
    marking: &MarkingDefinition,
    create_timestamp: DateTime<Utc>,
) -> Result<PersistOutcome, ImportError> {
    let type_info = TypeInfo {
        iobject_type: IobjectTypeKey {
            name: marking.type_name.clone(),
            namespace_uri: MARKING_TYPE_NAMESPACE_URI.to_string(),
            family: MARKING_FAMILY_NAME.to_string(),
        },
        type_revision: String::new(),
        family_revision: String::new(),
    };
    let namespaces = NamespaceMap::default();

    create_iobject(
        db,
        &NewIobject {
            element: &marking.element,
            identifier: marking.identifier.clone(),
            type_info: &type_info,
            timestamp: marking.timestamp.unwrap_or(create_timestamp),
            create_timestamp,
            markings: &[],
            namespaces: &namespaces,
        },
        &DefaultHooks,
    )
}

fn fill_placeholders(value: &mut Value, fill: &FxHashMap<&str, &str>) -> Result<(), ImportError> {
    match value {
        Value::String(s) => {
            *s = fill_str(s, fill)?;
            Ok(())
        }
        Value::Array(items) => items.iter_mut().try_for_each(|item| fill_placeholders(item, fill)),
        Value::Object(map) => map
            .values_mut()
            .try_for_each(|item| fill_placeholders(item, fill)),
        _ => Ok(()),
    }
}

fn fill_str(s: &str, fill: &FxHashMap<&str, &str>) -> Result<String, ImportError> {
    let Some(re) = PLACEHOLDER.as_ref() else {
        return Ok(s.to_string());
    };
    let mut missing: Option<String> = None;
    let filled = re.replace_all(s, |caps: &Captures<'_>| match fill.get(&caps[1]) {
        Some(value) => value.to_string(),
        None => {
            missing.get_or_insert_with(|| caps[1].to_string());
            String::new()
        }
    });
    match missing {
        Some(key) => Err(ImportError::InvalidMarking {
            message: format!("no value given for placeholder '{key}'"),
        }),
        None => Ok(filled.into_owned()),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn json_to_element(name: &str, value: &Value) -> XmlElement {
    let mut elt = XmlElement::new(name);
    match value {
        Value::Object(map) => {
            for (key, item) in map {
                if let Some(attribute) = key.strip_prefix('@') {
                    if let Some(text) = scalar_text(item) {
                        elt.attributes.push((attribute.to_string(), text));
                    }
                    continue;
                }
                if key == "_value" {
                    elt.text = scalar_text(item);
                    continue;
                }
                match item {
                    Value::Array(items) => elt
                        .children
                        .extend(items.iter().map(|i| json_to_element(key, i))),
                    other => elt.children.push(json_to_element(key, other)),
                }
            }
        }
        Value::Array(items) => elt
            .children
            .extend(items.iter().map(|i| json_to_element("item", i))),
        other => elt.text = scalar_text(other),
    }
    elt
}

#[cfg(test)]
mod tests {
    use super::*;

    const TLP: &str = r#"{
        "identifier": {"namespace": "http://example.com/markings", "uid": "{{source}}-tlp"},
        "type": "TLP_Marking",
        "content": {
            "Marking_Structure": {"@color": "{{color}}", "_value": "shared"},
            "Handling": ["internal", "partners"],
            "Level": 2
        }
    }"#;

    fn pfill() -> Vec<(String, String)> {
        vec![
            ("source".to_string(), "csirt".to_string()),
            ("color".to_string(), "AMBER".to_string()),
        ]
    }

    #[test]
    fn placeholders_are_filled_everywhere() {
        let marking = parse_marking(TLP, &pfill()).unwrap();
        assert_eq!(marking.identifier, IdentifierKey::new("http://example.com/markings", "csirt-tlp"));
        assert_eq!(marking.type_name, "TLP_Marking");
        let structure = marking.element.child("Marking_Structure").unwrap();
        assert_eq!(structure.attribute("color"), Some("AMBER"));
        assert_eq!(structure.text(), Some("shared"));
    }

    #[test]
    fn arrays_become_repeated_elements() {
        let marking = parse_marking(TLP, &pfill()).unwrap();
        let handling: Vec<_> = marking
            .element
            .children
            .iter()
            .filter(|c| c.name == "Handling")
            .map(|c| c.text().unwrap_or_default())
            .collect();
        assert_eq!(handling, vec!["internal", "partners"]);
        assert_eq!(marking.element.child("Level").unwrap().text(), Some("2"));
    }

    #[test]
    fn missing_placeholder_value_is_an_error() {
        let err = parse_marking(TLP, &pfill()[..1]).unwrap_err();
        assert!(matches!(err, ImportError::InvalidMarking { ref message } if message.contains("color")));
    }

    #[test]
    fn content_must_be_an_object() {
        let json = r#"{"identifier": {"namespace": "n", "uid": "u"}, "content": "text"}"#;
        assert!(matches!(
            parse_marking(json, &[]),
            Err(ImportError::InvalidMarking { .. })
        ));
    }

    #[test]
    fn default_type_name() {
        let json = r#"{"identifier": {"namespace": "n", "uid": "u"}, "content": {"A": "b"}}"#;
        let marking = parse_marking(json, &[]).unwrap();
        assert_eq!(marking.type_name, DEFAULT_MARKING_TYPE_NAME);
        assert_eq!(marking.element.name, DEFAULT_MARKING_TYPE_NAME);
    }

    #[test]
    fn pfill_pairs() {
        assert_eq!(
            parse_pfill("color=AMBER").unwrap(),
            ("color".to_string(), "AMBER".to_string())
        );
        assert_eq!(parse_pfill("k=a=b").unwrap().1, "a=b");
        assert!(parse_pfill("novalue").is_err());
        assert!(parse_pfill("=x").is_err());
    }
}
