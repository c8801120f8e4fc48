//! IODEF import rules.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, Utc};
use mantis_core::constants::DEFAULT_NAMESPACE_URI;
use mantis_core::types::{DatatypeKey, FactDataKind, IdentifierKey, IobjectTypeKey};
use mantis_import::flatten::FlatFact;
use mantis_import::hooks::{FactHandler, FactPredicate};
use mantis_import::{
    ExtractedObject, FactArgs, IdAndRevision, ImportHooks, NamespaceMap, TypeInfo, XmlElement,
};
use regex::Regex;

/// Namespace of the datatypes named by `dtype` attributes.
pub const IODEF_DATATYPE_NAMESPACE_URI: &str = "urn:ietf:params:xml:ns:iodef-1.0";
pub const IODEF_DATATYPE_NAMESPACE_NAME: &str = "IODEF";

/// Family used when the document namespace says nothing.
pub const IODEF_FAMILY_NAME: &str = "iodef";

pub const INCIDENT: &str = "Incident";

/// `urn:ietf:params:xml:ns:iodef-1.0` -> family namespace, family, revision.
static NS_FAMILY: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?P<family_ns>urn:ietf:params:xml:ns:(?P<family>[^-]*))-(?P<revision>.*)").ok()
});

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Family and revision information read off a namespace URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceFamily {
    pub family_ns: String,
    pub family: String,
    pub revision: String,
}

pub fn family_from_namespace(namespace: &str) -> Option<NamespaceFamily> {
    let caps = NS_FAMILY.as_ref()?.captures(namespace)?;
    Some(NamespaceFamily {
        family_ns: caps["family_ns"].to_string(),
        family: caps["family"].to_string(),
        revision: caps["revision"].to_string(),
    })
}

/// `ReportTime` as UTC. Values without an offset are taken to be UTC.
pub fn parse_report_time(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(ts.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}

#[derive(Debug, Clone)]
pub struct IodefHooks {
    /// Identifier namespace for incidents whose `IncidentID` has no `name`.
    pub identifier_ns_uri: String,
}

impl IodefHooks {
    pub fn new(identifier_ns_uri: impl Into<String>) -> Self {
        Self {
            identifier_ns_uri: identifier_ns_uri.into(),
        }
    }
}

fn is_portlist(fact: &FlatFact, _attr_info: &[(String, String)]) -> bool {
    fact.tag() == "Portlist" && !fact.is_attribute()
}

/// `60524,60526,60527` becomes one fact with three values.
fn split_portlist(fact: &FlatFact, _attr_info: &[(String, String)], args: &mut FactArgs) -> bool {
    args.values = fact
        .value
        .split(',')
        .map(|port| port.trim().to_string())
        .collect();
    true
}

impl ImportHooks for IodefHooks {
    fn embedding_type(&self, _parent: &XmlElement, child: &XmlElement) -> Option<String> {
        (child.name == INCIDENT).then(|| INCIDENT.to_string())
    }

    fn id_and_revision(&self, element: &XmlElement) -> IdAndRevision {
        let mut result = IdAndRevision::default();
        if element.name != INCIDENT {
            return result;
        }

        for child in &element.children {
            match child.name.as_str() {
                "IncidentID" if result.id.is_none() => {
                    let Some(uid) = child.text().filter(|t| !t.is_empty()) else {
                        tracing::warn!("IncidentID without content");
                        continue;
                    };
                    let namespace = child
                        .attribute("name")
                        .filter(|n| !n.is_empty())
                        .unwrap_or(self.identifier_ns_uri.as_str());
                    result.id = Some(IdentifierKey::new(namespace, uid));
                }
                "ReportTime" if result.timestamp.is_none() => {
                    let raw = child.text().unwrap_or_default();
                    result.timestamp = parse_report_time(raw);
                    if result.timestamp.is_none() {
                        tracing::warn!(report_time = raw, "unparsable ReportTime, using import time");
                    }
                }
                _ => {}
            }
            if result.id.is_some() && result.timestamp.is_some() {
                break;
            }
        }
        result
    }

    fn type_info(&self, object: &ExtractedObject, root_namespace: Option<&str>) -> TypeInfo {
        match root_namespace.and_then(family_from_namespace) {
            Some(ns) => TypeInfo {
                iobject_type: IobjectTypeKey {
                    name: object.elt_name().to_string(),
                    namespace_uri: ns.family_ns,
                    family: ns.family,
                },
                type_revision: ns.revision.clone(),
                family_revision: ns.revision,
            },
            None => {
                tracing::warn!(
                    element = %object.elt_name(),
                    namespace = root_namespace.unwrap_or_default(),
                    "document namespace is not an IODEF namespace"
                );
                TypeInfo {
                    iobject_type: IobjectTypeKey {
                        name: object.elt_name().to_string(),
                        namespace_uri: object
                            .element
                            .namespace
                            .clone()
                            .unwrap_or_else(|| DEFAULT_NAMESPACE_URI.to_string()),
                        family: IODEF_FAMILY_NAME.to_string(),
                    },
                    type_revision: String::new(),
                    family_revision: String::new(),
                }
            }
        }
    }

    /// `dtype` is stored as the datatype of the value instead.
    fn ignore_attribute(&self, fact: &FlatFact) -> bool {
        fact.attribute
            .as_deref()
            .is_some_and(|attr| attr.contains('@') || attr.contains("dtype"))
    }

    fn fact_handlers(&self) -> Vec<(FactPredicate, FactHandler)> {
        vec![(is_portlist as FactPredicate, split_portlist as FactHandler)]
    }

    fn extract_datatype(
        &self,
        _fact: &FlatFact,
        attr_info: &[(String, String)],
        _namespaces: &NamespaceMap,
        args: &mut FactArgs,
    ) -> bool {
        let Some((_, dtype)) = attr_info.iter().find(|(name, _)| name == "dtype") else {
            return false;
        };
        args.datatype = DatatypeKey {
            name: dtype.clone(),
            namespace_uri: IODEF_DATATYPE_NAMESPACE_URI.to_string(),
            namespace_name: Some(IODEF_DATATYPE_NAMESPACE_NAME.to_string()),
            kind: FactDataKind::NoVocab,
        };
        true
    }
}
