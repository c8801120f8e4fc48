//! Customization points of the generic XML import.
//!
//! Every method has a default, so a format importer only overrides what it
//! needs. The defaults import a document as a single generic object with
//! every attribute kept and every value typed as a plain string.

use mantis_core::constants::{DEFAULT_NAMESPACE_URI, GENERIC_FAMILY_NAME};
use mantis_core::types::{DatatypeKey, FactRecord, IobjectTypeKey};

use crate::embed::{ExtractedObject, IdAndRevision};
use crate::flatten::FlatFact;
use crate::xml::{NamespaceMap, XmlElement};

/// Decides whether a fact handler applies. Receives the flattened fact and
/// the attributes of the element it came from.
pub type FactPredicate = fn(&FlatFact, &[(String, String)]) -> bool;

/// Rewrites the arguments a fact will be created with. Returning `false`
/// vetoes the fact.
pub type FactHandler = fn(&FlatFact, &[(String, String)], &mut FactArgs) -> bool;

/// The arguments a fact will be persisted with, after hooks ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactArgs {
    pub node_id: String,
    pub term: String,
    pub attribute: Option<String>,
    pub values: Vec<String>,
    pub datatype: DatatypeKey,
}

impl FactArgs {
    /// Single string value, default datatype.
    pub fn from_fact(fact: &FlatFact) -> Self {
        Self {
            node_id: fact.node_id.clone(),
            term: fact.term.clone(),
            attribute: fact.attribute.clone(),
            values: vec![fact.value.clone()],
            datatype: DatatypeKey::string(),
        }
    }

    pub fn into_record(self) -> FactRecord {
        FactRecord {
            node_id: self.node_id,
            term: self.term,
            attribute: self.attribute,
            values: self.values,
            datatype: self.datatype,
            reference: None,
        }
    }
}

/// Type and family an object is stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInfo {
    pub iobject_type: IobjectTypeKey,
    pub type_revision: String,
    pub family_revision: String,
}

pub trait ImportHooks {
    /// `Some(type)` when `child` is to be extracted into an object of its own.
    /// The parent's children are not visible during the call.
    fn embedding_type(&self, _parent: &XmlElement, _child: &XmlElement) -> Option<String> {
        None
    }

    /// Identifier and timestamp of the object rooted at `element`.
    fn id_and_revision(&self, _element: &XmlElement) -> IdAndRevision {
        IdAndRevision::default()
    }

    /// Rewrite an object before it is flattened.
    fn transform(&self, object: ExtractedObject) -> ExtractedObject {
        object
    }

    /// Where an object is filed. `root_namespace` is the namespace of the
    /// document's root element.
    fn type_info(&self, object: &ExtractedObject, _root_namespace: Option<&str>) -> TypeInfo {
        TypeInfo {
            iobject_type: IobjectTypeKey {
                name: object.elt_name().to_string(),
                namespace_uri: object
                    .element
                    .namespace
                    .clone()
                    .unwrap_or_else(|| DEFAULT_NAMESPACE_URI.to_string()),
                family: GENERIC_FAMILY_NAME.to_string(),
            },
            type_revision: String::new(),
            family_revision: String::new(),
        }
    }

    /// `true` drops an attribute fact. Ignored attributes do not take up an
    /// attribute index, but stay visible to handlers through the element's
    /// attribute list.
    fn ignore_attribute(&self, _fact: &FlatFact) -> bool {
        false
    }

    /// Applied in order to every non-reference fact whose predicate holds.
    fn fact_handlers(&self) -> Vec<(FactPredicate, FactHandler)> {
        Vec::new()
    }

    /// Called for value facts. May set `args.datatype`; returns whether
    /// datatype information was found.
    fn extract_datatype(
        &self,
        _fact: &FlatFact,
        _attr_info: &[(String, String)],
        _namespaces: &NamespaceMap,
        _args: &mut FactArgs,
    ) -> bool {
        false
    }
}

/// Hooks with every default.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHooks;

impl ImportHooks for DefaultHooks {}
