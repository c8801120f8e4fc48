//! Embedded-object extraction.
//!
//! A document may carry several objects: the root, plus any descendant the
//! hooks decide to extract. Each extracted element is cut out of its parent
//! and replaced by a reference node pointing at the extracted object's
//! identifier. Extraction recurses into extracted subtrees as well.

use chrono::{DateTime, Utc};
use mantis_core::types::IdentifierKey;

use crate::hooks::ImportHooks;
use crate::xml::{NamespaceMap, XmlDocument, XmlElement};

/// Identity of an object as far as the document reveals it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdAndRevision {
    pub id: Option<IdentifierKey>,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct ExtractedObject {
    pub element: XmlElement,
    pub id_and_rev: IdAndRevision,
    /// What `embedding_type` said about this object; `None` for the root.
    pub embedded_type: Option<String>,
}

impl ExtractedObject {
    pub fn elt_name(&self) -> &str {
        &self.element.name
    }
}

#[derive(Debug, Clone)]
pub struct ExtractionResult {
    pub top: ExtractedObject,
    /// Extracted objects in document order; an object precedes the
    /// objects extracted from inside it.
    pub embedded: Vec<ExtractedObject>,
    pub namespaces: NamespaceMap,
}

impl ExtractionResult {
    /// The top object followed by every embedded one.
    pub fn into_objects(self) -> impl Iterator<Item = ExtractedObject> {
        std::iter::once(self.top).chain(self.embedded)
    }
}

/// Split a parsed document into its objects.
pub fn extract_embedded<H: ImportHooks + ?Sized>(doc: XmlDocument, hooks: &H) -> ExtractionResult {
    let mut root = doc.root;
    let id_and_rev = hooks.id_and_revision(&root);
    let mut embedded = Vec::new();
    extract_into(&mut root, hooks, &mut embedded);

    ExtractionResult {
        top: ExtractedObject {
            element: root,
            id_and_rev,
            embedded_type: None,
        },
        embedded,
        namespaces: doc.namespaces,
    }
}

fn extract_into<H: ImportHooks + ?Sized>(
    parent: &mut XmlElement,
    hooks: &H,
    out: &mut Vec<ExtractedObject>,
) {
    let children = std::mem::take(&mut parent.children);
    let mut kept = Vec::with_capacity(children.len());

    for mut child in children {
        let Some(embedded_type) = hooks.embedding_type(parent, &child) else {
            extract_into(&mut child, hooks, out);
            kept.push(child);
            continue;
        };

        let id_and_rev = hooks.id_and_revision(&child);
        match &id_and_rev.id {
            Some(id) => kept.push(child.reference_to(id.clone())),
            None => tracing::debug!(
                element = %child.name,
                "embedded object without id, dropping reference"
            ),
        }

        let mut nested = Vec::new();
        extract_into(&mut child, hooks, &mut nested);
        out.push(ExtractedObject {
            element: child,
            id_and_rev,
            embedded_type: Some(embedded_type),
        });
        out.extend(nested);
    }

    parent.children = kept;
}
