//! Flattening an element tree into facts.
//!
//! Node ids encode the position of a fact inside its object. Children are
//! grouped by element name in order of first appearance; group `n` is
//! `Nnnn`, and members of a group with more than one element get an extra
//! `Lmmm` segment. Attribute facts append `Aaaa`, counting only attributes
//! the hooks keep. Segments are joined with `:`; the object root itself
//! has the empty node id and the empty term.

use mantis_core::types::IdentifierKey;

use crate::hooks::ImportHooks;
use crate::xml::XmlElement;

/// One fact as read off the tree, before hooks rewrite it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatFact {
    pub node_id: String,
    /// `/`-joined element names below the object root.
    pub term: String,
    pub attribute: Option<String>,
    /// Empty for reference facts.
    pub value: String,
    pub reference: Option<IdentifierKey>,
    attr_index: usize,
}

impl FlatFact {
    /// Last segment of the term, i.e. the element name.
    pub fn tag(&self) -> &str {
        self.term.rsplit('/').next().unwrap_or("")
    }

    pub fn is_attribute(&self) -> bool {
        self.attribute.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Flattened {
    pub facts: Vec<FlatFact>,
    attr_info: Vec<Vec<(String, String)>>,
}

impl Flattened {
    /// All attributes of the element `fact` was read from, ignored ones included.
    pub fn attr_info_of(&self, fact: &FlatFact) -> &[(String, String)] {
        self.attr_info
            .get(fact.attr_index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

pub fn flatten<H: ImportHooks + ?Sized>(root: &XmlElement, hooks: &H) -> Flattened {
    let mut out = Flattened::default();
    let mut node = Vec::new();
    walk(root, &mut node, "", hooks, &mut out);
    out
}

fn walk<H: ImportHooks + ?Sized>(
    elt: &XmlElement,
    node: &mut Vec<String>,
    term: &str,
    hooks: &H,
    out: &mut Flattened,
) {
    let node_id = node.join(":");
    let attr_index = out.attr_info.len();
    out.attr_info.push(elt.attributes.clone());

    if let Some(reference) = &elt.reference {
        out.facts.push(FlatFact {
            node_id,
            term: term.to_string(),
            attribute: None,
            value: String::new(),
            reference: Some(reference.clone()),
            attr_index,
        });
        return;
    }

    let mut kept_attributes = 0usize;
    for (name, value) in &elt.attributes {
        let segment = format!("A{kept_attributes:03}");
        let fact = FlatFact {
            node_id: if node_id.is_empty() {
                segment
            } else {
                format!("{node_id}:{segment}")
            },
            term: term.to_string(),
            attribute: Some(name.clone()),
            value: value.clone(),
            reference: None,
            attr_index,
        };
        if hooks.ignore_attribute(&fact) {
            continue;
        }
        out.facts.push(fact);
        kept_attributes += 1;
    }

    let value = match &elt.text {
        Some(text) => Some(text.clone()),
        None if elt.children.is_empty() && kept_attributes == 0 => Some(String::new()),
        None => None,
    };
    if let Some(value) = value {
        out.facts.push(FlatFact {
            node_id,
            term: term.to_string(),
            attribute: None,
            value,
            reference: None,
            attr_index,
        });
    }

    let mut groups: Vec<(&str, Vec<&XmlElement>)> = Vec::new();
    for child in &elt.children {
        match groups.iter_mut().find(|(name, _)| *name == child.name) {
            Some((_, members)) => members.push(child),
            None => groups.push((child.name.as_str(), vec![child])),
        }
    }

    for (n, (name, members)) in groups.iter().enumerate() {
        let child_term = if term.is_empty() {
            name.to_string()
        } else {
            format!("{term}/{name}")
        };
        let repeated = members.len() > 1;
        for (m, child) in members.iter().enumerate() {
            node.push(format!("N{n:03}"));
            if repeated {
                node.push(format!("L{m:03}"));
            }
            walk(child, node, &child_term, hooks, out);
            node.pop();
            if repeated {
                node.pop();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::DefaultHooks;
    use proptest::prelude::*;
    use rustc_hash::FxHashSet;

    struct NoDtype;

    impl ImportHooks for NoDtype {
        fn ignore_attribute(&self, fact: &FlatFact) -> bool {
            fact.attribute.as_deref() == Some("dtype")
        }
    }

    fn summary(flat: &Flattened) -> Vec<(String, String, Option<String>, String)> {
        flat.facts
            .iter()
            .map(|f| (f.node_id.clone(), f.term.clone(), f.attribute.clone(), f.value.clone()))
            .collect()
    }

    fn row(node: &str, term: &str, attr: Option<&str>, value: &str) -> (String, String, Option<String>, String) {
        (node.to_string(), term.to_string(), attr.map(str::to_string), value.to_string())
    }

    #[test]
    fn root_attributes_children_and_repeated_groups() {
        let incident = XmlElement::new("Incident")
            .with_attribute("purpose", "reporting")
            .with_child(
                XmlElement::new("IncidentID")
                    .with_attribute("name", "csirt.example.com")
                    .with_text("189493"),
            )
            .with_child(XmlElement::new("Description").with_text("first"))
            .with_child(XmlElement::new("Assessment").with_child(
                XmlElement::new("Impact").with_attribute("type", "admin"),
            ))
            .with_child(XmlElement::new("Description").with_text("second"));

        let flat = flatten(&incident, &DefaultHooks);
        assert_eq!(
            summary(&flat),
            vec![
                row("A000", "", Some("purpose"), "reporting"),
                row("N000:A000", "IncidentID", Some("name"), "csirt.example.com"),
                row("N000", "IncidentID", None, "189493"),
                row("N001:L000", "Description", None, "first"),
                row("N001:L001", "Description", None, "second"),
                row("N002:N000:A000", "Assessment/Impact", Some("type"), "admin"),
            ]
        );
    }

    #[test]
    fn empty_leaf_yields_empty_value() {
        let elt = XmlElement::new("Root").with_child(XmlElement::new("Flag"));
        let flat = flatten(&elt, &DefaultHooks);
        assert_eq!(summary(&flat), vec![row("N000", "Flag", None, "")]);
    }

    #[test]
    fn ignored_attributes_do_not_consume_indices() {
        let elt = XmlElement::new("Root").with_child(
            XmlElement::new("RecordItem")
                .with_attribute("dtype", "url")
                .with_attribute("meaning", "log")
                .with_text("http://logs.example.com"),
        );
        let flat = flatten(&elt, &NoDtype);
        assert_eq!(
            summary(&flat),
            vec![
                row("N000:A000", "RecordItem", Some("meaning"), "log"),
                row("N000", "RecordItem", None, "http://logs.example.com"),
            ]
        );
        let value_fact = &flat.facts[1];
        assert_eq!(
            flat.attr_info_of(value_fact),
            &[
                ("dtype".to_string(), "url".to_string()),
                ("meaning".to_string(), "log".to_string())
            ]
        );
    }

    #[test]
    fn element_with_only_ignored_attributes_keeps_empty_value() {
        let elt = XmlElement::new("Root")
            .with_child(XmlElement::new("RecordItem").with_attribute("dtype", "string"));
        let flat = flatten(&elt, &NoDtype);
        assert_eq!(summary(&flat), vec![row("N000", "RecordItem", None, "")]);
    }

    #[test]
    fn reference_nodes_become_reference_facts() {
        let doc = XmlElement::new("IODEF-Document")
            .with_attribute("version", "1.00")
            .with_child(XmlElement::new("Incident").reference_to(IdentifierKey::new("csirt", "1")))
            .with_child(XmlElement::new("Incident").reference_to(IdentifierKey::new("csirt", "2")));
        let flat = flatten(&doc, &DefaultHooks);
        let refs: Vec<_> = flat
            .facts
            .iter()
            .filter_map(|f| f.reference.as_ref().map(|r| (f.node_id.as_str(), r.uid.as_str())))
            .collect();
        assert_eq!(refs, vec![("N000:L000", "1"), ("N000:L001", "2")]);
        assert_eq!(flat.facts[1].tag(), "Incident");
    }

    fn arb_element(depth: u32) -> BoxedStrategy<XmlElement> {
        let leaf = (
            prop::sample::select(vec!["A", "B", "C"]),
            prop::option::of("[a-z]{0,4}"),
            prop::collection::vec(prop::sample::select(vec!["x", "y", "dtype"]), 0..3),
        )
            .prop_map(|(name, text, attrs)| {
                let mut elt = XmlElement::new(name);
                elt.text = text;
                for attr in attrs {
                    if elt.attribute(attr).is_none() {
                        elt.attributes.push((attr.to_string(), "v".to_string()));
                    }
                }
                elt
            });
        leaf.prop_recursive(depth, 32, 4, |inner| {
            (
                prop::sample::select(vec!["A", "B", "C"]),
                prop::collection::vec(inner, 0..5),
            )
                .prop_map(|(name, children)| {
                    let mut elt = XmlElement::new(name);
                    elt.children = children;
                    elt
                })
        })
        .boxed()
    }

    proptest! {
        #[test]
        fn node_ids_are_unique_within_an_object(root in arb_element(4)) {
            let flat = flatten(&root, &NoDtype);
            let mut seen = FxHashSet::default();
            for fact in &flat.facts {
                prop_assert!(seen.insert(fact.node_id.clone()), "duplicate node id {}", fact.node_id);
            }
        }

        #[test]
        fn every_leaf_yields_a_fact(root in arb_element(4)) {
            fn leaves(elt: &XmlElement) -> usize {
                if elt.children.is_empty() { 1 } else { elt.children.iter().map(leaves).sum() }
            }
            let flat = flatten(&root, &DefaultHooks);
            prop_assert!(flat.facts.len() >= leaves(&root));
        }
    }
}
