//! Owned XML element tree built with quick-xml's namespace-resolving reader.
//!
//! The importer needs random access to a document (look ahead for ids,
//! cut embedded objects out of their parents), so the event stream is
//! folded into a small DOM. Namespace declarations are collected into a
//! document-wide [`NamespaceMap`] and never appear as attributes.

use std::fmt::Display;
use std::path::Path;

use mantis_core::errors::ParseError;
use mantis_core::types::IdentifierKey;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, PrefixDeclaration, ResolveResult};
use quick_xml::NsReader;
use rustc_hash::FxHashMap;

/// Deepest element nesting accepted by [`XmlDocument::parse`]. Later
/// stages walk the tree recursively.
pub const MAX_DEPTH: usize = 256;

/// Prefix -> namespace URI. The default namespace is stored under `None`.
pub type NamespaceMap = FxHashMap<Option<String>, String>;

/// One element with its attributes, trimmed text and child elements.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlElement {
    /// Local name, without prefix.
    pub name: String,
    /// Resolved namespace URI.
    pub namespace: Option<String>,
    /// Attributes in document order, keyed by qualified name.
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<XmlElement>,
    /// Set on nodes that stand in for an extracted embedded object.
    pub reference: Option<IdentifierKey>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(child);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First child element with the given local name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn is_reference(&self) -> bool {
        self.reference.is_some()
    }

    /// A childless stand-in for this element pointing at `id`.
    pub fn reference_to(&self, id: IdentifierKey) -> Self {
        Self {
            name: self.name.clone(),
            namespace: self.namespace.clone(),
            reference: Some(id),
            ..Default::default()
        }
    }

    fn append_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        match &mut self.text {
            Some(existing) => existing.push_str(text),
            None => self.text = Some(text.to_string()),
        }
    }
}

/// A parsed document: the root element and every namespace it declares.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    pub root: XmlElement,
    pub namespaces: NamespaceMap,
}

impl XmlDocument {
    /// Parse a document held in memory.
    pub fn parse(content: &str) -> Result<Self, ParseError> {
        let mut reader = NsReader::from_str(content);
        reader.config_mut().trim_text(true);

        let mut namespaces = NamespaceMap::default();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let (resolved, event) = match reader.read_resolved_event() {
                Ok(pair) => pair,
                Err(e) => return Err(malformed(reader.error_position() as u64, e)),
            };
            let namespace = resolve_namespace(resolved);
            let position = reader.buffer_position() as u64;

            match event {
                Event::Start(e) => {
                    let namespace = namespace.map_err(|prefix| ParseError::UnboundPrefix {
                        prefix,
                        position,
                    })?;
                    check_depth(stack.len() + 1, position)?;
                    stack.push(start_element(&e, namespace, &mut namespaces, position)?);
                }
                Event::Empty(e) => {
                    let namespace = namespace.map_err(|prefix| ParseError::UnboundPrefix {
                        prefix,
                        position,
                    })?;
                    check_depth(stack.len() + 1, position)?;
                    let element = start_element(&e, namespace, &mut namespaces, position)?;
                    close_element(element, &mut stack, &mut root, position)?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| malformed(position, "unexpected closing tag"))?;
                    close_element(element, &mut stack, &mut root, position)?;
                }
                Event::Text(t) => {
                    let text = t.unescape().map_err(|e| malformed(position, e))?;
                    if let Some(current) = stack.last_mut() {
                        current.append_text(text.trim());
                    }
                }
                Event::CData(c) => {
                    let bytes = c.into_inner();
                    if let Some(current) = stack.last_mut() {
                        current.append_text(String::from_utf8_lossy(&bytes).trim());
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(malformed(
                reader.buffer_position() as u64,
                format!("unexpected end of document inside <{}>", open.name),
            ));
        }
        let root = root.ok_or(ParseError::EmptyDocument)?;

        Ok(Self { root, namespaces })
    }

    pub fn from_file(path: &Path) -> Result<Self, ParseError> {
        let content = std::fs::read_to_string(path).map_err(|e| ParseError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Namespace URI of the root element.
    pub fn root_namespace(&self) -> Option<&str> {
        self.root.namespace.as_deref()
    }
}

fn check_depth(depth: usize, position: u64) -> Result<(), ParseError> {
    if depth > MAX_DEPTH {
        return Err(ParseError::TooDeep {
            limit: MAX_DEPTH,
            position,
        });
    }
    Ok(())
}

fn malformed(position: u64, message: impl Display) -> ParseError {
    ParseError::Malformed {
        position,
        message: message.to_string(),
    }
}

/// `Err(prefix)` for a prefix with no binding in scope.
fn resolve_namespace(resolved: ResolveResult<'_>) -> Result<Option<String>, String> {
    match resolved {
        ResolveResult::Bound(Namespace(ns)) => Ok(Some(String::from_utf8_lossy(ns).into_owned())),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(String::from_utf8_lossy(&prefix).into_owned()),
    }
}

fn start_element(
    e: &BytesStart<'_>,
    namespace: Option<String>,
    namespaces: &mut NamespaceMap,
    position: u64,
) -> Result<XmlElement, ParseError> {
    let mut element = XmlElement::new(String::from_utf8_lossy(e.local_name().as_ref()));
    element.namespace = namespace;

    for attr in e.attributes() {
        let attr = attr.map_err(|err| malformed(position, err))?;
        let value = attr
            .unescape_value()
            .map_err(|err| malformed(position, err))?
            .into_owned();
        match attr.key.as_namespace_binding() {
            Some(PrefixDeclaration::Default) => {
                namespaces.entry(None).or_insert(value);
            }
            Some(PrefixDeclaration::Named(prefix)) => {
                namespaces
                    .entry(Some(String::from_utf8_lossy(prefix).into_owned()))
                    .or_insert(value);
            }
            None => {
                let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                element.attributes.push((key, value));
            }
        }
    }
    Ok(element)
}

fn close_element(
    element: XmlElement,
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    position: u64,
) -> Result<(), ParseError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(element);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(malformed(position, "more than one root element")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_elements_with_namespace() {
        let doc = XmlDocument::parse(
            r#"<?xml version="1.0"?>
            <IODEF-Document version="1.00" xmlns="urn:ietf:params:xml:ns:iodef-1.0">
              <Incident purpose="mitigation">
                <IncidentID name="csirt.example.com">908711</IncidentID>
              </Incident>
            </IODEF-Document>"#,
        )
        .unwrap();

        assert_eq!(doc.root.name, "IODEF-Document");
        assert_eq!(doc.root_namespace(), Some("urn:ietf:params:xml:ns:iodef-1.0"));
        assert_eq!(doc.root.attributes, vec![("version".to_string(), "1.00".to_string())]);
        assert_eq!(
            doc.namespaces.get(&None).map(String::as_str),
            Some("urn:ietf:params:xml:ns:iodef-1.0")
        );

        let incident = doc.root.child("Incident").unwrap();
        assert_eq!(incident.attribute("purpose"), Some("mitigation"));
        assert_eq!(incident.namespace.as_deref(), Some("urn:ietf:params:xml:ns:iodef-1.0"));
        let id = incident.child("IncidentID").unwrap();
        assert_eq!(id.text(), Some("908711"));
        assert_eq!(id.attribute("name"), Some("csirt.example.com"));
    }

    #[test]
    fn prefixed_elements_resolve_and_keep_local_name() {
        let doc = XmlDocument::parse(
            r#"<iodef:Incident xmlns:iodef="urn:ietf:params:xml:ns:iodef-1.0" xml:lang="en"/>"#,
        )
        .unwrap();
        assert_eq!(doc.root.name, "Incident");
        assert_eq!(doc.root.namespace.as_deref(), Some("urn:ietf:params:xml:ns:iodef-1.0"));
        assert_eq!(doc.root.attribute("xml:lang"), Some("en"));
        assert!(doc.namespaces.contains_key(&Some("iodef".to_string())));
    }

    #[test]
    fn whitespace_only_text_is_dropped_and_entities_unescaped() {
        let doc = XmlDocument::parse(
            "<a>\n   <b>  x &amp; y  </b>\n  <c/>  <d><![CDATA[<raw>]]></d></a>",
        )
        .unwrap();
        assert_eq!(doc.root.text(), None);
        assert_eq!(doc.root.children[0].text(), Some("x & y"));
        assert_eq!(doc.root.children[1].text(), None);
        assert_eq!(doc.root.children[2].text(), Some("<raw>"));
    }

    #[test]
    fn no_namespace_elements_are_unbound() {
        let doc = XmlDocument::parse("<root><child/></root>").unwrap();
        assert_eq!(doc.root.namespace, None);
        assert!(doc.namespaces.is_empty());
    }

    #[test]
    fn mismatched_end_tag_is_malformed() {
        let err = XmlDocument::parse("<a><b></a>").unwrap_err();
        assert!(matches!(err, ParseError::Malformed { .. }), "{err:?}");
    }

    #[test]
    fn unclosed_element_is_malformed() {
        let err = XmlDocument::parse("<a><b>text</b>").unwrap_err();
        assert!(matches!(err, ParseError::Malformed { .. }), "{err:?}");
    }

    #[test]
    fn unbound_prefix_is_reported() {
        let err = XmlDocument::parse("<x:root/>").unwrap_err();
        assert!(
            matches!(err, ParseError::UnboundPrefix { ref prefix, .. } if prefix == "x"),
            "{err:?}"
        );
    }

    fn nested(depth: usize, leaf: &str) -> String {
        format!("{}{leaf}{}", "<a>".repeat(depth - 1), "</a>".repeat(depth - 1))
    }

    #[test]
    fn nesting_up_to_the_limit_parses() {
        let doc = XmlDocument::parse(&nested(MAX_DEPTH, "<b/>")).unwrap();
        let mut depth = 1;
        let mut current = &doc.root;
        while let Some(child) = current.children.first() {
            current = child;
            depth += 1;
        }
        assert_eq!(depth, MAX_DEPTH);
        assert_eq!(current.name, "b");
    }

    #[test]
    fn nesting_past_the_limit_is_rejected() {
        let err = XmlDocument::parse(&nested(MAX_DEPTH + 1, "<b/>")).unwrap_err();
        assert!(
            matches!(err, ParseError::TooDeep { limit: MAX_DEPTH, .. }),
            "{err:?}"
        );

        let err = XmlDocument::parse(&nested(MAX_DEPTH + 1, "<b>x</b>")).unwrap_err();
        assert!(matches!(err, ParseError::TooDeep { .. }), "{err:?}");

        let deep = nested(100_000, "");
        assert!(matches!(
            XmlDocument::parse(&deep),
            Err(ParseError::TooDeep { .. })
        ));
    }

    #[test]
    fn empty_input_has_no_root() {
        assert!(matches!(XmlDocument::parse(""), Err(ParseError::EmptyDocument)));
        assert!(matches!(
            XmlDocument::parse("<?xml version=\"1.0\"?>\n<!-- nothing -->"),
            Err(ParseError::EmptyDocument)
        ));
    }

    #[test]
    fn second_root_is_malformed() {
        let err = XmlDocument::parse("<a/><b/>").unwrap_err();
        assert!(matches!(err, ParseError::Malformed { .. }));
    }

    #[test]
    fn from_file_reads_and_reports_io_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.xml");
        std::fs::write(&path, "<root><child>x</child></root>").unwrap();
        let doc = XmlDocument::from_file(&path).unwrap();
        assert_eq!(doc.root.child("child").unwrap().text(), Some("x"));

        let err = XmlDocument::from_file(&dir.path().join("missing.xml")).unwrap_err();
        assert!(matches!(err, ParseError::Io { .. }));
    }

    #[test]
    fn reference_node_copies_name_only() {
        let elt = XmlElement::new("Incident")
            .with_attribute("purpose", "reporting")
            .with_child(XmlElement::new("IncidentID").with_text("1"));
        let reference = elt.reference_to(IdentifierKey::new("ns", "1"));
        assert_eq!(reference.name, "Incident");
        assert!(reference.attributes.is_empty());
        assert!(reference.children.is_empty());
        assert!(reference.is_reference());
    }
}
