//! Namespaces and well-known names of the fact data model.

/// Namespace assumed for XML elements that carry no namespace.
pub const DEFAULT_NAMESPACE_URI: &str = "http://dingo.sourceforge.net/namespaces/dingos";

/// Identifier namespace used when neither the document nor the caller names one.
pub const DEFAULT_ID_NAMESPACE_URI: &str = "http://dingo.sourceforge.net/namespaces/dingos/id";

/// Namespace of the built-in fact datatypes.
pub const DEFAULT_DATATYPE_NAMESPACE_URI: &str = "http://dingo.sourceforge.net/namespaces/dingos";
pub const DEFAULT_DATATYPE_NAMESPACE_NAME: &str = "dingos";

/// Datatype of plain text values.
pub const DEFAULT_DATATYPE_NAME: &str = "String";

/// Datatype of facts that point at another object.
pub const REFERENCE_DATATYPE_NAME: &str = "Reference";

/// Family name for objects whose namespace yields no family.
pub const GENERIC_FAMILY_NAME: &str = "generic";

/// Marking objects created from JSON marking definitions.
pub const MARKING_FAMILY_NAME: &str = "mantis";
pub const MARKING_TYPE_NAMESPACE_URI: &str = "urn:mantis:markings";
pub const DEFAULT_MARKING_TYPE_NAME: &str = "Marking";
