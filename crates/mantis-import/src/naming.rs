//! Object names from naming schemas.
//!
//! A schema is an ordered list of templates per object type. Placeholders:
//! `[term]` is the first value fact with that term, `[term@attr]` the first
//! attribute fact, `[@attr]` an attribute of the object root. Multiple
//! values are joined with `,`. The first template whose placeholders all
//! resolve to non-empty text names the object; otherwise the name is the
//! identifier uid.

use mantis_core::errors::StorageError;
use mantis_core::types::{FactRecord, IobjectTypeId, IobjectTypeKey};
use mantis_storage::queries::facts::{object_facts, StoredFact};
use mantis_storage::queries::{iobjects, naming, types};
use mantis_storage::{with_immediate_transaction, DatabaseManager};
use rusqlite::Connection;

struct NamedFact<'a> {
    term: &'a str,
    attribute: Option<&'a str>,
    values: &'a [String],
}

/// Read-only view of an object's facts for template lookup.
pub struct NamingView<'a> {
    facts: Vec<NamedFact<'a>>,
}

impl<'a> NamingView<'a> {
    pub fn from_records(records: &'a [FactRecord]) -> Self {
        Self {
            facts: records
                .iter()
                .map(|r| NamedFact {
                    term: &r.term,
                    attribute: r.attribute.as_deref(),
                    values: &r.values,
                })
                .collect(),
        }
    }

    pub fn from_stored(stored: &'a [StoredFact]) -> Self {
        Self {
            facts: stored
                .iter()
                .map(|f| NamedFact {
                    term: &f.term,
                    attribute: f.attribute.as_deref(),
                    values: &f.values,
                })
                .collect(),
        }
    }

    fn lookup(&self, term: &str, attribute: Option<&str>) -> Option<String> {
        self.facts
            .iter()
            .find(|f| f.term == term && f.attribute == attribute && !f.values.is_empty())
            .map(|f| f.values.join(","))
            .filter(|v| !v.is_empty())
    }
}

/// Fill a template, or `None` if a placeholder does not resolve.
pub fn render(template: &str, view: &NamingView<'_>) -> Option<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('[') {
        let Some(len) = rest[open + 1..].find(']') else {
            break;
        };
        let placeholder = &rest[open + 1..open + 1 + len];
        let (term, attribute) = match placeholder.split_once('@') {
            Some((term, attribute)) => (term, Some(attribute)),
            None => (placeholder, None),
        };

        out.push_str(&rest[..open]);
        out.push_str(&view.lookup(term, attribute)?);
        rest = &rest[open + len + 2..];
    }
    out.push_str(rest);
    Some(out)
}

pub fn choose_name(templates: &[String], view: &NamingView<'_>, fallback: &str) -> String {
    templates
        .iter()
        .find_map(|template| render(template, view))
        .unwrap_or_else(|| fallback.to_string())
}

/// Name for a new revision of a stored type.
pub fn name_for(
    conn: &Connection,
    iobject_type: IobjectTypeId,
    records: &[FactRecord],
    uid: &str,
) -> Result<String, StorageError> {
    let templates = naming::schemas_for(conn, iobject_type)?;
    Ok(choose_name(&templates, &NamingView::from_records(records), uid))
}

/// Store `templates` for a type, replacing earlier ones, and rename every
/// stored object of that type. Returns the number of renamed objects.
pub fn install_schemas(
    db: &DatabaseManager,
    key: &IobjectTypeKey,
    templates: &[&str],
) -> Result<usize, StorageError> {
    let renamed = db.with_writer(|conn| {
        with_immediate_transaction(conn, |tx| {
            let iobject_type = types::get_or_create_iobject_type(tx, key)?;
            naming::replace_schemas(tx, iobject_type, templates)?;

            let templates: Vec<String> = templates.iter().map(|t| t.to_string()).collect();
            let mut renamed = 0;
            for id in iobjects::ids_of_type(tx, iobject_type)? {
                let Some(row) = iobjects::get_iobject(tx, id)? else {
                    continue;
                };
                let stored = object_facts(tx, id)?;
                let name = choose_name(&templates, &NamingView::from_stored(&stored), &row.identifier.uid);
                if name != row.name {
                    iobjects::set_name(tx, id, &name)?;
                    renamed += 1;
                }
            }
            Ok::<_, StorageError>(renamed)
        })
    })?;

    tracing::info!(
        iobject_type = %key.name,
        family = %key.family,
        templates = templates.len(),
        renamed,
        "installed naming schema"
    );
    Ok(renamed)
}
