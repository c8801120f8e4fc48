//! Persisting one object revision, deduplicated against stored revisions.
//!
//! A revision is keyed by `(identifier, timestamp)`. Re-importing the same
//! revision with the same facts is a no-op; with different facts the stored
//! facts are replaced. A new timestamp creates a new revision.

use chrono::{DateTime, Utc};
use mantis_core::errors::{ImportError, StorageError};
use mantis_core::types::time::to_micros;
use mantis_core::types::{DatatypeKey, FactRecord, IdentifierKey, IobjectId, IobjectTypeId};
use mantis_storage::queries::{facts, identifiers, iobjects, markings, types};
use mantis_storage::{with_immediate_transaction, DatabaseManager};
use rusqlite::Connection;
use xxhash_rust::xxh3::Xxh3;

use crate::flatten::flatten;
use crate::hooks::{FactArgs, ImportHooks, TypeInfo};
use crate::naming;
use crate::xml::{NamespaceMap, XmlElement};

/// Everything needed to store one object revision.
#[derive(Debug, Clone)]
pub struct NewIobject<'a> {
    pub element: &'a XmlElement,
    pub identifier: IdentifierKey,
    pub type_info: &'a TypeInfo,
    pub timestamp: DateTime<Utc>,
    pub create_timestamp: DateTime<Utc>,
    pub markings: &'a [IobjectId],
    pub namespaces: &'a NamespaceMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    Created(IobjectId),
    /// Same revision, same facts.
    Unchanged(IobjectId),
    /// Same revision, facts rewritten.
    Replaced(IobjectId),
}

impl PersistOutcome {
    pub fn iobject_id(&self) -> IobjectId {
        match *self {
            Self::Created(id) | Self::Unchanged(id) | Self::Replaced(id) => id,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created(_) => "created",
            Self::Unchanged(_) => "unchanged",
            Self::Replaced(_) => "replaced",
        }
    }
}

/// Flatten `element` and run the fact hooks over the result.
pub fn build_facts<H: ImportHooks + ?Sized>(
    element: &XmlElement,
    hooks: &H,
    namespaces: &NamespaceMap,
) -> Vec<FactRecord> {
    let flat = flatten(element, hooks);
    let handlers = hooks.fact_handlers();
    let mut records = Vec::with_capacity(flat.facts.len());

    'facts: for fact in &flat.facts {
        if let Some(reference) = &fact.reference {
            records.push(FactRecord {
                node_id: fact.node_id.clone(),
                term: fact.term.clone(),
                attribute: None,
                values: Vec::new(),
                datatype: DatatypeKey::reference(),
                reference: Some(reference.clone()),
            });
            continue;
        }

        let attr_info = flat.attr_info_of(fact);
        let mut args = FactArgs::from_fact(fact);
        for (predicate, handler) in &handlers {
            if predicate(fact, attr_info) && !handler(fact, attr_info, &mut args) {
                tracing::trace!(node_id = %fact.node_id, term = %fact.term, "fact vetoed");
                continue 'facts;
            }
        }
        if !fact.is_attribute() {
            hooks.extract_datatype(fact, attr_info, namespaces, &mut args);
        }
        records.push(args.into_record());
    }
    records
}

/// xxh3 over the canonical form of a fact list.
pub fn content_hash(facts: &[FactRecord]) -> i64 {
    const UNIT: &[u8] = &[0x1f];
    const RECORD: &[u8] = &[0x1e];

    let mut hasher = Xxh3::new();
    for fact in facts {
        for part in [
            fact.node_id.as_str(),
            fact.term.as_str(),
            fact.attribute.as_deref().unwrap_or(""),
        ] {
            hasher.update(part.as_bytes());
            hasher.update(UNIT);
        }
        for value in &fact.values {
            hasher.update(value.as_bytes());
            hasher.update(UNIT);
        }
        hasher.update(fact.datatype.name.as_bytes());
        hasher.update(UNIT);
        hasher.update(fact.datatype.namespace_uri.as_bytes());
        hasher.update(UNIT);
        hasher.update(&fact.datatype.kind.as_i64().to_le_bytes());
        if let Some(reference) = &fact.reference {
            hasher.update(reference.namespace_uri.as_bytes());
            hasher.update(UNIT);
            hasher.update(reference.uid.as_bytes());
        }
        hasher.update(RECORD);
    }
    hasher.digest() as i64
}

/// Store facts and attach them to `iobject`.
pub fn store_facts(
    conn: &Connection,
    iobject: IobjectId,
    iobject_type: IobjectTypeId,
    records: &[FactRecord],
) -> Result<(), StorageError> {
    for record in records {
        let term = facts::get_or_create_fact_term(conn, &record.term, record.attribute.as_deref())?;
        facts::link_term_to_type(conn, term, iobject_type)?;

        let values = if record.values.is_empty() {
            Vec::new()
        } else {
            let datatype = facts::get_or_create_datatype(conn, &record.datatype)?;
            record
                .values
                .iter()
                .map(|value| facts::get_or_create_value(conn, value, datatype))
                .collect::<Result<Vec<_>, _>>()?
        };
        let reference = record
            .reference
            .as_ref()
            .map(|key| identifiers::get_or_create_identifier(conn, key))
            .transpose()?;

        let fact = facts::get_or_create_fact(conn, term, &values, reference)?;
        let node = facts::get_or_create_node_id(conn, &record.node_id)?;
        facts::attach_fact(conn, iobject, fact, node)?;
    }
    Ok(())
}

/// Store one object revision. Runs in a single immediate transaction.
pub fn create_iobject<H: ImportHooks + ?Sized>(
    db: &DatabaseManager,
    new: &NewIobject<'_>,
    hooks: &H,
) -> Result<PersistOutcome, ImportError> {
    let records = build_facts(new.element, hooks, new.namespaces);
    let hash = content_hash(&records);
    let timestamp = to_micros(new.timestamp);
    let create_timestamp = to_micros(new.create_timestamp);

    let outcome = db.with_writer(|conn| {
        with_immediate_transaction(conn, |tx| {
            for marking in new.markings {
                if !iobjects::exists(tx, *marking)? {
                    return Err(ImportError::UnknownMarking { id: marking.get() });
                }
            }

            let identifier = identifiers::get_or_create_identifier(tx, &new.identifier)?;
            let family = types::get_or_create_family(tx, &new.type_info.iobject_type.family)?;
            let family_revision = types::get_or_create_revision(tx, &new.type_info.family_revision)?;
            let type_revision = types::get_or_create_revision(tx, &new.type_info.type_revision)?;
            let iobject_type = types::get_or_create_iobject_type(tx, &new.type_info.iobject_type)?;

            let outcome = match iobjects::find_revision(tx, identifier, timestamp)? {
                Some((id, stored_hash)) if stored_hash == hash => PersistOutcome::Unchanged(id),
                Some((id, _)) => {
                    facts::detach_all_facts(tx, id)?;
                    store_facts(tx, id, iobject_type, &records)?;
                    iobjects::update_content(tx, id, hash, create_timestamp)?;
                    PersistOutcome::Replaced(id)
                }
                None => {
                    let id = iobjects::insert_iobject(
                        tx,
                        &iobjects::NewInfoObjectRow {
                            identifier,
                            iobject_type,
                            type_revision,
                            family,
                            family_revision,
                            timestamp,
                            create_timestamp,
                            name: String::new(),
                            content_hash: hash,
                        },
                    )?;
                    store_facts(tx, id, iobject_type, &records)?;
                    PersistOutcome::Created(id)
                }
            };

            let id = outcome.iobject_id();
            for marking in new.markings {
                markings::add_marking(tx, id, *marking)?;
            }

            if !matches!(outcome, PersistOutcome::Unchanged(_)) {
                let is_newest = match identifiers::latest_iobject(tx, identifier)? {
                    Some(current) if current != id => iobjects::timestamp_of(tx, current)?
                        .map_or(true, |current_ts| current_ts <= timestamp),
                    _ => true,
                };
                if is_newest {
                    identifiers::set_latest(tx, identifier, id)?;
                }

                let name = naming::name_for(tx, iobject_type, &records, &new.identifier.uid)?;
                iobjects::set_name(tx, id, &name)?;
            }

            Ok(outcome)
        })
    })?;

    match outcome {
        PersistOutcome::Unchanged(id) => tracing::debug!(
            identifier = %new.identifier,
            iobject = %id,
            "revision unchanged"
        ),
        _ => tracing::info!(
            identifier = %new.identifier,
            iobject = %outcome.iobject_id(),
            outcome = outcome.as_str(),
            facts = records.len(),
            "stored info object"
        ),
    }
    Ok(outcome)
}
