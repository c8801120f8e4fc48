//! Query tests over an in-memory database: get-or-create dimensions,
//! object revisions, shared facts, markings, naming schemas, counts.

use mantis_core::types::{DatatypeKey, FactDataKind, IdentifierKey, IobjectId, IobjectTypeKey};
use mantis_storage::counts::{delta, object_counts};
use mantis_storage::migrations::run_migrations;
use mantis_storage::queries::facts::*;
use mantis_storage::queries::identifiers::*;
use mantis_storage::queries::iobjects::*;
use mantis_storage::queries::markings::*;
use mantis_storage::queries::naming::*;
use mantis_storage::queries::types::*;
use rusqlite::Connection;

fn setup_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
    run_migrations(&conn).unwrap();
    conn
}

fn incident_type() -> IobjectTypeKey {
    IobjectTypeKey {
        name: "Incident".to_string(),
        namespace_uri: "urn:ietf:params:xml:ns:iodef".to_string(),
        family: "iodef".to_string(),
    }
}

fn insert_object(conn: &Connection, uid: &str, timestamp: i64) -> IobjectId {
    let identifier = get_or_create_identifier(conn, &IdentifierKey::new("csirt.example.com", uid)).unwrap();
    let iobject_type = get_or_create_iobject_type(conn, &incident_type()).unwrap();
    let family = get_or_create_family(conn, "iodef").unwrap();
    let revision = get_or_create_revision(conn, "1.0").unwrap();
    let id = insert_iobject(
        conn,
        &NewInfoObjectRow {
            identifier,
            iobject_type,
            type_revision: revision,
            family,
            family_revision: revision,
            timestamp,
            create_timestamp: timestamp + 1,
            name: uid.to_string(),
            content_hash: 42,
        },
    )
    .unwrap();
    set_latest(conn, identifier, id).unwrap();
    id
}

#[test]
fn get_or_create_is_idempotent() {
    let conn = setup_db();
    let key = IdentifierKey::new("csirt.example.com", "189493");
    let a = get_or_create_identifier(&conn, &key).unwrap();
    let b = get_or_create_identifier(&conn, &key).unwrap();
    assert_eq!(a, b);
    assert_eq!(identifier_key(&conn, a).unwrap(), key);

    let t1 = get_or_create_iobject_type(&conn, &incident_type()).unwrap();
    let t2 = get_or_create_iobject_type(&conn, &incident_type()).unwrap();
    assert_eq!(t1, t2);
    assert_eq!(find_iobject_type(&conn, &incident_type()).unwrap(), Some(t1));

    let r1 = get_or_create_revision(&conn, "").unwrap();
    let r2 = get_or_create_revision(&conn, "").unwrap();
    assert_eq!(r1, r2);
}

#[test]
fn unknown_identifier_is_not_found() {
    let conn = setup_db();
    let err = identifier_key(&conn, mantis_core::types::IdentifierId::new(99)).unwrap_err();
    assert!(matches!(
        err,
        mantis_core::errors::StorageError::NotFound { entity: "identifier", .. }
    ));
}

#[test]
fn same_identifier_different_timestamps_are_revisions() {
    let conn = setup_db();
    let first = insert_object(&conn, "189493", 1_000);
    let second = insert_object(&conn, "189493", 2_000);
    assert_ne!(first, second);

    let identifier = find_identifier(&conn, &IdentifierKey::new("csirt.example.com", "189493"))
        .unwrap()
        .unwrap();
    assert_eq!(find_revision(&conn, identifier, 1_000).unwrap(), Some((first, 42)));
    assert_eq!(find_revision(&conn, identifier, 3_000).unwrap(), None);
    assert_eq!(latest_iobject(&conn, identifier).unwrap(), Some(second));

    let revisions = revisions_of(&conn, &IdentifierKey::new("csirt.example.com", "189493")).unwrap();
    assert_eq!(revisions.len(), 2);
    assert_eq!(revisions[0].timestamp, 1_000);
    assert!(!revisions[0].is_latest);
    assert!(revisions[1].is_latest);
    assert_eq!(revisions[1].family, "iodef");
    assert_eq!(revisions[1].type_revision, "1.0");
}

#[test]
fn duplicate_identifier_timestamp_is_rejected() {
    let conn = setup_db();
    insert_object(&conn, "189493", 1_000);
    let identifier = find_identifier(&conn, &IdentifierKey::new("csirt.example.com", "189493"))
        .unwrap()
        .unwrap();
    let iobject_type = get_or_create_iobject_type(&conn, &incident_type()).unwrap();
    let family = get_or_create_family(&conn, "iodef").unwrap();
    let revision = get_or_create_revision(&conn, "1.0").unwrap();
    let result = insert_iobject(
        &conn,
        &NewInfoObjectRow {
            identifier,
            iobject_type,
            type_revision: revision,
            family,
            family_revision: revision,
            timestamp: 1_000,
            create_timestamp: 5,
            name: String::new(),
            content_hash: 0,
        },
    );
    assert!(result.is_err());
}

#[test]
fn identical_facts_are_shared() {
    let conn = setup_db();
    let a = insert_object(&conn, "a", 1);
    let b = insert_object(&conn, "b", 1);

    let datatype = get_or_create_datatype(&conn, &DatatypeKey::string()).unwrap();
    assert_eq!(datatype_kind(&conn, datatype).unwrap(), FactDataKind::NoVocab);
    let term = get_or_create_fact_term(&conn, "Description", None).unwrap();
    let value = get_or_create_value(&conn, "Large bot-net", datatype).unwrap();
    let node = get_or_create_node_id(&conn, "N001").unwrap();

    let fact_a = get_or_create_fact(&conn, term, &[value], None).unwrap();
    let fact_b = get_or_create_fact(&conn, term, &[value], None).unwrap();
    assert_eq!(fact_a, fact_b);

    attach_fact(&conn, a, fact_a, node).unwrap();
    attach_fact(&conn, b, fact_b, node).unwrap();

    let facts = object_facts(&conn, b).unwrap();
    assert_eq!(facts.len(), 1);
    assert_eq!(facts[0].term, "Description");
    assert_eq!(facts[0].values, vec!["Large bot-net".to_string()]);
    assert_eq!(facts[0].datatype.as_deref(), Some("String"));
    assert_eq!(facts[0].attribute, None);

    assert_eq!(detach_all_facts(&conn, a).unwrap(), 1);
    assert!(object_facts(&conn, a).unwrap().is_empty());
    assert_eq!(object_facts(&conn, b).unwrap().len(), 1);
}

#[test]
fn multi_value_facts_keep_value_order() {
    let conn = setup_db();
    let obj = insert_object(&conn, "ports", 1);
    let datatype = get_or_create_datatype(&conn, &DatatypeKey::string()).unwrap();
    let term = get_or_create_fact_term(&conn, "Flow/System/Service/Portlist", None).unwrap();
    let values: Vec<_> = ["80", "22", "443"]
        .iter()
        .map(|v| get_or_create_value(&conn, v, datatype).unwrap())
        .collect();
    let fact = get_or_create_fact(&conn, term, &values, None).unwrap();
    let node = get_or_create_node_id(&conn, "N004:N000:N001:N000").unwrap();
    attach_fact(&conn, obj, fact, node).unwrap();

    let reversed: Vec<_> = values.iter().rev().copied().collect();
    let other = get_or_create_fact(&conn, term, &reversed, None).unwrap();
    assert_ne!(fact, other);

    let facts = object_facts(&conn, obj).unwrap();
    assert_eq!(facts[0].values, vec!["80", "22", "443"]);
}

#[test]
fn reference_facts_resolve_identifier() {
    let conn = setup_db();
    let obj = insert_object(&conn, "doc", 1);
    let target = get_or_create_identifier(&conn, &IdentifierKey::new("csirt.example.com", "189493")).unwrap();
    let term = get_or_create_fact_term(&conn, "Incident", None).unwrap();
    let fact = get_or_create_fact(&conn, term, &[], Some(target)).unwrap();
    let node = get_or_create_node_id(&conn, "N000").unwrap();
    attach_fact(&conn, obj, fact, node).unwrap();

    let facts = object_facts(&conn, obj).unwrap();
    assert!(facts[0].values.is_empty());
    assert_eq!(
        facts[0].reference,
        Some(IdentifierKey::new("csirt.example.com", "189493"))
    );
}

#[test]
fn attribute_terms_are_distinct_from_value_terms() {
    let conn = setup_db();
    let value_term = get_or_create_fact_term(&conn, "", None).unwrap();
    let attr_term = get_or_create_fact_term(&conn, "", Some("purpose")).unwrap();
    assert_ne!(value_term, attr_term);
    assert_eq!(get_or_create_fact_term(&conn, "", Some("purpose")).unwrap(), attr_term);
}

#[test]
fn markings_are_attached_once() {
    let conn = setup_db();
    let obj = insert_object(&conn, "marked", 1);
    let marking = insert_object(&conn, "marking", 1);
    add_marking(&conn, obj, marking).unwrap();
    add_marking(&conn, obj, marking).unwrap();
    assert_eq!(markings_of(&conn, obj).unwrap(), vec![marking]);
    assert_eq!(marked_by(&conn, marking).unwrap(), vec![obj]);
}

#[test]
fn naming_schemas_replace_in_order() {
    let conn = setup_db();
    let iobject_type = get_or_create_iobject_type(&conn, &incident_type()).unwrap();
    replace_schemas(&conn, iobject_type, &["[Description] ([@purpose])", "[Description]"]).unwrap();
    assert_eq!(
        schemas_for(&conn, iobject_type).unwrap(),
        vec!["[Description] ([@purpose])", "[Description]"]
    );

    replace_schemas(&conn, iobject_type, &["[IncidentID]"]).unwrap();
    assert_eq!(schemas_for(&conn, iobject_type).unwrap(), vec!["[IncidentID]"]);
}

#[test]
fn object_listing_and_renaming() {
    let conn = setup_db();
    let a = insert_object(&conn, "a", 10);
    let b = insert_object(&conn, "b", 20);
    set_name(&conn, a, "renamed").unwrap();

    let recent = list_recent(&conn, 1).unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].id, b);

    let row = get_iobject(&conn, a).unwrap().unwrap();
    assert_eq!(row.name, "renamed");
    assert!(exists(&conn, a).unwrap());
    assert!(!exists(&conn, IobjectId::new(999)).unwrap());

    let iobject_type = iobject_type_of(&conn, a).unwrap();
    assert_eq!(ids_of_type(&conn, iobject_type).unwrap(), vec![a, b]);

    update_content(&conn, a, 7, 99).unwrap();
    let row = get_iobject(&conn, a).unwrap().unwrap();
    assert_eq!((row.content_hash, row.create_timestamp), (7, 99));
}

#[test]
fn counts_track_inserted_rows() {
    let conn = setup_db();
    let before = object_counts(&conn).unwrap();
    assert!(before.iter().all(|(_, n)| *n == 0));

    insert_object(&conn, "189493", 1);
    let after = object_counts(&conn).unwrap();
    assert_eq!(
        delta(&before, &after),
        vec![
            ("Identifier", 1),
            ("IdentifierNameSpace", 1),
            ("InfoObject", 1),
            ("InfoObjectFamily", 1),
            ("InfoObjectType", 1),
            ("Revision", 1),
        ]
    );
}
