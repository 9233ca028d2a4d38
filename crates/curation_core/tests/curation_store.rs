use curation_core::db::migrations::latest_version;
use curation_core::db::{open_db, open_db_in_memory, DbError};
use curation_core::{
    apply_verb, document_from_json, document_to_json, CurationDocument, CurationStore, Import,
    SqliteCurationStore, StoreError, StubStudy, Verb, WorkflowVariant,
};
use rusqlite::Connection;

fn sample_document() -> CurationDocument {
    let mut first = StubStudy::new("s1", "").with_title("Attention networks");
    first.authors = Some("Posner, M.".to_string());
    first.year = Some(1990);
    first.abstract_text = Some("Review of attention systems.".to_string());
    first.doi = Some("10.1146/annurev.ne.13.030190.000325".to_string());

    let document = CurationDocument::new(WorkflowVariant::Prisma)
        .ingest_import(
            Import::new("imp-1", "pubmed: attention"),
            vec![first, StubStudy::new("s2", ""), StubStudy::new("s3", "")],
        )
        .unwrap()
        .ingest_import(Import::new("imp-2", "manual upload"), vec![StubStudy::new("s4", "")])
        .unwrap();
    let document = apply_verb(&document, &["s1".to_string()], 0, &Verb::Promote).unwrap();
    let document = apply_verb(&document, &["s2".to_string()], 0, &Verb::Duplicate).unwrap();
    apply_verb(
        &document,
        &["s4".to_string()],
        0,
        &Verb::exclude_with_label("Conference abstract"),
    )
    .unwrap()
}

#[test]
fn save_and_load_round_trips_whole_document() {
    let mut conn = open_db_in_memory().unwrap();
    let mut store = SqliteCurationStore::try_new(&mut conn).unwrap();
    let document = sample_document();

    store.save("project-1", &document).unwrap();
    let loaded = store.load("project-1").unwrap().expect("project should exist");

    assert_eq!(loaded, document);
    assert_eq!(loaded.stub("s1").unwrap().year, Some(1990));
    assert_eq!(loaded.tags().len(), document.tags().len());
}

#[test]
fn load_unknown_project_returns_none() {
    let mut conn = open_db_in_memory().unwrap();
    let store = SqliteCurationStore::try_new(&mut conn).unwrap();
    assert!(store.load("missing").unwrap().is_none());
}

#[test]
fn save_replaces_previous_snapshot() {
    let mut conn = open_db_in_memory().unwrap();
    let mut store = SqliteCurationStore::try_new(&mut conn).unwrap();
    let document = sample_document();
    store.save("project-1", &document).unwrap();

    let moved = apply_verb(&document, &["s1".to_string()], 1, &Verb::Demote).unwrap();
    store.save("project-1", &moved).unwrap();

    let loaded = store.load("project-1").unwrap().unwrap();
    assert_eq!(loaded, moved);
    assert_eq!(loaded.column(1).unwrap().len(), 0);
}

#[test]
fn projects_are_isolated_and_listed_in_id_order() {
    let mut conn = open_db_in_memory().unwrap();
    let mut store = SqliteCurationStore::try_new(&mut conn).unwrap();
    store.save("b-project", &sample_document()).unwrap();
    store
        .save("a-project", &CurationDocument::new(WorkflowVariant::Simple))
        .unwrap();

    let projects = store.list_projects().unwrap();
    let listed: Vec<(&str, WorkflowVariant)> = projects
        .iter()
        .map(|project| (project.project_id.as_str(), project.variant))
        .collect();
    assert_eq!(
        listed,
        vec![
            ("a-project", WorkflowVariant::Simple),
            ("b-project", WorkflowVariant::Prisma)
        ]
    );
    assert_eq!(store.load("a-project").unwrap().unwrap().study_count(), 0);
    assert_eq!(store.load("b-project").unwrap().unwrap().study_count(), 4);
}

#[test]
fn file_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("curation.db");
    let document = sample_document();

    {
        let mut conn = open_db(&path).unwrap();
        let mut store = SqliteCurationStore::try_new(&mut conn).unwrap();
        store.save("project-1", &document).unwrap();
    }

    let mut conn = open_db(&path).unwrap();
    let store = SqliteCurationStore::try_new(&mut conn).unwrap();
    assert_eq!(store.load("project-1").unwrap(), Some(document));
}

#[test]
fn corrupt_rows_are_rejected_on_load() {
    let mut conn = open_db_in_memory().unwrap();
    {
        let mut store = SqliteCurationStore::try_new(&mut conn).unwrap();
        store.save("project-1", &sample_document()).unwrap();
    }
    conn.execute(
        "UPDATE stub_studies SET column_index = 9 WHERE study_id = 's3';",
        [],
    )
    .unwrap();

    let store = SqliteCurationStore::try_new(&mut conn).unwrap();
    let err = store.load("project-1").unwrap_err();
    assert!(matches!(err, StoreError::InvalidData(_)), "unexpected: {err}");
}

#[test]
fn unmigrated_connection_is_rejected() {
    let mut conn = Connection::open_in_memory().unwrap();
    let err = SqliteCurationStore::try_new(&mut conn)
        .err()
        .expect("plain connection should be rejected");
    assert!(matches!(
        err,
        StoreError::Db(DbError::SchemaNotReady { found: 0, required }) if required == latest_version()
    ));
}

#[test]
fn json_payload_round_trips_and_validates() {
    let document = sample_document();
    let payload = document_to_json(&document).unwrap();
    assert!(payload.contains("\"variant\": \"prisma\""));
    assert_eq!(document_from_json(&payload).unwrap(), document);

    let dangling = payload.replace("\"exclusion_tag\": \"duplicate\"", "\"exclusion_tag\": \"ghost\"");
    let err = document_from_json(&dangling).unwrap_err();
    assert!(matches!(err, StoreError::Serialization(_)));
    assert!(err.to_string().contains("tag not found"));
}
