//! CLI probe for the curation core.
//!
//! # Responsibility
//! - Verify `curation_core` linkage without a UI host.
//! - Load JSON curation documents into a SQLite store and print derived counts.
//!
//! Usage:
//! - `curation_cli` prints ping/version.
//! - `curation_cli import <db> <project_id> <document.json>`
//! - `curation_cli summary <db> <project_id>`
//! - `curation_cli projects <db>`

use curation_core::db::open_db;
use curation_core::{
    compute_counts, document_from_json, duplicate_summary, CurationStore, SqliteCurationStore,
};
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        [] => {
            println!("curation_core ping={}", curation_core::ping());
            println!("curation_core version={}", curation_core::core_version());
            Ok(())
        }
        ["import", db_path, project_id, json_path] => import(db_path, project_id, json_path),
        ["summary", db_path, project_id] => summary(db_path, project_id),
        ["projects", db_path] => projects(db_path),
        _ => {
            eprintln!("usage: curation_cli [import <db> <project> <json> | summary <db> <project> | projects <db>]");
            return ExitCode::from(2);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn import(db_path: &str, project_id: &str, json_path: &str) -> Result<(), Box<dyn Error>> {
    let payload = std::fs::read_to_string(json_path)?;
    let document = document_from_json(&payload)?;
    let mut conn = open_db(db_path)?;
    let mut store = SqliteCurationStore::try_new(&mut conn)?;
    store.save(project_id, &document)?;
    println!(
        "imported project={project_id} variant={} studies={}",
        document.variant(),
        document.study_count()
    );
    Ok(())
}

fn summary(db_path: &str, project_id: &str) -> Result<(), Box<dyn Error>> {
    let mut conn = open_db(db_path)?;
    let store = SqliteCurationStore::try_new(&mut conn)?;
    let Some(document) = store.load(project_id)? else {
        return Err(format!("project not found: {project_id}").into());
    };

    println!("{}", duplicate_summary(&document));
    let counts = compute_counts(&document);
    for phase in &counts.phases {
        println!(
            "{:<16} total={:<5} uncategorized={:<5} excluded={:<5} included={}",
            phase.phase.label(),
            phase.total,
            phase.uncategorized,
            phase.excluded,
            phase.included
        );
    }
    for group in &counts.exclusions {
        println!("excluded as {}: {}", group.label, group.study_ids.len());
    }
    Ok(())
}

fn projects(db_path: &str) -> Result<(), Box<dyn Error>> {
    let mut conn = open_db(db_path)?;
    let store = SqliteCurationStore::try_new(&mut conn)?;
    for project in store.list_projects()? {
        println!(
            "{} variant={} updated_at={}",
            project.project_id, project.variant, project.updated_at
        );
    }
    Ok(())
}
