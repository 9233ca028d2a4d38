//! Curation document persistence contract and SQLite implementation.
//!
//! # Responsibility
//! - Define the `save(document)` / `load` port consumed by the service layer.
//! - Persist whole documents per project with last-write-wins semantics.
//! - Provide the JSON payload codec used by REST-facing adapters.
//!
//! # Invariants
//! - Writes validate the document before any SQL mutation.
//! - One save replaces the whole project inside a single transaction.
//! - Reads reject invalid persisted state instead of masking it.

use crate::db::{ensure_schema_ready, DbError};
use crate::model::column::{Column, WorkflowVariant};
use crate::model::document::{CurationDocument, CurationError};
use crate::model::import::Import;
use crate::model::stub_study::StubStudy;
use crate::model::tag::{Tag, TagDictionary};
use log::{error, info};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from document persistence.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    /// Persisted rows cannot be mapped back to a document.
    InvalidData(String),
    /// Document failed invariant validation (on write or read-back).
    Document(CurationError),
    /// JSON payload encode/decode failure.
    Serialization(serde_json::Error),
    /// Adapter-specific failure (network, backend rejection).
    Unavailable(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted curation data: {message}"),
            Self::Document(err) => write!(f, "{err}"),
            Self::Serialization(err) => write!(f, "curation payload serialization failed: {err}"),
            Self::Unavailable(message) => write!(f, "curation store unavailable: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Document(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::InvalidData(_) | Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<CurationError> for StoreError {
    fn from(value: CurationError) -> Self {
        Self::Document(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Stored project header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSummary {
    pub project_id: String,
    pub variant: WorkflowVariant,
    /// Last save time in epoch milliseconds.
    pub updated_at: i64,
}

/// Persistence port for whole curation documents.
pub trait CurationStore {
    /// Replaces the stored document for `project_id`.
    fn save(&mut self, project_id: &str, document: &CurationDocument) -> StoreResult<()>;
    /// Loads the stored document, `None` when the project was never saved.
    fn load(&self, project_id: &str) -> StoreResult<Option<CurationDocument>>;
    /// Lists stored projects sorted by id.
    fn list_projects(&self) -> StoreResult<Vec<ProjectSummary>>;
}

/// SQLite-backed curation store.
pub struct SqliteCurationStore<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteCurationStore<'conn> {
    /// Wraps a connection opened through `db::open_db*`.
    ///
    /// # Errors
    /// - `Db(SchemaNotReady)` when migrations were not applied.
    pub fn try_new(conn: &'conn mut Connection) -> StoreResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl CurationStore for SqliteCurationStore<'_> {
    fn save(&mut self, project_id: &str, document: &CurationDocument) -> StoreResult<()> {
        let started_at = Instant::now();
        document.validate()?;

        let result = self
            .conn
            .transaction()
            .map_err(StoreError::from)
            .and_then(|tx| {
                write_document(&tx, project_id, document)?;
                tx.commit()?;
                Ok(())
            });

        match &result {
            Ok(()) => info!(
                "event=project_save module=repo status=ok studies={} tags={} duration_ms={}",
                document.study_count(),
                document.tags().len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=project_save module=repo status=error duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            ),
        }
        result
    }

    fn load(&self, project_id: &str) -> StoreResult<Option<CurationDocument>> {
        let variant_text: Option<String> = self
            .conn
            .query_row(
                "SELECT variant FROM projects WHERE project_id = ?1;",
                [project_id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(variant_text) = variant_text else {
            return Ok(None);
        };
        let variant = parse_variant(&variant_text)?;

        let tags = load_tags(&*self.conn, project_id)?;
        let imports = load_imports(&*self.conn, project_id)?;
        let columns = load_columns(&*self.conn, project_id, variant)?;

        let document = CurationDocument::from_parts(variant, columns, tags, imports)?;
        Ok(Some(document))
    }

    fn list_projects(&self) -> StoreResult<Vec<ProjectSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT project_id, variant, updated_at
             FROM projects
             ORDER BY project_id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next()? {
            let variant_text: String = row.get("variant")?;
            projects.push(ProjectSummary {
                project_id: row.get("project_id")?,
                variant: parse_variant(&variant_text)?,
                updated_at: row.get("updated_at")?,
            });
        }
        Ok(projects)
    }
}

/// Encodes a document as the JSON body sent to the project-update endpoint.
pub fn document_to_json(document: &CurationDocument) -> StoreResult<String> {
    Ok(serde_json::to_string_pretty(document)?)
}

/// Decodes and validates a JSON document payload.
pub fn document_from_json(payload: &str) -> StoreResult<CurationDocument> {
    Ok(serde_json::from_str(payload)?)
}

fn write_document(
    tx: &Transaction<'_>,
    project_id: &str,
    document: &CurationDocument,
) -> StoreResult<()> {
    tx.execute(
        "INSERT INTO projects (project_id, variant) VALUES (?1, ?2)
         ON CONFLICT(project_id) DO UPDATE SET
            variant = excluded.variant,
            updated_at = (strftime('%s', 'now') * 1000);",
        params![project_id, document.variant().as_str()],
    )?;
    tx.execute(
        "DELETE FROM stub_studies WHERE project_id = ?1;",
        [project_id],
    )?;
    tx.execute("DELETE FROM tags WHERE project_id = ?1;", [project_id])?;
    tx.execute("DELETE FROM imports WHERE project_id = ?1;", [project_id])?;

    for (order, tag) in document.tags().iter().enumerate() {
        tx.execute(
            "INSERT INTO tags (
                project_id, tag_id, label, is_assignable, is_exclusion_tag, sort_order
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                project_id,
                tag.id,
                tag.label,
                tag.is_assignable,
                tag.is_exclusion_tag,
                to_db_index(order)?,
            ],
        )?;
    }

    for (order, import) in document.imports().iter().enumerate() {
        tx.execute(
            "INSERT INTO imports (project_id, import_id, label, sort_order)
             VALUES (?1, ?2, ?3, ?4);",
            params![project_id, import.id, import.label, to_db_index(order)?],
        )?;
    }

    let mut insert_stub = tx.prepare(
        "INSERT INTO stub_studies (
            project_id, study_id, column_index, position,
            title, authors, journal, year, abstract, doi, pmid, keywords,
            import_id, exclusion_tag
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14);",
    )?;
    for (column_index, column) in document.columns().iter().enumerate() {
        for (position, stub) in column.stub_studies.iter().enumerate() {
            insert_stub.execute(params![
                project_id,
                stub.id,
                to_db_index(column_index)?,
                to_db_index(position)?,
                stub.title,
                stub.authors,
                stub.journal,
                stub.year,
                stub.abstract_text,
                stub.doi,
                stub.pmid,
                stub.keywords,
                stub.import_id,
                stub.exclusion_tag,
            ])?;
        }
    }
    Ok(())
}

fn load_tags(conn: &Connection, project_id: &str) -> StoreResult<TagDictionary> {
    let mut stmt = conn.prepare(
        "SELECT tag_id, label, is_assignable, is_exclusion_tag
         FROM tags
         WHERE project_id = ?1
         ORDER BY sort_order ASC;",
    )?;
    let mut rows = stmt.query([project_id])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        tags.push(Tag {
            id: row.get("tag_id")?,
            label: row.get("label")?,
            is_assignable: row.get("is_assignable")?,
            is_exclusion_tag: row.get("is_exclusion_tag")?,
        });
    }
    Ok(TagDictionary::try_from(tags)?)
}

fn load_imports(conn: &Connection, project_id: &str) -> StoreResult<Vec<Import>> {
    let mut stmt = conn.prepare(
        "SELECT import_id, label
         FROM imports
         WHERE project_id = ?1
         ORDER BY sort_order ASC;",
    )?;
    let mut rows = stmt.query([project_id])?;
    let mut imports = Vec::new();
    while let Some(row) = rows.next()? {
        imports.push(Import {
            id: row.get("import_id")?,
            label: row.get("label")?,
        });
    }
    Ok(imports)
}

fn load_columns(
    conn: &Connection,
    project_id: &str,
    variant: WorkflowVariant,
) -> StoreResult<Vec<Column>> {
    let mut columns: Vec<Column> = variant.phases().iter().copied().map(Column::new).collect();
    let mut stmt = conn.prepare(
        "SELECT
            study_id, column_index,
            title, authors, journal, year, abstract, doi, pmid, keywords,
            import_id, exclusion_tag
         FROM stub_studies
         WHERE project_id = ?1
         ORDER BY column_index ASC, position ASC;",
    )?;
    let mut rows = stmt.query([project_id])?;
    while let Some(row) = rows.next()? {
        let column_index: i64 = row.get("column_index")?;
        let column = usize::try_from(column_index)
            .ok()
            .and_then(|index| columns.get_mut(index))
            .ok_or_else(|| {
                StoreError::InvalidData(format!(
                    "column_index {column_index} out of range for {variant} workflow"
                ))
            })?;
        column.stub_studies.push(parse_stub_row(row)?);
    }
    Ok(columns)
}

fn parse_stub_row(row: &Row<'_>) -> StoreResult<StubStudy> {
    Ok(StubStudy {
        id: row.get("study_id")?,
        title: row.get("title")?,
        authors: row.get("authors")?,
        journal: row.get("journal")?,
        year: row.get("year")?,
        abstract_text: row.get("abstract")?,
        doi: row.get("doi")?,
        pmid: row.get("pmid")?,
        keywords: row.get("keywords")?,
        import_id: row.get("import_id")?,
        exclusion_tag: row.get("exclusion_tag")?,
    })
}

fn parse_variant(value: &str) -> StoreResult<WorkflowVariant> {
    WorkflowVariant::parse(value).ok_or_else(|| {
        StoreError::InvalidData(format!("invalid workflow variant `{value}` in projects.variant"))
    })
}

fn to_db_index(value: usize) -> StoreResult<i64> {
    i64::try_from(value)
        .map_err(|_| StoreError::InvalidData(format!("index {value} exceeds storage range")))
}
