//! SQLite bootstrap for curation projects.
//!
//! # Responsibility
//! - Open connections with the pragmas the curation store relies on.
//! - Own both schema-version guards: databases written by a newer build, and
//!   connections that never ran migrations.
//!
//! # Invariants
//! - Schema version lives in `PRAGMA user_version`.
//! - Project tables are only touched once `ensure_schema_ready` passes.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use migrations::ensure_schema_ready;
pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Storage-level failures below the curation store.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// File was migrated by a newer build; opening it would risk data loss.
    UnsupportedSchemaVersion { db_version: u32, latest_supported: u32 },
    /// Connection lacks the project tables (not opened through `open_db*`).
    SchemaNotReady { found: u32, required: u32 },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite error: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "curation database version {db_version} was written by a newer build (latest supported {latest_supported})"
            ),
            Self::SchemaNotReady { found, required } => write!(
                f,
                "curation schema version {found} is older than required {required}; open the database with open_db"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } | Self::SchemaNotReady { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
