//! Import batch record.

use serde::{Deserialize, Serialize};

/// Stable identifier of one import batch.
pub type ImportId = String;

/// One batch of citations brought into the project (search query, file upload).
///
/// Read-only after creation; stubs reference it through `import_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Import {
    pub id: ImportId,
    /// Search query or source description shown to users.
    pub label: String,
}

impl Import {
    pub fn new(id: impl Into<ImportId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}
