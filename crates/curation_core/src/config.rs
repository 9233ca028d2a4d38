//! Service configuration.
//!
//! Core takes configuration as explicit values; logging and storage locations
//! are passed to `init_logging` and `db::open_db` directly.

/// When committed mutations are written to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveMode {
    /// Save after every committed mutation.
    #[default]
    Immediate,
    /// Mark dirty; callers flush on their own schedule (debounce timer, exit).
    Deferred,
}

/// Options for `CurationService`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceOptions {
    pub save_mode: SaveMode,
    /// Publish a success notification after each save.
    pub notify_on_save_success: bool,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            save_mode: SaveMode::Immediate,
            notify_on_save_success: true,
        }
    }
}

impl ServiceOptions {
    pub fn deferred() -> Self {
        Self {
            save_mode: SaveMode::Deferred,
            ..Self::default()
        }
    }
}
