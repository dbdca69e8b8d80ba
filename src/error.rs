use rusqlite::ffi;
use thiserror::Error;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Failure taxonomy surfaced to callers. The store performs no silent
/// recovery; every failure is classified and returned.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Caller supplied a structurally invalid argument (absent or
    /// non-positive id, empty name, out-of-range weight, missing selector).
    #[error("{0}")]
    Validation(String),

    /// A uniqueness constraint (name or title) was violated.
    #[error("{entity} \"{name}\" already exists")]
    Duplicate { entity: &'static str, name: String },

    /// A lookup found nothing, or a stored reference failed to resolve
    /// during hydration.
    #[error("{entity} {key} not found")]
    NotFound { entity: &'static str, key: String },

    /// Any other underlying storage failure. Fatal to the current operation
    /// only.
    #[error(transparent)]
    Storage(#[from] StorageFailure),
}

#[derive(Debug, Error)]
pub enum StorageFailure {
    #[error("sqlite failure: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io failure: {0}")]
    Io(#[from] std::io::Error),

    /// An encoded list column that does not parse back. Should never happen
    /// for rows written by this store.
    #[error("corrupt {column} payload: {source}")]
    Encoding {
        column: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// An already-applied migration whose embedded SQL no longer matches
    /// the recorded checksum.
    #[error("migration {file} edited after application")]
    MigrationDrift { file: &'static str },
}

impl StoreError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        StoreError::Validation(message.into())
    }

    pub(crate) fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity,
            key: key.into(),
        }
    }

    pub(crate) fn corrupt(column: &'static str, source: serde_json::Error) -> Self {
        StoreError::Storage(StorageFailure::Encoding { column, source })
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Storage(StorageFailure::Sqlite(err))
    }
}

/// Map a sqlite write failure onto the taxonomy for the statement that
/// touched `entity` with unique value `name`. Uniqueness violations become
/// Duplicate, schema-level CHECK/NOT NULL trips become Validation, anything
/// else stays a storage failure.
pub(crate) fn classify_write(err: rusqlite::Error, entity: &'static str, name: &str) -> StoreError {
    if let rusqlite::Error::SqliteFailure(code, _) = &err {
        match code.extended_code {
            ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                return StoreError::Duplicate {
                    entity,
                    name: name.to_string(),
                }
            }
            ffi::SQLITE_CONSTRAINT_CHECK | ffi::SQLITE_CONSTRAINT_NOTNULL => {
                return StoreError::Validation(format!(
                    "{entity} \"{name}\" violates a schema constraint"
                ))
            }
            _ => {}
        }
    }
    err.into()
}
