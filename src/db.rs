use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, Transaction};
use tracing::{error, info, warn};

use crate::error::{StorageFailure, StoreResult};
use crate::migrate;

const DEFAULT_DB_NAME: &str = "ludoteca.sqlite3";

/// Owns the single connection for the lifetime of the store. Every
/// repository operation is a blocking call against it; there is no pool and
/// no protection against concurrent writers, by contract.
pub struct Store {
    pub(crate) conn: Connection,
}

impl Store {
    /// Open (or create) a file-backed store and bring its schema up to date.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    error!(
                        target: "ludoteca",
                        event = "store_dir_create_failed",
                        error = %e,
                        path = %parent.display()
                    );
                    StorageFailure::Io(e)
                })?;
            }
        }
        info!(target: "ludoteca", event = "store_path", path = %path.display());
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open the store at its fixed default location under the platform data
    /// directory, falling back to the temp dir when none exists.
    pub fn open_default() -> StoreResult<Self> {
        let base = dirs::data_dir().unwrap_or_else(std::env::temp_dir);
        Self::open(base.join("ludoteca").join(DEFAULT_DB_NAME))
    }

    /// In-memory store, mainly for tests. Contents vanish on close.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(mut conn: Connection) -> StoreResult<Self> {
        apply_pragmas(&conn)?;
        migrate::apply_migrations(&mut conn)?;
        Ok(Store { conn })
    }

    /// Re-run schema initialization. Idempotent; safe on every startup.
    /// `open` already does this, so calling it again is always a no-op
    /// unless the binary gained new migrations since the store was opened.
    pub fn setup(&mut self) -> StoreResult<()> {
        migrate::apply_migrations(&mut self.conn)
    }

    /// Close the underlying connection, surfacing any pending failure.
    pub fn close(self) -> StoreResult<()> {
        self.conn.close().map_err(|(_, err)| err.into())
    }

    /// Run work inside a transaction. Commits on success, rolls back on
    /// error.
    pub(crate) fn with_tx<R>(
        &mut self,
        f: impl FnOnce(&Transaction<'_>) -> StoreResult<R>,
    ) -> StoreResult<R> {
        let tx = self.conn.transaction().map_err(StorageFailure::Sqlite)?;
        info!(target: "ludoteca", event = "tx_begin");
        match f(&tx) {
            Ok(val) => {
                tx.commit().map_err(StorageFailure::Sqlite)?;
                info!(target: "ludoteca", event = "tx_commit");
                Ok(val)
            }
            Err(e) => {
                if let Err(rb) = tx.rollback() {
                    error!(target: "ludoteca", event = "tx_rollback_failed", error = %rb);
                } else {
                    warn!(target: "ludoteca", event = "tx_rollback");
                }
                Err(e)
            }
        }
    }
}

fn apply_pragmas(conn: &Connection) -> StoreResult<()> {
    let journal_mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |r| r.get(0))?;
    conn.execute("PRAGMA synchronous = FULL", [])?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;
    conn.busy_timeout(Duration::from_millis(5000))?;

    let sqlite_version: String = conn.query_row("SELECT sqlite_version()", [], |r| r.get(0))?;
    let synchronous: i64 = conn.query_row("PRAGMA synchronous", [], |r| r.get(0))?;
    let foreign_keys: i64 = conn.query_row("PRAGMA foreign_keys", [], |r| r.get(0))?;

    info!(
        target: "ludoteca",
        event = "store_open",
        sqlite_version = %sqlite_version,
        journal_mode = %journal_mode,
        synchronous = %synchronous,
        foreign_keys = %foreign_keys
    );

    if !journal_mode.eq_ignore_ascii_case("wal") && !journal_mode.eq_ignore_ascii_case("memory") {
        warn!(
            target: "ludoteca",
            event = "store_open_warning",
            msg = "journal_mode != WAL; running with reduced crash safety"
        );
    }
    Ok(())
}
