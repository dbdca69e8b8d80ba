use std::collections::HashMap;

use rusqlite::Connection;
use sha2::{Digest, Sha256};
use tracing::{error, info};

use crate::error::{StorageFailure, StoreError, StoreResult};
use crate::time::now_ms;

fn preview(sql: &str) -> String {
    let one_line = sql.replace(['\n', '\t'], " ");
    let trimmed = one_line.trim();
    if trimmed.len() > 160 {
        format!("{}…", &trimmed[..160])
    } else {
        trimmed.to_string()
    }
}

static MIGRATIONS: &[(&str, &str)] = &[(
    "202605141100_catalog.sql",
    include_str!("../migrations/202605141100_catalog.sql"),
)];

fn cleaned_sql(raw: &str) -> String {
    raw.lines()
        .filter(|line| {
            let t = line.trim_start();
            !(t.is_empty() || t.starts_with("--"))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Apply every embedded migration that has not run yet. Safe to call on
/// every open: applied files are skipped by version, and an applied file
/// whose SQL was edited afterwards is refused outright.
pub(crate) fn apply_migrations(conn: &mut Connection) -> StoreResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (\
           version    TEXT PRIMARY KEY,\
           applied_at INTEGER NOT NULL,\
           checksum   TEXT NOT NULL\
         )",
        [],
    )?;

    let mut applied: HashMap<String, String> = HashMap::new();
    {
        let mut stmt = conn.prepare("SELECT version, checksum FROM schema_migrations")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (version, checksum) = row?;
            applied.insert(version, checksum);
        }
    }

    for &(filename, raw_sql) in MIGRATIONS {
        let cleaned = cleaned_sql(raw_sql);
        let checksum = format!("{:x}", Sha256::digest(cleaned.as_bytes()));

        if let Some(stored) = applied.get(filename) {
            if stored != &checksum {
                return Err(StoreError::Storage(StorageFailure::MigrationDrift {
                    file: filename,
                }));
            }
            info!(target: "ludoteca", event = "migration_skip_file", file = %filename);
            continue;
        }

        let tx = conn.transaction()?;
        for stmt in cleaned.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            info!(target: "ludoteca", event = "migration_stmt", file = %filename, sql = %preview(s));
            if let Err(e) = tx.execute(s, []) {
                error!(target: "ludoteca", event = "migration_stmt_error", file = %filename, sql = %preview(s), error = %e);
                return Err(e.into());
            }
        }

        tx.execute(
            "INSERT INTO schema_migrations (version, applied_at, checksum) VALUES (?, ?, ?)",
            rusqlite::params![filename, now_ms(), &checksum],
        )?;

        tx.commit()?;
        info!(target: "ludoteca", event = "migration_file_applied", file = %filename);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_twice_without_error() {
        let mut conn = Connection::open_in_memory().expect("open in-memory");
        apply_migrations(&mut conn).expect("first run");
        apply_migrations(&mut conn).expect("second run is a no-op");

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' \
                 AND name IN ('games', 'cognitive_categories', 'cognitive_functions')",
                [],
                |row| row.get(0),
            )
            .expect("count tables");
        assert_eq!(tables, 3);
    }

    #[test]
    fn edited_migration_is_refused() {
        let mut conn = Connection::open_in_memory().expect("open in-memory");
        apply_migrations(&mut conn).expect("first run");
        conn.execute(
            "UPDATE schema_migrations SET checksum = 'tampered'",
            [],
        )
        .expect("tamper with checksum");
        let err = apply_migrations(&mut conn).unwrap_err();
        assert!(err.to_string().contains("edited after application"));
    }
}
