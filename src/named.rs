//! The two uniquely-named lookup tables (cognitive categories and
//! cognitive functions) are the same shape, so one generic core serves
//! both; the public surface stays typed per entity.

use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use crate::db::Store;
use crate::error::{classify_write, StoreError, StoreResult};
use crate::games;
use crate::model::{CognitiveCategory, CognitiveFunction};
use crate::time::now_ms;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NamedEntityKind {
    Category,
    Function,
}

impl NamedEntityKind {
    pub(crate) fn table(self) -> &'static str {
        match self {
            NamedEntityKind::Category => "cognitive_categories",
            NamedEntityKind::Function => "cognitive_functions",
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            NamedEntityKind::Category => "cognitive category",
            NamedEntityKind::Function => "cognitive function",
        }
    }

    /// The `games` column that holds encoded references of this kind. The
    /// column shares its table's name.
    pub(crate) fn game_column(self) -> &'static str {
        self.table()
    }
}

fn ensure_name(kind: NamedEntityKind, name: &str) -> StoreResult<()> {
    if name.trim().is_empty() {
        return Err(StoreError::validation(format!(
            "{} name must not be empty",
            kind.label()
        )));
    }
    Ok(())
}

fn require_positive_id(kind: NamedEntityKind, id: Option<i64>) -> StoreResult<i64> {
    match id {
        Some(v) if v >= 1 => Ok(v),
        _ => Err(StoreError::validation(format!(
            "{} id must be a positive number",
            kind.label()
        ))),
    }
}

fn insert(conn: &Connection, kind: NamedEntityKind, name: &str) -> StoreResult<i64> {
    ensure_name(kind, name)?;
    conn.execute(
        &format!(
            "INSERT INTO {} (name, created_at) VALUES (?, ?)",
            kind.table()
        ),
        params![name, now_ms()],
    )
    .map_err(|e| classify_write(e, kind.label(), name))?;
    let id = conn.last_insert_rowid();
    info!(target: "ludoteca", event = "named_entity_add", kind = kind.label(), id = id, name = %name);
    Ok(id)
}

fn rename(conn: &Connection, kind: NamedEntityKind, id: i64, name: &str) -> StoreResult<()> {
    ensure_name(kind, name)?;
    let affected = conn
        .execute(
            &format!("UPDATE {} SET name = ? WHERE id = ?", kind.table()),
            params![name, id],
        )
        .map_err(|e| classify_write(e, kind.label(), name))?;
    if affected == 0 {
        return Err(StoreError::not_found(kind.label(), format!("id {id}")));
    }
    info!(target: "ludoteca", event = "named_entity_update", kind = kind.label(), id = id, name = %name);
    Ok(())
}

/// Exact lookup used both by the public by-id surface and by game
/// hydration, where a miss means a broken reference.
pub(crate) fn fetch_by_id(
    conn: &Connection,
    kind: NamedEntityKind,
    id: i64,
) -> StoreResult<(i64, String)> {
    conn.query_row(
        &format!("SELECT id, name FROM {} WHERE id = ?", kind.table()),
        [id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .optional()?
    .ok_or_else(|| StoreError::not_found(kind.label(), format!("id {id}")))
}

fn fetch_by_name(conn: &Connection, kind: NamedEntityKind, name: &str) -> StoreResult<(i64, String)> {
    conn.query_row(
        &format!("SELECT id, name FROM {} WHERE name = ?", kind.table()),
        [name],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .optional()?
    .ok_or_else(|| StoreError::not_found(kind.label(), format!("name \"{name}\"")))
}

fn search(conn: &Connection, kind: NamedEntityKind, query: &str) -> StoreResult<Vec<(i64, String)>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, name FROM {} WHERE name LIKE '%' || ? || '%' ORDER BY id",
        kind.table()
    ))?;
    let rows = stmt.query_map([query], |row| Ok((row.get(0)?, row.get(1)?)))?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(StoreError::from)
}

fn all(conn: &Connection, kind: NamedEntityKind) -> StoreResult<Vec<(i64, String)>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, name FROM {} ORDER BY id",
        kind.table()
    ))?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(StoreError::from)
}

impl Store {
    fn delete_named(&mut self, kind: NamedEntityKind, id: i64) -> StoreResult<()> {
        if id < 1 {
            return Err(StoreError::validation(format!(
                "{} id must be a positive number",
                kind.label()
            )));
        }
        // Row delete and reference purge are one unit of work: if either
        // fails the other must not survive, or games would carry dangling
        // references.
        self.with_tx(|tx| {
            let affected = tx.execute(
                &format!("DELETE FROM {} WHERE id = ?", kind.table()),
                [id],
            )?;
            if affected == 0 {
                return Err(StoreError::not_found(kind.label(), format!("id {id}")));
            }
            let rewritten = games::purge_references(tx, kind, id)?;
            info!(
                target: "ludoteca",
                event = "named_entity_delete",
                kind = kind.label(),
                id = id,
                games_rewritten = rewritten
            );
            Ok(())
        })
    }

    /// Insert a category; the entity's own `id` is ignored and assigned by
    /// the store. Fails with `Duplicate` when the name is taken.
    pub fn add_category(&mut self, category: &CognitiveCategory) -> StoreResult<CognitiveCategory> {
        let id = insert(&self.conn, NamedEntityKind::Category, &category.name)?;
        Ok(CognitiveCategory {
            id: Some(id),
            name: category.name.clone(),
        })
    }

    pub fn update_category(&mut self, category: &CognitiveCategory) -> StoreResult<()> {
        let id = require_positive_id(NamedEntityKind::Category, category.id)?;
        rename(&self.conn, NamedEntityKind::Category, id, &category.name)
    }

    /// Delete a category and purge it from every game's stored category
    /// list, atomically.
    pub fn delete_category(&mut self, id: i64) -> StoreResult<()> {
        self.delete_named(NamedEntityKind::Category, id)
    }

    pub fn category_by_id(&self, id: i64) -> StoreResult<CognitiveCategory> {
        let (id, name) = fetch_by_id(&self.conn, NamedEntityKind::Category, id)?;
        Ok(CognitiveCategory { id: Some(id), name })
    }

    /// Exact, case-sensitive name lookup.
    pub fn category_by_name(&self, name: &str) -> StoreResult<CognitiveCategory> {
        let (id, name) = fetch_by_name(&self.conn, NamedEntityKind::Category, name)?;
        Ok(CognitiveCategory { id: Some(id), name })
    }

    /// Substring match for autocomplete; zero or more results, never an
    /// error on no match.
    pub fn search_categories(&self, query: &str) -> StoreResult<Vec<CognitiveCategory>> {
        Ok(search(&self.conn, NamedEntityKind::Category, query)?
            .into_iter()
            .map(|(id, name)| CognitiveCategory { id: Some(id), name })
            .collect())
    }

    /// Every category, stable insertion order.
    pub fn categories(&self) -> StoreResult<Vec<CognitiveCategory>> {
        Ok(all(&self.conn, NamedEntityKind::Category)?
            .into_iter()
            .map(|(id, name)| CognitiveCategory { id: Some(id), name })
            .collect())
    }

    /// Insert a function; the entity's own `id` is ignored and assigned by
    /// the store. Fails with `Duplicate` when the name is taken.
    pub fn add_function(&mut self, function: &CognitiveFunction) -> StoreResult<CognitiveFunction> {
        let id = insert(&self.conn, NamedEntityKind::Function, &function.name)?;
        Ok(CognitiveFunction {
            id: Some(id),
            name: function.name.clone(),
        })
    }

    pub fn update_function(&mut self, function: &CognitiveFunction) -> StoreResult<()> {
        let id = require_positive_id(NamedEntityKind::Function, function.id)?;
        rename(&self.conn, NamedEntityKind::Function, id, &function.name)
    }

    /// Delete a function and purge it from every game's stored function
    /// list, atomically.
    pub fn delete_function(&mut self, id: i64) -> StoreResult<()> {
        self.delete_named(NamedEntityKind::Function, id)
    }

    pub fn function_by_id(&self, id: i64) -> StoreResult<CognitiveFunction> {
        let (id, name) = fetch_by_id(&self.conn, NamedEntityKind::Function, id)?;
        Ok(CognitiveFunction { id: Some(id), name })
    }

    /// Exact, case-sensitive name lookup.
    pub fn function_by_name(&self, name: &str) -> StoreResult<CognitiveFunction> {
        let (id, name) = fetch_by_name(&self.conn, NamedEntityKind::Function, name)?;
        Ok(CognitiveFunction { id: Some(id), name })
    }

    /// Substring match for autocomplete; zero or more results, never an
    /// error on no match.
    pub fn search_functions(&self, query: &str) -> StoreResult<Vec<CognitiveFunction>> {
        Ok(search(&self.conn, NamedEntityKind::Function, query)?
            .into_iter()
            .map(|(id, name)| CognitiveFunction { id: Some(id), name })
            .collect())
    }

    /// Every function, stable insertion order.
    pub fn functions(&self) -> StoreResult<Vec<CognitiveFunction>> {
        Ok(all(&self.conn, NamedEntityKind::Function)?
            .into_iter()
            .map(|(id, name)| CognitiveFunction { id: Some(id), name })
            .collect())
    }
}
