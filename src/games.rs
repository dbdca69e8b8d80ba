use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;

use crate::codec;
use crate::db::Store;
use crate::error::{classify_write, StoreError, StoreResult};
use crate::model::{CognitiveCategory, CognitiveFunction, Game, WEIGHT_MAX, WEIGHT_MIN};
use crate::named::{self, NamedEntityKind};

pub(crate) const GAME_COLUMNS: &str =
    "id, title, description, cognitive_functions, cognitive_categories, materials, image";

/// A games row as stored, encoded columns still raw. Hydration happens
/// separately so the cheap listing path can skip it.
pub(crate) struct GameRow {
    id: i64,
    title: String,
    description: String,
    functions_raw: Option<String>,
    categories_raw: Option<String>,
    materials_raw: Option<String>,
    image: Option<String>,
}

pub(crate) fn read_row(row: &Row<'_>) -> rusqlite::Result<GameRow> {
    Ok(GameRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        functions_raw: row.get(3)?,
        categories_raw: row.get(4)?,
        materials_raw: row.get(5)?,
        image: row.get(6)?,
    })
}

/// Resolve a stored row into a full `Game`. Every reference must resolve;
/// a miss is a broken invariant and fails the whole operation.
pub(crate) fn hydrate(conn: &Connection, row: GameRow) -> StoreResult<Game> {
    let materials = codec::decode_materials(row.materials_raw.as_deref())?;

    let mut categories = Vec::new();
    for (id, weight) in codec::decode_pairs(row.categories_raw.as_deref(), "cognitive_categories")? {
        let (id, name) = named::fetch_by_id(conn, NamedEntityKind::Category, id)?;
        categories.push((CognitiveCategory { id: Some(id), name }, weight));
    }

    let mut functions = Vec::new();
    for (id, weight) in codec::decode_pairs(row.functions_raw.as_deref(), "cognitive_functions")? {
        let (id, name) = named::fetch_by_id(conn, NamedEntityKind::Function, id)?;
        functions.push((CognitiveFunction { id: Some(id), name }, weight));
    }

    Ok(Game {
        id: Some(row.id),
        title: row.title,
        description: row.description,
        image: row.image,
        materials,
        categories,
        functions,
    })
}

/// Drop every `(id, weight)` pair referencing `id` from the given kind's
/// column across all games. Returns how many rows were rewritten. Runs
/// inside the caller's transaction.
pub(crate) fn purge_references(
    conn: &Connection,
    kind: NamedEntityKind,
    id: i64,
) -> StoreResult<usize> {
    let column = kind.game_column();
    let rows = {
        let mut stmt = conn.prepare(&format!("SELECT id, {column} FROM games"))?;
        let mapped = stmt.query_map([], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, Option<String>>(1)?))
        })?;
        mapped.collect::<rusqlite::Result<Vec<_>>>()?
    };

    let mut rewritten = 0;
    for (game_id, raw) in rows {
        let pairs = codec::decode_pairs(raw.as_deref(), column)?;
        let kept: Vec<(i64, i64)> = pairs
            .iter()
            .copied()
            .filter(|(ref_id, _)| *ref_id != id)
            .collect();
        if kept.len() == pairs.len() {
            continue;
        }
        let encoded = codec::encode_pairs(&kept, column)?;
        conn.execute(
            &format!("UPDATE games SET {column} = ? WHERE id = ?"),
            params![encoded, game_id],
        )?;
        rewritten += 1;
    }
    Ok(rewritten)
}

/// Seam between a game's typed association lists and the generic checks
/// below; both named-entity types look the same from here.
trait NamedRef {
    fn ref_id(&self) -> Option<i64>;
    fn ref_name(&self) -> &str;
}

impl NamedRef for CognitiveCategory {
    fn ref_id(&self) -> Option<i64> {
        self.id
    }
    fn ref_name(&self) -> &str {
        &self.name
    }
}

impl NamedRef for CognitiveFunction {
    fn ref_id(&self) -> Option<i64> {
        self.id
    }
    fn ref_name(&self) -> &str {
        &self.name
    }
}

/// Validate one association list and reduce it to the `(id, weight)` pairs
/// the codec stores: ids must be present and positive, weights in bounds.
fn assoc_pairs<T: NamedRef>(
    entries: &[(T, i64)],
    kind: NamedEntityKind,
) -> StoreResult<Vec<(i64, i64)>> {
    let mut pairs = Vec::with_capacity(entries.len());
    for (entity, weight) in entries {
        let id = match entity.ref_id() {
            Some(v) if v >= 1 => v,
            _ => {
                return Err(StoreError::validation(format!(
                    "{} \"{}\" must be persisted before a game can reference it",
                    kind.label(),
                    entity.ref_name()
                )))
            }
        };
        if !(WEIGHT_MIN..=WEIGHT_MAX).contains(weight) {
            return Err(StoreError::validation(format!(
                "weight {weight} for {} \"{}\" must be between {WEIGHT_MIN} and {WEIGHT_MAX}",
                kind.label(),
                entity.ref_name()
            )));
        }
        pairs.push((id, *weight));
    }
    Ok(pairs)
}

/// Every referenced id must exist at write time. The check runs inside
/// the write's transaction.
fn ensure_references(
    conn: &Connection,
    kind: NamedEntityKind,
    pairs: &[(i64, i64)],
) -> StoreResult<()> {
    for (id, _) in pairs {
        named::fetch_by_id(conn, kind, *id)?;
    }
    Ok(())
}

fn ensure_title(game: &Game) -> StoreResult<()> {
    if game.title.trim().is_empty() {
        return Err(StoreError::validation("game title must not be empty"));
    }
    Ok(())
}

impl Store {
    /// Insert a game; the game's own `id` is ignored and assigned by the
    /// store. Fails with `Duplicate` on a title collision and refuses
    /// references to entities that do not exist.
    pub fn add_game(&mut self, game: &Game) -> StoreResult<Game> {
        ensure_title(game)?;
        let categories = assoc_pairs(&game.categories, NamedEntityKind::Category)?;
        let functions = assoc_pairs(&game.functions, NamedEntityKind::Function)?;

        self.with_tx(|tx| {
            ensure_references(tx, NamedEntityKind::Category, &categories)?;
            ensure_references(tx, NamedEntityKind::Function, &functions)?;

            let functions_json = codec::encode_pairs(&functions, "cognitive_functions")?;
            let categories_json = codec::encode_pairs(&categories, "cognitive_categories")?;
            let materials_json = codec::encode_materials(&game.materials)?;

            tx.execute(
                "INSERT INTO games \
                 (title, description, cognitive_functions, \
                  cognitive_categories, materials, image) \
                 VALUES (?, ?, ?, ?, ?, ?)",
                params![
                    game.title,
                    game.description,
                    functions_json,
                    categories_json,
                    materials_json,
                    game.image,
                ],
            )
            .map_err(|e| classify_write(e, "game", &game.title))?;

            let id = tx.last_insert_rowid();
            info!(target: "ludoteca", event = "game_add", id = id, title = %game.title);
            Ok(Game {
                id: Some(id),
                ..game.clone()
            })
        })
    }

    /// Overwrite every field of an existing game. Requires a persisted,
    /// positive id.
    pub fn update_game(&mut self, game: &Game) -> StoreResult<()> {
        let id = match game.id {
            Some(v) if v >= 1 => v,
            _ => {
                return Err(StoreError::validation(
                    "game id must be a positive number",
                ))
            }
        };
        ensure_title(game)?;
        let categories = assoc_pairs(&game.categories, NamedEntityKind::Category)?;
        let functions = assoc_pairs(&game.functions, NamedEntityKind::Function)?;

        self.with_tx(|tx| {
            ensure_references(tx, NamedEntityKind::Category, &categories)?;
            ensure_references(tx, NamedEntityKind::Function, &functions)?;

            let functions_json = codec::encode_pairs(&functions, "cognitive_functions")?;
            let categories_json = codec::encode_pairs(&categories, "cognitive_categories")?;
            let materials_json = codec::encode_materials(&game.materials)?;

            let affected = tx
                .execute(
                    "UPDATE games \
                     SET title = ?, description = ?, cognitive_functions = ?, \
                         cognitive_categories = ?, materials = ?, image = ? \
                     WHERE id = ?",
                    params![
                        game.title,
                        game.description,
                        functions_json,
                        categories_json,
                        materials_json,
                        game.image,
                        id,
                    ],
                )
                .map_err(|e| classify_write(e, "game", &game.title))?;
            if affected == 0 {
                return Err(StoreError::not_found("game", format!("id {id}")));
            }
            info!(target: "ludoteca", event = "game_update", id = id, title = %game.title);
            Ok(())
        })
    }

    /// Remove a game by id. Nothing references games, so no cascade runs
    /// in this direction.
    pub fn delete_game(&mut self, id: i64) -> StoreResult<()> {
        if id < 1 {
            return Err(StoreError::validation(
                "game id must be a positive number",
            ));
        }
        let affected = self.conn.execute("DELETE FROM games WHERE id = ?", [id])?;
        if affected == 0 {
            return Err(StoreError::not_found("game", format!("id {id}")));
        }
        info!(target: "ludoteca", event = "game_delete", id = id);
        Ok(())
    }

    /// Exact title lookup, fully hydrated. A stored reference that no
    /// longer resolves fails the whole lookup rather than being dropped.
    pub fn game_by_title(&self, title: &str) -> StoreResult<Game> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {GAME_COLUMNS} FROM games WHERE title = ?"),
                [title],
                read_row,
            )
            .optional()?
            .ok_or_else(|| StoreError::not_found("game", format!("title \"{title}\"")))?;
        hydrate(&self.conn, row)
    }

    /// Lookup by id, fully hydrated.
    pub fn game_by_id(&self, id: i64) -> StoreResult<Game> {
        if id < 1 {
            return Err(StoreError::validation(
                "game id must be a positive number",
            ));
        }
        let row = self
            .conn
            .query_row(
                &format!("SELECT {GAME_COLUMNS} FROM games WHERE id = ?"),
                [id],
                read_row,
            )
            .optional()?
            .ok_or_else(|| StoreError::not_found("game", format!("id {id}")))?;
        hydrate(&self.conn, row)
    }

    /// Substring title search, fully hydrated; zero or more results.
    pub fn search_games_by_title(&self, query: &str) -> StoreResult<Vec<Game>> {
        let rows = {
            let mut stmt = self.conn.prepare(&format!(
                "SELECT {GAME_COLUMNS} FROM games WHERE title LIKE '%' || ? || '%' ORDER BY id"
            ))?;
            let mapped = stmt.query_map([query], read_row)?;
            mapped.collect::<rusqlite::Result<Vec<_>>>()?
        };
        rows.into_iter()
            .map(|row| hydrate(&self.conn, row))
            .collect()
    }

    /// Every game, cheap listing path: categories and functions stay empty
    /// (no reference resolution), materials decode locally.
    pub fn games(&self) -> StoreResult<Vec<Game>> {
        let rows = {
            let mut stmt = self
                .conn
                .prepare("SELECT id, title, description, materials, image FROM games ORDER BY id")?;
            let mapped = stmt.query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            })?;
            mapped.collect::<rusqlite::Result<Vec<_>>>()?
        };

        let mut games = Vec::with_capacity(rows.len());
        for (id, title, description, materials_raw, image) in rows {
            games.push(Game {
                id: Some(id),
                title,
                description,
                image,
                materials: codec::decode_materials(materials_raw.as_deref())?,
                categories: Vec::new(),
                functions: Vec::new(),
            });
        }
        Ok(games)
    }
}
