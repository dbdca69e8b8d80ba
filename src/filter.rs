//! Ad-hoc game search: zero or more independent criteria composed into a
//! single query. AND across criteria, OR within one criterion's value set.
//! The list-valued criteria are evaluated directly against the encoded
//! columns with the JSON1 table functions; there is no join table.

use std::collections::BTreeSet;

use rusqlite::params_from_iter;
use rusqlite::types::Value;

use crate::db::Store;
use crate::error::StoreResult;
use crate::games::{self, GAME_COLUMNS};
use crate::model::{Game, Material};

#[derive(Debug, Clone, Default)]
pub struct GameFilter {
    title_contains: Option<String>,
    category_ids: BTreeSet<i64>,
    function_ids: BTreeSet<i64>,
    materials: BTreeSet<Material>,
}

impl GameFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Substring match on the title (LIKE semantics, so ASCII
    /// case-insensitive under the default collation).
    pub fn title_contains(mut self, query: impl Into<String>) -> Self {
        self.title_contains = Some(query.into());
        self
    }

    /// Match games whose stored category references include any of `ids`.
    pub fn category_ids(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.category_ids.extend(ids);
        self
    }

    pub fn category_id(self, id: i64) -> Self {
        self.category_ids([id])
    }

    /// Match games whose stored function references include any of `ids`.
    pub fn function_ids(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.function_ids.extend(ids);
        self
    }

    pub fn function_id(self, id: i64) -> Self {
        self.function_ids([id])
    }

    /// Match games tagged with any of `materials`.
    pub fn materials(mut self, materials: impl IntoIterator<Item = Material>) -> Self {
        self.materials.extend(materials);
        self
    }

    pub fn material(self, material: Material) -> Self {
        self.materials([material])
    }

    /// True when no criterion is active; such a filter matches every game.
    pub fn is_empty(&self) -> bool {
        self.title_contains.is_none()
            && self.category_ids.is_empty()
            && self.function_ids.is_empty()
            && self.materials.is_empty()
    }

    /// The WHERE fragment (leading ` WHERE ` included, empty when no
    /// criterion is active) and its bound parameters, in clause order.
    /// Values are always bound, never spliced into the SQL.
    fn predicate(&self) -> (String, Vec<Value>) {
        let mut clauses: Vec<String> = Vec::new();
        let mut params: Vec<Value> = Vec::new();

        if let Some(query) = &self.title_contains {
            clauses.push("title LIKE '%' || ? || '%'".to_string());
            params.push(Value::Text(query.clone()));
        }

        if !self.category_ids.is_empty() {
            clauses.push(format!(
                "EXISTS (SELECT 1 FROM json_each(games.cognitive_categories) AS entry \
                 WHERE json_extract(entry.value, '$[0]') IN ({}))",
                placeholders(self.category_ids.len())
            ));
            params.extend(self.category_ids.iter().map(|id| Value::Integer(*id)));
        }

        if !self.function_ids.is_empty() {
            clauses.push(format!(
                "EXISTS (SELECT 1 FROM json_each(games.cognitive_functions) AS entry \
                 WHERE json_extract(entry.value, '$[0]') IN ({}))",
                placeholders(self.function_ids.len())
            ));
            params.extend(self.function_ids.iter().map(|id| Value::Integer(*id)));
        }

        if !self.materials.is_empty() {
            clauses.push(format!(
                "EXISTS (SELECT 1 FROM json_each(games.materials) AS entry \
                 WHERE entry.value IN ({}))",
                placeholders(self.materials.len())
            ));
            params.extend(
                self.materials
                    .iter()
                    .map(|m| Value::Text(m.name().to_string())),
            );
        }

        if clauses.is_empty() {
            (String::new(), params)
        } else {
            (format!(" WHERE {}", clauses.join(" AND ")), params)
        }
    }
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

impl Store {
    /// Every game matching all active criteria, fully hydrated, ordered by
    /// id. An empty filter returns every game; no match is an empty vec,
    /// not an error.
    pub fn search_games(&self, filter: &GameFilter) -> StoreResult<Vec<Game>> {
        let (where_sql, params) = filter.predicate();
        let sql = format!("SELECT {GAME_COLUMNS} FROM games{where_sql} ORDER BY id");
        let rows = {
            let mut stmt = self.conn.prepare(&sql)?;
            let mapped = stmt.query_map(params_from_iter(params), games::read_row)?;
            mapped.collect::<rusqlite::Result<Vec<_>>>()?
        };
        rows.into_iter()
            .map(|row| games::hydrate(&self.conn, row))
            .collect()
    }
}
