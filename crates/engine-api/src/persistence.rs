//! SQLite persistence: the whole world state as one blob per game, plus the
//! player-token sidecar. A tick commits state and tokens in one transaction,
//! so an interrupted tick leaves the previous snapshot intact.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use contracts::{GameConfig, WorldState};
use rusqlite::{params, Connection, OptionalExtension};

#[derive(Debug)]
pub enum PersistenceError {
    Sqlite(rusqlite::Error),
    Serde(serde_json::Error),
    NotAttached,
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite error: {err}"),
            Self::Serde(err) => write!(f, "serde error: {err}"),
            Self::NotAttached => write!(f, "sqlite store is not attached"),
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<rusqlite::Error> for PersistenceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serde(value)
    }
}

#[derive(Debug)]
pub struct SqliteGameStore {
    conn: Connection,
}

impl SqliteGameStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.configure()?;
        store.migrate()?;
        Ok(store)
    }

    /// Commit the post-tick state and any freshly minted tokens atomically.
    pub fn persist_game(
        &mut self,
        config: &GameConfig,
        state: &WorldState,
        tokens: &BTreeMap<String, String>,
    ) -> Result<(), PersistenceError> {
        let config_json = serde_json::to_string(config)?;
        let state_json = serde_json::to_string(state)?;

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO games (
                server_id,
                schema_version,
                config_json,
                state_json,
                current_tick,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(server_id) DO UPDATE SET
                schema_version = excluded.schema_version,
                config_json = excluded.config_json,
                state_json = excluded.state_json,
                current_tick = excluded.current_tick,
                updated_at = excluded.updated_at",
            params![
                config.server_id.as_str(),
                config.schema_version.as_str(),
                config_json,
                state_json,
                i64::try_from(state.meta.tick).unwrap_or(i64::MAX),
                tick_stamp(state.meta.tick),
            ],
        )?;

        for (player_id, token) in tokens {
            tx.execute(
                "INSERT OR IGNORE INTO player_tokens (server_id, player_id, token)
                 VALUES (?1, ?2, ?3)",
                params![config.server_id.as_str(), player_id.as_str(), token.as_str()],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    pub fn load_game(
        &self,
        server_id: &str,
    ) -> Result<Option<(GameConfig, WorldState)>, PersistenceError> {
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT config_json, state_json FROM games WHERE server_id = ?1",
                params![server_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match row {
            Some((config_json, state_json)) => {
                let config = serde_json::from_str::<GameConfig>(&config_json)?;
                let state = serde_json::from_str::<WorldState>(&state_json)?;
                Ok(Some((config, state)))
            }
            None => Ok(None),
        }
    }

    pub fn load_tokens(
        &self,
        server_id: &str,
    ) -> Result<BTreeMap<String, String>, PersistenceError> {
        let mut stmt = self
            .conn
            .prepare("SELECT player_id, token FROM player_tokens WHERE server_id = ?1")?;
        let rows = stmt.query_map(params![server_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut tokens = BTreeMap::new();
        for row in rows {
            let (player_id, token) = row?;
            tokens.insert(player_id, token);
        }
        Ok(tokens)
    }

    pub fn list_server_ids(&self) -> Result<Vec<String>, PersistenceError> {
        let mut stmt = self
            .conn
            .prepare("SELECT server_id FROM games ORDER BY server_id")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    }

    fn configure(&mut self) -> Result<(), PersistenceError> {
        self.conn.pragma_update(None, "journal_mode", "WAL")?;
        self.conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(())
    }

    fn migrate(&mut self) -> Result<(), PersistenceError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS games (
                server_id TEXT PRIMARY KEY,
                schema_version TEXT NOT NULL,
                config_json TEXT NOT NULL,
                state_json TEXT NOT NULL,
                current_tick INTEGER NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS player_tokens (
                server_id TEXT NOT NULL,
                player_id TEXT NOT NULL,
                token TEXT NOT NULL,
                PRIMARY KEY (server_id, player_id)
            );

            CREATE INDEX IF NOT EXISTS idx_games_tick ON games(current_tick);
            ",
        )?;

        self.conn.execute(
            "INSERT OR IGNORE INTO schema_migrations(version, name, applied_at)
             VALUES(1, 'initial_v1', 'tick-000000')",
            [],
        )?;

        Ok(())
    }
}

fn tick_stamp(tick: u64) -> String {
    format!("tick-{tick:06}")
}
