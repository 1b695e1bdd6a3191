//! Per-game facade: token-authenticated request validation, deterministic
//! engine calls, and SQLite persistence committed at tick finalize.

mod advisors;
mod persistence;
mod scheduler;
mod server;

use std::collections::BTreeMap;
use std::path::Path;

use contracts::{
    ApiError, ErrorCode, GameConfig, PlayerAction, PlayerView, Role, WorldState,
};
use engine_core::{AdvisorSuite, GameWorld, JoinError, SubmitError, TickReport};

pub use advisors::{AdvisorConfig, LlmAdvisorSuite};
pub use persistence::{PersistenceError, SqliteGameStore};
pub use server::{serve, ServerError, ServerOptions};

/// What a successful join hands back to the HTTP layer. The token lives in
/// the sidecar map only, never inside the world state.
#[derive(Debug, Clone)]
pub struct JoinGrant {
    pub player_id: String,
    pub player_token: String,
    pub tick: u64,
    pub tick_deadline_ms: u64,
}

#[derive(Debug)]
pub struct EngineApi {
    world: GameWorld,
    tokens: BTreeMap<String, String>,
    store: Option<SqliteGameStore>,
    last_persistence_error: Option<String>,
}

impl EngineApi {
    pub fn create(config: GameConfig, now_ms: u64) -> Self {
        Self {
            world: GameWorld::new(config, now_ms),
            tokens: BTreeMap::new(),
            store: None,
            last_persistence_error: None,
        }
    }

    /// Rehydrate a persisted game.
    pub fn from_parts(
        config: GameConfig,
        state: WorldState,
        tokens: BTreeMap<String, String>,
    ) -> Self {
        Self {
            world: GameWorld::from_state(config, state),
            tokens,
            store: None,
            last_persistence_error: None,
        }
    }

    pub fn attach_sqlite_store(&mut self, path: impl AsRef<Path>) -> Result<(), PersistenceError> {
        let store = SqliteGameStore::open(path)?;
        self.store = Some(store);
        self.flush_persistence_if_enabled();
        Ok(())
    }

    pub fn world(&self) -> &GameWorld {
        &self.world
    }

    pub fn server_id(&self) -> &str {
        self.world.server_id()
    }

    pub fn tick(&self) -> u64 {
        self.world.state().meta.tick
    }

    pub fn tick_deadline_ms(&self) -> u64 {
        self.world.state().meta.tick_deadline_ms
    }

    pub fn last_persistence_error(&self) -> Option<&str> {
        self.last_persistence_error.as_deref()
    }

    pub fn join(&mut self, name: &str, role: Role) -> Result<JoinGrant, ApiError> {
        let player_id = self.world.join_player(name, role).map_err(join_error)?;
        let meta = &self.world.state().meta;
        let token = engine_core::rng::seeded_token(
            meta.seed,
            meta.tick,
            self.tokens.len() as u64,
            &player_id,
        );
        self.tokens.insert(player_id.clone(), token.clone());

        let grant = JoinGrant {
            player_id,
            player_token: token,
            tick: meta.tick,
            tick_deadline_ms: meta.tick_deadline_ms,
        };
        self.flush_persistence_if_enabled();
        Ok(grant)
    }

    pub fn authorize(&self, player_id: &str, token: &str) -> Result<(), ApiError> {
        match self.tokens.get(player_id) {
            Some(expected) if expected == token => Ok(()),
            _ => Err(ApiError::new(
                ErrorCode::InvalidAuth,
                "playerToken does not match playerId",
                None,
            )),
        }
    }

    pub fn submit_action(
        &mut self,
        player_id: &str,
        token: &str,
        action: PlayerAction,
    ) -> Result<usize, ApiError> {
        self.authorize(player_id, token)?;
        let pending = self
            .world
            .submit_action(player_id, action)
            .map_err(submit_error)?;
        self.flush_persistence_if_enabled();
        Ok(pending)
    }

    pub fn view(&self, player_id: &str, token: &str) -> Result<PlayerView, ApiError> {
        self.authorize(player_id, token)?;
        self.world.project_view(player_id).ok_or_else(|| {
            ApiError::new(ErrorCode::GameNotFound, "player has no projectable view", None)
        })
    }

    /// Run exactly one tick and commit the result. Storage sees either the
    /// pre-tick snapshot or the fully finalized post-tick state, never a
    /// partial tick.
    pub fn run_tick(&mut self, advisors: &dyn AdvisorSuite) -> TickReport {
        let report = self.world.run_tick(advisors);
        self.flush_persistence_if_enabled();
        report
    }

    fn flush_persistence_if_enabled(&mut self) {
        let Some(store) = self.store.as_mut() else {
            return;
        };
        match store.persist_game(self.world.config(), self.world.state(), &self.tokens) {
            Ok(()) => self.last_persistence_error = None,
            Err(err) => {
                tracing::warn!(server = self.world.server_id(), %err, "persistence flush failed");
                self.last_persistence_error = Some(err.to_string());
            }
        }
    }
}

fn join_error(err: JoinError) -> ApiError {
    match err {
        JoinError::WrongPhase => ApiError::new(
            ErrorCode::WrongPhase,
            "joins are only accepted while the server is accepting actions",
            None,
        ),
        JoinError::ServerFull => {
            ApiError::new(ErrorCode::ServerFull, "server is at its player cap", None)
        }
    }
}

fn submit_error(err: SubmitError) -> ApiError {
    match err {
        SubmitError::UnknownPlayer => {
            ApiError::new(ErrorCode::InvalidAuth, "player does not exist", None)
        }
        SubmitError::PlayerDead => {
            ApiError::new(ErrorCode::InvalidAction, "player is no longer alive", None)
        }
        SubmitError::WrongPhase => ApiError::new(
            ErrorCode::WrongPhase,
            "actions are only accepted during accepting_actions",
            None,
        ),
        SubmitError::WrongRole => ApiError::new(
            ErrorCode::WrongRole,
            "action type is not available to this role",
            None,
        ),
        SubmitError::RateLimited => ApiError::new(
            ErrorCode::RateLimited,
            "pending action limit reached for this tick",
            Some(format!("limit={}", contracts::MAX_PENDING_ACTIONS)),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::NoopAdvisors;
    use serde_json::Value;

    fn test_config() -> GameConfig {
        GameConfig::new("srv_api_test", 7)
    }

    fn temp_db_path(name: &str) -> std::path::PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be monotonic")
            .as_nanos();
        std::env::temp_dir().join(format!("statecraft_{name}_{nanos}.sqlite"))
    }

    #[test]
    fn join_grants_distinct_32_char_tokens() {
        let mut api = EngineApi::create(test_config(), 0);
        let ada = api.join("ada", Role::Citizen).unwrap();
        let bob = api.join("bob", Role::Politician).unwrap();

        assert_eq!(ada.player_token.len(), 32);
        assert_ne!(ada.player_token, bob.player_token);
        assert!(api.authorize(&ada.player_id, &ada.player_token).is_ok());
        assert!(api.authorize(&ada.player_id, &bob.player_token).is_err());
        assert!(api.authorize("player_missing", &ada.player_token).is_err());
    }

    #[test]
    fn sixth_action_is_rate_limited_with_distinct_code() {
        let mut api = EngineApi::create(test_config(), 0);
        let grant = api.join("ada", Role::Citizen).unwrap();
        for _ in 0..5 {
            api.submit_action(
                &grant.player_id,
                &grant.player_token,
                PlayerAction { action_type: "work".to_string(), params: Value::Null },
            )
            .unwrap();
        }
        let err = api
            .submit_action(
                &grant.player_id,
                &grant.player_token,
                PlayerAction { action_type: "work".to_string(), params: Value::Null },
            )
            .unwrap_err();
        assert_eq!(err.error_code, ErrorCode::RateLimited);
        assert_eq!(
            api.world().player(&grant.player_id).unwrap().actions_pending.len(),
            5
        );
    }

    #[test]
    fn wrong_role_maps_to_wrong_role_code() {
        let mut api = EngineApi::create(test_config(), 0);
        let grant = api.join("ada", Role::Citizen).unwrap();
        let err = api
            .submit_action(
                &grant.player_id,
                &grant.player_token,
                PlayerAction { action_type: "produce".to_string(), params: Value::Null },
            )
            .unwrap_err();
        assert_eq!(err.error_code, ErrorCode::WrongRole);
    }

    #[test]
    fn persists_and_rehydrates_across_restart() {
        let db_path = temp_db_path("rehydrate");
        let config = test_config();

        let (grant, hash_after_two) = {
            let mut api = EngineApi::create(config.clone(), 0);
            api.attach_sqlite_store(&db_path).expect("attach store");
            let grant = api.join("ada", Role::Citizen).unwrap();
            api.run_tick(&NoopAdvisors);
            api.run_tick(&NoopAdvisors);
            let hash = api.world().state().tick_log.last().unwrap().content_hash.clone();
            (grant, hash)
        };

        let store = SqliteGameStore::open(&db_path).expect("reopen store");
        let (loaded_config, loaded_state) = store
            .load_game(config.server_id.as_str())
            .expect("load game")
            .expect("game present");
        let tokens = store.load_tokens(config.server_id.as_str()).expect("load tokens");
        let api = EngineApi::from_parts(loaded_config, loaded_state, tokens);

        assert_eq!(api.tick(), 2);
        assert_eq!(
            api.world().state().tick_log.last().unwrap().content_hash,
            hash_after_two
        );
        assert!(api.authorize(&grant.player_id, &grant.player_token).is_ok());

        let _ = std::fs::remove_file(&db_path);
        let _ = std::fs::remove_file(db_path.with_extension("sqlite-wal"));
        let _ = std::fs::remove_file(db_path.with_extension("sqlite-shm"));
    }

    #[test]
    fn view_requires_matching_token() {
        let mut api = EngineApi::create(test_config(), 0);
        let grant = api.join("ada", Role::Citizen).unwrap();
        assert!(api.view(&grant.player_id, &grant.player_token).is_ok());
        let err = api.view(&grant.player_id, "bad-token").unwrap_err();
        assert_eq!(err.error_code, ErrorCode::InvalidAuth);
    }
}
