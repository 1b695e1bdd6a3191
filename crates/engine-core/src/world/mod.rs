//! The owned game world and its tick machinery.
//!
//! One `GameWorld` is the single-writer domain for one game instance: HTTP
//! handlers and the tick scheduler are serialized around it by the caller.
//! Submodules implement the tick phases in the order of `tick::run_tick`.

use std::collections::BTreeMap;
use std::fmt;

mod actions;
mod events;
mod init;
mod laws;
mod pipeline;
mod recalc;
mod tick;
mod view;
mod watchdog;

use contracts::{
    ActionType, GameConfig, Phase, Player, PlayerAction, Role, SubmittedAction, WorldState,
    MAX_PENDING_ACTIONS,
};

use crate::rng;

pub use tick::TickReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinError {
    /// Joins are only accepted while the tick window is open.
    WrongPhase,
    ServerFull,
}

impl fmt::Display for JoinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongPhase => write!(f, "joins are only accepted during accepting_actions"),
            Self::ServerFull => write!(f, "server is at its player cap"),
        }
    }
}

impl std::error::Error for JoinError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    UnknownPlayer,
    PlayerDead,
    WrongPhase,
    WrongRole,
    /// The pending queue already holds `MAX_PENDING_ACTIONS` submissions.
    RateLimited,
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownPlayer => write!(f, "player does not exist"),
            Self::PlayerDead => write!(f, "player is no longer alive"),
            Self::WrongPhase => write!(f, "actions are only accepted during accepting_actions"),
            Self::WrongRole => write!(f, "action type is not available to this role"),
            Self::RateLimited => write!(f, "pending action limit reached"),
        }
    }
}

impl std::error::Error for SubmitError {}

#[derive(Debug)]
pub struct GameWorld {
    config: GameConfig,
    state: WorldState,
    /// event_type -> last trigger tick. Anti-spam heuristic, deliberately
    /// outside the hashed state; rebuilt empty on restart.
    watchdog_cooldowns: BTreeMap<&'static str, u64>,
}

impl GameWorld {
    /// Fresh world at tick 0. `now_ms` seeds only the first tick deadline;
    /// everything after is deadline-relative and clock-free.
    pub fn new(config: GameConfig, now_ms: u64) -> Self {
        let state = init::initial_state(&config, now_ms);
        Self {
            config,
            state,
            watchdog_cooldowns: BTreeMap::new(),
        }
    }

    /// Rehydrate from a persisted state blob.
    pub fn from_state(config: GameConfig, state: WorldState) -> Self {
        Self {
            config,
            state,
            watchdog_cooldowns: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> &WorldState {
        &self.state
    }

    pub fn server_id(&self) -> &str {
        &self.state.meta.server_id
    }

    /// Add a player during the open tick window. Returns the new player id;
    /// tokens are the caller's concern (they never enter the state tree).
    pub fn join_player(&mut self, name: &str, role: Role) -> Result<String, JoinError> {
        if self.state.meta.phase != Phase::AcceptingActions {
            return Err(JoinError::WrongPhase);
        }
        if self.state.alive_player_count() >= usize::from(self.config.max_players) {
            return Err(JoinError::ServerFull);
        }

        let tick = self.state.meta.tick;
        let seed = self.state.meta.seed;
        let player_id = rng::seeded_id("player", seed, tick, self.state.players.len() as u64);
        let player = init::new_player(&self.state, &player_id, name, role, tick);
        self.state.players.insert(player_id.clone(), player);
        Ok(player_id)
    }

    /// Queue a validated action submission. Returns the new pending count.
    pub fn submit_action(
        &mut self,
        player_id: &str,
        action: PlayerAction,
    ) -> Result<usize, SubmitError> {
        if self.state.meta.phase != Phase::AcceptingActions {
            return Err(SubmitError::WrongPhase);
        }
        let Some(player) = self.state.players.get(player_id) else {
            return Err(SubmitError::UnknownPlayer);
        };
        if !player.alive {
            return Err(SubmitError::PlayerDead);
        }
        // A known type must be listed for the player's role. Unknown types
        // queue as-is and are skipped with a warning at resolution, so one
        // malformed submission can never reject a tick.
        if let Some(action_type) = ActionType::parse(&action.action_type) {
            if !player.role.allows(action_type) {
                return Err(SubmitError::WrongRole);
            }
        }
        if player.actions_pending.len() >= MAX_PENDING_ACTIONS {
            return Err(SubmitError::RateLimited);
        }

        let tick = self.state.meta.tick;
        let seed = self.state.meta.seed;
        let counter = player.actions_pending.len() as u64;
        let id = format!(
            "act_{}",
            &rng::seeded_token(seed, tick, counter, player_id)[..12]
        );
        let submitted = SubmittedAction {
            id,
            action_type: action.action_type,
            params: action.params,
            submitted_tick: tick,
        };
        let Some(player) = self.state.players.get_mut(player_id) else {
            return Err(SubmitError::UnknownPlayer);
        };
        player.actions_pending.push(submitted);
        Ok(player.actions_pending.len())
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.state.players.get(player_id)
    }
}
