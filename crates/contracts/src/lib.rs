//! v1 cross-boundary contracts for the tick engine, API, persistence, and clients.

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod actions;
pub mod advisors;
pub mod events;
pub mod laws;
pub mod state;
pub mod view;

pub use actions::{ActionHistoryGroup, ActionType, PlayerAction, SubmittedAction};
pub use advisors::{
    AdvisorStage, AnalystOutput, ApprovalDelta, CrisisOutput, EraTransition, HistorianOutput,
    JudiciaryOutput, MediaArticleOut, MediaHeadlineOut, MediaOutput, MediaRumorOut,
    MovementAction, MovementDirective, ReactionOutput,
};
pub use events::{EventSource, EventStatus, GameEvent, Modifier, ModifierOp};
pub use laws::{JudiciaryInterpretation, Law, LawImplementation, LawStatus, VoteChoice, VoteTally};
pub use state::{
    Approval, Article, Budget, BudgetAllocation, BusinessRecord, CitizenRecord, Economy, Era,
    Government, Headline, HiddenStats, HistoryState, Market, MediaState, Meta, Movement,
    MovementType, Player, PoliticianRecord, ReputationRecord, Rumor, Society, TickLogEntry,
    VisibleStats, WorldState,
};
pub use view::{ApprovalVague, Availability, LaborMood, Mood, PlayerView, PriceTrend, RoleView};

pub const SCHEMA_VERSION_V1: &str = "1.0";

/// Cap on queued actions per player per tick.
pub const MAX_PENDING_ACTIONS: usize = 5;
/// Tick groups retained in a player's action history.
pub const ACTION_HISTORY_GROUPS: usize = 10;
/// Tick-log entries retained before head-trimming.
pub const TICK_LOG_CAP: usize = 50;
/// Upper bound on a proposed law's free text.
pub const LAW_TEXT_MAX_CHARS: usize = 2_000;
/// Upper bound on a published statement's text.
pub const STATEMENT_MAX_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    AcceptingActions,
    Processing,
    AiEvaluation,
    Resolved,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::AcceptingActions => "accepting_actions",
            Phase::Processing => "processing",
            Phase::AiEvaluation => "ai_evaluation",
            Phase::Resolved => "resolved",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Citizen,
    BusinessOwner,
    Politician,
}

impl Role {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "citizen" => Some(Role::Citizen),
            "business_owner" => Some(Role::BusinessOwner),
            "politician" => Some(Role::Politician),
            _ => None,
        }
    }

    /// The role -> allowed-actions table.
    pub fn allows(self, action: ActionType) -> bool {
        use ActionType::*;
        match self {
            Role::Citizen => {
                matches!(action, Work | Consume | VoteLaw | JoinMovement | LeaveMovement)
            }
            Role::BusinessOwner => {
                matches!(action, Produce | SetWages | Lobby | EvadeTaxes | ComplyTaxes)
            }
            Role::Politician => matches!(
                action,
                ProposeLaw | VoteLawPolitician | AllocateBudget | PublishStatement
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameConfig {
    pub schema_version: String,
    pub server_id: String,
    pub seed: u32,
    #[serde(default = "default_tick_interval_hours")]
    pub tick_interval_hours: u32,
    #[serde(default = "default_max_players")]
    pub max_players: u16,
    pub notes: Option<String>,
}

impl GameConfig {
    pub fn new(server_id: impl Into<String>, seed: u32) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            server_id: server_id.into(),
            seed,
            tick_interval_hours: default_tick_interval_hours(),
            max_players: default_max_players(),
            notes: None,
        }
    }

    pub fn tick_interval_ms(&self) -> u64 {
        u64::from(self.tick_interval_hours) * 3_600_000
    }
}

fn default_tick_interval_hours() -> u32 {
    4
}

fn default_max_players() -> u16 {
    20
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    GameNotFound,
    InvalidAuth,
    WrongRole,
    WrongPhase,
    ServerFull,
    RateLimited,
    InvalidAction,
    InvalidQuery,
    InternalError,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiError {
    pub schema_version: String,
    pub error_code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(error_code: ErrorCode, message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            error_code,
            message: message.into(),
            details,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.error_code, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_action_table_is_disjoint() {
        for action in ActionType::ALL {
            let allowed = [Role::Citizen, Role::BusinessOwner, Role::Politician]
                .iter()
                .filter(|role| role.allows(*action))
                .count();
            assert_eq!(allowed, 1, "{action:?} should belong to exactly one role");
        }
    }

    #[test]
    fn phase_round_trips_snake_case() {
        let json = serde_json::to_string(&Phase::AcceptingActions).unwrap();
        assert_eq!(json, "\"accepting_actions\"");
        let parsed: Phase = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Phase::AcceptingActions);
    }

    #[test]
    fn config_defaults_apply_on_partial_json() {
        let config: GameConfig = serde_json::from_str(
            r#"{"schema_version":"1.0","server_id":"srv_1","seed":7,"notes":null}"#,
        )
        .unwrap();
        assert_eq!(config.tick_interval_hours, 4);
        assert_eq!(config.max_players, 20);
        assert_eq!(config.tick_interval_ms(), 4 * 3_600_000);
    }
}
