//! Player action submissions and the queued/archived forms the engine works on.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Work,
    Consume,
    VoteLaw,
    JoinMovement,
    LeaveMovement,
    Produce,
    SetWages,
    Lobby,
    EvadeTaxes,
    ComplyTaxes,
    ProposeLaw,
    VoteLawPolitician,
    AllocateBudget,
    PublishStatement,
}

impl ActionType {
    pub const ALL: &'static [ActionType] = &[
        ActionType::Work,
        ActionType::Consume,
        ActionType::VoteLaw,
        ActionType::JoinMovement,
        ActionType::LeaveMovement,
        ActionType::Produce,
        ActionType::SetWages,
        ActionType::Lobby,
        ActionType::EvadeTaxes,
        ActionType::ComplyTaxes,
        ActionType::ProposeLaw,
        ActionType::VoteLawPolitician,
        ActionType::AllocateBudget,
        ActionType::PublishStatement,
    ];

    /// Parse the wire name. Queued actions keep the raw string so unknown
    /// types survive to the resolver, which skips them with a warning.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "work" => Some(Self::Work),
            "consume" => Some(Self::Consume),
            "vote_law" => Some(Self::VoteLaw),
            "join_movement" => Some(Self::JoinMovement),
            "leave_movement" => Some(Self::LeaveMovement),
            "produce" => Some(Self::Produce),
            "set_wages" => Some(Self::SetWages),
            "lobby" => Some(Self::Lobby),
            "evade_taxes" => Some(Self::EvadeTaxes),
            "comply_taxes" => Some(Self::ComplyTaxes),
            "propose_law" => Some(Self::ProposeLaw),
            "vote_law_politician" => Some(Self::VoteLawPolitician),
            "allocate_budget" => Some(Self::AllocateBudget),
            "publish_statement" => Some(Self::PublishStatement),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::Consume => "consume",
            Self::VoteLaw => "vote_law",
            Self::JoinMovement => "join_movement",
            Self::LeaveMovement => "leave_movement",
            Self::Produce => "produce",
            Self::SetWages => "set_wages",
            Self::Lobby => "lobby",
            Self::EvadeTaxes => "evade_taxes",
            Self::ComplyTaxes => "comply_taxes",
            Self::ProposeLaw => "propose_law",
            Self::VoteLawPolitician => "vote_law_politician",
            Self::AllocateBudget => "allocate_budget",
            Self::PublishStatement => "publish_statement",
        }
    }
}

/// The action body as submitted over HTTP: `{action_type, params}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerAction {
    pub action_type: String,
    #[serde(default)]
    pub params: Value,
}

/// A validated submission sitting in a player's pending queue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubmittedAction {
    pub id: String,
    pub action_type: String,
    #[serde(default)]
    pub params: Value,
    pub submitted_tick: u64,
}

/// One tick's worth of drained actions in a player's history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionHistoryGroup {
    pub tick: u64,
    pub actions: Vec<SubmittedAction>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_action_round_trips_through_parse() {
        for action in ActionType::ALL {
            assert_eq!(ActionType::parse(action.as_str()), Some(*action));
        }
    }

    #[test]
    fn unknown_action_type_parses_to_none() {
        assert_eq!(ActionType::parse("overthrow_government"), None);
    }
}
