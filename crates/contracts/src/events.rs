//! Game events and the modifier instructions they carry.

use serde::{Deserialize, Serialize};

/// Origin of a game event; priority decides application order within a tick.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    CoreEngine,
    Judiciary,
    Crisis,
    PoliticalReaction,
    StateAnalyst,
    Media,
}

impl EventSource {
    pub fn priority(self) -> u8 {
        match self {
            EventSource::CoreEngine => 100,
            EventSource::Judiciary => 85,
            EventSource::Crisis => 70,
            EventSource::PoliticalReaction => 60,
            EventSource::StateAnalyst => 50,
            EventSource::Media => 10,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Pending,
    Applied,
    Rejected,
    Expired,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModifierOp {
    Set,
    Add,
    Multiply,
    Clamp,
}

/// A typed instruction to change one numeric state leaf, addressed by
/// dot-path. The only sanctioned mutation outside action handlers and the
/// recalculator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Modifier {
    pub variable: String,
    pub operation: ModifierOp,
    #[serde(default)]
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl Modifier {
    pub fn set(variable: impl Into<String>, value: f64) -> Self {
        Self {
            variable: variable.into(),
            operation: ModifierOp::Set,
            value,
            min: None,
            max: None,
        }
    }

    pub fn add(variable: impl Into<String>, value: f64) -> Self {
        Self {
            variable: variable.into(),
            operation: ModifierOp::Add,
            value,
            min: None,
            max: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameEvent {
    pub id: String,
    pub source: EventSource,
    pub tick: u64,
    pub event_type: String,
    /// [1, 5]
    pub severity: u8,
    pub status: EventStatus,
    pub description: String,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ticks: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_tick: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative_hook: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_priorities_are_strictly_ordered() {
        let sources = [
            EventSource::CoreEngine,
            EventSource::Judiciary,
            EventSource::Crisis,
            EventSource::PoliticalReaction,
            EventSource::StateAnalyst,
            EventSource::Media,
        ];
        for pair in sources.windows(2) {
            assert!(pair[0].priority() > pair[1].priority());
        }
    }

    #[test]
    fn modifier_defaults_fill_missing_fields() {
        let modifier: Modifier = serde_json::from_str(
            r#"{"variable":"society.stability","operation":"clamp","min":0,"max":50}"#,
        )
        .unwrap();
        assert_eq!(modifier.operation, ModifierOp::Clamp);
        assert_eq!(modifier.value, 0.0);
        assert_eq!(modifier.min, Some(0.0));
        assert_eq!(modifier.max, Some(50.0));
    }
}
