//! Validated output records for the six advisor stages.
//!
//! Advisors are untrusted: the engine checks the required top-level fields on
//! the raw JSON before deserializing into these records, and falls back per
//! stage when anything is missing or out of range.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::events::Modifier;
use crate::laws::LawImplementation;
use crate::state::{MovementType, ReputationRecord};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AdvisorStage {
    Analyst,
    Judiciary,
    Media,
    Reaction,
    Crisis,
    Historian,
}

impl AdvisorStage {
    pub fn as_str(self) -> &'static str {
        match self {
            AdvisorStage::Analyst => "analyst",
            AdvisorStage::Judiciary => "judiciary",
            AdvisorStage::Media => "media",
            AdvisorStage::Reaction => "reaction",
            AdvisorStage::Crisis => "crisis",
            AdvisorStage::Historian => "historian",
        }
    }

    /// Required top-level fields of the stage's JSON output.
    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            AdvisorStage::Analyst => &["trends", "risks", "projections", "confidence"],
            AdvisorStage::Judiciary => &["law_id", "interpretation", "ambiguities", "implementation"],
            AdvisorStage::Media => &["headlines", "articles", "rumors"],
            AdvisorStage::Reaction => {
                &["approval_delta", "protest_prob", "movements", "suppressed_warnings"]
            }
            AdvisorStage::Crisis => {
                &["event_type", "severity", "modifiers", "narrative_hook", "duration_ticks"]
            }
            AdvisorStage::Historian => &["era_transition", "summary", "player_reputations"],
        }
    }

    /// Only the crisis stage may legitimately answer `null`.
    pub fn allows_null(self) -> bool {
        matches!(self, AdvisorStage::Crisis)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalystOutput {
    #[serde(default)]
    pub trends: Vec<String>,
    #[serde(default)]
    pub risks: Vec<String>,
    #[serde(default)]
    pub projections: Value,
    #[serde(default)]
    pub confidence: f64,
}

impl AnalystOutput {
    /// The failure fallback: empty trends/risks, pass-through projections,
    /// confidence zero.
    pub fn fallback(projections: Value) -> Self {
        Self {
            trends: Vec::new(),
            risks: Vec::new(),
            projections,
            confidence: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JudiciaryOutput {
    pub law_id: String,
    pub interpretation: String,
    #[serde(default)]
    pub ambiguities: Vec<String>,
    pub implementation: LawImplementation,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaHeadlineOut {
    pub text: String,
    #[serde(default = "default_truth_score")]
    pub truth_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaArticleOut {
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default = "default_truth_score")]
    pub truth_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaRumorOut {
    pub text: String,
    #[serde(default = "default_credibility")]
    pub credibility: f64,
}

fn default_truth_score() -> f64 {
    0.5
}

fn default_credibility() -> f64 {
    0.3
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaOutput {
    #[serde(default)]
    pub headlines: Vec<MediaHeadlineOut>,
    #[serde(default)]
    pub articles: Vec<MediaArticleOut>,
    #[serde(default)]
    pub rumors: Vec<MediaRumorOut>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ApprovalDelta {
    #[serde(default)]
    pub overall: f64,
    #[serde(default)]
    pub economic: f64,
    #[serde(default)]
    pub social: f64,
    #[serde(default)]
    pub security: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MovementAction {
    Create,
    Strengthen,
    Dissolve,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovementDirective {
    pub action: MovementAction,
    #[serde(default)]
    pub movement_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub movement_type: Option<MovementType>,
    #[serde(default)]
    pub strength_delta: Option<f64>,
    #[serde(default)]
    pub demands: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReactionOutput {
    pub approval_delta: ApprovalDelta,
    pub protest_prob: f64,
    #[serde(default)]
    pub movements: Vec<MovementDirective>,
    #[serde(default)]
    pub suppressed_warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CrisisOutput {
    pub event_type: String,
    pub severity: u8,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    #[serde(default)]
    pub narrative_hook: Option<String>,
    #[serde(default)]
    pub duration_ticks: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EraTransition {
    pub name: String,
    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistorianOutput {
    #[serde(default)]
    pub era_transition: Option<EraTransition>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub player_reputations: BTreeMap<String, ReputationRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_names_match_wire_format() {
        assert_eq!(AdvisorStage::Analyst.as_str(), "analyst");
        assert_eq!(
            serde_json::to_string(&AdvisorStage::Reaction).unwrap(),
            "\"reaction\""
        );
    }

    #[test]
    fn crisis_output_accepts_null_optionals() {
        let output: CrisisOutput = serde_json::from_str(
            r#"{"event_type":"flood","severity":3,"modifiers":[],"narrative_hook":null,"duration_ticks":null}"#,
        )
        .unwrap();
        assert_eq!(output.severity, 3);
        assert!(output.duration_ticks.is_none());
    }

    #[test]
    fn only_crisis_allows_null() {
        for stage in [
            AdvisorStage::Analyst,
            AdvisorStage::Judiciary,
            AdvisorStage::Media,
            AdvisorStage::Reaction,
            AdvisorStage::Historian,
        ] {
            assert!(!stage.allows_null());
        }
        assert!(AdvisorStage::Crisis.allows_null());
    }
}
