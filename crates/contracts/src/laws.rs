//! Laws: the per-law state machine data and the judiciary's binding.

use serde::{Deserialize, Serialize};

use crate::events::Modifier;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LawStatus {
    Proposed,
    Voting,
    Active,
    Repealed,
    Rejected,
    Invalidated,
}

impl LawStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, LawStatus::Repealed | LawStatus::Rejected | LawStatus::Invalidated)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VoteChoice {
    For,
    Against,
    Abstain,
}

impl VoteChoice {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "for" => Some(Self::For),
            "against" => Some(Self::Against),
            "abstain" => Some(Self::Abstain),
            _ => None,
        }
    }
}

/// Weighted tallies; a politician's vote counts three times a citizen's.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VoteTally {
    #[serde(rename = "for")]
    pub for_: f64,
    pub against: f64,
    pub abstain: f64,
}

impl VoteTally {
    pub fn total_decisive(&self) -> f64 {
        self.for_ + self.against
    }
}

/// The judiciary's reading of a law's free text as a concrete modifier batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JudiciaryInterpretation {
    pub interpretation: String,
    #[serde(default)]
    pub ambiguities: Vec<String>,
    pub implementation: LawImplementation,
    /// Set when the kernel rejected the batch; the law stays active with no effect.
    #[serde(default)]
    pub rejected_by_core: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LawImplementation {
    #[serde(default)]
    pub affected_variables: Vec<String>,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Law {
    pub id: String,
    pub proposer: String,
    pub proposed_tick: u64,
    /// Free text as submitted, <= 2000 chars.
    pub original_text: String,
    pub status: LawStatus,
    pub votes: VoteTally,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judiciary_interpretation: Option<JudiciaryInterpretation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activated_tick: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repealed_tick: Option<u64>,
}

impl Law {
    /// True when the law is active with a bound interpretation the kernel
    /// has not rejected.
    pub fn has_live_interpretation(&self) -> bool {
        self.status == LawStatus::Active
            && self
                .judiciary_interpretation
                .as_ref()
                .is_some_and(|interpretation| !interpretation.rejected_by_core)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tally_serializes_for_keyword_field() {
        let tally = VoteTally {
            for_: 3.0,
            against: 1.0,
            abstain: 0.0,
        };
        let json = serde_json::to_value(&tally).unwrap();
        assert_eq!(json["for"], 3.0);
        assert_eq!(json["against"], 1.0);
    }

    #[test]
    fn rejected_interpretation_is_not_live() {
        let law = Law {
            id: "law_1".to_string(),
            proposer: "p1".to_string(),
            proposed_tick: 0,
            original_text: "test".to_string(),
            status: LawStatus::Active,
            votes: VoteTally::default(),
            judiciary_interpretation: Some(JudiciaryInterpretation {
                interpretation: "noop".to_string(),
                ambiguities: Vec::new(),
                implementation: LawImplementation {
                    affected_variables: Vec::new(),
                    modifiers: Vec::new(),
                },
                rejected_by_core: true,
            }),
            activated_tick: Some(1),
            repealed_tick: None,
        };
        assert!(!law.has_live_interpretation());
    }
}
