//! The projected, lossy, role-specific slice of state delivered to a player.
//!
//! Sensitive quantities are categorical; the only numeric leaks are the
//! player's own wealth and the politician's noise-perturbed estimates.

use serde::{Deserialize, Serialize};

use crate::state::{Headline, Rumor};
use crate::Phase;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PriceTrend {
    Rising,
    Falling,
    Stable,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Abundant,
    Normal,
    Scarce,
    Shortage,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalVague {
    Popular,
    Mixed,
    Unpopular,
    Crisis,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Content,
    Neutral,
    Frustrated,
    Angry,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LaborMood {
    Calm,
    Tense,
    Restive,
    Striking,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum RoleView {
    Citizen {
        employed: bool,
        mood: Mood,
    },
    BusinessOwner {
        employees: u32,
        production_capacity: f64,
        wage_level: f64,
        labor_mood: LaborMood,
    },
    Politician {
        laws_proposed: u32,
        laws_passed: u32,
        approval_estimate: i64,
        unemployment_estimate: f64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerView {
    pub tick: u64,
    pub phase: Phase,
    pub price_trend: PriceTrend,
    pub availability: Availability,
    pub approval_vague: ApprovalVague,
    /// The caller's own wealth, rounded to 2 decimals.
    pub wealth: f64,
    pub headlines: Vec<Headline>,
    pub rumors: Vec<Rumor>,
    pub role_view: RoleView,
}
