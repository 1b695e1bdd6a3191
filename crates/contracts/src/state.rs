//! The owned world-state tree for one game instance.
//!
//! Every floating-point quantity is an `f64`. Bounds named here are enforced
//! by the engine's modifier kernel on every write; the types themselves stay
//! plain data so the whole tree serializes as one blob.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::actions::{ActionHistoryGroup, SubmittedAction};
use crate::events::GameEvent;
use crate::laws::Law;
use crate::{Phase, Role, SCHEMA_VERSION_V1};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorldState {
    pub schema_version: String,
    pub meta: Meta,
    pub economy: Economy,
    pub society: Society,
    pub government: Government,
    pub players: BTreeMap<String, Player>,
    pub laws: Vec<Law>,
    pub events: Vec<GameEvent>,
    pub media: MediaState,
    pub history: HistoryState,
    pub tick_log: Vec<TickLogEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Meta {
    pub server_id: String,
    pub tick: u64,
    pub tick_interval_hours: u32,
    /// Absolute deadline of the current tick window, epoch milliseconds.
    /// Advances by exactly one interval at finalize so the post-tick state
    /// is a pure function of the pre-tick state.
    pub tick_deadline_ms: u64,
    pub phase: Phase,
    pub seed: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Economy {
    /// [0, 100000]
    pub gdp: f64,
    pub gdp_delta: f64,
    /// [-20, 500]
    pub inflation: f64,
    /// [0, 100]
    pub unemployment: f64,
    /// [0, 100]
    pub tax_rate: f64,
    /// [0, 1]
    pub tax_compliance: f64,
    /// [0.01, 100]
    pub wage_index: f64,
    pub budget: Budget,
    pub market: Market,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Budget {
    pub revenue: f64,
    pub spending: f64,
    /// [-10000, 100000]
    pub reserves: f64,
    pub deficit: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Market {
    /// [0, 100000]
    pub supply: f64,
    /// [0, 100000]
    pub demand: f64,
    /// [0.01, 1000]
    pub price_index: f64,
    pub shortage: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Society {
    /// [0, 100], as are the other four scalars here except protest_pressure.
    pub stability: f64,
    pub public_trust: f64,
    pub satisfaction: f64,
    pub radicalization: f64,
    /// [0, 1]
    pub protest_pressure: f64,
    pub movements: Vec<Movement>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    Reform,
    Populist,
    Radical,
    Separatist,
    Labor,
    Business,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movement {
    pub id: String,
    pub name: String,
    pub movement_type: MovementType,
    /// [0, 1]
    pub strength: f64,
    pub demands: Vec<String>,
    pub member_player_ids: Vec<String>,
    pub created_tick: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Government {
    pub approval: Approval,
    pub budget_allocation: BudgetAllocation,
    pub active_law_count: u32,
    pub election_tick: Option<u64>,
}

/// Four approval sub-scores, each [0, 100].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Approval {
    pub overall: f64,
    pub economic: f64,
    pub social: f64,
    pub security: f64,
}

/// Fractions over the five spending categories; must sum to 1 within ±0.01.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BudgetAllocation {
    pub welfare: f64,
    pub infrastructure: f64,
    pub enforcement: f64,
    pub education: f64,
    pub discretionary: f64,
}

impl BudgetAllocation {
    pub fn sum(&self) -> f64 {
        self.welfare + self.infrastructure + self.enforcement + self.education + self.discretionary
    }

    pub fn fractions(&self) -> [(&'static str, f64); 5] {
        [
            ("welfare", self.welfare),
            ("infrastructure", self.infrastructure),
            ("enforcement", self.enforcement),
            ("education", self.education),
            ("discretionary", self.discretionary),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub joined_tick: u64,
    pub alive: bool,
    pub hidden_stats: HiddenStats,
    pub visible_stats: VisibleStats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citizen: Option<CitizenRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business: Option<BusinessRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub politician: Option<PoliticianRecord>,
    pub actions_pending: Vec<SubmittedAction>,
    pub actions_history: Vec<ActionHistoryGroup>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HiddenStats {
    pub influence: f64,
    pub reputation: f64,
    pub fear: f64,
    pub corruption: f64,
    pub historical_legacy: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VisibleStats {
    pub wealth: f64,
    pub movement_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CitizenRecord {
    pub employed: bool,
    pub employer_id: Option<String>,
    pub satisfaction: f64,
    pub economic_pressure: f64,
    pub radicalization: f64,
    pub voted_this_tick: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BusinessRecord {
    pub production_capacity: f64,
    pub employees: u32,
    pub wage_level: f64,
    /// [0, 1]
    pub strike_risk: f64,
    /// [0, 1]
    pub tax_evasion: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PoliticianRecord {
    pub laws_proposed: u32,
    pub laws_passed: u32,
    pub lobby_money_received: f64,
    pub tax_evasion: f64,
    /// Statement text keyed by the tick it was published in.
    pub statements: BTreeMap<u64, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaState {
    pub headlines: Vec<Headline>,
    pub articles: Vec<Article>,
    pub rumors: Vec<Rumor>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Headline {
    pub id: String,
    pub tick: u64,
    pub text: String,
    /// [0, 1]
    pub truth_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Article {
    pub id: String,
    pub tick: u64,
    pub title: String,
    pub body: String,
    pub truth_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rumor {
    pub id: String,
    pub tick: u64,
    pub text: String,
    /// [0, 1]
    pub credibility: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryState {
    /// Ordered eras; the final entry stays open (`tick_end == None`).
    pub eras: Vec<Era>,
    pub player_reputations: BTreeMap<String, ReputationRecord>,
    /// Ring of the last 10 tick-end stability values, oldest first.
    #[serde(default)]
    pub stability_samples: Vec<f64>,
    /// Ring of the last 10 tick-end GDP values, oldest first.
    #[serde(default)]
    pub gdp_samples: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Era {
    pub name: String,
    pub tick_start: u64,
    pub tick_end: Option<u64>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReputationRecord {
    pub summary: String,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TickLogEntry {
    pub tick: u64,
    pub actions_resolved: u32,
    pub actions_skipped: u32,
    pub events_applied: u32,
    pub events_rejected: u32,
    pub events_expired: u32,
    pub laws_enacted: u32,
    pub laws_rejected: u32,
    pub advisor_failures: u32,
    /// Hex SHA-256 of the post-finalize state.
    pub content_hash: String,
    /// Raw advisor outputs keyed by stage name, as returned by the transport.
    pub advisor_outputs: BTreeMap<String, serde_json::Value>,
}

impl WorldState {
    /// Look up a movement by id.
    pub fn movement(&self, movement_id: &str) -> Option<&Movement> {
        self.society
            .movements
            .iter()
            .find(|movement| movement.id == movement_id)
    }

    pub fn movement_mut(&mut self, movement_id: &str) -> Option<&mut Movement> {
        self.society
            .movements
            .iter_mut()
            .find(|movement| movement.id == movement_id)
    }

    pub fn law(&self, law_id: &str) -> Option<&Law> {
        self.laws.iter().find(|law| law.id == law_id)
    }

    pub fn law_mut(&mut self, law_id: &str) -> Option<&mut Law> {
        self.laws.iter_mut().find(|law| law.id == law_id)
    }

    pub fn alive_player_count(&self) -> usize {
        self.players.values().filter(|player| player.alive).count()
    }
}

impl Default for WorldState {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            meta: Meta {
                server_id: String::new(),
                tick: 0,
                tick_interval_hours: 4,
                tick_deadline_ms: 0,
                phase: Phase::AcceptingActions,
                seed: 0,
            },
            economy: Economy::default(),
            society: Society::default(),
            government: Government::default(),
            players: BTreeMap::new(),
            laws: Vec::new(),
            events: Vec::new(),
            media: MediaState {
                headlines: Vec::new(),
                articles: Vec::new(),
                rumors: Vec::new(),
            },
            history: HistoryState {
                eras: Vec::new(),
                player_reputations: BTreeMap::new(),
                stability_samples: Vec::new(),
                gdp_samples: Vec::new(),
            },
            tick_log: Vec::new(),
        }
    }
}

impl Default for Economy {
    fn default() -> Self {
        Self {
            gdp: 1_000.0,
            gdp_delta: 0.0,
            inflation: 2.0,
            unemployment: 5.0,
            tax_rate: 20.0,
            tax_compliance: 0.9,
            wage_index: 1.0,
            budget: Budget {
                revenue: 0.0,
                spending: 50.0,
                reserves: 500.0,
                deficit: 0.0,
            },
            market: Market {
                supply: 1_000.0,
                demand: 800.0,
                price_index: 1.0,
                shortage: false,
            },
        }
    }
}

impl Default for Society {
    fn default() -> Self {
        Self {
            stability: 70.0,
            public_trust: 60.0,
            satisfaction: 60.0,
            radicalization: 10.0,
            protest_pressure: 0.0,
            movements: Vec::new(),
        }
    }
}

impl Default for Government {
    fn default() -> Self {
        Self {
            approval: Approval {
                overall: 50.0,
                economic: 50.0,
                social: 50.0,
                security: 50.0,
            },
            budget_allocation: BudgetAllocation {
                welfare: 0.3,
                infrastructure: 0.25,
                enforcement: 0.2,
                education: 0.15,
                discretionary: 0.1,
            },
            active_law_count: 0,
            election_tick: None,
        }
    }
}
