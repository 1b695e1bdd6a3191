//! View projection: the lossy, role-specific slice a player is shown.
//!
//! All noise is drawn from the fixed per-tick stream
//! `seed * 1000 + tick`, so projecting the same state twice is identical and
//! nothing here consumes host entropy.

use contracts::{ApprovalVague, Availability, LaborMood, Mood, PlayerView, PriceTrend, RoleView};

use super::GameWorld;
use crate::rng;

// Stream indices per projected quantity.
const IDX_PRICE_TREND: u64 = 1;
const IDX_AVAILABILITY: u64 = 2;
const IDX_APPROVAL: u64 = 3;
const IDX_APPROVAL_ESTIMATE: u64 = 4;
const IDX_UNEMPLOYMENT_ESTIMATE: u64 = 5;

impl GameWorld {
    /// Project the current state for one player. `None` for unknown players;
    /// auth is the caller's concern.
    pub fn project_view(&self, player_id: &str) -> Option<PlayerView> {
        let player = self.state.players.get(player_id)?;
        let meta = &self.state.meta;
        let noise_seed = u64::from(meta.seed) * 1000 + meta.tick;

        let economy = &self.state.economy;
        let price_signal = rng::noise(
            economy.market.price_index - 1.0,
            0.1,
            noise_seed,
            IDX_PRICE_TREND,
        );
        let price_trend = if price_signal > 0.05 {
            PriceTrend::Rising
        } else if price_signal < -0.05 {
            PriceTrend::Falling
        } else {
            PriceTrend::Stable
        };

        let ratio = economy.market.supply / economy.market.demand.max(1.0);
        let availability = match rng::noise(ratio, 0.15, noise_seed, IDX_AVAILABILITY) {
            value if value > 1.3 => Availability::Abundant,
            value if value > 0.8 => Availability::Normal,
            value if value > 0.5 => Availability::Scarce,
            _ => Availability::Shortage,
        };

        let overall = self.state.government.approval.overall;
        let approval_vague = match rng::noise(overall, 10.0, noise_seed, IDX_APPROVAL) {
            value if value > 65.0 => ApprovalVague::Popular,
            value if value > 40.0 => ApprovalVague::Mixed,
            value if value > 20.0 => ApprovalVague::Unpopular,
            _ => ApprovalVague::Crisis,
        };

        let role_view = if let Some(citizen) = player.citizen.as_ref() {
            RoleView::Citizen {
                employed: citizen.employed,
                mood: mood_bucket(citizen.satisfaction),
            }
        } else if let Some(business) = player.business.as_ref() {
            RoleView::BusinessOwner {
                employees: business.employees,
                production_capacity: business.production_capacity,
                wage_level: business.wage_level,
                labor_mood: labor_mood_bucket(business.strike_risk),
            }
        } else if let Some(politician) = player.politician.as_ref() {
            let approval_estimate =
                rng::noise(overall, 8.0, noise_seed, IDX_APPROVAL_ESTIMATE).round() as i64;
            let unemployment_estimate = (rng::noise(
                economy.unemployment,
                3.0,
                noise_seed,
                IDX_UNEMPLOYMENT_ESTIMATE,
            ) * 10.0)
                .round()
                / 10.0;
            RoleView::Politician {
                laws_proposed: politician.laws_proposed,
                laws_passed: politician.laws_passed,
                approval_estimate,
                unemployment_estimate,
            }
        } else {
            return None;
        };

        Some(PlayerView {
            tick: meta.tick,
            phase: meta.phase,
            price_trend,
            availability,
            approval_vague,
            wealth: (player.visible_stats.wealth * 100.0).round() / 100.0,
            headlines: self.state.media.headlines.clone(),
            rumors: self.state.media.rumors.clone(),
            role_view,
        })
    }
}

fn mood_bucket(satisfaction: f64) -> Mood {
    if satisfaction > 70.0 {
        Mood::Content
    } else if satisfaction > 40.0 {
        Mood::Neutral
    } else if satisfaction > 20.0 {
        Mood::Frustrated
    } else {
        Mood::Angry
    }
}

fn labor_mood_bucket(strike_risk: f64) -> LaborMood {
    if strike_risk < 0.3 {
        LaborMood::Calm
    } else if strike_risk < 0.6 {
        LaborMood::Tense
    } else if strike_risk < 0.8 {
        LaborMood::Restive
    } else {
        LaborMood::Striking
    }
}
