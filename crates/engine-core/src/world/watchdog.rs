//! Threshold watchdog: static trigger table scanned every tick, emitting
//! narrative-only events with per-type cooldowns.

use contracts::{EventSource, EventStatus, GameEvent};

use super::GameWorld;
use crate::{kernel, rng};

struct ThresholdTrigger {
    variable: &'static str,
    above: bool,
    value: f64,
    event_type: &'static str,
    severity: u8,
    cooldown_ticks: u64,
}

static TRIGGERS: &[ThresholdTrigger] = &[
    ThresholdTrigger { variable: "economy.gdp", above: false, value: 100.0, event_type: "economic_crisis", severity: 5, cooldown_ticks: 10 },
    ThresholdTrigger { variable: "economy.inflation", above: true, value: 50.0, event_type: "hyperinflation", severity: 4, cooldown_ticks: 5 },
    ThresholdTrigger { variable: "economy.unemployment", above: true, value: 25.0, event_type: "protest", severity: 3, cooldown_ticks: 3 },
    ThresholdTrigger { variable: "society.stability", above: false, value: 20.0, event_type: "revolution", severity: 5, cooldown_ticks: 20 },
    ThresholdTrigger { variable: "society.stability", above: true, value: 90.0, event_type: "scandal", severity: 2, cooldown_ticks: 5 },
    ThresholdTrigger { variable: "society.radicalization", above: true, value: 80.0, event_type: "revolution", severity: 4, cooldown_ticks: 15 },
    ThresholdTrigger { variable: "society.radicalization", above: true, value: 60.0, event_type: "movement_formed", severity: 2, cooldown_ticks: 5 },
    ThresholdTrigger { variable: "economy.budget.reserves", above: false, value: 0.0, event_type: "budget_crisis", severity: 3, cooldown_ticks: 5 },
];

impl GameWorld {
    /// Entries fire independently; several may fire in one tick. Cooldowns
    /// are keyed by event type, so the two revolution triggers share one.
    pub(super) fn scan_thresholds(&mut self, tick: u64, sequence: &mut u64) {
        for trigger in TRIGGERS {
            let Some(current) = kernel::get(&self.state, trigger.variable) else {
                continue;
            };
            let crossed = if trigger.above {
                current > trigger.value
            } else {
                current < trigger.value
            };
            if !crossed {
                continue;
            }
            if let Some(last) = self.watchdog_cooldowns.get(trigger.event_type) {
                if tick.saturating_sub(*last) <= trigger.cooldown_ticks {
                    continue;
                }
            }
            self.watchdog_cooldowns.insert(trigger.event_type, tick);

            let id = rng::seeded_id("evt", self.state.meta.seed, tick, *sequence);
            *sequence += 1;
            let direction = if trigger.above { "rose above" } else { "fell below" };
            self.state.events.push(GameEvent {
                id,
                source: EventSource::CoreEngine,
                tick,
                event_type: trigger.event_type.to_string(),
                severity: trigger.severity,
                status: EventStatus::Applied,
                description: format!("{} {direction} {}", trigger.variable, trigger.value),
                modifiers: Vec::new(),
                duration_ticks: None,
                expires_tick: None,
                narrative_hook: None,
            });
        }
    }
}
