//! The tick orchestrator: one full phase sequence, ending in finalize.

use std::collections::BTreeMap;

use contracts::{Phase, TickLogEntry, TICK_LOG_CAP};
use serde_json::Value;

use super::GameWorld;
use crate::advisor::AdvisorSuite;
use crate::hashing;

const HISTORY_SAMPLE_CAP: usize = 10;

#[derive(Debug, Clone, Copy, Default)]
pub(super) struct TickCounters {
    pub actions_resolved: u32,
    pub actions_skipped: u32,
    pub events_applied: u32,
    pub events_rejected: u32,
    pub events_expired: u32,
    pub laws_enacted: u32,
    pub laws_rejected: u32,
    pub advisor_failures: u32,
}

/// What one tick did, as appended to the audit log.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub content_hash: String,
    pub actions_resolved: u32,
    pub actions_skipped: u32,
    pub events_applied: u32,
    pub events_rejected: u32,
    pub events_expired: u32,
    pub laws_enacted: u32,
    pub laws_rejected: u32,
    pub advisor_failures: u32,
}

impl GameWorld {
    /// Run exactly one tick. Never aborts: every failure path inside is a
    /// logged rejection or an advisor fallback, and finalize always runs.
    pub fn run_tick(&mut self, advisors: &dyn AdvisorSuite) -> TickReport {
        let tick = self.state.meta.tick;
        let mut counters = TickCounters::default();
        let mut advisor_outputs: BTreeMap<String, Value> = BTreeMap::new();
        // Shared stream index for every id minted during this tick.
        let mut sequence = 0_u64;

        tracing::info!(server = self.server_id(), tick, "tick started");

        self.state.meta.phase = Phase::Processing;
        let drained = self.drain_pending_actions(tick);
        self.resolve_actions(tick, &drained, &mut counters);
        self.recalculate();
        let newly_active = self.advance_laws(tick, &mut counters);

        self.state.meta.phase = Phase::AiEvaluation;
        self.run_advisor_pipeline(
            tick,
            &newly_active,
            advisors,
            &mut counters,
            &mut advisor_outputs,
            &mut sequence,
        );

        self.state.meta.phase = Phase::Resolved;
        self.scan_thresholds(tick, &mut sequence);
        self.process_events(tick, &mut counters);
        self.run_historian(tick, advisors, &mut counters, &mut advisor_outputs);

        let report = self.finalize(tick, counters, advisor_outputs);
        tracing::info!(
            server = self.server_id(),
            tick,
            hash = report.content_hash.as_str(),
            "tick finalized"
        );
        report
    }

    fn finalize(
        &mut self,
        tick: u64,
        counters: TickCounters,
        advisor_outputs: BTreeMap<String, Value>,
    ) -> TickReport {
        for player in self.state.players.values_mut() {
            if let Some(citizen) = player.citizen.as_mut() {
                citizen.voted_this_tick = false;
            }
        }

        push_sample(&mut self.state.history.stability_samples, self.state.society.stability);
        push_sample(&mut self.state.history.gdp_samples, self.state.economy.gdp);

        self.state.meta.tick = tick + 1;
        self.state.meta.seed = self.state.meta.seed.wrapping_add(1);
        self.state.meta.phase = Phase::AcceptingActions;
        self.state.meta.tick_deadline_ms += self.config.tick_interval_ms();

        // The hash covers everything finalize decided; the log entry that
        // carries it is appended after, so replays can verify it.
        let content_hash = hashing::content_hash(&self.state);

        self.state.tick_log.push(TickLogEntry {
            tick,
            actions_resolved: counters.actions_resolved,
            actions_skipped: counters.actions_skipped,
            events_applied: counters.events_applied,
            events_rejected: counters.events_rejected,
            events_expired: counters.events_expired,
            laws_enacted: counters.laws_enacted,
            laws_rejected: counters.laws_rejected,
            advisor_failures: counters.advisor_failures,
            content_hash: content_hash.clone(),
            advisor_outputs,
        });
        while self.state.tick_log.len() > TICK_LOG_CAP {
            self.state.tick_log.remove(0);
        }

        TickReport {
            tick,
            content_hash,
            actions_resolved: counters.actions_resolved,
            actions_skipped: counters.actions_skipped,
            events_applied: counters.events_applied,
            events_rejected: counters.events_rejected,
            events_expired: counters.events_expired,
            laws_enacted: counters.laws_enacted,
            laws_rejected: counters.laws_rejected,
            advisor_failures: counters.advisor_failures,
        }
    }
}

fn push_sample(samples: &mut Vec<f64>, value: f64) {
    samples.push(value);
    while samples.len() > HISTORY_SAMPLE_CAP {
        samples.remove(0);
    }
}
