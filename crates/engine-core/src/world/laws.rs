//! Law lifecycle: one status hop per tick, vote resolution, and the
//! every-tick application of bound interpretations.

use contracts::LawStatus;

use super::tick::TickCounters;
use super::GameWorld;
use crate::kernel;

impl GameWorld {
    /// Advance every law at most one hop and apply the modifier batches of
    /// laws that were already active with a live interpretation. Returns the
    /// ids of laws that became active this tick; the judiciary stage binds
    /// their interpretations later in the same tick.
    pub(super) fn advance_laws(&mut self, tick: u64, counters: &mut TickCounters) -> Vec<String> {
        let mut newly_active = Vec::new();
        let mut passed_proposers = Vec::new();

        // Batches of previously-active laws, collected before any transition
        // so a law activated this tick is not applied twice.
        let standing: Vec<(String, Vec<contracts::Modifier>)> = self
            .state
            .laws
            .iter()
            .filter(|law| law.has_live_interpretation())
            .map(|law| {
                let modifiers = law
                    .judiciary_interpretation
                    .as_ref()
                    .map(|interpretation| interpretation.implementation.modifiers.clone())
                    .unwrap_or_default();
                (law.id.clone(), modifiers)
            })
            .collect();

        for law in self.state.laws.iter_mut() {
            match law.status {
                LawStatus::Proposed if tick > law.proposed_tick => {
                    law.status = LawStatus::Voting;
                }
                LawStatus::Voting => {
                    let decisive = law.votes.total_decisive();
                    if decisive > 0.0 {
                        if law.votes.for_ > law.votes.against {
                            law.status = LawStatus::Active;
                            law.activated_tick = Some(tick);
                            newly_active.push(law.id.clone());
                            passed_proposers.push(law.proposer.clone());
                            counters.laws_enacted += 1;
                        } else {
                            law.status = LawStatus::Rejected;
                            counters.laws_rejected += 1;
                        }
                    }
                    // Zero decisive votes: stays in voting one more tick.
                }
                _ => {}
            }
        }

        self.state.government.active_law_count += newly_active.len() as u32;
        for proposer in passed_proposers {
            if let Some(politician) = self
                .state
                .players
                .get_mut(&proposer)
                .and_then(|player| player.politician.as_mut())
            {
                politician.laws_passed += 1;
            }
        }

        for (law_id, modifiers) in standing {
            if modifiers.is_empty() {
                continue;
            }
            let tag = format!("law:{law_id}");
            if kernel::apply_batch(&mut self.state, &modifiers, &tag).is_err() {
                // The batch was rolled back; the law stays active but dead.
                if let Some(interpretation) = self
                    .state
                    .law_mut(&law_id)
                    .and_then(|law| law.judiciary_interpretation.as_mut())
                {
                    interpretation.rejected_by_core = true;
                }
            }
        }

        newly_active
    }
}
