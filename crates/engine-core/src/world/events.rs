//! Pending-event processing: expiry, priority ordering, and all-or-nothing
//! modifier batches.

use std::cmp::Ordering;

use contracts::EventStatus;

use super::tick::TickCounters;
use super::GameWorld;
use crate::kernel;

impl GameWorld {
    pub(super) fn process_events(&mut self, tick: u64, counters: &mut TickCounters) {
        // Applied events whose window has closed expire first.
        for event in self.state.events.iter_mut() {
            if event.status == EventStatus::Applied
                && event.expires_tick.is_some_and(|expires| expires <= tick)
            {
                event.status = EventStatus::Expired;
                counters.events_expired += 1;
            }
        }

        let mut pending: Vec<usize> = self
            .state
            .events
            .iter()
            .enumerate()
            .filter(|(_, event)| event.status == EventStatus::Pending)
            .map(|(index, _)| index)
            .collect();
        pending.sort_by(|&a, &b| {
            let left = &self.state.events[a];
            let right = &self.state.events[b];
            match right.source.priority().cmp(&left.source.priority()) {
                Ordering::Equal => left.id.cmp(&right.id),
                ordering => ordering,
            }
        });

        for index in pending {
            let (id, modifiers, duration) = {
                let event = &self.state.events[index];
                (event.id.clone(), event.modifiers.clone(), event.duration_ticks)
            };

            let applied = if modifiers.is_empty() {
                true
            } else {
                let tag = format!("event:{id}");
                kernel::apply_batch(&mut self.state, &modifiers, &tag).is_ok()
            };

            let event = &mut self.state.events[index];
            if applied {
                event.status = EventStatus::Applied;
                event.expires_tick = duration.map(|ticks| tick + ticks);
                counters.events_applied += 1;
            } else {
                event.status = EventStatus::Rejected;
                counters.events_rejected += 1;
            }
        }
    }
}
