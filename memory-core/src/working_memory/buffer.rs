//! Bounded working-memory buffer (spec §4.5).

use chrono::{DateTime, Utc};

use crate::config::WorkingMemoryConfig;
use crate::types::{ItemRef, WorkingMemorySlot};

/// The outcome of inserting into a full buffer: the evictee, and whether its
/// composite score cleared the consolidation-routing threshold (spec §4.5
/// "Consolidation trigger").
#[derive(Debug, Clone)]
pub struct EvictionOutcome {
    pub evicted: WorkingMemorySlot,
    pub should_route_to_storage: bool,
}

/// A small, ordered, capacity-bounded set of salience-scored slots modelling
/// short-term focus (spec §3 "Working-memory slot", §4.5).
#[derive(Debug)]
pub struct WorkingMemoryBuffer {
    config: WorkingMemoryConfig,
    slots: Vec<WorkingMemorySlot>,
}

impl WorkingMemoryBuffer {
    #[must_use]
    pub fn new(config: WorkingMemoryConfig) -> Self {
        Self {
            config,
            slots: Vec::with_capacity(config.capacity),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use]
    pub fn slots(&self) -> &[WorkingMemorySlot] {
        &self.slots
    }

    fn composite(&self, slot: &WorkingMemorySlot, now: DateTime<Utc>) -> f64 {
        let age_min = (now - slot.last_reinforced).num_seconds() as f64 / 60.0;
        let recency = self.config.decay_per_min.powf(age_min.max(0.0));
        self.config.alpha * slot.salience + (1.0 - self.config.alpha) * recency
    }

    /// Apply time decay to every slot's salience (spec §4.5 "Decay").
    pub fn decay(&mut self, now: DateTime<Utc>) {
        for slot in &mut self.slots {
            let age_min = (now - slot.last_reinforced).num_seconds() as f64 / 60.0;
            if age_min > 0.0 {
                slot.salience *= self.config.decay_per_min.powf(age_min);
                slot.last_reinforced = now;
            }
        }
    }

    /// Reinforce a slot already present, returning `true` if found (spec
    /// §4.5 "Reinforcement on re-reference").
    pub fn reinforce(&mut self, item_ref: ItemRef, now: DateTime<Utc>) -> bool {
        if let Some(slot) = self.slots.iter_mut().find(|s| s.item_ref == item_ref) {
            slot.salience = (slot.salience + self.config.reinforcement_delta).min(1.0);
            slot.last_reinforced = now;
            true
        } else {
            false
        }
    }

    /// Insert a new item. If the buffer is full, evicts the lowest-composite
    /// slot first and reports whether that evictee should be routed to
    /// persistent storage instead of dropped (spec §4.5).
    pub fn insert(
        &mut self,
        item_ref: ItemRef,
        salience: f64,
        now: DateTime<Utc>,
    ) -> Option<EvictionOutcome> {
        if self.reinforce(item_ref, now) {
            return None;
        }

        let mut outcome = None;
        if self.slots.len() >= self.config.capacity {
            let evict_idx = self
                .slots
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| {
                    self.composite(a, now)
                        .partial_cmp(&self.composite(b, now))
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .map(|(i, _)| i)
                .expect("capacity > 0 implies non-empty buffer when full");
            let evicted = self.slots.remove(evict_idx);
            let should_route_to_storage = self.composite(&evicted, now) >= self.config.route_threshold;
            outcome = Some(EvictionOutcome {
                evicted,
                should_route_to_storage,
            });
        }

        self.slots.push(WorkingMemorySlot {
            item_ref,
            salience: salience.clamp(0.0, 1.0),
            inserted_at: now,
            last_reinforced: now,
        });
        outcome
    }
}
