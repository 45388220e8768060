//! Stateful delta engine: turns pairs of raw counter samples into rates.
//!
//! A cumulative kernel counter is only meaningful as a difference between two
//! reads separated by a known interval. [`DeltaTable`] remembers the previous
//! sample per entity and classifies every new observation:
//!
//! - first sample for an entity → [`DeltaOutcome::First`], never a fabricated
//!   rate;
//! - non-positive elapsed time (stale or retrograde clock) →
//!   [`DeltaOutcome::Stale`]; the stored sample is **replaced** with the
//!   current one so a transient clock glitch self-heals on the next cycle;
//! - otherwise a [`DeltaWindow`] with per-field deltas, where a decreased
//!   counter (wraparound or reset) degrades only that field, not the entity.

use std::collections::HashMap;

use crate::sample::RawSample;

/// Delta of one counter field across a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDelta {
    /// Non-negative counter difference.
    Counted(u64),
    /// Counter decreased between samples; no rate this cycle. The new raw
    /// value is already stored as the baseline for the next one.
    Reset,
}

/// Per-field deltas for one entity over a positive elapsed interval.
#[derive(Debug, Clone, PartialEq)]
pub struct DeltaWindow {
    /// Elapsed seconds between the two samples. Always > 0.
    pub elapsed: f64,
    pub deltas: HashMap<String, FieldDelta>,
}

impl DeltaWindow {
    /// The counted delta for a field, or `None` if the field was absent in
    /// either sample or reset in between.
    pub fn counted(&self, field: &str) -> Option<u64> {
        match self.deltas.get(field) {
            Some(FieldDelta::Counted(d)) => Some(*d),
            _ => None,
        }
    }

    /// Whether any field of this window hit a counter reset.
    pub fn any_reset(&self) -> bool {
        self.deltas.values().any(|d| matches!(d, FieldDelta::Reset))
    }

    /// Units per second for a counted field.
    pub fn rate(&self, field: &str) -> Option<f64> {
        self.counted(field).map(|d| rate(d, self.elapsed))
    }
}

/// Result of observing one sample for one entity.
#[derive(Debug, Clone, PartialEq)]
pub enum DeltaOutcome {
    /// First sample for this entity; no rate yet.
    First,
    /// Elapsed time was zero or negative; no rate this cycle.
    Stale,
    Window(DeltaWindow),
}

// ---------------------------------------------------------------------------
// DeltaTable
// ---------------------------------------------------------------------------

/// Previous-sample state for one collector's entities.
///
/// Owned exclusively by the collector that feeds it; entries for vanished
/// entities must be dropped via [`DeltaTable::retain`] or
/// [`DeltaTable::remove`] so a future entity reusing the same identifier
/// never inherits stale state.
#[derive(Debug, Default)]
pub struct DeltaTable {
    prev: HashMap<String, RawSample>,
}

impl DeltaTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the current sample for its entity, returning the delta outcome.
    /// The current sample always becomes the stored baseline.
    pub fn observe(&mut self, current: RawSample) -> DeltaOutcome {
        let key = current.entity_id.clone();
        let previous = self.prev.insert(key, current.clone());

        let Some(previous) = previous else {
            return DeltaOutcome::First;
        };

        let elapsed = current.timestamp - previous.timestamp;
        if elapsed <= 0.0 {
            log::warn!(
                "entity {}: non-positive elapsed interval ({:.3}s), skipping delta",
                current.entity_id,
                elapsed
            );
            return DeltaOutcome::Stale;
        }

        let mut deltas = HashMap::with_capacity(current.fields.len());
        for (name, cur) in &current.fields {
            let Some(prev) = previous.fields.get(name) else {
                // Field appeared this cycle; it gets a baseline, not a rate.
                continue;
            };
            if cur >= prev {
                deltas.insert(name.clone(), FieldDelta::Counted(cur - prev));
            } else {
                log::warn!(
                    "entity {}: counter {} decreased ({} -> {}), treating as reset",
                    current.entity_id,
                    name,
                    prev,
                    cur
                );
                deltas.insert(name.clone(), FieldDelta::Reset);
            }
        }

        DeltaOutcome::Window(DeltaWindow { elapsed, deltas })
    }

    /// Drop state for every entity not accepted by `keep`.
    pub fn retain<F: FnMut(&str) -> bool>(&mut self, mut keep: F) {
        self.prev.retain(|k, _| keep(k));
    }

    pub fn remove(&mut self, entity_id: &str) {
        self.prev.remove(entity_id);
    }

    pub fn contains(&self, entity_id: &str) -> bool {
        self.prev.contains_key(entity_id)
    }

    pub fn len(&self) -> usize {
        self.prev.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prev.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Rate / percentage helpers
// ---------------------------------------------------------------------------

/// Units per second.
pub fn rate(delta: u64, elapsed: f64) -> f64 {
    if elapsed <= 0.0 {
        return 0.0;
    }
    delta as f64 / elapsed
}

/// Share of a maximum possible delta, unclamped.
pub fn percentage(delta: u64, max_delta: f64) -> f64 {
    if max_delta <= 0.0 {
        return 0.0;
    }
    100.0 * delta as f64 / max_delta
}

/// Clamp a percentage to `[0, 100 * unit_count]`.
///
/// Returns the clamped value and whether clamping occurred. Clamping means a
/// counter anomaly slipped past delta checks; callers surface it on the
/// snapshot rather than hiding it.
pub fn clamp_percent(value: f64, unit_count: usize) -> (f64, bool) {
    let max = 100.0 * unit_count.max(1) as f64;
    if value < 0.0 {
        (0.0, true)
    } else if value > max {
        (max, true)
    } else {
        (value, false)
    }
}
