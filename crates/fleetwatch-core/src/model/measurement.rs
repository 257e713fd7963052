// ── Measurement samples and bounded history ──

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::EntityId;

/// Inclusive load band considered healthy. Values outside it (other than
/// zero, which means offline) put an entity into warning.
pub const VALID_BAND: (f64, f64) = (45.0, 75.0);

/// Samples retained per entity for charting. Oldest evicted first.
pub const DEFAULT_HISTORY_DEPTH: usize = 5;

/// One load measurement as reported over the wire. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementSample {
    pub entity_id: EntityId,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
    pub is_valid: bool,
}

impl MeasurementSample {
    pub fn new(entity_id: EntityId, value: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            entity_id,
            value,
            timestamp,
            is_valid: (VALID_BAND.0..=VALID_BAND.1).contains(&value),
        }
    }
}

/// FIFO ring of the most recent samples for one entity.
#[derive(Debug, Clone)]
pub struct MeasurementHistory {
    samples: VecDeque<MeasurementSample>,
    depth: usize,
}

impl Default for MeasurementHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_DEPTH)
    }
}

impl MeasurementHistory {
    pub fn new(depth: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(depth),
            depth,
        }
    }

    /// Append a sample, evicting the oldest if the ring is full.
    /// Depth zero retains nothing.
    pub fn push(&mut self, sample: MeasurementSample) {
        if self.depth == 0 {
            return;
        }
        while self.samples.len() >= self.depth {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Oldest-first view of the retained samples.
    pub fn samples(&self) -> impl Iterator<Item = &MeasurementSample> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample(value: f64) -> MeasurementSample {
        MeasurementSample::new(EntityId::new(1).unwrap(), value, Utc::now())
    }

    #[test]
    fn sample_validity_uses_inclusive_band() {
        assert!(sample(45.0).is_valid);
        assert!(sample(75.0).is_valid);
        assert!(!sample(44.99).is_valid);
        assert!(!sample(80.0).is_valid);
        assert!(!sample(0.0).is_valid);
    }

    #[test]
    fn history_evicts_oldest_on_overflow() {
        let mut history = MeasurementHistory::new(3);
        for v in [1.0, 2.0, 3.0, 4.0] {
            history.push(sample(v));
        }
        let values: Vec<f64> = history.samples().map(|s| s.value).collect();
        assert_eq!(values, vec![2.0, 3.0, 4.0]);
        assert_eq!(history.len(), 3);
    }
}
