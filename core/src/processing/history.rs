use std::collections::{vec_deque, VecDeque};

use crate::protocol::PolarSample;

/// Bounded FIFO of recent samples for the trailing sweep trace.
pub struct SampleHistory {
    samples: VecDeque<PolarSample>,
    capacity: usize,
}

impl SampleHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends `sample`, evicting the oldest entries beyond capacity.
    pub fn record(&mut self, sample: PolarSample) {
        if self.capacity == 0 {
            return;
        }
        while self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Oldest-first view; each call starts a fresh walk.
    pub fn iter(&self) -> vec_deque::Iter<'_, PolarSample> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn to_vec(&self) -> Vec<PolarSample> {
        self.samples.iter().copied().collect()
    }
}

impl<'a> IntoIterator for &'a SampleHistory {
    type Item = &'a PolarSample;
    type IntoIter = vec_deque::Iter<'a, PolarSample>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn sample(angle: f64, at: Instant) -> PolarSample {
        PolarSample::new(angle, 100.0, at)
    }

    #[test]
    fn history_is_capped_with_oldest_evicted() {
        let now = Instant::now();
        let mut history = SampleHistory::with_capacity(360);
        for i in 0..400 {
            history.record(sample(i as f64, now));
        }
        assert_eq!(history.len(), 360);
        assert_eq!(history.iter().next().unwrap().angle, 40.0);
        assert_eq!(history.iter().last().unwrap().angle, 399.0);
    }

    #[test]
    fn iteration_is_restartable_in_insertion_order() {
        let now = Instant::now();
        let mut history = SampleHistory::with_capacity(4);
        for i in 0..3 {
            history.record(sample(i as f64, now));
        }
        let first: Vec<f64> = history.iter().map(|s| s.angle).collect();
        let second: Vec<f64> = (&history).into_iter().map(|s| s.angle).collect();
        assert_eq!(first, vec![0.0, 1.0, 2.0]);
        assert_eq!(first, second);
    }

    #[test]
    fn clear_empties_history() {
        let mut history = SampleHistory::with_capacity(2);
        history.record(sample(1.0, Instant::now()));
        history.clear();
        assert!(history.is_empty());
    }
}
