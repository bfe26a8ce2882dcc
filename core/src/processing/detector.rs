use std::collections::HashMap;
use std::time::Instant;

use crate::math::angle::bearing_bucket;
use crate::prelude::DetectorConfig;
use crate::protocol::{DetectedTarget, TargetId};
use crate::telemetry::log::LogManager;

/// Edge-triggered change detector over bearing buckets.
///
/// Each bucket remembers the last distance seen there. A reading that
/// jumps by more than the change threshold from that previous value is a
/// candidate target; candidates that fall inside the dedup window of a
/// live target are dropped. Live targets are kept in arrival order and
/// expire after `expiry_ms`. The baseline slides forward on every
/// reading, whether or not a target fired.
pub struct TargetDetector {
    config: DetectorConfig,
    baselines: HashMap<i64, f64>,
    targets: Vec<DetectedTarget>,
    next_id: u64,
    logger: LogManager,
}

impl TargetDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            baselines: HashMap::new(),
            targets: Vec::new(),
            next_id: 0,
            logger: LogManager::new("detector"),
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Feeds one reading taken at `now` and returns the target it created, if any.
    pub fn observe(&mut self, angle: f64, distance: f64, now: Instant) -> Option<DetectedTarget> {
        if !angle.is_finite() || !distance.is_finite() {
            self.logger
                .irregularity(&format!("ignoring non-finite reading {}/{}", angle, distance));
            return None;
        }

        let bucket = bearing_bucket(angle, self.config.bucket_deg);
        let previous = self.baselines.get(&bucket).copied();

        self.prune(now);

        let detected = match previous {
            Some(previous) if self.is_change(previous, distance) => {
                self.insert_unless_duplicate(angle, distance, now)
            }
            _ => None,
        };

        self.baselines.insert(bucket, distance);
        detected
    }

    fn is_change(&self, previous: f64, distance: f64) -> bool {
        distance > 0.0 && (distance - previous).abs() > self.config.change_threshold
    }

    fn insert_unless_duplicate(&mut self, angle: f64, distance: f64, now: Instant) -> Option<DetectedTarget> {
        let duplicate = self.targets.iter().any(|target| {
            target.is_near(
                angle,
                distance,
                self.config.dedup_angle_deg,
                self.config.dedup_distance,
            )
        });
        if duplicate {
            self.logger
                .trace(&format!("duplicate candidate at {:.1}°/{:.0}", angle, distance));
            return None;
        }

        let target = DetectedTarget::new(TargetId(self.next_id), angle, distance, now);
        self.next_id += 1;
        self.logger.record(&format!(
            "{} detected at {:.1}°, distance {:.0}",
            target.id, angle, distance
        ));
        self.targets.push(target.clone());
        Some(target)
    }

    /// Drops every target whose age at `now` has reached the expiry window.
    pub fn prune(&mut self, now: Instant) {
        let expiry_ms = self.config.expiry_ms;
        self.targets.retain(|target| target.age_ms(now) < expiry_ms);
    }

    /// Live targets in arrival order, as of the last observation.
    pub fn targets(&self) -> &[DetectedTarget] {
        &self.targets
    }

    /// Targets still live at `now`, without mutating the list.
    pub fn live_targets(&self, now: Instant) -> Vec<DetectedTarget> {
        self.targets
            .iter()
            .filter(|target| target.age_ms(now) < self.config.expiry_ms)
            .cloned()
            .collect()
    }

    pub fn baseline(&self, bucket: i64) -> Option<f64> {
        self.baselines.get(&bucket).copied()
    }

    /// Forgets every target and every bucket baseline. Ids keep counting.
    pub fn clear(&mut self) {
        self.targets.clear();
        self.baselines.clear();
    }
}

impl Default for TargetDetector {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn detection_needs_a_previous_reading_and_a_jump() {
        let mut detector = TargetDetector::default();
        let now = Instant::now();
        assert!(detector.observe(10.0, 100.0, now).is_none());
        assert!(detector.observe(10.0, 100.0, now).is_none());
        let target = detector.observe(10.0, 200.0, now).unwrap();
        assert_eq!(target.id, TargetId(0));
        assert_eq!(target.distance, 200.0);
        assert_eq!(detector.targets().len(), 1);
    }

    #[test]
    fn change_at_threshold_does_not_fire() {
        let mut detector = TargetDetector::default();
        let now = Instant::now();
        detector.observe(40.0, 300.0, now);
        assert!(detector.observe(40.0, 350.0, now).is_none());
        assert!(detector.observe(40.0, 400.1, now).is_some());
    }

    #[test]
    fn zero_distance_never_fires() {
        let mut detector = TargetDetector::default();
        let now = Instant::now();
        detector.observe(90.0, 500.0, now);
        assert!(detector.observe(90.0, 0.0, now).is_none());
        assert_eq!(detector.baseline(18), Some(0.0));
    }

    #[test]
    fn baseline_slides_even_without_detection() {
        let mut detector = TargetDetector::default();
        let now = Instant::now();
        detector.observe(20.0, 100.0, now);
        detector.observe(21.0, 130.0, now);
        detector.observe(19.0, 160.0, now);
        assert_eq!(detector.baseline(4), Some(160.0));
        assert!(detector.targets().is_empty());
    }

    #[test]
    fn duplicates_inside_window_are_dropped() {
        let mut detector = TargetDetector::default();
        let now = Instant::now();
        detector.observe(30.0, 100.0, now);
        let first = detector.observe(30.0, 300.0, now).unwrap();

        detector.observe(35.0, 100.0, now);
        assert!(detector.observe(35.0, 350.0, now).is_none());
        assert_eq!(detector.targets(), &[first.clone()][..]);

        detector.observe(45.0, 100.0, now);
        assert!(detector.observe(45.0, 300.0, now).is_some());
        assert_eq!(detector.targets().len(), 2);
    }

    #[test]
    fn duplicate_does_not_refresh_existing_target() {
        let mut detector = TargetDetector::default();
        let start = Instant::now();
        detector.observe(60.0, 100.0, start);
        let original = detector.observe(60.0, 300.0, start).unwrap();

        let later = start + Duration::from_millis(10_000);
        detector.observe(60.0, 100.0, later);
        detector.observe(60.0, 310.0, later);
        assert_eq!(detector.targets()[0].timestamp, original.timestamp);
    }

    #[test]
    fn expired_targets_are_pruned_on_next_observation() {
        let mut detector = TargetDetector::default();
        let start = Instant::now();
        detector.observe(10.0, 100.0, start);
        detector.observe(10.0, 250.0, start);
        assert_eq!(detector.targets().len(), 1);

        let later = start + Duration::from_millis(30_000);
        assert_eq!(detector.live_targets(later).len(), 0);
        detector.observe(200.0, 50.0, later);
        assert!(detector.targets().is_empty());
    }

    #[test]
    fn expired_target_no_longer_blocks_a_new_one() {
        let mut detector = TargetDetector::default();
        let start = Instant::now();
        detector.observe(10.0, 100.0, start);
        detector.observe(10.0, 250.0, start);

        let later = start + Duration::from_millis(31_000);
        let fresh = detector.observe(10.0, 180.0, later).unwrap();
        assert_eq!(fresh.id, TargetId(1));
        assert_eq!(detector.targets().len(), 1);
    }

    #[test]
    fn fractional_bucket_width_separates_adjacent_bearings() {
        let mut detector = TargetDetector::new(DetectorConfig {
            bucket_deg: 0.5,
            ..Default::default()
        });
        let now = Instant::now();
        detector.observe(1.0, 100.0, now);
        assert!(detector.observe(1.5, 300.0, now).is_none());
        assert_eq!(detector.baseline(2), Some(100.0));
        assert_eq!(detector.baseline(3), Some(300.0));
    }

    #[test]
    fn clear_resets_targets_and_baselines_but_not_ids() {
        let mut detector = TargetDetector::default();
        let now = Instant::now();
        detector.observe(10.0, 100.0, now);
        detector.observe(10.0, 250.0, now);
        detector.clear();
        assert!(detector.targets().is_empty());
        assert_eq!(detector.baseline(2), None);

        assert!(detector.observe(10.0, 400.0, now).is_none());
        let next = detector.observe(10.0, 100.0, now).unwrap();
        assert_eq!(next.id, TargetId(1));
    }
}
