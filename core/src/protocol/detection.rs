use serde::{Serialize, Serializer};
use std::fmt;
use std::time::Instant;

/// Unique token for a detected target, rendered as `target_<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(pub u64);

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "target_{}", self.0)
    }
}

impl Serialize for TargetId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One angle/distance reading stamped on arrival.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolarSample {
    pub angle: f64,
    pub distance: f64,
    pub timestamp: Instant,
}

impl PolarSample {
    pub fn new(angle: f64, distance: f64, timestamp: Instant) -> Self {
        Self {
            angle,
            distance,
            timestamp,
        }
    }

    /// Age relative to `now`, clamped at 0.
    pub fn age_ms(&self, now: Instant) -> u64 {
        now.saturating_duration_since(self.timestamp).as_millis() as u64
    }
}

/// Transient object inferred from a distance discontinuity. Never mutated
/// after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedTarget {
    pub id: TargetId,
    pub angle: f64,
    pub distance: f64,
    pub timestamp: Instant,
}

impl DetectedTarget {
    pub fn new(id: TargetId, angle: f64, distance: f64, timestamp: Instant) -> Self {
        Self {
            id,
            angle,
            distance,
            timestamp,
        }
    }

    pub fn age_ms(&self, now: Instant) -> u64 {
        now.saturating_duration_since(self.timestamp).as_millis() as u64
    }

    /// True when both bearing and range lie strictly inside the given windows.
    pub fn is_near(&self, angle: f64, distance: f64, angle_window: f64, distance_window: f64) -> bool {
        (self.angle - angle).abs() < angle_window && (self.distance - distance).abs() < distance_window
    }
}
