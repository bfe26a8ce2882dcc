//! Geometry and fade helpers for a radar-style display client.
//!
//! Bearings are clockwise from the top of the scope; ranges outside
//! `(0, max_distance)` are not drawn.

use serde::Serialize;

use crate::prelude::DisplayConfig;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScopePoint {
    pub x: f64,
    pub y: f64,
}

/// Projects a polar reading onto a square scope of `size` units centred on
/// `(size / 2, size / 2)`, leaving `margin` units of border.
pub fn polar_to_scope(angle: f64, distance: f64, size: f64, margin: f64, max_distance: f64) -> ScopePoint {
    let center = size / 2.0;
    let radius = (distance / max_distance) * (center - margin);
    let radians = (angle - 90.0).to_radians();
    ScopePoint {
        x: center + radius * radians.cos(),
        y: center + radius * radians.sin(),
    }
}

pub fn in_display_range(distance: f64, config: &DisplayConfig) -> bool {
    distance > 0.0 && distance < config.max_distance
}

/// Linear fade from 1 at age 0 down to `floor` at `horizon_ms`.
pub fn fade(age_ms: u64, horizon_ms: u64, floor: f64) -> f64 {
    if horizon_ms == 0 {
        return floor;
    }
    (1.0 - age_ms as f64 / horizon_ms as f64).max(floor)
}
