use serde::{Deserialize, Serialize};

use crate::transport::TransportError;

/// Thresholds for the per-bearing change detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Width of a bearing bucket in degrees.
    pub bucket_deg: f64,
    /// Minimum distance jump against the previous reading in the same bucket.
    pub change_threshold: f64,
    /// Age at which a detected target is dropped.
    pub expiry_ms: u64,
    pub dedup_angle_deg: f64,
    pub dedup_distance: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            bucket_deg: 5.0,
            change_threshold: 50.0,
            expiry_ms: 30_000,
            dedup_angle_deg: 10.0,
            dedup_distance: 100.0,
        }
    }
}

/// Cadence and easing of the displayed sweep angle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub tick_ms: u64,
    /// Fraction of the remaining difference covered per tick.
    pub easing: f64,
    /// Below this difference the displayed angle snaps to the target.
    pub snap_deg: f64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            tick_ms: 16,
            easing: 0.1,
            snap_deg: 0.5,
        }
    }
}

/// Projection and fade parameters handed to the display client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub max_distance: f64,
    pub target_fade_ms: u64,
    pub point_min_opacity: f64,
    pub target_min_opacity: f64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_distance: 2_000.0,
            target_fade_ms: 30_000,
            point_min_opacity: 0.1,
            target_min_opacity: 0.3,
        }
    }
}

/// Shared configuration for the whole telemetry pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub history_capacity: usize,
    pub fade_horizon_ms: u64,
    pub detector: DetectorConfig,
    pub sweep: SweepConfig,
    pub display: DisplayConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            history_capacity: 360,
            fade_horizon_ms: 5_000,
            detector: DetectorConfig::default(),
            sweep: SweepConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

/// A chunk that could only be partially decoded.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("decode irregularity: {reason}")]
pub struct DecodeIrregularity {
    pub reason: String,
    /// Text recovered from the well-formed part of the chunk.
    pub salvaged: String,
}

/// Common error type for pipeline steps. None of these are fatal.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Decode(#[from] DecodeIrregularity),
    #[error("frame parse error: {0}")]
    FrameParse(String),
    #[error("field `{field}` is not a finite number")]
    FieldCoercion { field: &'static str },
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),
    #[error("transport is not connected")]
    NotConnected,
}

pub type PipelineResult<T> = Result<T, PipelineError>;
