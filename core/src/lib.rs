//! Telemetry decoding and target detection for the LoRa radar link.
//!
//! Raw chunks from the serial bridge are decoded, framed into lines,
//! parsed into telemetry messages and fanned out to the live reading,
//! a bounded sample history, and a per-bearing change detector.

pub mod clock;
pub mod math;
pub mod pipeline;
pub mod prelude;
pub mod processing;
pub mod protocol;
pub mod session;
pub mod telemetry;
pub mod transport;

pub use pipeline::{IngestReport, RadarPipeline, RadarSnapshot};
pub use prelude::{PipelineConfig, PipelineError, PipelineResult};
pub use protocol::{Command, DetectedTarget, PolarSample, RawChunk, TelemetryMessage};
pub use session::RadarSession;
