pub mod chunk;
pub mod command;
pub mod detection;
pub mod message;

pub use chunk::RawChunk;
pub use command::Command;
pub use detection::{DetectedTarget, PolarSample, TargetId};
pub use message::{TelemetryMessage, WireFrame};
