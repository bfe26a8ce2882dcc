pub mod decoder;
pub mod detector;
pub mod framer;
pub mod history;
pub mod parser;
pub mod state;
pub mod sweep;

pub use decoder::ChunkDecoder;
pub use detector::TargetDetector;
pub use framer::LineFramer;
pub use history::SampleHistory;
pub use parser::MessageParser;
pub use state::TelemetryState;
pub use sweep::{SweepLoop, SweepSmoother};
