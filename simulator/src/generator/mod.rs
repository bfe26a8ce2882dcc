pub mod encoding;
pub mod profile;

pub use encoding::{encode_chunks, ChunkEncoding};
pub use profile::{build_frames, ready_frame, ScenarioConfig};
