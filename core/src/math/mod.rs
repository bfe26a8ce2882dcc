pub mod angle;
pub mod display;

pub use angle::{bearing_bucket, round_half_up};
pub use display::{fade, in_display_range, polar_to_scope, ScopePoint};
