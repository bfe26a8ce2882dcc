/// Rounds half toward positive infinity, so `-2.5` becomes `-2`.
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Coarse bearing key: index of the nearest multiple of `width`, so
/// bucket `n` covers bearings around `n * width`.
pub fn bearing_bucket(angle: f64, width: f64) -> i64 {
    let width = if width > 0.0 { width } else { 1.0 };
    round_half_up(angle / width) as i64
}
