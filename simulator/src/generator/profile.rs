use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Transient echo placed in the synthetic scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetSpec {
    pub angle: f64,
    pub distance: f64,
    /// First and last sweep pass (inclusive) on which the echo is present.
    pub first_pass: usize,
    pub last_pass: usize,
    /// Angular width of the echo in degrees.
    #[serde(default = "default_target_width")]
    pub width_deg: f64,
}

fn default_target_width() -> f64 {
    4.0
}

/// Configuration for generating a synthetic rotating-sensor stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub sweep_start_deg: f64,
    pub sweep_end_deg: f64,
    pub step_deg: f64,
    /// Number of sweeps; odd passes run backwards like a servo scanner.
    pub passes: usize,
    pub frame_interval_ms: u64,
    pub wall_distance: f64,
    pub noise: f64,
    pub seed: u64,
    pub targets: Vec<TargetSpec>,
    /// Emit angle/distance as numeric strings instead of numbers.
    pub string_fields: bool,
    /// Every Nth frame is preceded by a non-JSON log line (0 = never).
    pub banner_every: usize,
    /// Every Nth frame is truncated before its closing brace (0 = never).
    pub corrupt_every: usize,
    pub description: Option<String>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            sweep_start_deg: 0.0,
            sweep_end_deg: 180.0,
            step_deg: 2.0,
            passes: 6,
            frame_interval_ms: 50,
            wall_distance: 1_500.0,
            noise: 5.0,
            seed: 0,
            targets: vec![
                TargetSpec {
                    angle: 60.0,
                    distance: 600.0,
                    first_pass: 1,
                    last_pass: 3,
                    width_deg: 4.0,
                },
                TargetSpec {
                    angle: 120.0,
                    distance: 900.0,
                    first_pass: 2,
                    last_pass: 4,
                    width_deg: 4.0,
                },
            ],
            string_fields: false,
            banner_every: 0,
            corrupt_every: 0,
            description: None,
        }
    }
}

impl ScenarioConfig {
    fn sweep_angles(&self) -> Vec<f64> {
        let step = if self.step_deg > 0.0 { self.step_deg } else { 1.0 };
        let span = (self.sweep_end_deg - self.sweep_start_deg).max(0.0);
        let count = (span / step).floor() as usize + 1;
        (0..count)
            .map(|i| self.sweep_start_deg + i as f64 * step)
            .collect()
    }
}

fn echo_distance(config: &ScenarioConfig, pass: usize, angle: f64) -> f64 {
    config
        .targets
        .iter()
        .find(|t| {
            (t.first_pass..=t.last_pass).contains(&pass) && (angle - t.angle).abs() <= t.width_deg / 2.0
        })
        .map(|t| t.distance)
        .unwrap_or(config.wall_distance)
}

/// Wire text for every sweep step, in send order. Each entry is one
/// terminated frame plus any noise line sent ahead of it.
pub fn build_frames(config: &ScenarioConfig) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let forward = config.sweep_angles();
    let mut frames = Vec::with_capacity(forward.len() * config.passes);
    let mut index = 0usize;

    for pass in 0..config.passes {
        let angles: Box<dyn Iterator<Item = &f64>> = if pass % 2 == 0 {
            Box::new(forward.iter())
        } else {
            Box::new(forward.iter().rev())
        };

        for &angle in angles {
            index += 1;
            let jitter = if config.noise > 0.0 {
                rng.gen_range(-config.noise..config.noise)
            } else {
                0.0
            };
            let distance = (echo_distance(config, pass, angle) + jitter).round();

            let body = if config.string_fields {
                json!({
                    "angle": format!("{:.1}", angle),
                    "distance": format!("{:.0}", distance),
                    "connected": true,
                })
            } else {
                json!({ "angle": angle, "distance": distance, "connected": true })
            };

            let mut wire = String::new();
            if config.banner_every > 0 && index % config.banner_every == 0 {
                wire.push_str(&format!("relay rssi=-{} snr=7\n", 60 + index % 30));
            }
            let mut line = body.to_string();
            if config.corrupt_every > 0 && index % config.corrupt_every == 0 {
                line.pop();
            }
            wire.push_str(&line);
            wire.push('\n');

            frames.push(wire);
        }
    }
    frames
}

/// Status frame the relay sends once after boot.
pub fn ready_frame() -> String {
    format!("{}\n", json!({ "status": "ready", "connected": true }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn reading(wire: &str) -> (f64, f64) {
        let frame: Value = serde_json::from_str(wire.lines().last().unwrap()).unwrap();
        (frame["angle"].as_f64().unwrap(), frame["distance"].as_f64().unwrap())
    }

    #[test]
    fn frames_cover_every_pass() {
        let config = ScenarioConfig::default();
        let frames = build_frames(&config);
        assert_eq!(frames.len(), 91 * config.passes);
        assert_eq!(reading(&frames[0]).0, 0.0);
        assert_eq!(reading(&frames[91]).0, 180.0);
    }

    #[test]
    fn targets_only_echo_on_their_passes() {
        let config = ScenarioConfig {
            noise: 0.0,
            ..Default::default()
        };
        let frames = build_frames(&config);
        let at = |pass: usize, angle: f64| {
            frames[pass * 91..(pass + 1) * 91]
                .iter()
                .map(|wire| reading(wire))
                .find(|(a, _)| *a == angle)
                .map(|(_, distance)| distance)
                .unwrap()
        };
        assert_eq!(at(0, 60.0), 1_500.0);
        assert_eq!(at(1, 60.0), 600.0);
        assert_eq!(at(4, 120.0), 900.0);
        assert_eq!(at(5, 120.0), 1_500.0);
    }

    #[test]
    fn same_seed_reproduces_stream() {
        let config = ScenarioConfig {
            seed: 9,
            ..Default::default()
        };
        assert_eq!(build_frames(&config), build_frames(&config));
    }

    #[test]
    fn noise_lines_and_corruption_are_injected() {
        let config = ScenarioConfig {
            banner_every: 10,
            corrupt_every: 7,
            string_fields: true,
            ..Default::default()
        };
        let frames = build_frames(&config);
        assert!(frames[9].starts_with("relay rssi="));
        assert!(!frames[6].trim_end().ends_with('}'));
        assert!(frames[0].contains("\"angle\":\"0.0\""));
    }
}
