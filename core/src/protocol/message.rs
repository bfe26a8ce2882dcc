use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Frame as it arrives on the wire. Every field is optional and untyped
/// until coerced.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WireFrame {
    pub angle: Option<Value>,
    pub distance: Option<Value>,
    pub connected: Option<Value>,
    pub status: Option<Value>,
}

/// Parsed telemetry record. A numeric field that was present but could not
/// be coerced is stored as NaN.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TelemetryMessage {
    pub angle: Option<f64>,
    pub distance: Option<f64>,
    pub connected: Option<bool>,
    pub status: Option<String>,
}

impl TelemetryMessage {
    pub fn from_frame(frame: WireFrame) -> Self {
        Self {
            angle: frame.angle.as_ref().map(coerce_number),
            distance: frame.distance.as_ref().map(coerce_number),
            connected: frame.connected.as_ref().and_then(Value::as_bool),
            status: frame.status.and_then(|value| match value {
                Value::String(text) => Some(text),
                _ => None,
            }),
        }
    }

    /// The (angle, distance) pair, when both are present and finite.
    pub fn sample(&self) -> Option<(f64, f64)> {
        match (self.angle, self.distance) {
            (Some(angle), Some(distance)) if is_valid_number(angle) && is_valid_number(distance) => {
                Some((angle, distance))
            }
            _ => None,
        }
    }

    /// Names of numeric fields that were present but not finite.
    pub fn coercion_failures(&self) -> Vec<&'static str> {
        [("angle", self.angle), ("distance", self.distance)]
            .into_iter()
            .filter_map(|(name, value)| match value {
                Some(v) if !is_valid_number(v) => Some(name),
                _ => None,
            })
            .collect()
    }

    pub fn is_ready(&self) -> bool {
        self.status.as_deref() == Some("ready")
    }
}

pub fn is_valid_number(value: f64) -> bool {
    value.is_finite()
}

/// Numbers pass through; strings go through [`parse_float`]; everything else is NaN.
pub fn coerce_number(value: &Value) -> f64 {
    match value {
        Value::Number(number) => number.as_f64().unwrap_or(f64::NAN),
        Value::String(text) => parse_float(text),
        _ => f64::NAN,
    }
}

/// Parses the longest numeric prefix of `text` after leading whitespace,
/// so `"12.5cm"` yields 12.5. Yields NaN when no prefix is numeric.
pub fn parse_float(text: &str) -> f64 {
    let trimmed = text.trim_start();
    let end = numeric_prefix_len(trimmed.as_bytes());
    if end == 0 {
        return f64::NAN;
    }
    trimmed[..end].parse::<f64>().unwrap_or(f64::NAN)
}

/// Length of the longest `[+-]digits[.digits][(e|E)[+-]digits]` prefix.
/// The mantissa needs at least one digit; an exponent without digits is
/// left out of the prefix.
fn numeric_prefix_len(bytes: &[u8]) -> usize {
    let digits_from = |start: usize| {
        bytes[start..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    let integer = digits_from(end);
    end += integer;

    let mut fraction = 0;
    if bytes.get(end) == Some(&b'.') {
        fraction = digits_from(end + 1);
        if integer > 0 || fraction > 0 {
            end += 1 + fraction;
        }
    }
    if integer == 0 && fraction == 0 {
        return 0;
    }

    if matches!(bytes.get(end), Some(b'e') | Some(b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+') | Some(b'-')) {
            exp += 1;
        }
        let exp_digits = digits_from(exp);
        if exp_digits > 0 {
            end = exp + exp_digits;
        }
    }
    end
}
