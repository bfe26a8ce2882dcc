use crate::prelude::DecodeIrregularity;
use crate::protocol::RawChunk;
use crate::telemetry::log::LogManager;
use serde_json::Value;

/// Normalizes heterogeneously encoded transport chunks into text.
///
/// Strings made only of hex digits are read as byte pairs, byte-value
/// sequences map one value per character, and anything else is taken
/// literally. Each byte maps to the character with the same code point.
pub struct ChunkDecoder {
    logger: LogManager,
}

impl ChunkDecoder {
    pub fn new() -> Self {
        Self {
            logger: LogManager::new("decoder"),
        }
    }

    /// Decodes `chunk`, falling back to the salvaged part on irregular input.
    pub fn decode(&self, chunk: &RawChunk) -> String {
        match self.try_decode(chunk) {
            Ok(text) => text,
            Err(irregularity) => self.salvage(irregularity),
        }
    }

    pub fn try_decode(&self, chunk: &RawChunk) -> Result<String, DecodeIrregularity> {
        match chunk {
            RawChunk::Text(text) if is_hex_text(text) => decode_hex(text),
            RawChunk::Text(text) => Ok(text.clone()),
            RawChunk::Values(values) => decode_values(values),
            RawChunk::Opaque(Value::String(text)) => Ok(text.clone()),
            RawChunk::Opaque(Value::Null) => Ok(String::new()),
            RawChunk::Opaque(other) => Ok(other.to_string()),
        }
    }

    /// Logs the irregularity and hands back whatever text survived.
    pub fn salvage(&self, irregularity: DecodeIrregularity) -> String {
        self.logger.irregularity(&format!(
            "{} (salvaged {} chars)",
            irregularity,
            irregularity.salvaged.chars().count()
        ));
        irregularity.salvaged
    }
}

impl Default for ChunkDecoder {
    fn default() -> Self {
        Self::new()
    }
}

fn is_hex_text(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_hexdigit())
}

fn decode_hex(text: &str) -> Result<String, DecodeIrregularity> {
    let digits = text.as_bytes();
    let mut decoded = String::with_capacity(digits.len() / 2);
    for pair in digits.chunks_exact(2) {
        // Both digits are ASCII hex, so the pair always parses.
        let high = hex_value(pair[0]);
        let low = hex_value(pair[1]);
        decoded.push(char::from((high << 4) | low));
    }

    if digits.len() % 2 == 1 {
        return Err(DecodeIrregularity {
            reason: format!("odd-length hex string ({} digits)", digits.len()),
            salvaged: decoded,
        });
    }
    Ok(decoded)
}

fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        b'A'..=b'F' => digit - b'A' + 10,
        _ => 0,
    }
}

fn decode_values(values: &[i64]) -> Result<String, DecodeIrregularity> {
    let mut decoded = String::with_capacity(values.len());
    let mut rejected = 0usize;
    for &value in values {
        match u8::try_from(value) {
            Ok(byte) => decoded.push(char::from(byte)),
            Err(_) => rejected += 1,
        }
    }

    if rejected > 0 {
        return Err(DecodeIrregularity {
            reason: format!("{} byte value(s) outside 0..=255", rejected),
            salvaged: decoded,
        });
    }
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_pairs_decode_to_text() {
        let decoder = ChunkDecoder::new();
        assert_eq!(decoder.decode(&RawChunk::from("48656C6C6F")), "Hello");
        assert_eq!(decoder.decode(&RawChunk::from("7b7d0a")), "{}\n");
    }

    #[test]
    fn byte_values_decode_to_text() {
        let decoder = ChunkDecoder::new();
        let chunk = RawChunk::Values(vec![72, 101, 108, 108, 111]);
        assert_eq!(decoder.decode(&chunk), "Hello");
    }

    #[test]
    fn plain_text_passes_through() {
        let decoder = ChunkDecoder::new();
        let text = "{\"angle\":12,\"distance\":300}\n";
        assert_eq!(decoder.decode(&RawChunk::from(text)), text);
    }

    #[test]
    fn odd_length_hex_salvages_complete_pairs() {
        let decoder = ChunkDecoder::new();
        let chunk = RawChunk::from("48690");
        let err = decoder.try_decode(&chunk).unwrap_err();
        assert_eq!(err.salvaged, "Hi");
        assert_eq!(decoder.decode(&chunk), "Hi");
    }

    #[test]
    fn out_of_range_values_are_skipped() {
        let decoder = ChunkDecoder::new();
        let chunk = RawChunk::Values(vec![79, 300, -1, 75]);
        let err = decoder.try_decode(&chunk).unwrap_err();
        assert!(err.reason.contains("2 byte value(s)"));
        assert_eq!(decoder.decode(&chunk), "OK");
    }

    #[test]
    fn high_bytes_map_to_matching_code_points() {
        let decoder = ChunkDecoder::new();
        assert_eq!(decoder.decode(&RawChunk::from("E9")), "\u{e9}");
    }

    #[test]
    fn opaque_values_use_literal_form() {
        let decoder = ChunkDecoder::new();
        assert_eq!(decoder.decode(&RawChunk::Opaque(serde_json::json!(42))), "42");
        assert_eq!(decoder.decode(&RawChunk::Opaque(Value::Null)), "");
        assert_eq!(decoder.decode(&RawChunk::from("")), "");
    }
}
