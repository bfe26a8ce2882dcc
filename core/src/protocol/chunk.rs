use serde::{Deserialize, Serialize};

/// One delivery unit from the transport.
///
/// Strings may carry hex digit pairs or already-decoded text; which of the
/// two is decided by the decoder, not at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawChunk {
    /// Ordered byte values. Kept wide so out-of-range values survive until decode.
    Values(Vec<i64>),
    Text(String),
    /// Anything else the transport hands over; decoded by its literal form.
    Opaque(serde_json::Value),
}

impl From<&str> for RawChunk {
    fn from(text: &str) -> Self {
        RawChunk::Text(text.to_string())
    }
}

impl From<String> for RawChunk {
    fn from(text: String) -> Self {
        RawChunk::Text(text)
    }
}

impl From<&[u8]> for RawChunk {
    fn from(bytes: &[u8]) -> Self {
        RawChunk::Values(bytes.iter().map(|&b| i64::from(b)).collect())
    }
}

impl From<Vec<u8>> for RawChunk {
    fn from(bytes: Vec<u8>) -> Self {
        RawChunk::from(bytes.as_slice())
    }
}
