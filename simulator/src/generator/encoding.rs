use clap::ValueEnum;
use loracore::RawChunk;
use rand::{rngs::StdRng, Rng};
use serde::{Deserialize, Serialize};

/// How the simulated bridge hands bytes to the pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChunkEncoding {
    Hex,
    Bytes,
    Text,
    /// Pick one of the other three per chunk.
    #[default]
    Mixed,
}

fn encode_piece(piece: &str, encoding: ChunkEncoding, rng: &mut StdRng) -> RawChunk {
    let encoding = match encoding {
        ChunkEncoding::Mixed => match rng.gen_range(0..3) {
            0 => ChunkEncoding::Hex,
            1 => ChunkEncoding::Bytes,
            _ => ChunkEncoding::Text,
        },
        other => other,
    };

    match encoding {
        ChunkEncoding::Hex => RawChunk::Text(piece.bytes().map(|b| format!("{:02X}", b)).collect()),
        // A text piece made only of hex digits would be read back as hex.
        ChunkEncoding::Text if piece.bytes().all(|b| b.is_ascii_hexdigit()) => {
            RawChunk::from(piece.as_bytes())
        }
        ChunkEncoding::Text => RawChunk::from(piece),
        _ => RawChunk::from(piece.as_bytes()),
    }
}

/// Splits `text` into chunks of 1..=`max_chunk` bytes at character
/// boundaries, encoding each one independently.
pub fn encode_chunks(text: &str, encoding: ChunkEncoding, max_chunk: usize, rng: &mut StdRng) -> Vec<RawChunk> {
    let max_chunk = max_chunk.max(1);
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = (start + rng.gen_range(1..=max_chunk)).min(text.len());
        while !text.is_char_boundary(end) {
            end += 1;
        }
        chunks.push(encode_piece(&text[start..end], encoding, rng));
        start = end;
    }
    chunks
}
