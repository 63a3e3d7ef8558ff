//! Embedding codec for Q&A pairs: base64 over little-endian `f32`s.

use base64::{engine::general_purpose::STANDARD, Engine as _};

pub fn encode_embedding(values: &[f32]) -> String {
    let mut raw = Vec::with_capacity(values.len() * 4);
    for v in values {
        raw.extend_from_slice(&v.to_le_bytes());
    }
    STANDARD.encode(raw)
}

pub fn decode_embedding(encoded: &str) -> Result<Vec<f32>, String> {
    let raw = STANDARD
        .decode(encoded.trim())
        .map_err(|e| format!("embedding base64: {}", e))?;
    if raw.len() % 4 != 0 {
        return Err(format!(
            "embedding payload is {} bytes, not a multiple of 4",
            raw.len()
        ));
    }
    Ok(raw
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}
