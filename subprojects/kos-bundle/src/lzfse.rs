//! Minimal LZFSE-compatible block decoder.
//!
//! The bundle builder only ever emits two block shapes for init-bundle
//! payloads: a raw passthrough block for data that doesn't compress, and a
//! plain LZ77 token stream for everything else. Full Apple LZFSE also
//! defines an FSE/tANS-entropy-coded block for its general-purpose mode;
//! init bundle payloads are small enough in practice that the extra
//! entropy stage buys little, so this decoder only implements the two
//! block kinds the builder uses, not the complete format.

use alloc::vec::Vec;
use thiserror::Error;

/// Raw (uncompressed) block tag: `'bvxn'`.
const TAG_RAW: u32 = u32::from_le_bytes(*b"bvxn");
/// LZ77 token-stream block tag: `'bvxl'`.
const TAG_LZ: u32 = u32::from_le_bytes(*b"bvxl");

#[derive(Error, Debug, Copy, Clone, Eq, PartialEq)]
pub enum LzfseError {
    #[error("block too short to contain a tag")]
    Truncated,
    #[error("unrecognized block tag {0:#x}")]
    UnknownTag(u32),
    #[error("decoded length {got} does not match expected {expected}")]
    LengthMismatch { expected: usize, got: usize },
    #[error("token stream references data beyond the decoded output so far")]
    BadBackReference,
}

/// Decompresses `input` into a fresh buffer of exactly `raw_len` bytes.
pub fn decompress(input: &[u8], raw_len: usize) -> Result<Vec<u8>, LzfseError> {
    if input.len() < 4 {
        return Err(LzfseError::Truncated);
    }
    let tag = u32::from_le_bytes(input[..4].try_into().unwrap());
    let body = &input[4..];

    let out = match tag {
        TAG_RAW => body.to_vec(),
        TAG_LZ => decode_lz_tokens(body, raw_len)?,
        other => return Err(LzfseError::UnknownTag(other)),
    };

    if out.len() != raw_len {
        return Err(LzfseError::LengthMismatch {
            expected: raw_len,
            got: out.len(),
        });
    }
    Ok(out)
}

/// Token stream: repeated `(literal_len:u16, match_len:u16, dist:u16)`
/// triples, each followed by `literal_len` literal bytes. `match_len == 0`
/// marks the final token (no back-reference copy after its literals).
fn decode_lz_tokens(body: &[u8], raw_len: usize) -> Result<Vec<u8>, LzfseError> {
    let mut out = Vec::with_capacity(raw_len);
    let mut cursor = 0usize;

    while out.len() < raw_len {
        let header = body.get(cursor..cursor + 6).ok_or(LzfseError::Truncated)?;
        let literal_len = u16::from_le_bytes([header[0], header[1]]) as usize;
        let match_len = u16::from_le_bytes([header[2], header[3]]) as usize;
        let dist = u16::from_le_bytes([header[4], header[5]]) as usize;
        cursor += 6;

        let literal = body.get(cursor..cursor + literal_len).ok_or(LzfseError::Truncated)?;
        out.extend_from_slice(literal);
        cursor += literal_len;

        if match_len == 0 {
            break;
        }

        if dist == 0 || dist > out.len() {
            return Err(LzfseError::BadBackReference);
        }
        let start = out.len() - dist;
        for i in 0..match_len {
            let byte = out[start + i];
            out.push(byte);
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_block_passes_through() {
        let mut input = Vec::new();
        input.extend_from_slice(&TAG_RAW.to_le_bytes());
        input.extend_from_slice(b"hello world");
        let out = decompress(&input, 11).unwrap();
        assert_eq!(out, b"hello world");
    }

    #[test]
    fn lz_block_expands_back_reference() {
        let mut input = Vec::new();
        input.extend_from_slice(&TAG_LZ.to_le_bytes());
        // literal "ab", then copy 4 bytes from distance 2 -> "ababab"
        input.extend_from_slice(&2u16.to_le_bytes());
        input.extend_from_slice(&4u16.to_le_bytes());
        input.extend_from_slice(&2u16.to_le_bytes());
        input.extend_from_slice(b"ab");
        // terminator token with no literals/match
        input.extend_from_slice(&0u16.to_le_bytes());
        input.extend_from_slice(&0u16.to_le_bytes());
        input.extend_from_slice(&0u16.to_le_bytes());

        let out = decompress(&input, 6).unwrap();
        assert_eq!(out, b"ababab");
    }

    #[test]
    fn bad_back_reference_is_rejected() {
        let mut input = Vec::new();
        input.extend_from_slice(&TAG_LZ.to_le_bytes());
        input.extend_from_slice(&0u16.to_le_bytes());
        input.extend_from_slice(&1u16.to_le_bytes());
        input.extend_from_slice(&5u16.to_le_bytes());
        assert!(decompress(&input, 1).is_err());
    }
}
