//! Self-verifying wire format for stored values.
//!
//! Every record in the table carries its own integrity check:
//!
//! ```text
//! | value len (u32, native order) | value bytes | verification suffix |
//! ```
//!
//! The suffix is a Sha256 digest of the value when the value is longer
//! than [`DIGEST_THRESHOLD`], and a verbatim duplicate of the value
//! otherwise. Duplicating a value at or below the digest width costs no
//! more space than the digest and skips the hashing work. Either form is
//! a statistical check against storage corruption (torn writes, stray
//! scribbles over the segment), not a defense against tampering.

use sha2::{Digest, Sha256};
use shmkv_core::{Error, Result};

/// Values longer than this are verified by digest; shorter ones by a
/// verbatim duplicate. Equal to the digest width.
pub const DIGEST_THRESHOLD: usize = 32;

const DIGEST_LEN: usize = 32;
const LEN_PREFIX: usize = std::mem::size_of::<u32>();

/// Encode `value` into its stored wire form. Deterministic.
#[must_use]
pub fn encode(value: &[u8]) -> Vec<u8> {
    let suffix_len = if value.len() > DIGEST_THRESHOLD {
        DIGEST_LEN
    } else {
        value.len()
    };

    let mut wire = Vec::with_capacity(LEN_PREFIX + value.len() + suffix_len);
    wire.extend_from_slice(&(value.len() as u32).to_ne_bytes());
    wire.extend_from_slice(value);
    if value.len() > DIGEST_THRESHOLD {
        wire.extend_from_slice(&Sha256::digest(value));
    } else {
        wire.extend_from_slice(value);
    }
    wire
}

/// Decode a stored record and verify its suffix.
///
/// Any inconsistency is `DataCorrupt`: a record shorter than its header,
/// a declared length the buffer cannot hold, or a suffix that does not
/// match the value. Bytes past the expected suffix are tolerated; slot
/// storage may round record sizes up.
pub fn decode(wire: &[u8]) -> Result<Vec<u8>> {
    if wire.len() < LEN_PREFIX {
        return Err(Error::corrupt(format!(
            "record of {} bytes is shorter than its length prefix",
            wire.len()
        )));
    }

    let mut len_bytes = [0u8; LEN_PREFIX];
    len_bytes.copy_from_slice(&wire[..LEN_PREFIX]);
    let declared = u32::from_ne_bytes(len_bytes) as usize;

    let value_end = match LEN_PREFIX.checked_add(declared) {
        Some(end) if end <= wire.len() => end,
        _ => {
            return Err(Error::corrupt(format!(
                "declared value length {} exceeds record of {} bytes",
                declared,
                wire.len()
            )))
        }
    };
    let value = &wire[LEN_PREFIX..value_end];

    if declared > DIGEST_THRESHOLD {
        let suffix_end = value_end + DIGEST_LEN;
        if wire.len() < suffix_end {
            return Err(Error::corrupt(format!(
                "record of {} bytes is missing its digest suffix",
                wire.len()
            )));
        }
        let expected = Sha256::digest(value);
        let stored = &wire[value_end..suffix_end];
        if expected.as_slice() != stored {
            return Err(Error::corrupt(format!(
                "digest mismatch: expected {}, stored {}",
                hex::encode(expected),
                hex::encode(stored)
            )));
        }
    } else {
        let suffix_end = value_end + declared;
        if wire.len() < suffix_end {
            return Err(Error::corrupt(format!(
                "record of {} bytes is missing its duplicate suffix",
                wire.len()
            )));
        }
        if value != &wire[value_end..suffix_end] {
            return Err(Error::corrupt(
                "duplicate suffix does not match the value".to_string(),
            ));
        }
    }

    Ok(value.to_vec())
}
