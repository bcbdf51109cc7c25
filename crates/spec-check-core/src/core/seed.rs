// crates/spec-check-core/src/core/seed.rs
// ============================================================================
// Module: Generator Seeds
// Description: Fixed-width seeds for deterministic generation runs.
// Purpose: Make failing checks replayable from their reported seed.
// Dependencies: rand, serde, thiserror
// ============================================================================

//! ## Overview
//! Seeds are 32 bytes (the ChaCha key size) and serialize as lowercase hex so
//! they can be copied from a report into configuration verbatim.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use thiserror::Error;

// ============================================================================
// SECTION: Seed
// ============================================================================

/// Seed length in bytes.
pub const SEED_LEN: usize = 32;

/// Seed parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeedError {
    /// Input did not have exactly `2 * SEED_LEN` characters.
    #[error("seed must be {expected} hex characters, got {actual}")]
    Length {
        /// Expected character count.
        expected: usize,
        /// Actual character count.
        actual: usize,
    },
    /// Input contained a non-hex character.
    #[error("seed contains non-hex character at offset {0}")]
    NotHex(usize),
}

/// Deterministic generation seed.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Seed([u8; SEED_LEN]);

impl Seed {
    /// Wraps raw seed bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; SEED_LEN]) -> Self {
        Self(bytes)
    }

    /// Draws a fresh seed from the thread RNG.
    #[must_use]
    pub fn random() -> Self {
        Self(rand::random())
    }

    /// Returns the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; SEED_LEN] {
        &self.0
    }

    /// Parses a lowercase or uppercase hex seed.
    ///
    /// # Errors
    ///
    /// Returns [`SeedError`] when the input is not `2 * SEED_LEN` hex digits.
    pub fn from_hex(text: &str) -> Result<Self, SeedError> {
        let bytes = text.as_bytes();
        if bytes.len() != SEED_LEN * 2 {
            return Err(SeedError::Length {
                expected: SEED_LEN * 2,
                actual: bytes.len(),
            });
        }
        let mut out = [0u8; SEED_LEN];
        for (index, slot) in out.iter_mut().enumerate() {
            let high = hex_value(bytes[index * 2]).ok_or(SeedError::NotHex(index * 2))?;
            let low = hex_value(bytes[index * 2 + 1]).ok_or(SeedError::NotHex(index * 2 + 1))?;
            *slot = (high << 4) | low;
        }
        Ok(Self(out))
    }

    /// Renders the seed as lowercase hex.
    #[must_use]
    pub fn to_hex(&self) -> String {
        const HEX: &[u8; 16] = b"0123456789abcdef";
        let mut out = String::with_capacity(SEED_LEN * 2);
        for byte in self.0 {
            out.push(char::from(HEX[usize::from(byte >> 4)]));
            out.push(char::from(HEX[usize::from(byte & 0x0f)]));
        }
        out
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Seed({})", self.to_hex())
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Seed {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Seed {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_hex(&text).map_err(serde::de::Error::custom)
    }
}

/// Decodes a single hex digit.
const fn hex_value(digit: u8) -> Option<u8> {
    match digit {
        b'0' ..= b'9' => Some(digit - b'0'),
        b'a' ..= b'f' => Some(digit - b'a' + 10),
        b'A' ..= b'F' => Some(digit - b'A' + 10),
        _ => None,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions are permitted.")]

    use super::*;

    #[test]
    fn hex_roundtrip_preserves_bytes() {
        let mut bytes = [0u8; SEED_LEN];
        for (index, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::try_from(index * 7 % 256).unwrap();
        }
        let seed = Seed::from_bytes(bytes);
        assert_eq!(Seed::from_hex(&seed.to_hex()).unwrap(), seed);
    }

    #[test]
    fn rejects_wrong_length() {
        assert_eq!(
            Seed::from_hex("abcd"),
            Err(SeedError::Length {
                expected: 64,
                actual: 4
            })
        );
    }

    #[test]
    fn rejects_non_hex() {
        let text = format!("zz{}", "0".repeat(62));
        assert_eq!(Seed::from_hex(&text), Err(SeedError::NotHex(0)));
    }
}
