// crates/spec-check-core/src/core/frame.rs
// ============================================================================
// Module: Stack Frames
// Description: Raw and interpreted call stack frames.
// Purpose: Carry caller attribution data for contract failures.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Raw frames are captured as-is from the platform stack walker. Interpreted
//! frames have been demangled into the unit they belong to, optionally with a
//! nested local function (closure) annotation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::UnitName;

// ============================================================================
// SECTION: Frame Types
// ============================================================================

/// Stack frame as captured, innermost first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFrame {
    /// Mangled or demangled symbol path.
    pub symbol: String,
    /// Source file when debug info is available.
    pub file: Option<String>,
    /// Source line when debug info is available.
    pub line: Option<u32>,
}

impl RawFrame {
    /// Creates a raw frame without source location.
    #[must_use]
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            file: None,
            line: None,
        }
    }

    /// Attaches a source location.
    #[must_use]
    pub fn at(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }
}

/// Frame mapped onto the unit that owns it.
///
/// The raw symbol is intentionally not carried; it is not meaningful to the
/// person reading a contract failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    /// Unit the frame executes in.
    pub unit: UnitName,
    /// Nested local function (closure) inside the unit, when present.
    pub local_fn: Option<String>,
    /// Source file when known.
    pub file: Option<String>,
    /// Source line when known.
    pub line: Option<u32>,
}
