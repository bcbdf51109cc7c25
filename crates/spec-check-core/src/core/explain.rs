// crates/spec-check-core/src/core/explain.rs
// ============================================================================
// Module: Explain Data
// Description: Structured descriptions of contract violations.
// Purpose: Report why a value failed to conform and where the call came from.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Explain data is produced whenever a value fails its spec, both for live
//! instrumentation failures and for failing generative trials. It records the
//! offending value, the spec description, the problems reported by the spec,
//! the role of the spec within the fn-spec, and optionally the caller frame.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::frame::Frame;
use crate::core::identifiers::UnitName;
use crate::core::spec::Spec;

// ============================================================================
// SECTION: Role
// ============================================================================

/// Position of a spec within a fn-spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Argument tuple spec.
    Args,
    /// Return value spec.
    Ret,
    /// Relation between conformed arguments and return value.
    Fn,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Args => f.write_str(":args"),
            Self::Ret => f.write_str(":ret"),
            Self::Fn => f.write_str(":fn"),
        }
    }
}

// ============================================================================
// SECTION: Problems
// ============================================================================

/// Single conformance problem reported by a spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    /// Path into the value (tuple positions, keys).
    pub path: Vec<String>,
    /// Predicate or spec description that rejected the value.
    pub pred: String,
    /// Offending value at `path`.
    pub val: Value,
    /// Optional reason beyond the predicate.
    pub reason: Option<String>,
}

impl Problem {
    /// Creates a problem rooted at the value itself.
    #[must_use]
    pub fn new(pred: impl Into<String>, val: Value) -> Self {
        Self {
            path: Vec::new(),
            pred: pred.into(),
            val,
            reason: None,
        }
    }

    /// Attaches a reason.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Prefixes the problem path with a parent segment.
    #[must_use]
    pub fn nested_in(mut self, segment: impl Into<String>) -> Self {
        self.path.insert(0, segment.into());
        self
    }
}

// ============================================================================
// SECTION: Explain Data
// ============================================================================

/// Explanation of a contract violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplainData {
    /// Problems reported by the spec.
    pub problems: Vec<Problem>,
    /// Description of the spec that rejected the value.
    pub spec: String,
    /// Value that failed to conform.
    pub value: Value,
    /// Role of the failing spec.
    pub role: Role,
    /// Nearest genuine caller, when derivable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caller: Option<Frame>,
    /// Raw argument tuple of the call, when distinct from `value`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Value>,
}

impl ExplainData {
    /// Builds explain data for `value` against `spec` in the given role.
    #[must_use]
    pub fn explain(spec: &dyn Spec, role: Role, value: Value) -> Self {
        Self {
            problems: spec.explain(&value),
            spec: spec.describe(),
            value,
            role,
            caller: None,
            args: None,
        }
    }

    /// Attaches the raw argument tuple.
    #[must_use]
    pub fn with_args(mut self, args: Value) -> Self {
        self.args = Some(args);
        self
    }

    /// Attaches the caller frame when one is available.
    #[must_use]
    pub fn with_caller(mut self, caller: Option<Frame>) -> Self {
        self.caller = caller;
        self
    }
}

// ============================================================================
// SECTION: Instrumentation Failure
// ============================================================================

/// Live argument check failure raised by an instrumented unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("call to {unit} did not conform to spec: {}", .explain.spec)]
pub struct InstrumentCheckFailed {
    /// Instrumented unit whose arguments were rejected.
    pub unit: UnitName,
    /// Explanation of the rejected arguments.
    pub explain: ExplainData,
}
