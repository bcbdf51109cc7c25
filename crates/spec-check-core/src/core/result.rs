// crates/spec-check-core/src/core/result.rs
// ============================================================================
// Module: Check Results
// Description: Result records produced by the generative test runner.
// Purpose: Capture per-unit outcomes and the raw property-run report.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A [`CheckResult`] is created fresh for every unit (or ad-hoc callable)
//! checked. Failures are always captured here rather than raised so a run can
//! enumerate every failing unit.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::callable::CallError;
use crate::core::explain::ExplainData;
use crate::core::identifiers::UnitName;
use crate::core::seed::Seed;
use crate::core::spec::FnSpec;
use crate::core::spec::GenError;

// ============================================================================
// SECTION: Trial Failures
// ============================================================================

/// Failure observed in a single generative trial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum TrialFailure {
    /// A value failed its spec.
    Violation(ExplainData),
    /// The callable raised or panicked.
    Threw(CallError),
}

impl fmt::Display for TrialFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Violation(explain) => write!(
                f,
                "{} value {} did not conform to {}",
                explain.role, explain.value, explain.spec
            ),
            Self::Threw(error) => write!(f, "{error}"),
        }
    }
}

/// Shrunk counterexample reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShrunkCase {
    /// Smallest failing argument tuple found.
    pub smallest: Value,
    /// Failure produced by `smallest`.
    pub result: TrialFailure,
}

/// Raw report of one property run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyReport {
    /// True when every trial passed.
    pub passed: bool,
    /// Trials executed before the run passed or first failed.
    pub num_tests: u64,
    /// Seed used by the run.
    pub seed: Seed,
    /// First failing argument tuple, before shrinking.
    pub fail: Option<Value>,
    /// Failure produced by `fail`.
    pub fail_result: Option<TrialFailure>,
    /// Shrunk counterexample, when shrinking produced one.
    pub shrunk: Option<ShrunkCase>,
}

// ============================================================================
// SECTION: Check Results
// ============================================================================

/// Reason a unit did not pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum CheckFailure {
    /// A generated or returned value failed its spec.
    Violation(ExplainData),
    /// The callable raised or panicked.
    Threw(CallError),
    /// The unit name did not resolve to a callable.
    NoFn,
    /// The fn-spec has no `args` spec to generate from.
    NoArgSpec,
    /// A generator for `args` could not be built.
    NoGen(GenError),
}

impl From<TrialFailure> for CheckFailure {
    fn from(failure: TrialFailure) -> Self {
        match failure {
            TrialFailure::Violation(explain) => Self::Violation(explain),
            TrialFailure::Threw(error) => Self::Threw(error),
        }
    }
}

/// Overall outcome of checking one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckOutcome {
    /// Every trial passed.
    Passed,
    /// The unit failed or could not be checked.
    Failed(CheckFailure),
}

impl CheckOutcome {
    /// Returns true for a passing outcome.
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Returns the failure, if any.
    #[must_use]
    pub const fn failure(&self) -> Option<&CheckFailure> {
        match self {
            Self::Passed => None,
            Self::Failed(failure) => Some(failure),
        }
    }
}

/// Result of checking one unit or ad-hoc callable.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Unit name when checked by name.
    pub unit: Option<UnitName>,
    /// Effective fn-spec, when one was found.
    pub spec: Option<FnSpec>,
    /// Outcome (shrunk failure when available).
    pub outcome: CheckOutcome,
    /// Raw property-run report, when trials ran.
    pub report: Option<PropertyReport>,
}

impl CheckResult {
    /// Creates a result that never reached the trial stage.
    #[must_use]
    pub fn unchecked(
        unit: Option<UnitName>,
        spec: Option<FnSpec>,
        failure: CheckFailure,
    ) -> Self {
        Self {
            unit,
            spec,
            outcome: CheckOutcome::Failed(failure),
            report: None,
        }
    }
}
