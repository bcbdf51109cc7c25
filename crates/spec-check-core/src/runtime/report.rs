// crates/spec-check-core/src/runtime/report.rs
// ============================================================================
// Module: Result Reporting
// Description: Outcome classification and summaries for check runs.
// Purpose: Fold check results into per-category counts.
// Dependencies: serde, serde_json, crate::core, crate::audit
// ============================================================================

//! ## Overview
//! Every [`CheckResult`] falls into exactly one [`OutcomeCategory`].
//! [`summarize`] folds a result sequence into counts while handing each
//! result to a caller-supplied formatter; [`summarize_to_sink`] does the same
//! but emits abbreviated results as audit events.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::audit::CheckEvent;
use crate::audit::EventSink;
use crate::audit::now_ms;
use crate::core::CallError;
use crate::core::CheckFailure;
use crate::core::CheckOutcome;
use crate::core::CheckResult;
use crate::core::FnSpecSummary;
use crate::core::UnitName;

// ============================================================================
// SECTION: Categories
// ============================================================================

/// Outcome category of a check result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeCategory {
    /// Every trial passed.
    Passed,
    /// A generated value violated a spec.
    TestFailed,
    /// The unit failed or panicked during a trial.
    Threw,
    /// A trial tripped live instrumentation on a nested unit.
    InstrumentCheckFailed,
    /// The fn-spec has no `args` spec.
    NoArgSpec,
    /// The unit has no live binding.
    NoFn,
    /// No generator could be built for `args`.
    NoGen,
}

impl OutcomeCategory {
    /// Stable snake case label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::TestFailed => "test_failed",
            Self::Threw => "threw",
            Self::InstrumentCheckFailed => "instrument_check_failed",
            Self::NoArgSpec => "no_arg_spec",
            Self::NoFn => "no_fn",
            Self::NoGen => "no_gen",
        }
    }
}

/// Classifies `result` into its outcome category.
#[must_use]
pub const fn classify(result: &CheckResult) -> OutcomeCategory {
    match &result.outcome {
        CheckOutcome::Passed => OutcomeCategory::Passed,
        CheckOutcome::Failed(failure) => match failure {
            CheckFailure::Violation(_) => OutcomeCategory::TestFailed,
            CheckFailure::Threw(CallError::CheckFailed(_)) => OutcomeCategory::InstrumentCheckFailed,
            CheckFailure::Threw(_) => OutcomeCategory::Threw,
            CheckFailure::NoFn => OutcomeCategory::NoFn,
            CheckFailure::NoArgSpec => OutcomeCategory::NoArgSpec,
            CheckFailure::NoGen(_) => OutcomeCategory::NoGen,
        },
    }
}

// ============================================================================
// SECTION: Abbreviation
// ============================================================================

/// Check result without the raw engine report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbbrevResult {
    /// Unit checked, when checked by name.
    pub unit: Option<UnitName>,
    /// Descriptions of the fn-spec parts.
    pub spec: Option<FnSpecSummary>,
    /// Outcome category.
    pub category: OutcomeCategory,
    /// Trials executed, when trials ran.
    pub num_tests: Option<u64>,
    /// Hex seed, when trials ran.
    pub seed: Option<String>,
    /// Serialized failure detail.
    pub failure: Option<Value>,
}

/// Drops the raw report from `result`.
#[must_use]
pub fn abbreviate(result: &CheckResult) -> AbbrevResult {
    AbbrevResult {
        unit: result.unit.clone(),
        spec: result.spec.as_ref().map(crate::core::FnSpec::summary),
        category: classify(result),
        num_tests: result.report.as_ref().map(|report| report.num_tests),
        seed: result.report.as_ref().map(|report| report.seed.to_hex()),
        failure: result.outcome.failure().and_then(|failure| serde_json::to_value(failure).ok()),
    }
}

// ============================================================================
// SECTION: Summaries
// ============================================================================

/// Result counts for a check run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Results seen.
    pub total: u64,
    /// Results per category; absent categories had none.
    pub counts: BTreeMap<OutcomeCategory, u64>,
}

impl Summary {
    /// Count for `category`.
    #[must_use]
    pub fn count(&self, category: OutcomeCategory) -> u64 {
        self.counts.get(&category).copied().unwrap_or(0)
    }

    /// True when every result passed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.count(OutcomeCategory::Passed) == self.total
    }
}

/// Folds `results` into a summary, calling `formatter` with each result.
pub fn summarize(
    results: impl IntoIterator<Item = CheckResult>,
    mut formatter: impl FnMut(&CheckResult),
) -> Summary {
    let mut summary = Summary::default();
    for result in results {
        formatter(&result);
        summary.total += 1;
        *summary.counts.entry(classify(&result)).or_insert(0) += 1;
    }
    summary
}

/// Folds `results` into a summary, emitting one check event per result.
pub fn summarize_to_sink(
    results: impl IntoIterator<Item = CheckResult>,
    sink: &dyn EventSink,
) -> Summary {
    summarize(results, |result| {
        let abbrev = abbreviate(result);
        sink.record_check(&CheckEvent {
            event: "check_result",
            timestamp_ms: now_ms(),
            unit: abbrev.unit,
            category: abbrev.category,
            num_tests: abbrev.num_tests,
            seed: abbrev.seed,
            failure: abbrev.failure,
        });
    })
}
