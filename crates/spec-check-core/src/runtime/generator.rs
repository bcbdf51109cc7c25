// crates/spec-check-core/src/runtime/generator.rs
// ============================================================================
// Module: Generation Engine
// Description: Seeded sampling and property runs over proptest strategies.
// Purpose: Draw conforming values and shrink failing argument tuples.
// Dependencies: proptest, crate::core
// ============================================================================

//! ## Overview
//! Every run is driven by a ChaCha RNG seeded from a [`Seed`], so a report's
//! seed reproduces its trials exactly. [`sample`] draws a single value (used
//! for stubs); [`run_property`] drives a property to its first failure and
//! lets proptest shrink it. [`build_generator`] turns a panicking generator
//! factory into a [`GenError`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::any::Any;
use std::cell::Cell;
use std::cell::RefCell;
use std::panic;
use std::panic::AssertUnwindSafe;

use proptest::strategy::BoxedStrategy;
use proptest::strategy::Strategy;
use proptest::strategy::ValueTree;
use proptest::test_runner::Config;
use proptest::test_runner::RngAlgorithm;
use proptest::test_runner::TestCaseError;
use proptest::test_runner::TestError;
use proptest::test_runner::TestRng;
use proptest::test_runner::TestRunner;
use serde_json::Value;

use crate::core::GenError;
use crate::core::GenOverrides;
use crate::core::PropertyReport;
use crate::core::Seed;
use crate::core::ShrunkCase;
use crate::core::Spec;
use crate::core::TrialFailure;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default upper bound on shrink steps per failure.
pub const DEFAULT_MAX_SHRINK_ITERS: u32 = 1024;

// ============================================================================
// SECTION: Options
// ============================================================================

/// Generation engine options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Fixed seed; a random seed is drawn per run when absent.
    pub seed: Option<Seed>,
    /// Upper bound on shrink steps.
    pub max_shrink_iters: u32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            seed: None,
            max_shrink_iters: DEFAULT_MAX_SHRINK_ITERS,
        }
    }
}

impl EngineOptions {
    /// Returns the configured seed, or a fresh random one.
    #[must_use]
    pub fn resolve_seed(&self) -> Seed {
        self.seed.unwrap_or_else(Seed::random)
    }
}

// ============================================================================
// SECTION: Construction
// ============================================================================

/// Builds the generator for `spec`, applying `overrides`.
///
/// # Errors
///
/// Returns [`GenError`] when the spec or an override cannot build a
/// generator, including when its factory panics.
pub fn build_generator(
    spec: &dyn Spec,
    overrides: &GenOverrides,
) -> Result<BoxedStrategy<Value>, GenError> {
    panic::catch_unwind(AssertUnwindSafe(|| spec.generator(overrides))).unwrap_or_else(|payload| {
        Err(GenError::new(
            spec.describe(),
            format!("generator construction panicked: {}", panic_message(payload.as_ref())),
        ))
    })
}

// ============================================================================
// SECTION: Sampling
// ============================================================================

/// Draws one value from `strategy` using `seed`.
///
/// # Errors
///
/// Returns [`GenError`] when the strategy cannot produce a value.
pub fn sample(
    strategy: &BoxedStrategy<Value>,
    seed: Seed,
    spec: &str,
) -> Result<Value, GenError> {
    let mut runner = runner_for(seed, Config::default());
    let tree = strategy
        .new_tree(&mut runner)
        .map_err(|reason| GenError::new(spec, reason.message().to_string()))?;
    Ok(tree.current())
}

// ============================================================================
// SECTION: Property Runs
// ============================================================================

/// Runs `trial` against up to `num_tests` generated values.
///
/// The trial count in the report stops at the first failure; shrink steps
/// are not counted. When a failure shrinks, the reported shrunk result is
/// the trial outcome for the minimal value.
///
/// # Errors
///
/// Returns [`GenError`] when the engine aborts (for example because the
/// strategy rejects too many values).
pub fn run_property(
    strategy: &BoxedStrategy<Value>,
    num_tests: u64,
    engine: &EngineOptions,
    spec: &str,
    trial: impl Fn(&Value) -> Result<(), TrialFailure>,
) -> Result<PropertyReport, GenError> {
    let seed = engine.resolve_seed();
    let config = Config {
        cases: u32::try_from(num_tests).unwrap_or(u32::MAX),
        max_shrink_iters: engine.max_shrink_iters,
        failure_persistence: None,
        ..Config::default()
    };
    let mut runner = runner_for(seed, config);
    let trials = Cell::new(0u64);
    let first: RefCell<Option<(Value, TrialFailure)>> = RefCell::new(None);
    let last: RefCell<Option<(Value, TrialFailure)>> = RefCell::new(None);

    let outcome = runner.run(strategy, |value| {
        if first.borrow().is_none() {
            trials.set(trials.get() + 1);
        }
        match trial(&value) {
            Ok(()) => Ok(()),
            Err(failure) => {
                let message = failure.to_string();
                if first.borrow().is_none() {
                    first.replace(Some((value.clone(), failure.clone())));
                }
                last.replace(Some((value, failure)));
                Err(TestCaseError::fail(message))
            }
        }
    });

    let mut report = PropertyReport {
        passed: true,
        num_tests: trials.get(),
        seed,
        fail: None,
        fail_result: None,
        shrunk: None,
    };
    match outcome {
        Ok(()) => Ok(report),
        Err(TestError::Abort(reason)) => Err(GenError::new(spec, reason.message().to_string())),
        Err(TestError::Fail(_, smallest)) => {
            report.passed = false;
            if let Some((value, failure)) = first.into_inner() {
                report.fail = Some(value);
                report.fail_result = Some(failure);
            }
            let result = match last.into_inner() {
                Some((value, failure)) if value == smallest => Some(failure),
                _ => trial(&smallest).err(),
            };
            report.shrunk = result.map(|result| ShrunkCase {
                smallest,
                result,
            });
            Ok(report)
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Extracts a printable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

/// Builds a runner whose RNG is seeded from `seed`.
fn runner_for(seed: Seed, config: Config) -> TestRunner {
    TestRunner::new_with_rng(config, TestRng::from_seed(RngAlgorithm::ChaCha, seed.as_bytes()))
}
