// crates/spec-check-core/src/runtime/check.rs
// ============================================================================
// Module: Generative Check Runner
// Description: Property-based testing of units against their fn-specs.
// Purpose: Generate argument tuples, invoke units, and classify outcomes.
// Dependencies: crate::core, crate::runtime, proptest, serde_json
// ============================================================================

//! ## Overview
//! [`Checker`] drives each unit through a property run: argument tuples are
//! drawn from the `args` generator, the unit is invoked with its
//! instrumentation paused, and the return value is conformed against `ret`
//! and the relation spec. Failures are always captured in the
//! [`CheckResult`], never raised.
//!
//! [`Checker::check`] fans units out to a bounded pool of worker threads and
//! returns a lazy [`CheckRun`] yielding results in completion order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::VecDeque;
use std::fmt;
use std::num::NonZeroUsize;
use std::panic;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::mpsc;
use std::thread;

use serde_json::Value;
use serde_json::json;

use crate::core::CallError;
use crate::core::CallResult;
use crate::core::Callable;
use crate::core::CheckFailure;
use crate::core::CheckOutcome;
use crate::core::CheckResult;
use crate::core::Conformed;
use crate::core::ExplainData;
use crate::core::FnSpec;
use crate::core::GenError;
use crate::core::GenOverrides;
use crate::core::Role;
use crate::core::Spec;
use crate::core::TrialFailure;
use crate::core::UnitName;
use crate::runtime::generator::EngineOptions;
use crate::runtime::generator::build_generator;
use crate::runtime::generator::panic_message;
use crate::runtime::generator::run_property;
use crate::runtime::instrument::Instrumenter;

// ============================================================================
// SECTION: Options
// ============================================================================

/// Default number of trials per unit.
pub const DEFAULT_NUM_TESTS: u64 = 1000;

/// Options for a check run.
#[derive(Clone)]
pub struct CheckOptions {
    /// Maximum trials per unit.
    pub num_tests: u64,
    /// Generator overrides keyed by spec description.
    pub generators: GenOverrides,
    /// Per-unit fn-spec overrides, preferred over the registry.
    pub specs: BTreeMap<UnitName, FnSpec>,
    /// Generation engine options.
    pub engine: EngineOptions,
    /// Worker threads used by [`Checker::check`]; zero checks on the consuming thread.
    pub parallelism: usize,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            num_tests: DEFAULT_NUM_TESTS,
            generators: GenOverrides::new(),
            specs: BTreeMap::new(),
            engine: EngineOptions::default(),
            parallelism: thread::available_parallelism().map_or(1, NonZeroUsize::get),
        }
    }
}

impl fmt::Debug for CheckOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckOptions")
            .field("num_tests", &self.num_tests)
            .field("generators", &self.generators.keys().collect::<Vec<_>>())
            .field("specs", &self.specs)
            .field("engine", &self.engine)
            .field("parallelism", &self.parallelism)
            .finish()
    }
}

// ============================================================================
// SECTION: Checker
// ============================================================================

/// Generative test runner sharing an instrumenter's registry and bindings.
#[derive(Clone)]
pub struct Checker {
    /// Source of specs and bindings; pauses instrumentation during checks.
    instrumenter: Instrumenter,
}

impl Checker {
    /// Creates a checker over `instrumenter`.
    #[must_use]
    pub const fn new(instrumenter: Instrumenter) -> Self {
        Self {
            instrumenter,
        }
    }

    /// Units that can be checked with `options`.
    #[must_use]
    pub fn checkable_units(&self, options: &CheckOptions) -> BTreeSet<UnitName> {
        let mut units = self.instrumenter.fn_spec_names();
        units.extend(options.specs.keys().cloned());
        units
    }

    /// Checks `names` (filtered to checkable units), or every checkable unit.
    #[must_use]
    pub fn check(&self, names: Option<&[UnitName]>, options: &CheckOptions) -> CheckRun {
        let checkable = self.checkable_units(options);
        let units: VecDeque<UnitName> = match names {
            Some(names) => {
                let mut seen = BTreeSet::new();
                names
                    .iter()
                    .filter(|name| checkable.contains(*name) && seen.insert((*name).clone()))
                    .cloned()
                    .collect()
            }
            None => checkable.into_iter().collect(),
        };
        CheckRun::start(self.clone(), Arc::new(options.clone()), units)
    }

    /// Checks a single unit by name.
    #[must_use]
    pub fn check_unit(&self, unit: &UnitName, options: &CheckOptions) -> CheckResult {
        let spec = self.instrumenter.effective_spec(unit, &options.specs);
        let _pause = self.instrumenter.pause(unit).ok().flatten();
        let Some(callable) = self.instrumenter.bindings().current_binding(unit) else {
            return CheckResult::unchecked(Some(unit.clone()), spec, CheckFailure::NoFn);
        };
        let Some(spec) = spec else {
            return CheckResult::unchecked(Some(unit.clone()), None, CheckFailure::NoArgSpec);
        };
        let mut result = check_with(&callable, spec, options);
        result.unit = Some(unit.clone());
        result
    }

    /// Checks `unit`, turning a panic outside the trials into a `Threw` result.
    fn check_guarded(&self, unit: &UnitName, options: &CheckOptions) -> CheckResult {
        panic::catch_unwind(AssertUnwindSafe(|| self.check_unit(unit, options))).unwrap_or_else(
            |payload| {
                CheckResult::unchecked(
                    Some(unit.clone()),
                    None,
                    CheckFailure::Threw(CallError::Panicked {
                        message: panic_message(payload.as_ref()),
                    }),
                )
            },
        )
    }

    /// Checks an ad-hoc callable against `spec`.
    #[must_use]
    pub fn check_callable(
        &self,
        callable: &Callable,
        spec: &FnSpec,
        options: &CheckOptions,
    ) -> CheckResult {
        check_with(callable, spec.clone(), options)
    }
}

// ============================================================================
// SECTION: Check Run
// ============================================================================

/// Lazy sequence of check results, in completion order.
///
/// Dropping the run stops workers once their current unit finishes.
pub struct CheckRun {
    /// Checker used for units no worker picked up.
    checker: Checker,
    /// Options shared with the workers.
    options: Arc<CheckOptions>,
    /// Units not yet started.
    queue: Arc<Mutex<VecDeque<UnitName>>>,
    /// Results produced by workers.
    results: mpsc::Receiver<CheckResult>,
}

impl CheckRun {
    /// Spawns up to `options.parallelism` workers over `units`.
    fn start(checker: Checker, options: Arc<CheckOptions>, units: VecDeque<UnitName>) -> Self {
        let workers = options.parallelism.min(units.len());
        let queue = Arc::new(Mutex::new(units));
        let (sender, results) = mpsc::channel();
        for index in 0 .. workers {
            let checker = checker.clone();
            let options = Arc::clone(&options);
            let queue = Arc::clone(&queue);
            let sender = sender.clone();
            let spawned = thread::Builder::new()
                .name(format!("spec-check-worker-{index}"))
                .spawn(move || {
                    while let Some(unit) = next_unit(&queue) {
                        if sender.send(checker.check_guarded(&unit, &options)).is_err() {
                            break;
                        }
                    }
                });
            // Units left behind by a failed spawn are checked by the consumer.
            if spawned.is_err() {
                break;
            }
        }
        drop(sender);
        Self {
            checker,
            options,
            queue,
            results,
        }
    }
}

impl Iterator for CheckRun {
    type Item = CheckResult;

    fn next(&mut self) -> Option<Self::Item> {
        if let Ok(result) = self.results.recv() {
            return Some(result);
        }
        let unit = next_unit(&self.queue)?;
        Some(self.checker.check_guarded(&unit, &self.options))
    }
}

impl Drop for CheckRun {
    fn drop(&mut self) {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

/// Pops the next pending unit.
fn next_unit(queue: &Mutex<VecDeque<UnitName>>) -> Option<UnitName> {
    queue.lock().unwrap_or_else(PoisonError::into_inner).pop_front()
}

// ============================================================================
// SECTION: Trials
// ============================================================================

/// Runs the property for `callable` and folds the report into a result.
fn check_with(callable: &Callable, spec: FnSpec, options: &CheckOptions) -> CheckResult {
    let Some(args_spec) = spec.args().cloned() else {
        return CheckResult::unchecked(None, Some(spec), CheckFailure::NoArgSpec);
    };
    let strategy = match build_generator(args_spec.as_ref(), &options.generators) {
        Ok(strategy) => strategy,
        Err(err) => return CheckResult::unchecked(None, Some(spec), CheckFailure::NoGen(err)),
    };
    let description = args_spec.describe();
    // Trials catch their own panics; anything reaching here came from the strategy.
    let report = panic::catch_unwind(AssertUnwindSafe(|| {
        run_property(&strategy, options.num_tests, &options.engine, &description, |args| {
            run_trial(callable, &spec, args_spec.as_ref(), args)
        })
    }))
    .unwrap_or_else(|payload| {
        Err(GenError::new(
            description.clone(),
            format!("generation panicked: {}", panic_message(payload.as_ref())),
        ))
    });
    let report = match report {
        Ok(report) => report,
        Err(err) => return CheckResult::unchecked(None, Some(spec), CheckFailure::NoGen(err)),
    };
    let failure = report
        .shrunk
        .as_ref()
        .map(|shrunk| shrunk.result.clone())
        .or_else(|| report.fail_result.clone());
    let outcome = match (report.passed, failure) {
        (true, _) => CheckOutcome::Passed,
        (false, Some(failure)) => CheckOutcome::Failed(failure.into()),
        (false, None) => CheckOutcome::Failed(CheckFailure::Threw(CallError::raised(
            "property failed without a recorded trial",
        ))),
    };
    CheckResult {
        unit: None,
        spec: Some(spec),
        outcome,
        report: Some(report),
    }
}

/// Executes one trial: conform args, invoke, conform ret and relation.
fn run_trial(
    callable: &Callable,
    spec: &FnSpec,
    args_spec: &dyn Spec,
    args: &Value,
) -> Result<(), TrialFailure> {
    let Conformed::Valid(conformed_args) = args_spec.conform(args) else {
        return Err(TrialFailure::Violation(ExplainData::explain(args_spec, Role::Args, args.clone())));
    };
    let tuple = match args {
        Value::Array(items) => items.as_slice(),
        other => std::slice::from_ref(other),
    };
    let ret = invoke(callable, tuple).map_err(TrialFailure::Threw)?;
    let Some(ret_spec) = spec.ret() else {
        return Ok(());
    };
    let Conformed::Valid(conformed_ret) = ret_spec.conform(&ret) else {
        return Err(TrialFailure::Violation(
            ExplainData::explain(ret_spec.as_ref(), Role::Ret, ret).with_args(args.clone()),
        ));
    };
    if let Some(relation) = spec.relation() {
        let pair = json!({ "args": conformed_args, "ret": conformed_ret });
        if relation.conform(&pair).is_invalid() {
            return Err(TrialFailure::Violation(
                ExplainData::explain(relation.as_ref(), Role::Fn, pair).with_args(args.clone()),
            ));
        }
    }
    Ok(())
}

/// Invokes `callable`, converting a panic into [`CallError::Panicked`].
fn invoke(callable: &Callable, args: &[Value]) -> CallResult {
    panic::catch_unwind(AssertUnwindSafe(|| callable.call(args))).unwrap_or_else(|payload| {
        Err(CallError::Panicked {
            message: panic_message(payload.as_ref()),
        })
    })
}
