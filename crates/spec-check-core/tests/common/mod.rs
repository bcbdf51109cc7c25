// crates/spec-check-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: Shared specs, callables, and collaborators for core tests.
// Purpose: Provide deterministic fixtures for instrumentation and checking.
// Dependencies: spec-check-core, proptest, serde_json
// ============================================================================

//! ## Overview
//! Fixtures wire an in-memory spec registry and binding table into an
//! [`Instrumenter`] that captures no stack frames, plus a recording event
//! sink and a handful of integer specs and callables.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only helpers use unwrap/expect for clarity."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;

use proptest::prelude::*;
use serde_json::Value;
use spec_check_core::BindingTable;
use spec_check_core::CallError;
use spec_check_core::Callable;
use spec_check_core::CheckEvent;
use spec_check_core::EventSink;
use spec_check_core::FnSpec;
use spec_check_core::InMemorySpecRegistry;
use spec_check_core::InstrumentAction;
use spec_check_core::InstrumentEvent;
use spec_check_core::Instrumenter;
use spec_check_core::PredicateSpec;
use spec_check_core::SpecRef;
use spec_check_core::TupleSpec;
use spec_check_core::UnitName;
use spec_check_core::runtime::NoFrameSource;

// ============================================================================
// SECTION: Fixture
// ============================================================================

/// Registry, bindings, and an instrumenter over both.
pub struct Fixture {
    pub registry: InMemorySpecRegistry,
    pub bindings: BindingTable,
    pub instrumenter: Instrumenter,
    pub events: Arc<RecordingSink>,
}

pub fn fixture() -> Fixture {
    let registry = InMemorySpecRegistry::new();
    let bindings = BindingTable::new();
    let events = Arc::new(RecordingSink::default());
    let instrumenter = Instrumenter::new(registry.clone(), bindings.clone())
        .with_frame_source(Arc::new(NoFrameSource))
        .with_event_sink(events.clone());
    Fixture {
        registry,
        bindings,
        instrumenter,
        events,
    }
}

pub fn unit(name: &str) -> UnitName {
    UnitName::new(name)
}

// ============================================================================
// SECTION: Specs
// ============================================================================

/// Positive integers, generated from `1 .. 1000`.
pub fn pos_int() -> SpecRef {
    PredicateSpec::new("pos-int", |value| value.as_i64().is_some_and(|n| n > 0))
        .with_generator(|| (1i64 .. 1000).prop_map(Value::from).boxed())
        .shared()
}

/// Any integer, generated from `-1000 .. 1000`.
pub fn int() -> SpecRef {
    PredicateSpec::new("int", Value::is_i64)
        .with_generator(|| (-1000i64 .. 1000).prop_map(Value::from).boxed())
        .shared()
}

/// Even integers; no generator.
pub fn even_int() -> SpecRef {
    PredicateSpec::new("even-int", |value| value.as_i64().is_some_and(|n| n % 2 == 0)).shared()
}

/// Single-argument tuple.
pub fn args1(spec: SpecRef) -> SpecRef {
    TupleSpec::new(vec![spec]).shared()
}

/// `(tuple pos-int)` arguments returning `int`.
pub fn pos_to_int() -> FnSpec {
    FnSpec::new(Some(args1(pos_int())), Some(int()), None).unwrap()
}

// ============================================================================
// SECTION: Callables
// ============================================================================

/// First argument as an integer.
pub fn first_int(args: &[Value]) -> Result<i64, CallError> {
    args.first().and_then(Value::as_i64).ok_or_else(|| CallError::raised("expected an integer"))
}

/// Returns its argument plus one.
pub fn inc() -> Callable {
    Callable::new(|args| Ok(Value::from(first_int(args)? + 1)))
}

/// Returns its argument unchanged.
pub fn identity() -> Callable {
    Callable::new(|args| Ok(Value::from(first_int(args)?)))
}

// ============================================================================
// SECTION: Recording Sink
// ============================================================================

/// Event sink that keeps every event in memory.
#[derive(Default)]
pub struct RecordingSink {
    pub instrument: Mutex<Vec<InstrumentEvent>>,
    pub checks: Mutex<Vec<CheckEvent>>,
}

impl RecordingSink {
    pub fn actions(&self) -> Vec<(String, InstrumentAction)> {
        self.instrument
            .lock()
            .unwrap()
            .iter()
            .map(|event| (event.unit.to_string(), event.action))
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn record_instrument(&self, event: &InstrumentEvent) {
        self.instrument.lock().unwrap().push(event.clone());
    }

    fn record_check(&self, event: &CheckEvent) {
        self.checks.lock().unwrap().push(event.clone());
    }
}
