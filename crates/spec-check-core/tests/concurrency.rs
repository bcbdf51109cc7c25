// crates/spec-check-core/tests/concurrency.rs
// ============================================================================
// Module: Instrumentation Concurrency Tests
// Description: Tests for concurrent install and restore across threads.
// ============================================================================
//! ## Overview
//! Validates that concurrent instrumentation from many threads leaves exactly
//! one consistent record per installed unit and never wraps a proxy.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use std::collections::BTreeSet;
use std::thread;

use serde_json::json;
use spec_check_core::BindingResolver;
use spec_check_core::Callable;
use spec_check_core::InstrumentOptions;
use spec_check_core::UnitName;

use crate::common::Fixture;
use crate::common::fixture;
use crate::common::inc;
use crate::common::pos_to_int;
use crate::common::unit;

const UNITS: usize = 100;
const THREADS: usize = 8;

fn seeded() -> (Fixture, Vec<UnitName>, Vec<Callable>) {
    let fx = fixture();
    let mut names = Vec::with_capacity(UNITS);
    let mut originals = Vec::with_capacity(UNITS);
    for index in 0 .. UNITS {
        let name = unit(&format!("app.load/unit{index}"));
        let original = inc();
        fx.bindings.bind(name.clone(), original.clone());
        fx.registry.register(name.clone(), pos_to_int());
        names.push(name);
        originals.push(original);
    }
    (fx, names, originals)
}

#[test]
fn concurrent_install_and_restore_keeps_net_state() {
    let (fx, names, originals) = seeded();

    thread::scope(|scope| {
        for worker in 0 .. THREADS {
            let instrumenter = fx.instrumenter.clone();
            let names = &names;
            scope.spawn(move || {
                let options = InstrumentOptions::default();
                for (index, name) in names.iter().enumerate() {
                    if index % THREADS != worker {
                        continue;
                    }
                    let target = std::slice::from_ref(name);
                    for _ in 0 .. 3 {
                        instrumenter.instrument(Some(target), &options).unwrap();
                    }
                    if index % 3 == 0 {
                        instrumenter.unstrument(Some(target)).unwrap();
                    }
                }
            });
        }
    });

    let expected: BTreeSet<UnitName> = names
        .iter()
        .enumerate()
        .filter(|(index, _)| index % 3 != 0)
        .map(|(_, name)| name.clone())
        .collect();
    assert_eq!(fx.instrumenter.instrumented_units().unwrap(), expected);

    for (index, (name, original)) in names.iter().zip(&originals).enumerate() {
        let live = fx.bindings.resolve(name).unwrap();
        if index % 3 == 0 {
            assert!(live.same_as(original), "{name} should be restored");
            assert!(fx.instrumenter.raw_callable(name).unwrap().is_none());
        } else {
            assert!(!live.same_as(original), "{name} should be instrumented");
            assert!(fx.instrumenter.raw_callable(name).unwrap().unwrap().same_as(original));
            assert!(fx.bindings.invoke(name, &[json!(-1)]).is_err());
        }
    }
}

#[test]
fn contended_install_of_the_same_units_never_wraps_a_proxy() {
    let (fx, names, originals) = seeded();

    thread::scope(|scope| {
        for _ in 0 .. THREADS {
            let instrumenter = fx.instrumenter.clone();
            let names = &names;
            scope.spawn(move || {
                instrumenter.instrument(Some(names.as_slice()), &InstrumentOptions::default()).unwrap();
            });
        }
    });

    assert_eq!(fx.instrumenter.instrumented_units().unwrap().len(), UNITS);
    for (name, original) in names.iter().zip(&originals) {
        assert!(fx.instrumenter.raw_callable(name).unwrap().unwrap().same_as(original));
        assert_eq!(fx.bindings.invoke(name, &[json!(1)]).unwrap(), json!(2));
    }

    let removed = fx.instrumenter.unstrument(None).unwrap();
    assert_eq!(removed.len(), UNITS);
    for (name, original) in names.iter().zip(&originals) {
        assert!(fx.bindings.resolve(name).unwrap().same_as(original));
    }
}
