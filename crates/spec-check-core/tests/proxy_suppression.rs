// crates/spec-check-core/tests/proxy_suppression.rs
// ============================================================================
// Module: Checking Proxy Tests
// Description: Tests for live argument checks and re-entrancy suppression.
// ============================================================================
//! ## Overview
//! Validates that proxies reject non-conforming arguments, validate a
//! self-recursive unit once per call chain, still check nested and mutually
//! recursive units, and attribute failures to the nearest caller frame.

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

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use serde_json::Value;
use serde_json::json;
use spec_check_core::CallError;
use spec_check_core::Callable;
use spec_check_core::FnSpec;
use spec_check_core::InstrumentAction;
use spec_check_core::InstrumentOptions;
use spec_check_core::PredicateSpec;
use spec_check_core::RawFrame;
use spec_check_core::Role;
use spec_check_core::runtime::FixedFrameSource;
use spec_check_core::with_checking_suppressed;

use crate::common::args1;
use crate::common::first_int;
use crate::common::fixture;
use crate::common::inc;
use crate::common::int;
use crate::common::pos_int;
use crate::common::pos_to_int;
use crate::common::unit;

#[test]
fn negative_argument_is_rejected_and_positive_delegates() {
    let fx = fixture();
    let name = unit("app.math/inc");
    fx.bindings.bind(name.clone(), inc());
    fx.registry.register(name.clone(), pos_to_int());
    fx.instrumenter.instrument(Some(&[name.clone()]), &InstrumentOptions::default()).unwrap();

    let err = fx.bindings.invoke(&name, &[json!(-1)]).unwrap_err();
    let CallError::CheckFailed(failure) = err else {
        panic!("expected instrumentation failure, got {err:?}");
    };
    assert_eq!(failure.unit, name);
    assert_eq!(failure.explain.role, Role::Args);
    assert_eq!(failure.explain.args, Some(json!([-1])));
    assert_eq!(failure.explain.spec, "(tuple pos-int)");
    assert_eq!(failure.explain.problems.len(), 1);
    assert_eq!(failure.explain.problems[0].path, vec!["0".to_string()]);
    assert!(failure.explain.caller.is_none());

    assert_eq!(fx.bindings.invoke(&name, &[json!(5)]).unwrap(), json!(6));
    assert!(fx.events.actions().contains(&(name.to_string(), InstrumentAction::ArgsCheckFailed)));
}

#[test]
fn self_recursive_unit_is_validated_once() {
    let fx = fixture();
    let name = unit("app.math/countdown");
    let validations = Arc::new(AtomicUsize::new(0));
    let counter = validations.clone();
    let counted = PredicateSpec::new("counted-int", move |value: &Value| {
        counter.fetch_add(1, Ordering::SeqCst);
        value.is_i64()
    })
    .shared();
    fx.registry.register(name.clone(), FnSpec::args_only(args1(counted)));

    let bindings = fx.bindings.clone();
    let self_name = name.clone();
    fx.bindings.bind(
        name.clone(),
        Callable::new(move |args| {
            let n = first_int(args)?;
            if n <= 0 {
                return Ok(json!(0));
            }
            bindings.invoke(&self_name, &[json!(n - 1)])
        }),
    );
    fx.instrumenter.instrument(Some(&[name.clone()]), &InstrumentOptions::default()).unwrap();

    assert_eq!(fx.bindings.invoke(&name, &[json!(3)]).unwrap(), json!(0));
    assert_eq!(validations.load(Ordering::SeqCst), 1);

    assert_eq!(fx.bindings.invoke(&name, &[json!(1)]).unwrap(), json!(0));
    assert_eq!(validations.load(Ordering::SeqCst), 2);
}

#[test]
fn nested_instrumented_units_are_still_checked() {
    let fx = fixture();
    let outer = unit("app.orders/submit");
    let inner = unit("app.math/inc");
    fx.bindings.bind(inner.clone(), inc());
    fx.registry.register(inner.clone(), pos_to_int());
    fx.registry.register(outer.clone(), FnSpec::args_only(args1(pos_int())));

    let bindings = fx.bindings.clone();
    let inner_name = inner.clone();
    fx.bindings.bind(
        outer.clone(),
        Callable::new(move |args| {
            let n = first_int(args)?;
            bindings.invoke(&inner_name, &[json!(-n)])
        }),
    );
    fx.instrumenter.instrument(None, &InstrumentOptions::default()).unwrap();

    let err = fx.bindings.invoke(&outer, &[json!(2)]).unwrap_err();
    let failure = err.as_check_failed().unwrap();
    assert_eq!(failure.unit, inner);
    assert_eq!(failure.explain.args, Some(json!([-2])));
}

#[test]
fn mutual_recursion_checks_the_reentered_unit() {
    let fx = fixture();
    let a = unit("app.math/a");
    let b = unit("app.math/b");
    fx.registry.register(a.clone(), FnSpec::args_only(args1(pos_int())));
    fx.registry.register(b.clone(), FnSpec::args_only(args1(int())));

    let bindings = fx.bindings.clone();
    let b_name = b.clone();
    fx.bindings.bind(
        a.clone(),
        Callable::new(move |args| bindings.invoke(&b_name, &[json!(first_int(args)?)])),
    );
    let bindings = fx.bindings.clone();
    let a_name = a.clone();
    fx.bindings.bind(
        b.clone(),
        Callable::new(move |args| {
            let n = first_int(args)?;
            if n < 0 {
                return Ok(json!(n));
            }
            bindings.invoke(&a_name, &[json!(-n)])
        }),
    );
    fx.instrumenter.instrument(None, &InstrumentOptions::default()).unwrap();

    let err = fx.bindings.invoke(&a, &[json!(3)]).unwrap_err();
    let failure = err.as_check_failed().unwrap();
    assert_eq!(failure.unit, a);
    assert_eq!(failure.explain.args, Some(json!([-3])));
}

#[test]
fn suppressed_calls_bypass_checks() {
    let fx = fixture();
    let name = unit("app.math/inc");
    fx.bindings.bind(name.clone(), inc());
    fx.registry.register(name.clone(), pos_to_int());
    fx.instrumenter.instrument(Some(&[name.clone()]), &InstrumentOptions::default()).unwrap();

    let result = with_checking_suppressed(|| fx.bindings.invoke(&name, &[json!(-1)]));
    assert_eq!(result.unwrap(), json!(0));
    assert!(fx.bindings.invoke(&name, &[json!(-1)]).is_err());
}

#[test]
fn failure_is_attributed_to_the_nearest_caller() {
    let fx = fixture();
    let frames = FixedFrameSource::new(vec![
        RawFrame::new("spec_check_core::runtime::proxy::checking_proxy::{{closure}}"),
        RawFrame::new("core::ops::function::Fn::call"),
        RawFrame::new("spec_check_core::runtime::store::BindingTable::invoke::h0123456789abcdef"),
        RawFrame::new("app::orders::submit::{{closure}}").at("src/orders.rs", 12),
        RawFrame::new("app::main"),
    ]);
    let instrumenter = fx.instrumenter.clone().with_frame_source(Arc::new(frames));
    let name = unit("app.math/inc");
    fx.bindings.bind(name.clone(), inc());
    fx.registry.register(name.clone(), pos_to_int());
    instrumenter.instrument(Some(&[name.clone()]), &InstrumentOptions::default()).unwrap();

    let err = fx.bindings.invoke(&name, &[json!(0)]).unwrap_err();
    let caller = err.as_check_failed().unwrap().explain.caller.clone().unwrap();
    assert_eq!(caller.unit.as_str(), "app.orders/submit");
    assert_eq!(caller.local_fn.as_deref(), Some("closure"));
    assert_eq!(caller.file.as_deref(), Some("src/orders.rs"));
    assert_eq!(caller.line, Some(12));
}

#[test]
fn return_values_are_not_checked_live() {
    let fx = fixture();
    let name = unit("app.math/inc");
    fx.bindings.bind(name.clone(), Callable::constant(json!("not an int")));
    fx.registry.register(name.clone(), pos_to_int());
    fx.instrumenter.instrument(Some(&[name.clone()]), &InstrumentOptions::default()).unwrap();

    assert_eq!(fx.bindings.invoke(&name, &[json!(1)]).unwrap(), json!("not an int"));
}

#[test]
fn suppression_does_not_leak_to_other_threads() {
    let fx = fixture();
    let name = unit("app.math/inc");
    fx.bindings.bind(name.clone(), inc());
    fx.registry.register(name.clone(), pos_to_int());
    fx.instrumenter.instrument(Some(&[name.clone()]), &InstrumentOptions::default()).unwrap();

    let bindings = fx.bindings.clone();
    let rejected = with_checking_suppressed(|| {
        std::thread::spawn(move || bindings.invoke(&name, &[json!(-1)]).is_err()).join().unwrap()
    });
    assert!(rejected);
}
