// crates/spec-check-core/src/runtime/proxy.rs
// ============================================================================
// Module: Checking Proxy
// Description: Substitute callables that enforce argument contracts live.
// Purpose: Validate every instrumented call before delegating to real code.
// Dependencies: crate::core, crate::audit, crate::interfaces
// ============================================================================

//! ## Overview
//! A checking proxy stands in for a unit's callable. On each call it conforms
//! the argument tuple against the fn-spec's `args` spec and either fails with
//! [`CallError::CheckFailed`] or delegates unchanged. Only `args` is enforced
//! here; `ret` and relation specs are left to the generative runner.
//!
//! Validation runs with checking suppressed, and the unit is marked active
//! while its delegate executes, so spec predicates and direct self-recursion
//! never trigger a second validation. A unit re-entered through another
//! instrumented unit is checked again.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use serde_json::Value;

use crate::audit::InstrumentAction;
use crate::audit::InstrumentEvent;
use crate::audit::SharedEventSink;
use crate::core::CallError;
use crate::core::Callable;
use crate::core::ExplainData;
use crate::core::FnSpec;
use crate::core::InstrumentCheckFailed;
use crate::core::Role;
use crate::core::UnitName;
use crate::interfaces::FrameSource;
use crate::runtime::stack::nearest_caller;
use crate::runtime::suppression::ActiveGuard;
use crate::runtime::suppression::SuppressGuard;
use crate::runtime::suppression::checking_enabled;
use crate::runtime::suppression::is_innermost_active;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Shared frame source handle used by proxies.
pub type SharedFrameSource = Arc<dyn FrameSource + Send + Sync>;

// ============================================================================
// SECTION: Proxy Factory
// ============================================================================

/// Builds a checking proxy for `unit` around `delegate`.
#[must_use]
pub fn checking_proxy(
    unit: UnitName,
    spec: &FnSpec,
    delegate: Callable,
    frames: SharedFrameSource,
    events: SharedEventSink,
) -> Callable {
    let args_spec = spec.args().cloned();
    Callable::new(move |args| {
        if !checking_enabled() || is_innermost_active(&unit) {
            return delegate.call(args);
        }
        if let Some(args_spec) = &args_spec {
            let violation = {
                let _suppressed = SuppressGuard::engage();
                let tuple = Value::Array(args.to_vec());
                if args_spec.conform(&tuple).is_invalid() {
                    let caller = nearest_caller(&frames.capture());
                    Some(
                        ExplainData::explain(args_spec.as_ref(), Role::Args, tuple.clone())
                            .with_caller(caller)
                            .with_args(tuple),
                    )
                } else {
                    None
                }
            };
            if let Some(explain) = violation {
                events.record_instrument(
                    &InstrumentEvent::new(&unit, InstrumentAction::ArgsCheckFailed)
                        .with_detail(explain.spec.clone()),
                );
                return Err(CallError::CheckFailed(Box::new(InstrumentCheckFailed {
                    unit: unit.clone(),
                    explain,
                })));
            }
        }
        let _active = ActiveGuard::enter(unit.clone());
        delegate.call(args)
    })
}
