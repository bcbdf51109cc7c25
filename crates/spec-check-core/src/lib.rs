// crates/spec-check-core/src/lib.rs
// ============================================================================
// Module: Spec Check Core Library
// Description: Public API surface for spec-driven instrumentation and checking.
// Purpose: Expose core types, collaborator interfaces, runtime, and audit sinks.
// Dependencies: crate::{audit, core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Spec Check attaches fn-specs (argument, return, and relation contracts) to
//! named units. Instrumentation swaps a unit's binding for a proxy that
//! validates arguments on every call; generative checking draws argument
//! tuples from the `args` spec and validates what the unit returns.
//!
//! Specs, bindings, and stack capture are collaborators reached through
//! [`interfaces`], so embedders supply their own registry and binding layer.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use audit::CheckEvent;
pub use audit::EventSink;
pub use audit::FileEventSink;
pub use audit::InstrumentAction;
pub use audit::InstrumentEvent;
pub use audit::NoopEventSink;
pub use audit::SharedEventSink;
pub use audit::StderrEventSink;
pub use interfaces::BindingError;
pub use interfaces::BindingResolver;
pub use interfaces::FrameSource;
pub use interfaces::SpecRegistry;
pub use runtime::BindingTable;
pub use runtime::CheckOptions;
pub use runtime::CheckRun;
pub use runtime::Checker;
pub use runtime::EngineOptions;
pub use runtime::InMemorySpecRegistry;
pub use runtime::InstrumentError;
pub use runtime::InstrumentOptions;
pub use runtime::Instrumenter;
pub use runtime::OutcomeCategory;
pub use runtime::Summary;
pub use runtime::with_checking_suppressed;
