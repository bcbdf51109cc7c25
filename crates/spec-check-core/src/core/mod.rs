// crates/spec-check-core/src/core/mod.rs
// ============================================================================
// Module: Spec Check Core Types
// Description: Canonical unit, spec, callable, and result structures.
// Purpose: Provide stable types shared by instrumentation and generative checking.
// Dependencies: proptest, rand, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Core types define how units are named, what a fn-spec contains, how
//! callables are invoked and compared, and what a check run reports. Runtime
//! modules consume these types; they never reach into collaborator internals.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod callable;
pub mod explain;
pub mod frame;
pub mod identifiers;
pub mod result;
pub mod seed;
pub mod spec;
pub mod specs;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use callable::CallError;
pub use callable::CallResult;
pub use callable::Callable;
pub use explain::ExplainData;
pub use explain::InstrumentCheckFailed;
pub use explain::Problem;
pub use explain::Role;
pub use frame::Frame;
pub use frame::RawFrame;
pub use identifiers::UnitName;
pub use result::CheckFailure;
pub use result::CheckOutcome;
pub use result::CheckResult;
pub use result::PropertyReport;
pub use result::ShrunkCase;
pub use result::TrialFailure;
pub use seed::Seed;
pub use seed::SeedError;
pub use spec::Conformed;
pub use spec::FnSpec;
pub use spec::FnSpecError;
pub use spec::FnSpecSummary;
pub use spec::GenError;
pub use spec::GenFactory;
pub use spec::GenOverrides;
pub use spec::Spec;
pub use spec::SpecRef;
pub use spec::gen_factory;
pub use specs::PredicateSpec;
pub use specs::TupleSpec;
