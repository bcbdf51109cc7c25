// crates/spec-check-core/src/runtime/mod.rs
// ============================================================================
// Module: Spec Check Runtime
// Description: Instrumentation, generative checking, and reporting.
// Purpose: Drive live contract enforcement and property-based checks.
// Dependencies: crate::core, crate::interfaces, crate::audit, proptest
// ============================================================================

//! ## Overview
//! The runtime installs checking proxies through the [`Instrumenter`], runs
//! generative checks through the [`Checker`], and folds results with the
//! [`report`] helpers. Stack attribution and per-thread suppression support
//! the proxies; in-memory collaborators back tests and embedded use.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod check;
pub mod generator;
pub mod instrument;
pub mod proxy;
pub mod report;
pub mod stack;
pub mod store;
pub mod suppression;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use check::CheckOptions;
pub use check::CheckRun;
pub use check::Checker;
pub use check::DEFAULT_NUM_TESTS;
pub use generator::DEFAULT_MAX_SHRINK_ITERS;
pub use generator::EngineOptions;
pub use instrument::InstrumentError;
pub use instrument::InstrumentOptions;
pub use instrument::InstrumentPause;
pub use instrument::InstrumentRecord;
pub use instrument::Instrumenter;
pub use instrument::SharedBindingResolver;
pub use instrument::SharedSpecRegistry;
pub use proxy::SharedFrameSource;
pub use report::AbbrevResult;
pub use report::OutcomeCategory;
pub use report::Summary;
pub use report::abbreviate;
pub use report::classify;
pub use report::summarize;
pub use report::summarize_to_sink;
pub use stack::BacktraceFrameSource;
pub use stack::FixedFrameSource;
pub use stack::NoFrameSource;
pub use stack::caller_frames;
pub use stack::nearest_caller;
pub use store::BindingTable;
pub use store::InMemorySpecRegistry;
pub use suppression::checking_enabled;
pub use suppression::with_checking_suppressed;
