// crates/spec-check-core/src/interfaces/mod.rs
// ============================================================================
// Module: Spec Check Interfaces
// Description: Collaborator contracts for spec lookup, binding, and stack capture.
// Purpose: Define the seams the instrumenter and checker depend on.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! Instrumentation never owns the callables or specs it works with. Specs
//! come from a [`SpecRegistry`], live callables from a [`BindingResolver`],
//! and caller attribution from a [`FrameSource`]. Each has an in-memory or
//! standard-library implementation in [`crate::runtime`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use thiserror::Error;

use crate::core::Callable;
use crate::core::FnSpec;
use crate::core::RawFrame;
use crate::core::UnitName;

// ============================================================================
// SECTION: Spec Registry
// ============================================================================

/// Source of fn-specs registered for units.
pub trait SpecRegistry {
    /// Returns the fn-spec registered for `unit`.
    fn lookup(&self, unit: &UnitName) -> Option<FnSpec>;

    /// Returns every unit name that has a registered fn-spec.
    fn fn_spec_names(&self) -> BTreeSet<UnitName>;
}

// ============================================================================
// SECTION: Binding Resolver
// ============================================================================

/// Binding resolver errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    /// The name has no binding cell to update.
    #[error("no binding for {0}")]
    Unknown(UnitName),
    /// The resolver backend failed.
    #[error("binding resolver error: {0}")]
    Resolver(String),
}

/// Indirection cell mapping stable names to their current callable.
pub trait BindingResolver {
    /// Resolves `unit` to its live callable.
    fn resolve(&self, unit: &UnitName) -> Option<Callable>;

    /// Returns the callable currently bound to `unit`.
    fn current_binding(&self, unit: &UnitName) -> Option<Callable> {
        self.resolve(unit)
    }

    /// Rebinds `unit` to `callable`.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError`] when the binding cannot be updated.
    fn set_binding(&self, unit: &UnitName, callable: Callable) -> Result<(), BindingError>;
}

// ============================================================================
// SECTION: Frame Source
// ============================================================================

/// Best-effort capture of the current call stack.
pub trait FrameSource {
    /// Captures raw frames, innermost first. May return nothing.
    fn capture(&self) -> Vec<RawFrame>;
}
