// crates/spec-check-config/src/lib.rs
// ============================================================================
// Module: Spec Check Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for spec-check.toml semantics.
// Dependencies: spec-check-core, serde, toml
// ============================================================================

//! ## Overview
//! `spec-check-config` defines the configuration model for spec-check. It
//! provides strict, fail-closed validation and builds the runtime options
//! and audit sink described by a `spec-check.toml` file.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
