// crates/spec-check-core/src/runtime/store.rs
// ============================================================================
// Module: Spec Check In-Memory Collaborators
// Description: In-memory spec registry and binding table.
// Purpose: Provide deterministic collaborator implementations without external deps.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! [`InMemorySpecRegistry`] holds fn-specs keyed by unit name.
//! [`BindingTable`] is the indirection layer call sites go through: callers
//! invoke units by name, so swapping a binding (for instrumentation) takes
//! effect on the next call.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::sync::RwLock;

use serde_json::Value;

use crate::core::CallError;
use crate::core::CallResult;
use crate::core::Callable;
use crate::core::FnSpec;
use crate::core::UnitName;
use crate::interfaces::BindingError;
use crate::interfaces::BindingResolver;
use crate::interfaces::SpecRegistry;

// ============================================================================
// SECTION: Spec Registry
// ============================================================================

/// In-memory fn-spec registry.
#[derive(Debug, Default, Clone)]
pub struct InMemorySpecRegistry {
    /// Fn-specs keyed by unit, protected by a mutex.
    specs: Arc<Mutex<BTreeMap<UnitName, FnSpec>>>,
}

impl InMemorySpecRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the fn-spec for `unit`.
    pub fn register(&self, unit: impl Into<UnitName>, spec: FnSpec) {
        self.guard().insert(unit.into(), spec);
    }

    /// Removes the fn-spec for `unit`, returning it when present.
    pub fn remove(&self, unit: &UnitName) -> Option<FnSpec> {
        self.guard().remove(unit)
    }

    /// Locks the map; a poisoned lock still holds consistent data.
    fn guard(&self) -> MutexGuard<'_, BTreeMap<UnitName, FnSpec>> {
        self.specs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SpecRegistry for InMemorySpecRegistry {
    fn lookup(&self, unit: &UnitName) -> Option<FnSpec> {
        self.guard().get(unit).cloned()
    }

    fn fn_spec_names(&self) -> BTreeSet<UnitName> {
        self.guard().keys().cloned().collect()
    }
}

// ============================================================================
// SECTION: Binding Table
// ============================================================================

/// Name to callable indirection table.
#[derive(Debug, Default, Clone)]
pub struct BindingTable {
    /// Current bindings, protected by a read-write lock.
    bindings: Arc<RwLock<BTreeMap<UnitName, Callable>>>,
}

impl BindingTable {
    /// Creates an empty binding table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `unit` to `callable`, creating the cell when missing.
    pub fn bind(&self, unit: impl Into<UnitName>, callable: Callable) {
        self.bindings.write().unwrap_or_else(PoisonError::into_inner).insert(unit.into(), callable);
    }

    /// Removes the binding for `unit`.
    pub fn unbind(&self, unit: &UnitName) -> Option<Callable> {
        self.bindings.write().unwrap_or_else(PoisonError::into_inner).remove(unit)
    }

    /// Invokes whatever is currently bound to `unit`.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::Unbound`] when nothing is bound, otherwise the
    /// callable's own error.
    pub fn invoke(&self, unit: &UnitName, args: &[Value]) -> CallResult {
        // Clone out of the lock so the callable never runs under it.
        let callable = self.resolve(unit).ok_or_else(|| CallError::Unbound {
            unit: unit.clone(),
        })?;
        callable.call(args)
    }
}

impl BindingResolver for BindingTable {
    fn resolve(&self, unit: &UnitName) -> Option<Callable> {
        self.bindings.read().unwrap_or_else(PoisonError::into_inner).get(unit).cloned()
    }

    fn set_binding(&self, unit: &UnitName, callable: Callable) -> Result<(), BindingError> {
        let mut guard = self.bindings.write().unwrap_or_else(PoisonError::into_inner);
        let Some(slot) = guard.get_mut(unit) else {
            return Err(BindingError::Unknown(unit.clone()));
        };
        *slot = callable;
        drop(guard);
        Ok(())
    }
}
