// crates/spec-check-core/src/core/callable.rs
// ============================================================================
// Module: Callables
// Description: Type-erased callable units and their failure modes.
// Purpose: Give instrumentation a comparable, shareable handle to live code.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! A [`Callable`] takes an argument tuple of JSON values and returns a JSON
//! value or a [`CallError`]. Callables are compared by identity, which is how
//! the instrumenter detects whether a binding still holds its proxy.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::explain::InstrumentCheckFailed;
use crate::core::identifiers::UnitName;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failure raised by a callable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CallError {
    /// An instrumented unit rejected its arguments.
    #[error(transparent)]
    CheckFailed(Box<InstrumentCheckFailed>),
    /// The unit itself reported a failure.
    #[error("call raised: {message}")]
    Raised {
        /// Failure message.
        message: String,
        /// Optional structured payload.
        data: Option<Value>,
    },
    /// The unit panicked while under generative checking.
    #[error("call panicked: {message}")]
    Panicked {
        /// Panic payload rendered as text.
        message: String,
    },
    /// No callable is bound to the invoked name.
    #[error("no callable bound to {unit}")]
    Unbound {
        /// Name that was invoked.
        unit: UnitName,
    },
}

impl CallError {
    /// Creates a raised failure with a message.
    pub fn raised(message: impl Into<String>) -> Self {
        Self::Raised {
            message: message.into(),
            data: None,
        }
    }

    /// Returns the instrumentation failure when this error carries one.
    #[must_use]
    pub fn as_check_failed(&self) -> Option<&InstrumentCheckFailed> {
        match self {
            Self::CheckFailed(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Result of invoking a callable.
pub type CallResult = Result<Value, CallError>;

// ============================================================================
// SECTION: Callable
// ============================================================================

/// Boxed function signature shared by every callable.
type CallFn = dyn Fn(&[Value]) -> CallResult + Send + Sync;

/// Shareable callable unit compared by identity.
#[derive(Clone)]
pub struct Callable {
    /// Function body.
    inner: Arc<CallFn>,
}

impl Callable {
    /// Wraps a function as a callable.
    pub fn new(f: impl Fn(&[Value]) -> CallResult + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(f),
        }
    }

    /// Creates a callable that ignores its arguments and returns `value`.
    #[must_use]
    pub fn constant(value: Value) -> Self {
        Self::new(move |_| Ok(value.clone()))
    }

    /// Invokes the callable.
    ///
    /// # Errors
    ///
    /// Returns whatever [`CallError`] the underlying function produces.
    pub fn call(&self, args: &[Value]) -> CallResult {
        (self.inner)(args)
    }

    /// Returns true when both handles refer to the same function instance.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callable({:p})", Arc::as_ptr(&self.inner).cast::<()>())
    }
}
