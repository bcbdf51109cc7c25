// crates/spec-check-core/src/core/spec.rs
// ============================================================================
// Module: Spec Contracts
// Description: Spec capability trait and the fn-spec triple.
// Purpose: Describe the contract surface consumed by instrumentation and checking.
// Dependencies: proptest, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! A [`Spec`] is an opaque capability: it can conform a value, explain a
//! non-conforming value, and build a generator for conforming values. An
//! [`FnSpec`] groups the `args`, `ret`, and relation specs attached to a unit.
//! Generators are `proptest` strategies so the runner can shrink failures.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use proptest::strategy::BoxedStrategy;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::explain::Problem;

// ============================================================================
// SECTION: Spec Capability
// ============================================================================

/// Outcome of conforming a value against a spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conformed {
    /// Value conforms; carries the (possibly transformed) conformed value.
    Valid(Value),
    /// Value does not conform.
    Invalid,
}

impl Conformed {
    /// Returns the conformed value when valid.
    #[must_use]
    pub fn into_valid(self) -> Option<Value> {
        match self {
            Self::Valid(value) => Some(value),
            Self::Invalid => None,
        }
    }

    /// Returns true when the value did not conform.
    #[must_use]
    pub const fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid)
    }
}

/// Generator factory used to override a spec's default generator.
///
/// A factory that cannot produce a generator returns [`GenError`].
pub type GenFactory = Arc<dyn Fn() -> Result<BoxedStrategy<Value>, GenError> + Send + Sync>;

/// Wraps an infallible strategy constructor as a [`GenFactory`].
#[must_use]
pub fn gen_factory(
    strategy: impl Fn() -> BoxedStrategy<Value> + Send + Sync + 'static,
) -> GenFactory {
    Arc::new(move || Ok(strategy()))
}

/// Generator overrides keyed by spec description.
pub type GenOverrides = BTreeMap<String, GenFactory>;

/// Generator construction failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("unable to construct generator for {spec}: {reason}")]
pub struct GenError {
    /// Description of the spec that could not produce a generator.
    pub spec: String,
    /// Reason generation is unavailable.
    pub reason: String,
}

impl GenError {
    /// Creates a generator error.
    #[must_use]
    pub fn new(spec: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            spec: spec.into(),
            reason: reason.into(),
        }
    }
}

/// Declarative contract over values.
///
/// Implementations must be deterministic: conforming the same value twice
/// yields the same outcome.
pub trait Spec: Send + Sync {
    /// Returns a short human-readable description (also the override key).
    fn describe(&self) -> String;

    /// Validates `value`, returning its conformed form.
    fn conform(&self, value: &Value) -> Conformed;

    /// Explains why `value` does not conform. Empty when it conforms.
    fn explain(&self, value: &Value) -> Vec<Problem>;

    /// Builds a generator of conforming values.
    ///
    /// # Errors
    ///
    /// Returns [`GenError`] when no generator can be built for this spec.
    fn generator(&self, overrides: &GenOverrides) -> Result<BoxedStrategy<Value>, GenError>;
}

/// Shared spec handle.
pub type SpecRef = Arc<dyn Spec>;

// ============================================================================
// SECTION: Fn-Spec
// ============================================================================

/// Fn-spec construction errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FnSpecError {
    /// Neither an `args` nor a `ret` spec was supplied.
    #[error("fn-spec requires an args or ret spec")]
    Empty,
}

/// Contract attached to a callable unit.
///
/// # Invariants
/// - At least one of `args` or `ret` is present.
#[derive(Clone)]
pub struct FnSpec {
    /// Spec for the argument tuple.
    args: Option<SpecRef>,
    /// Spec for the return value.
    ret: Option<SpecRef>,
    /// Spec for `{"args": conformed-args, "ret": conformed-ret}`.
    relation: Option<SpecRef>,
}

impl FnSpec {
    /// Creates a fn-spec from its parts.
    ///
    /// # Errors
    ///
    /// Returns [`FnSpecError::Empty`] when both `args` and `ret` are absent.
    pub fn new(
        args: Option<SpecRef>,
        ret: Option<SpecRef>,
        relation: Option<SpecRef>,
    ) -> Result<Self, FnSpecError> {
        if args.is_none() && ret.is_none() {
            return Err(FnSpecError::Empty);
        }
        Ok(Self {
            args,
            ret,
            relation,
        })
    }

    /// Creates a fn-spec that only constrains arguments.
    #[must_use]
    pub const fn args_only(args: SpecRef) -> Self {
        Self {
            args: Some(args),
            ret: None,
            relation: None,
        }
    }

    /// Returns the argument spec.
    #[must_use]
    pub const fn args(&self) -> Option<&SpecRef> {
        self.args.as_ref()
    }

    /// Returns the return value spec.
    #[must_use]
    pub const fn ret(&self) -> Option<&SpecRef> {
        self.ret.as_ref()
    }

    /// Returns the relation spec.
    #[must_use]
    pub const fn relation(&self) -> Option<&SpecRef> {
        self.relation.as_ref()
    }

    /// Returns a serializable description of the fn-spec.
    #[must_use]
    pub fn summary(&self) -> FnSpecSummary {
        FnSpecSummary {
            args: self.args.as_ref().map(|spec| spec.describe()),
            ret: self.ret.as_ref().map(|spec| spec.describe()),
            relation: self.relation.as_ref().map(|spec| spec.describe()),
        }
    }
}

impl fmt::Debug for FnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = self.summary();
        f.debug_struct("FnSpec")
            .field("args", &summary.args)
            .field("ret", &summary.ret)
            .field("relation", &summary.relation)
            .finish()
    }
}

/// Described form of an [`FnSpec`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FnSpecSummary {
    /// Argument spec description.
    pub args: Option<String>,
    /// Return spec description.
    pub ret: Option<String>,
    /// Relation spec description.
    pub relation: Option<String>,
}
