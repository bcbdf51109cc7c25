// crates/spec-check-core/src/core/specs.rs
// ============================================================================
// Module: Reference Specs
// Description: Predicate and tuple spec implementations.
// Purpose: Provide a minimal spec vocabulary for registering fn-specs.
// Dependencies: proptest, serde_json
// ============================================================================

//! ## Overview
//! The spec language is pluggable through [`Spec`]. This module provides the
//! two shapes every fn-spec needs: a named predicate over a single value and
//! a positional tuple of specs for argument lists.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use proptest::strategy::BoxedStrategy;
use proptest::strategy::Strategy;
use serde_json::Value;

use crate::core::explain::Problem;
use crate::core::spec::Conformed;
use crate::core::spec::GenError;
use crate::core::spec::GenOverrides;
use crate::core::spec::Spec;
use crate::core::spec::SpecRef;

// ============================================================================
// SECTION: Predicate Spec
// ============================================================================

/// Predicate function over a single value.
type PredicateFn = dyn Fn(&Value) -> bool + Send + Sync;

/// Default strategy constructor attached to a predicate spec.
type StrategyFn = dyn Fn() -> BoxedStrategy<Value> + Send + Sync;

/// Spec defined by a named predicate and an optional generator.
#[derive(Clone)]
pub struct PredicateSpec {
    /// Spec name (also the generator override key).
    name: String,
    /// Acceptance predicate.
    predicate: Arc<PredicateFn>,
    /// Default generator.
    generator: Option<Arc<StrategyFn>>,
}

impl PredicateSpec {
    /// Creates a predicate spec without a generator.
    pub fn new(
        name: impl Into<String>,
        predicate: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            predicate: Arc::new(predicate),
            generator: None,
        }
    }

    /// Attaches a default generator.
    #[must_use]
    pub fn with_generator(
        mut self,
        generator: impl Fn() -> BoxedStrategy<Value> + Send + Sync + 'static,
    ) -> Self {
        self.generator = Some(Arc::new(generator));
        self
    }

    /// Converts the spec into a shared handle.
    #[must_use]
    pub fn shared(self) -> SpecRef {
        Arc::new(self)
    }
}

impl fmt::Debug for PredicateSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateSpec")
            .field("name", &self.name)
            .field("has_generator", &self.generator.is_some())
            .finish()
    }
}

impl Spec for PredicateSpec {
    fn describe(&self) -> String {
        self.name.clone()
    }

    fn conform(&self, value: &Value) -> Conformed {
        if (self.predicate)(value) { Conformed::Valid(value.clone()) } else { Conformed::Invalid }
    }

    fn explain(&self, value: &Value) -> Vec<Problem> {
        if (self.predicate)(value) {
            Vec::new()
        } else {
            vec![Problem::new(self.name.clone(), value.clone())]
        }
    }

    fn generator(&self, overrides: &GenOverrides) -> Result<BoxedStrategy<Value>, GenError> {
        if let Some(factory) = overrides.get(&self.name) {
            return factory();
        }
        self.generator
            .as_ref()
            .map(|factory| factory())
            .ok_or_else(|| GenError::new(self.name.clone(), "no generator registered"))
    }
}

// ============================================================================
// SECTION: Tuple Spec
// ============================================================================

/// Positional spec over a JSON array, one spec per element.
#[derive(Clone)]
pub struct TupleSpec {
    /// Optional explicit name; derived from elements otherwise.
    name: Option<String>,
    /// Element specs in position order.
    elements: Vec<SpecRef>,
}

impl TupleSpec {
    /// Creates a tuple spec from element specs.
    #[must_use]
    pub const fn new(elements: Vec<SpecRef>) -> Self {
        Self {
            name: None,
            elements,
        }
    }

    /// Names the tuple spec (used for descriptions and override lookup).
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Converts the spec into a shared handle.
    #[must_use]
    pub fn shared(self) -> SpecRef {
        Arc::new(self)
    }
}

impl fmt::Debug for TupleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl Spec for TupleSpec {
    fn describe(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        let parts: Vec<String> = self.elements.iter().map(|spec| spec.describe()).collect();
        format!("(tuple {})", parts.join(" "))
    }

    fn conform(&self, value: &Value) -> Conformed {
        let Value::Array(items) = value else {
            return Conformed::Invalid;
        };
        if items.len() != self.elements.len() {
            return Conformed::Invalid;
        }
        let mut conformed = Vec::with_capacity(items.len());
        for (spec, item) in self.elements.iter().zip(items) {
            match spec.conform(item) {
                Conformed::Valid(value) => conformed.push(value),
                Conformed::Invalid => return Conformed::Invalid,
            }
        }
        Conformed::Valid(Value::Array(conformed))
    }

    fn explain(&self, value: &Value) -> Vec<Problem> {
        let Value::Array(items) = value else {
            return vec![Problem::new(self.describe(), value.clone()).with_reason("not a tuple")];
        };
        let mut problems = Vec::new();
        for (index, (spec, item)) in self.elements.iter().zip(items).enumerate() {
            problems.extend(
                spec.explain(item).into_iter().map(|problem| problem.nested_in(index.to_string())),
            );
        }
        if items.len() < self.elements.len() {
            problems.push(
                Problem::new(self.describe(), value.clone()).with_reason("Insufficient input"),
            );
        } else if items.len() > self.elements.len() {
            problems.push(Problem::new(self.describe(), value.clone()).with_reason("Extra input"));
        }
        problems
    }

    fn generator(&self, overrides: &GenOverrides) -> Result<BoxedStrategy<Value>, GenError> {
        if let Some(factory) = overrides.get(&self.describe()) {
            return factory();
        }
        let strategies = self
            .elements
            .iter()
            .map(|spec| spec.generator(overrides))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(strategies.prop_map(Value::Array).boxed())
    }
}
