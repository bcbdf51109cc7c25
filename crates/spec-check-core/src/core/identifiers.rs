// crates/spec-check-core/src/core/identifiers.rs
// ============================================================================
// Module: Spec Check Identifiers
// Description: Qualified names for instrumentable and checkable units.
// Purpose: Provide a strongly typed, serializable unit name with a stable string form.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Units are addressed by a qualified symbolic name of the form
//! `namespace/name` (for example `app.math/inc`). A unit name is a weak
//! reference: it never owns the callable it names and is resolved lazily
//! through a [`crate::BindingResolver`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Unit Name
// ============================================================================

/// Separator between the namespace and the local name of a unit.
pub const NAMESPACE_SEPARATOR: char = '/';

/// Qualified name of a callable unit.
///
/// # Invariants
/// - Opaque; the namespace is everything before the last `/` when present.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitName(String);

impl UnitName {
    /// Creates a new unit name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Creates a unit name from a namespace and a local name.
    #[must_use]
    pub fn qualified(namespace: &str, name: &str) -> Self {
        Self(format!("{namespace}{NAMESPACE_SEPARATOR}{name}"))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the namespace portion, if the name is qualified.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.0.rsplit_once(NAMESPACE_SEPARATOR).map(|(namespace, _)| namespace)
    }

    /// Returns the local name portion.
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.rsplit_once(NAMESPACE_SEPARATOR).map_or(self.0.as_str(), |(_, name)| name)
    }
}

impl fmt::Display for UnitName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for UnitName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for UnitName {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
