// crates/spec-check-core/src/runtime/suppression.rs
// ============================================================================
// Module: Check Suppression
// Description: Per-call-chain instrumentation state.
// Purpose: Stop spec validation and re-entrant calls from being re-checked.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Each thread carries its own checking state: whether checking is currently
//! suppressed, and which instrumented units are executing further up the
//! stack. Only the innermost of those bypasses its own checks, so direct
//! self-recursion is validated once while mutual recursion is still checked. Guards restore the previous state on drop, so the state unwinds
//! with the call chain (including panics) and never leaks across threads.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cell::RefCell;

use crate::core::UnitName;

// ============================================================================
// SECTION: Thread State
// ============================================================================

/// Checking state for the current call chain.
struct ChainState {
    /// True while checking is disabled on this chain.
    suppressed: bool,
    /// Instrumented units currently executing, outermost first.
    active: Vec<UnitName>,
}

thread_local! {
    /// Checking state of the call chain running on this thread.
    static CHAIN: RefCell<ChainState> = const {
        RefCell::new(ChainState {
            suppressed: false,
            active: Vec::new(),
        })
    };
}

/// Returns true when checking is enabled on the current call chain.
#[must_use]
pub fn checking_enabled() -> bool {
    CHAIN.with(|chain| !chain.borrow().suppressed)
}

/// Returns true when `unit` is the innermost instrumented unit executing on
/// the current call chain, i.e. a call to it now is direct self-recursion.
#[must_use]
pub fn is_innermost_active(unit: &UnitName) -> bool {
    CHAIN.with(|chain| chain.borrow().active.last() == Some(unit))
}

/// Runs `f` with instrumentation checking disabled on this call chain.
pub fn with_checking_suppressed<T>(f: impl FnOnce() -> T) -> T {
    let _guard = SuppressGuard::engage();
    f()
}

// ============================================================================
// SECTION: Guards
// ============================================================================

/// Guard that suppresses checking until dropped.
pub(crate) struct SuppressGuard {
    /// Suppression flag before the guard was engaged.
    prev: bool,
}

impl SuppressGuard {
    /// Suppresses checking on the current thread.
    pub(crate) fn engage() -> Self {
        let prev = CHAIN.with(|chain| std::mem::replace(&mut chain.borrow_mut().suppressed, true));
        Self {
            prev,
        }
    }
}

impl Drop for SuppressGuard {
    fn drop(&mut self) {
        let prev = self.prev;
        CHAIN.with(|chain| chain.borrow_mut().suppressed = prev);
    }
}

/// Guard marking a unit as executing until dropped.
pub(crate) struct ActiveGuard {
    /// Depth of the active stack before the unit was pushed.
    depth: usize,
}

impl ActiveGuard {
    /// Marks `unit` as executing on the current thread.
    pub(crate) fn enter(unit: UnitName) -> Self {
        let depth = CHAIN.with(|chain| {
            let mut chain = chain.borrow_mut();
            let depth = chain.active.len();
            chain.active.push(unit);
            depth
        });
        Self {
            depth,
        }
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        let depth = self.depth;
        CHAIN.with(|chain| chain.borrow_mut().active.truncate(depth));
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suppression_restores_previous_state() {
        assert!(checking_enabled());
        with_checking_suppressed(|| {
            assert!(!checking_enabled());
            with_checking_suppressed(|| assert!(!checking_enabled()));
            assert!(!checking_enabled());
        });
        assert!(checking_enabled());
    }

    #[test]
    fn only_the_innermost_unit_counts_as_active() {
        let outer = UnitName::new("app/outer");
        let inner = UnitName::new("app/inner");
        {
            let _outer = ActiveGuard::enter(outer.clone());
            assert!(is_innermost_active(&outer));
            {
                let _inner = ActiveGuard::enter(inner.clone());
                assert!(is_innermost_active(&inner));
                assert!(!is_innermost_active(&outer));
            }
            assert!(is_innermost_active(&outer));
            assert!(!is_innermost_active(&inner));
        }
        assert!(!is_innermost_active(&outer));
    }

    #[test]
    fn state_does_not_leak_across_threads() {
        with_checking_suppressed(|| {
            let enabled_elsewhere = std::thread::spawn(checking_enabled).join().unwrap_or(false);
            assert!(enabled_elsewhere);
        });
    }
}
