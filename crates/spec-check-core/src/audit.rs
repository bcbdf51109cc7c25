// crates/spec-check-core/src/audit.rs
// ============================================================================
// Module: Spec Check Audit Logging
// Description: Structured events for instrumentation and check runs.
// Purpose: Emit JSON-line events without hard logging dependencies.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! This module defines event payloads and sinks for instrumentation changes,
//! live contract failures, and check results. Sinks are intentionally
//! lightweight so deployments can route events to their preferred pipeline.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;
use serde_json::Value;

use crate::core::UnitName;
use crate::runtime::report::OutcomeCategory;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Instrumentation state change or live failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentAction {
    /// A checking proxy was installed.
    Instrumented,
    /// The raw callable was restored.
    Unstrumented,
    /// The binding had been replaced by someone else; only the record was dropped.
    RestoreSkipped,
    /// Instrumentation was paused for a check run.
    Paused,
    /// Instrumentation was reinstated after a check run.
    Resumed,
    /// A live call failed its `args` spec.
    ArgsCheckFailed,
}

/// Instrumentation audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct InstrumentEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Unit the event concerns.
    pub unit: UnitName,
    /// Action taken.
    pub action: InstrumentAction,
    /// Optional detail (for example the rejecting spec).
    pub detail: Option<String>,
}

impl InstrumentEvent {
    /// Creates an instrumentation event stamped with the current time.
    #[must_use]
    pub fn new(unit: &UnitName, action: InstrumentAction) -> Self {
        Self {
            event: "instrument",
            timestamp_ms: now_ms(),
            unit: unit.clone(),
            action,
            detail: None,
        }
    }

    /// Attaches a detail message.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Check result audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct CheckEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Unit checked, when checked by name.
    pub unit: Option<UnitName>,
    /// Outcome category.
    pub category: OutcomeCategory,
    /// Trials executed, when trials ran.
    pub num_tests: Option<u64>,
    /// Seed used, when trials ran.
    pub seed: Option<String>,
    /// Abbreviated failure payload.
    pub failure: Option<Value>,
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Event sink for instrumentation and check events.
pub trait EventSink: Send + Sync {
    /// Records an instrumentation event.
    fn record_instrument(&self, event: &InstrumentEvent);

    /// Records a check result event.
    fn record_check(&self, event: &CheckEvent);
}

/// Shared event sink handle.
pub type SharedEventSink = Arc<dyn EventSink>;

/// Event sink that logs JSON lines to stderr.
pub struct StderrEventSink;

impl EventSink for StderrEventSink {
    fn record_instrument(&self, event: &InstrumentEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }

    fn record_check(&self, event: &CheckEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Event sink that appends JSON lines to a file.
pub struct FileEventSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileEventSink {
    /// Opens the event log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Writes one serialized payload line.
    fn write_line(&self, payload: &str) {
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

impl EventSink for FileEventSink {
    fn record_instrument(&self, event: &InstrumentEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            self.write_line(&payload);
        }
    }

    fn record_check(&self, event: &CheckEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            self.write_line(&payload);
        }
    }
}

/// No-op event sink.
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn record_instrument(&self, _event: &InstrumentEvent) {}

    fn record_check(&self, _event: &CheckEvent) {}
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Milliseconds since the Unix epoch; zero if the clock is before it.
pub(crate) fn now_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |duration| duration.as_millis())
}
