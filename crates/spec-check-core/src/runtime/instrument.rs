// crates/spec-check-core/src/runtime/instrument.rs
// ============================================================================
// Module: Instrumentation Registry
// Description: Install and restore checking proxies over unit bindings.
// Purpose: Enforce argument contracts live with idempotent install/restore.
// Dependencies: crate::core, crate::interfaces, crate::audit, thiserror
// ============================================================================

//! ## Overview
//! The [`Instrumenter`] owns one record per instrumented unit: the callable
//! that was live before instrumentation (`raw`) and the proxy installed in
//! its place (`wrapped`). Every record mutation happens under one mutex that
//! is never held while a proxy or delegate runs.
//!
//! Invariants:
//! - At most one record exists per unit.
//! - Re-instrumenting wraps the prior record's `raw`, never the old proxy.
//! - Restore only rebinds when the live binding is still the record's proxy;
//!   the record is removed either way.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use thiserror::Error;

use crate::audit::InstrumentAction;
use crate::audit::InstrumentEvent;
use crate::audit::NoopEventSink;
use crate::audit::SharedEventSink;
use crate::core::Callable;
use crate::core::FnSpec;
use crate::core::GenError;
use crate::core::GenOverrides;
use crate::core::UnitName;
use crate::interfaces::BindingError;
use crate::interfaces::BindingResolver;
use crate::interfaces::SpecRegistry;
use crate::runtime::generator::EngineOptions;
use crate::runtime::generator::build_generator;
use crate::runtime::generator::sample;
use crate::runtime::proxy::SharedFrameSource;
use crate::runtime::proxy::checking_proxy;
use crate::runtime::stack::BacktraceFrameSource;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Shared spec registry handle.
pub type SharedSpecRegistry = Arc<dyn SpecRegistry + Send + Sync>;

/// Shared binding resolver handle.
pub type SharedBindingResolver = Arc<dyn BindingResolver + Send + Sync>;

/// Options for [`Instrumenter::instrument`].
#[derive(Clone, Default)]
pub struct InstrumentOptions {
    /// Per-unit fn-spec overrides, preferred over the registry.
    pub specs: BTreeMap<UnitName, FnSpec>,
    /// Units whose delegate is replaced by a constant generated from `ret`.
    pub stub: BTreeSet<UnitName>,
    /// Generator overrides keyed by spec description, used for stubs.
    pub generators: GenOverrides,
    /// Units whose delegate is replaced by the given callable.
    pub replace: BTreeMap<UnitName, Callable>,
}

impl fmt::Debug for InstrumentOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstrumentOptions")
            .field("specs", &self.specs)
            .field("stub", &self.stub)
            .field("generators", &self.generators.keys().collect::<Vec<_>>())
            .field("replace", &self.replace)
            .finish()
    }
}

/// Instrumentation errors.
#[derive(Debug, Error)]
pub enum InstrumentError {
    /// Neither an override nor a registered fn-spec exists for the unit.
    #[error("no fn-spec registered for {unit}")]
    NoFnSpec {
        /// Unit that lacked a fn-spec.
        unit: UnitName,
        /// Override supplied in the options; always empty when raised.
        override_spec: Option<FnSpec>,
    },
    /// A stub value could not be generated.
    #[error("unable to generate stub value for {unit}")]
    NoGen {
        /// Unit being stubbed.
        unit: UnitName,
        /// Underlying generator failure.
        #[source]
        source: GenError,
    },
    /// The binding resolver rejected a rebind.
    #[error(transparent)]
    Binding(#[from] BindingError),
    /// The record lock is unusable.
    #[error("instrumentation registry error: {0}")]
    Registry(String),
}

/// Installed instrumentation for one unit.
#[derive(Debug, Clone)]
pub struct InstrumentRecord {
    /// Callable that was live before instrumentation.
    raw: Callable,
    /// Checking proxy installed as the live binding.
    wrapped: Callable,
}

impl InstrumentRecord {
    /// Returns the pre-instrumentation callable.
    #[must_use]
    pub const fn raw(&self) -> &Callable {
        &self.raw
    }

    /// Returns the installed proxy.
    #[must_use]
    pub const fn wrapped(&self) -> &Callable {
        &self.wrapped
    }
}

// ============================================================================
// SECTION: Instrumenter
// ============================================================================

/// Instrumentation manager over a spec registry and a binding resolver.
#[derive(Clone)]
pub struct Instrumenter {
    /// Registered fn-specs.
    specs: SharedSpecRegistry,
    /// Live unit bindings.
    bindings: SharedBindingResolver,
    /// Installed records keyed by unit.
    records: Arc<Mutex<BTreeMap<UnitName, InstrumentRecord>>>,
    /// Stack capture for caller attribution.
    frames: SharedFrameSource,
    /// Audit sink.
    events: SharedEventSink,
    /// Engine options used when sampling stub values.
    engine: EngineOptions,
}

impl Instrumenter {
    /// Creates an instrumenter with backtrace attribution and no audit sink.
    pub fn new(
        specs: impl SpecRegistry + Send + Sync + 'static,
        bindings: impl BindingResolver + Send + Sync + 'static,
    ) -> Self {
        Self {
            specs: Arc::new(specs),
            bindings: Arc::new(bindings),
            records: Arc::new(Mutex::new(BTreeMap::new())),
            frames: Arc::new(BacktraceFrameSource),
            events: Arc::new(NoopEventSink),
            engine: EngineOptions::default(),
        }
    }

    /// Replaces the frame source used by proxies installed afterwards.
    #[must_use]
    pub fn with_frame_source(mut self, frames: SharedFrameSource) -> Self {
        self.frames = frames;
        self
    }

    /// Replaces the audit sink.
    #[must_use]
    pub fn with_event_sink(mut self, events: SharedEventSink) -> Self {
        self.events = events;
        self
    }

    /// Replaces the engine options used for stub sampling.
    #[must_use]
    pub const fn with_engine(mut self, engine: EngineOptions) -> Self {
        self.engine = engine;
        self
    }

    /// Installs checking proxies for `names`, or for every instrumentable unit.
    ///
    /// Unbound names are skipped. Returns the distinct names installed, in
    /// input order.
    ///
    /// # Errors
    ///
    /// Returns [`InstrumentError::NoFnSpec`] for a bound unit with no fn-spec,
    /// [`InstrumentError::NoGen`] when a stub value cannot be generated, and
    /// binding or lock failures. Units installed before the error stay installed.
    pub fn instrument(
        &self,
        names: Option<&[UnitName]>,
        options: &InstrumentOptions,
    ) -> Result<Vec<UnitName>, InstrumentError> {
        let names = match names {
            Some(names) => distinct(names),
            None => self.instrumentable_units(options).into_iter().collect(),
        };
        let mut installed = Vec::with_capacity(names.len());
        for unit in names {
            if self.bindings.resolve(&unit).is_none() {
                continue;
            }
            let spec = self.effective_spec(&unit, &options.specs).ok_or_else(|| {
                InstrumentError::NoFnSpec {
                    unit: unit.clone(),
                    override_spec: options.specs.get(&unit).cloned(),
                }
            })?;
            let stub = if options.stub.contains(&unit) {
                Some(self.stub_for(&unit, &spec, &options.generators)?)
            } else {
                None
            };
            let replacement = options.replace.get(&unit).cloned();
            self.install(&unit, &spec, stub.or(replacement))?;
            installed.push(unit);
        }
        Ok(installed)
    }

    /// Restores `names`, or every instrumented unit.
    ///
    /// Returns the names whose records were removed.
    ///
    /// # Errors
    ///
    /// Returns binding or lock failures. A unit whose rebind fails keeps its
    /// record; units restored before the failure stay restored.
    pub fn unstrument(&self, names: Option<&[UnitName]>) -> Result<Vec<UnitName>, InstrumentError> {
        let mut records = self.lock_records()?;
        let names = match names {
            Some(names) => distinct(names),
            None => records.keys().cloned().collect(),
        };
        let mut removed = Vec::with_capacity(names.len());
        for unit in names {
            let Some(record) = records.get(&unit).cloned() else {
                continue;
            };
            let live = self.bindings.current_binding(&unit);
            if live.as_ref().is_some_and(|live| live.same_as(&record.wrapped)) {
                // The record stays until the rebind succeeds so a retry can restore it.
                self.bindings.set_binding(&unit, record.raw)?;
                self.events
                    .record_instrument(&InstrumentEvent::new(&unit, InstrumentAction::Unstrumented));
            } else {
                self.events
                    .record_instrument(&InstrumentEvent::new(&unit, InstrumentAction::RestoreSkipped));
            }
            records.remove(&unit);
            removed.push(unit);
        }
        drop(records);
        Ok(removed)
    }

    /// Units that could be instrumented with `options`.
    #[must_use]
    pub fn instrumentable_units(&self, options: &InstrumentOptions) -> BTreeSet<UnitName> {
        let mut units = self.specs.fn_spec_names();
        units.extend(options.specs.keys().cloned());
        units.extend(options.stub.iter().cloned());
        units.extend(options.replace.keys().cloned());
        units
    }

    /// Units that currently have an instrumentation record.
    ///
    /// # Errors
    ///
    /// Returns [`InstrumentError::Registry`] when the record lock is poisoned.
    pub fn instrumented_units(&self) -> Result<BTreeSet<UnitName>, InstrumentError> {
        Ok(self.lock_records()?.keys().cloned().collect())
    }

    /// Returns the pre-instrumentation callable for `unit`, if instrumented.
    ///
    /// # Errors
    ///
    /// Returns [`InstrumentError::Registry`] when the record lock is poisoned.
    pub fn raw_callable(&self, unit: &UnitName) -> Result<Option<Callable>, InstrumentError> {
        Ok(self.lock_records()?.get(unit).map(|record| record.raw.clone()))
    }

    /// Temporarily restores `unit`'s raw callable.
    ///
    /// Returns `None` when the unit is not instrumented or its binding no
    /// longer holds the proxy. The proxy is reinstated when the guard drops.
    ///
    /// # Errors
    ///
    /// Returns binding or lock failures.
    pub fn pause(&self, unit: &UnitName) -> Result<Option<InstrumentPause>, InstrumentError> {
        let records = self.lock_records()?;
        let Some(record) = records.get(unit).cloned() else {
            return Ok(None);
        };
        let live = self.bindings.current_binding(unit);
        if !live.as_ref().is_some_and(|live| live.same_as(&record.wrapped)) {
            return Ok(None);
        }
        self.bindings.set_binding(unit, record.raw.clone())?;
        drop(records);
        self.events.record_instrument(&InstrumentEvent::new(unit, InstrumentAction::Paused));
        Ok(Some(InstrumentPause {
            instrumenter: self.clone(),
            unit: unit.clone(),
            record,
        }))
    }

    /// Resolves the effective fn-spec for `unit`.
    pub(crate) fn effective_spec(
        &self,
        unit: &UnitName,
        overrides: &BTreeMap<UnitName, FnSpec>,
    ) -> Option<FnSpec> {
        overrides.get(unit).cloned().or_else(|| self.specs.lookup(unit))
    }

    /// Registry fn-spec names.
    pub(crate) fn fn_spec_names(&self) -> BTreeSet<UnitName> {
        self.specs.fn_spec_names()
    }

    /// Binding resolver shared with the checker.
    pub(crate) fn bindings(&self) -> &SharedBindingResolver {
        &self.bindings
    }

    /// Swaps the proxy in and records it, all under the record lock.
    fn install(
        &self,
        unit: &UnitName,
        spec: &FnSpec,
        delegate: Option<Callable>,
    ) -> Result<(), InstrumentError> {
        let mut records = self.lock_records()?;
        let Some(live) = self.bindings.current_binding(unit) else {
            return Err(InstrumentError::Binding(BindingError::Unknown(unit.clone())));
        };
        let to_wrap = match records.get(unit) {
            Some(prior) if live.same_as(&prior.wrapped) => prior.raw.clone(),
            _ => live,
        };
        let proxy = checking_proxy(
            unit.clone(),
            spec,
            delegate.unwrap_or_else(|| to_wrap.clone()),
            Arc::clone(&self.frames),
            Arc::clone(&self.events),
        );
        self.bindings.set_binding(unit, proxy.clone())?;
        records.insert(
            unit.clone(),
            InstrumentRecord {
                raw: to_wrap,
                wrapped: proxy,
            },
        );
        drop(records);
        self.events.record_instrument(
            &InstrumentEvent::new(unit, InstrumentAction::Instrumented).with_detail(spec_label(spec)),
        );
        Ok(())
    }

    /// Builds a constant stand-in returning one value generated from `ret`.
    fn stub_for(
        &self,
        unit: &UnitName,
        spec: &FnSpec,
        generators: &GenOverrides,
    ) -> Result<Callable, InstrumentError> {
        let no_gen = |source| InstrumentError::NoGen {
            unit: unit.clone(),
            source,
        };
        let ret = spec.ret().ok_or_else(|| {
            no_gen(GenError::new(unit.as_str(), "stubbing requires a ret spec"))
        })?;
        let description = ret.describe();
        let value = build_generator(ret.as_ref(), generators)
            .and_then(|strategy| sample(&strategy, self.engine.resolve_seed(), &description))
            .map_err(no_gen)?;
        Ok(Callable::constant(value))
    }

    /// Locks the record map.
    fn lock_records(
        &self,
    ) -> Result<MutexGuard<'_, BTreeMap<UnitName, InstrumentRecord>>, InstrumentError> {
        self.records
            .lock()
            .map_err(|_| InstrumentError::Registry("instrumentation record lock poisoned".to_string()))
    }
}

// ============================================================================
// SECTION: Pause Guard
// ============================================================================

/// Guard holding a unit's raw callable in place of its proxy.
pub struct InstrumentPause {
    /// Owner of the paused record.
    instrumenter: Instrumenter,
    /// Paused unit.
    unit: UnitName,
    /// Record captured at pause time.
    record: InstrumentRecord,
}

impl Drop for InstrumentPause {
    fn drop(&mut self) {
        let Ok(records) = self.instrumenter.lock_records() else {
            return;
        };
        let still_recorded = records
            .get(&self.unit)
            .is_some_and(|record| record.wrapped.same_as(&self.record.wrapped));
        let still_raw = self
            .instrumenter
            .bindings
            .current_binding(&self.unit)
            .is_some_and(|live| live.same_as(&self.record.raw));
        if still_recorded
            && still_raw
            && self.instrumenter.bindings.set_binding(&self.unit, self.record.wrapped.clone()).is_ok()
        {
            drop(records);
            self.instrumenter
                .events
                .record_instrument(&InstrumentEvent::new(&self.unit, InstrumentAction::Resumed));
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Distinct names in first-seen order.
fn distinct(names: &[UnitName]) -> Vec<UnitName> {
    let mut seen = BTreeSet::new();
    names.iter().filter(|name| seen.insert((*name).clone())).cloned().collect()
}

/// Short description of a fn-spec for audit details.
fn spec_label(spec: &FnSpec) -> String {
    let summary = spec.summary();
    [("args", summary.args), ("ret", summary.ret), ("fn", summary.relation)]
        .into_iter()
        .filter_map(|(role, description)| description.map(|description| format!(":{role} {description}")))
        .collect::<Vec<_>>()
        .join(" ")
}
