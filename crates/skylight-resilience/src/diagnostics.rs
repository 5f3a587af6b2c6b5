//! Capture pipeline shared by the boundary, the bootstrap and manual reports

use std::rc::Rc;

use crate::config::ResilienceConfig;
use crate::debug_slot::DebugSlot;
use crate::host::{ClientEnvironment, SystemEnvironment};
use crate::record::{Channel, ErrorRecord, Failure};
use crate::store::{DiagnosticStore, MemoryStore};

/// Store, environment and debug slot bundled for the capture components
pub struct Diagnostics {
    store: DiagnosticStore,
    environment: Rc<dyn ClientEnvironment>,
    debug_slot: DebugSlot,
}

impl std::fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Diagnostics")
            .field("store", &self.store)
            .field("debug_slot", &self.debug_slot)
            .finish_non_exhaustive()
    }
}

impl Diagnostics {
    pub fn new(
        store: DiagnosticStore,
        environment: Rc<dyn ClientEnvironment>,
        debug_slot: DebugSlot,
    ) -> Self {
        Self {
            store,
            environment,
            debug_slot,
        }
    }

    /// In-memory pipeline for hosts that never installed a runtime
    pub fn detached() -> Self {
        Self::new(
            DiagnosticStore::new(
                Rc::new(MemoryStore::new()),
                Rc::new(ResilienceConfig::default()),
            ),
            Rc::new(SystemEnvironment),
            DebugSlot::detached(),
        )
    }

    pub fn store(&self) -> &DiagnosticStore {
        &self.store
    }

    pub fn environment(&self) -> &dyn ClientEnvironment {
        self.environment.as_ref()
    }

    pub fn debug_slot(&self) -> &DebugSlot {
        &self.debug_slot
    }

    /// Build a record for `failure` against the current environment
    pub fn capture(&self, failure: &Failure) -> ErrorRecord {
        ErrorRecord::capture(failure, self.environment.as_ref())
    }

    /// Report a failure from non-render code (event handlers, effects).
    ///
    /// The record goes to the render-boundary channel like an in-tree failure
    /// but no boundary is tripped.
    pub fn report(&self, failure: &Failure, detail: Option<&str>) -> ErrorRecord {
        let mut record = self.capture(failure);
        if let Some(detail) = detail {
            record = record.with_detail(detail);
        }

        tracing::error!(
            error = record.message(),
            detail = record.detail(),
            stack = record.stack_trace(),
            "Manual error capture"
        );
        self.store.put(Channel::RenderBoundary, &record);
        record
    }
}
