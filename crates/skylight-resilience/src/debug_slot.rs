//! Debug inspection slot for external tooling
//!
//! Holds the most recent render-boundary failure. Written only by the capture
//! components, read by post-mortem tooling; in the browser the entry is also
//! mirrored onto a well-known `window` property.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::record::ErrorRecord;

/// What the slot exposes about the latest failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugEntry {
    pub error: String,
    pub render_trace: Option<String>,
    pub timestamp: String,
}

impl From<&ErrorRecord> for DebugEntry {
    fn from(record: &ErrorRecord) -> Self {
        Self {
            error: record.message().to_string(),
            render_trace: record.render_trace().map(str::to_string),
            timestamp: record.captured_at_iso(),
        }
    }
}

/// Host-side surface the slot mirrors into
pub trait DebugSurface {
    fn expose(&self, entry: &DebugEntry);
}

/// Surface for hosts without a global object
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedSurface;

impl DebugSurface for DetachedSurface {
    fn expose(&self, _entry: &DebugEntry) {}
}

pub struct DebugSlot {
    latest: RefCell<Option<DebugEntry>>,
    surface: Rc<dyn DebugSurface>,
}

impl DebugSlot {
    pub fn new(surface: Rc<dyn DebugSurface>) -> Self {
        Self {
            latest: RefCell::new(None),
            surface,
        }
    }

    pub fn detached() -> Self {
        Self::new(Rc::new(DetachedSurface))
    }

    pub fn publish(&self, record: &ErrorRecord) {
        let entry = DebugEntry::from(record);
        self.surface.expose(&entry);
        *self.latest.borrow_mut() = Some(entry);
    }

    pub fn latest(&self) -> Option<DebugEntry> {
        self.latest.borrow().clone()
    }
}

impl std::fmt::Debug for DebugSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebugSlot")
            .field("latest", &self.latest.borrow())
            .finish_non_exhaustive()
    }
}
