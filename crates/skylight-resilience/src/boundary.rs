//! Render boundary latch
//!
//! A [`RenderBoundary`] is the state behind one boundary instance in the UI
//! tree. The UI layer forwards render failures to [`RenderBoundary::intercept`]
//! and asks [`RenderBoundary::presentation`] what to show. The latch trips once
//! and never resets; recovery requires remounting the page.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::diagnostics::Diagnostics;
use crate::fallback::RENDER_TIPS;
use crate::host::{ArtifactSink, PageControl};
use crate::record::{Channel, ErrorRecord, Failure, RenderTrace};

/// State of one boundary instance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BoundaryState {
    #[default]
    Transparent,
    Tripped(Arc<ErrorRecord>),
}

impl BoundaryState {
    pub fn is_tripped(&self) -> bool {
        matches!(self, BoundaryState::Tripped(_))
    }

    pub fn record(&self) -> Option<&ErrorRecord> {
        match self {
            BoundaryState::Transparent => None,
            BoundaryState::Tripped(record) => Some(record.as_ref()),
        }
    }
}

/// Result of forwarding a failure to a boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interception {
    /// First failure: the boundary tripped and captured this record
    Captured(Arc<ErrorRecord>),
    /// The boundary had already tripped; the failure was dropped
    AlreadyTripped,
}

/// What the boundary should render right now
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presentation {
    Children,
    CustomFallback,
    DefaultFallback(DefaultFallback),
}

/// Actions offered by the default fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackAction {
    Reload,
    ExportErrorLog,
}

impl FallbackAction {
    pub fn label(&self) -> &'static str {
        match self {
            FallbackAction::Reload => "Reload Page",
            FallbackAction::ExportErrorLog => "Download Error Log",
        }
    }

    pub fn perform(&self, diagnostics: &Diagnostics, page: &dyn PageControl, sink: &dyn ArtifactSink) {
        match self {
            FallbackAction::Reload => page.reload(),
            FallbackAction::ExportErrorLog => {
                diagnostics
                    .store()
                    .export_as_download(Channel::RenderBoundary, sink);
            }
        }
    }
}

/// Content of the built-in fallback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultFallback {
    pub title: &'static str,
    pub message: String,
    pub render_trace: Option<String>,
    pub actions: [FallbackAction; 2],
    pub tips: &'static [&'static str],
}

impl DefaultFallback {
    fn for_record(record: &ErrorRecord) -> Self {
        Self {
            title: "Something went wrong",
            message: record.message().to_string(),
            render_trace: record.render_trace().map(str::to_string),
            actions: [FallbackAction::Reload, FallbackAction::ExportErrorLog],
            tips: RENDER_TIPS,
        }
    }
}

/// Shared latch for one boundary instance; clones observe the same state
#[derive(Debug, Clone)]
pub struct RenderBoundary {
    trace: RenderTrace,
    state: Arc<Mutex<BoundaryState>>,
}

impl RenderBoundary {
    pub fn new(trace: RenderTrace) -> Self {
        Self {
            trace,
            state: Arc::default(),
        }
    }

    pub fn trace(&self) -> &RenderTrace {
        &self.trace
    }

    pub fn state(&self) -> BoundaryState {
        self.lock().clone()
    }

    pub fn is_tripped(&self) -> bool {
        self.lock().is_tripped()
    }

    /// Trip the boundary on the first failure and capture it.
    ///
    /// Later failures are logged at debug level and otherwise ignored.
    pub fn intercept(&self, failure: &Failure, diagnostics: &Diagnostics) -> Interception {
        let record = {
            let mut state = self.lock();
            if state.is_tripped() {
                tracing::debug!("Boundary already tripped, ignoring: {}", failure);
                return Interception::AlreadyTripped;
            }
            let record = Arc::new(diagnostics.capture(failure).with_render_trace(&self.trace));
            *state = BoundaryState::Tripped(Arc::clone(&record));
            record
        };

        tracing::error!(
            error = record.message(),
            stack = record.stack_trace(),
            render_trace = record.render_trace(),
            "Render boundary caught an error"
        );
        diagnostics.debug_slot().publish(&record);
        diagnostics.store().put(Channel::RenderBoundary, &record);

        Interception::Captured(record)
    }

    pub fn presentation(&self, has_custom_fallback: bool) -> Presentation {
        match &*self.lock() {
            BoundaryState::Transparent => Presentation::Children,
            BoundaryState::Tripped(_) if has_custom_fallback => Presentation::CustomFallback,
            BoundaryState::Tripped(record) => {
                Presentation::DefaultFallback(DefaultFallback::for_record(record))
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, BoundaryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
