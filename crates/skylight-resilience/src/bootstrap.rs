//! Hydration bootstrap: drive the page from static markup to a live UI
//!
//! The sequence is strictly ordered: document readiness, then mount point
//! lookup, then activation. Nothing is retried. On failure the mount point is
//! overwritten with raw markup from [`crate::fallback`]; that path never calls
//! back into the rendering runtime.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::config::ResilienceConfig;
use crate::diagnostics::Diagnostics;
use crate::fallback::bootstrap_fallback_markup;
use crate::host::{HostDocument, ReadyState, RenderingRuntime};
use crate::record::{Channel, DocumentSnapshot, Failure};

/// Bootstrap lifecycle; `Activated` and `Failed` are terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BootstrapState {
    Idle,
    AwaitingDocumentReady,
    Activating,
    Activated,
    Failed,
}

impl BootstrapState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BootstrapState::Activated | BootstrapState::Failed)
    }

    /// The only transitions the bootstrap may take
    pub fn can_advance_to(&self, next: BootstrapState) -> bool {
        use BootstrapState::*;
        matches!(
            (self, next),
            (Idle, AwaitingDocumentReady)
                | (AwaitingDocumentReady, Activating)
                | (AwaitingDocumentReady, Failed)
                | (Activating, Activated)
                | (Activating, Failed)
        )
    }
}

impl fmt::Display for BootstrapState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Why the bootstrap failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BootstrapFailure {
    #[error("Mount point #{0} not found")]
    MountPointMissing(String),

    #[error("{0}")]
    Activation(Failure),
}

impl BootstrapFailure {
    fn to_failure(&self) -> Failure {
        match self {
            BootstrapFailure::MountPointMissing(_) => Failure::new(self.to_string()),
            BootstrapFailure::Activation(failure) => failure.clone(),
        }
    }
}

/// Mount point state after activation, logged for post-mortem comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthReport {
    pub state: BootstrapState,
    pub ready_state: ReadyState,
    pub mount_point_present: bool,
    pub mount_children: u32,
}

pub struct HydrationBootstrap {
    document: Rc<dyn HostDocument>,
    runtime: Rc<dyn RenderingRuntime>,
    diagnostics: Rc<Diagnostics>,
    config: Rc<ResilienceConfig>,
    state: Cell<BootstrapState>,
    history: RefCell<Vec<BootstrapState>>,
    failure: RefCell<Option<BootstrapFailure>>,
}

impl HydrationBootstrap {
    pub fn new(
        document: Rc<dyn HostDocument>,
        runtime: Rc<dyn RenderingRuntime>,
        diagnostics: Rc<Diagnostics>,
        config: Rc<ResilienceConfig>,
    ) -> Self {
        Self {
            document,
            runtime,
            diagnostics,
            config,
            state: Cell::new(BootstrapState::Idle),
            history: RefCell::new(vec![BootstrapState::Idle]),
            failure: RefCell::new(None),
        }
    }

    pub fn state(&self) -> BootstrapState {
        self.state.get()
    }

    /// Every state visited so far, starting with `Idle`
    pub fn history(&self) -> Vec<BootstrapState> {
        self.history.borrow().clone()
    }

    pub fn failure(&self) -> Option<BootstrapFailure> {
        self.failure.borrow().clone()
    }

    /// Run the bootstrap sequence to a terminal state.
    ///
    /// Only the first call does any work; later calls return the current state.
    pub async fn run(&self) -> BootstrapState {
        if self.state() != BootstrapState::Idle {
            tracing::warn!("Bootstrap already started (state {})", self.state());
            return self.state();
        }

        tracing::info!("Starting hydration");
        self.advance(BootstrapState::AwaitingDocumentReady);
        if self.document.ready_state().is_loading() {
            tracing::info!("Document is still loading, waiting");
            self.document.document_ready().await;
            tracing::debug!("Document ready");
        }

        let mount_id = self.config.mount_point_id.as_str();
        if self.document.mount_point(mount_id).is_none() {
            self.fail(BootstrapFailure::MountPointMissing(mount_id.to_string()));
            return self.state();
        }
        tracing::debug!("Mount point #{} found", mount_id);

        self.advance(BootstrapState::Activating);
        let started = self.diagnostics.environment().now();
        let result = self.runtime.activate(mount_id).await;
        let elapsed_ms = (self.diagnostics.environment().now() - started).num_milliseconds();

        if self.state() != BootstrapState::Activating {
            // A panic during activation already failed the bootstrap
            tracing::warn!("Activation returned after the bootstrap reached {}", self.state());
            return self.state();
        }

        match result {
            Ok(()) => {
                if self.document.remove_placeholder(&self.config.placeholder_selector) {
                    tracing::debug!("Loading placeholder removed");
                }
                self.advance(BootstrapState::Activated);
                tracing::info!("Hydration completed in {}ms", elapsed_ms);
            }
            Err(e) => {
                self.fail(BootstrapFailure::Activation(Failure::from_error(&e)));
            }
        }

        self.state()
    }

    /// Treat a panic raised during activation as an activation failure.
    ///
    /// Returns true if the bootstrap was activating and is now failed.
    pub fn escalate_panic(&self, failure: &Failure) -> bool {
        if self.state() != BootstrapState::Activating {
            return false;
        }
        self.fail(BootstrapFailure::Activation(failure.clone()));
        true
    }

    /// Snapshot of the mount point, meant to run a while after activation
    pub fn health_report(&self) -> HealthReport {
        let mount = self.document.mount_point(&self.config.mount_point_id);
        let report = HealthReport {
            state: self.state(),
            ready_state: self.document.ready_state(),
            mount_point_present: mount.is_some(),
            mount_children: mount.map(|m| m.child_count()).unwrap_or(0),
        };
        tracing::info!(
            state = %report.state,
            ready_state = %report.ready_state,
            mount_point_present = report.mount_point_present,
            mount_children = report.mount_children,
            "Post-hydration check"
        );
        if report.state == BootstrapState::Activated && report.mount_children == 0 {
            tracing::warn!("Mount point is empty after activation");
        }
        report
    }

    fn advance(&self, next: BootstrapState) -> bool {
        let current = self.state();
        if !current.can_advance_to(next) {
            tracing::error!("Rejected bootstrap transition {} -> {}", current, next);
            return false;
        }
        tracing::debug!("Bootstrap {} -> {}", current, next);
        self.state.set(next);
        self.history.borrow_mut().push(next);
        true
    }

    fn fail(&self, failure: BootstrapFailure) {
        if !self.advance(BootstrapState::Failed) {
            return;
        }
        tracing::error!("Fatal error during app initialization: {}", failure);

        let mount_id = self.config.mount_point_id.as_str();
        let mount = self.document.mount_point(mount_id);
        let record = self
            .diagnostics
            .capture(&failure.to_failure())
            .with_document_state(DocumentSnapshot {
                ready_state: self.document.ready_state(),
                mount_point_present: mount.is_some(),
            });
        self.diagnostics.store().put(Channel::Bootstrap, &record);

        match mount {
            Some(mount) => mount.replace_contents(&bootstrap_fallback_markup(record.message())),
            None => tracing::error!("Cannot show error UI: mount point #{} not found", mount_id),
        }
        self.document
            .remove_placeholder(&self.config.placeholder_selector);

        *self.failure.borrow_mut() = Some(failure);
    }
}

impl fmt::Debug for HydrationBootstrap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HydrationBootstrap")
            .field("state", &self.state.get())
            .field("failure", &self.failure.borrow())
            .finish_non_exhaustive()
    }
}
