//! Process-wide resilience context
//!
//! Lifecycle: [`ResilienceRuntime::init`] runs once at startup, after
//! [`GlobalFaultCapture::install`](crate::fault::GlobalFaultCapture::install)
//! and before any UI work. From then on the capture components reach the
//! shared diagnostics through [`with_diagnostics`]; nothing else writes to it.
//! The browser runs all of this on a single thread, so the context lives in a
//! thread-local cell.

use std::cell::OnceCell;
use std::rc::Rc;

use crate::boundary::FallbackAction;
use crate::bootstrap::HydrationBootstrap;
use crate::config::ResilienceConfig;
use crate::debug_slot::{DebugSlot, DebugSurface};
use crate::diagnostics::Diagnostics;
use crate::fault::GlobalFaultCapture;
use crate::host::{ArtifactSink, ClientEnvironment, HostDocument, PageControl, RenderingRuntime};
use crate::store::{DiagnosticStore, KeyValueStore};

/// Host implementations the runtime is assembled from
pub struct HostBindings {
    pub document: Rc<dyn HostDocument>,
    pub rendering: Rc<dyn RenderingRuntime>,
    pub storage: Rc<dyn KeyValueStore>,
    pub environment: Rc<dyn ClientEnvironment>,
    pub debug_surface: Rc<dyn DebugSurface>,
    pub page: Rc<dyn PageControl>,
    pub artifacts: Rc<dyn ArtifactSink>,
}

thread_local! {
    static RUNTIME: OnceCell<Rc<ResilienceRuntime>> = const { OnceCell::new() };
    static DETACHED: Diagnostics = Diagnostics::detached();
}

pub struct ResilienceRuntime {
    config: Rc<ResilienceConfig>,
    diagnostics: Rc<Diagnostics>,
    bootstrap: Rc<HydrationBootstrap>,
    page: Rc<dyn PageControl>,
    artifacts: Rc<dyn ArtifactSink>,
}

impl ResilienceRuntime {
    /// Build the page's single runtime. Fails if one already exists.
    pub fn init(config: ResilienceConfig, host: HostBindings) -> crate::Result<Rc<ResilienceRuntime>> {
        if Self::current().is_some() {
            return Err(crate::ResilienceError::AlreadyInstalled("resilience runtime"));
        }

        let config = Rc::new(config);
        let diagnostics = Rc::new(Diagnostics::new(
            DiagnosticStore::new(host.storage, Rc::clone(&config)),
            host.environment,
            DebugSlot::new(host.debug_surface),
        ));
        let bootstrap = Rc::new(HydrationBootstrap::new(
            host.document,
            host.rendering,
            Rc::clone(&diagnostics),
            Rc::clone(&config),
        ));

        match GlobalFaultCapture::installed() {
            Some(capture) => {
                let bootstrap = Rc::downgrade(&bootstrap);
                capture.on_panic(move |failure| {
                    if let Some(bootstrap) = bootstrap.upgrade() {
                        if bootstrap.escalate_panic(failure) {
                            tracing::error!("Panic during activation escalated to bootstrap failure");
                        }
                    }
                });
            }
            None => tracing::warn!("Runtime initialized before global fault capture"),
        }

        let runtime = Rc::new(ResilienceRuntime {
            config,
            diagnostics,
            bootstrap,
            page: host.page,
            artifacts: host.artifacts,
        });
        RUNTIME
            .with(|cell| cell.set(Rc::clone(&runtime)))
            .map_err(|_| crate::ResilienceError::AlreadyInstalled("resilience runtime"))?;

        tracing::debug!("Resilience runtime initialized");
        Ok(runtime)
    }

    pub fn current() -> Option<Rc<ResilienceRuntime>> {
        RUNTIME.try_with(|cell| cell.get().cloned()).ok().flatten()
    }

    pub fn config(&self) -> &ResilienceConfig {
        &self.config
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn bootstrap(&self) -> Rc<HydrationBootstrap> {
        Rc::clone(&self.bootstrap)
    }

    /// Run one of the default fallback's actions
    pub fn perform(&self, action: FallbackAction) {
        tracing::info!("Fallback action: {}", action.label());
        action.perform(&self.diagnostics, self.page.as_ref(), self.artifacts.as_ref());
    }
}

impl std::fmt::Debug for ResilienceRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilienceRuntime")
            .field("config", &self.config)
            .field("bootstrap", &self.bootstrap)
            .finish_non_exhaustive()
    }
}

/// Run `f` against the page's diagnostics.
///
/// Before [`ResilienceRuntime::init`] (or off-browser) an in-memory pipeline
/// is used so capture never fails for lack of a runtime.
pub fn with_diagnostics<R>(f: impl FnOnce(&Diagnostics) -> R) -> R {
    match ResilienceRuntime::current() {
        Some(runtime) => f(runtime.diagnostics()),
        None => DETACHED.with(|diagnostics| f(diagnostics)),
    }
}
