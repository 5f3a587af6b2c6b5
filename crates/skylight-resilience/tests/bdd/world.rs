//! BDD test world for the resilience layer

use std::rc::Rc;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use cucumber::World;

use skylight_resilience::boundary::{Interception, RenderBoundary};
use skylight_resilience::bootstrap::{BootstrapState, HealthReport};
use skylight_resilience::debug_slot::{DebugEntry, DebugSlot, DebugSurface};
use skylight_resilience::diagnostics::Diagnostics;
use skylight_resilience::fault::Disposition;
use skylight_resilience::host::{
    ArtifactSink, HostDocument, MountPoint, PageControl, ReadyState, RenderingRuntime,
    StaticEnvironment,
};
use skylight_resilience::store::{DiagnosticStore, KeyValueStore, MemoryStore, UnavailableStore};
use skylight_resilience::{ErrorRecord, ResilienceConfig, ResilienceError};

/// Storage backend selected by a scenario
#[derive(Debug, Clone)]
pub enum StorageBackend {
    Memory(MemoryStore),
    Unavailable,
}

impl Default for StorageBackend {
    fn default() -> Self {
        StorageBackend::Memory(MemoryStore::new())
    }
}

impl StorageBackend {
    pub fn backend(&self) -> Rc<dyn KeyValueStore> {
        match self {
            StorageBackend::Memory(store) => Rc::new(store.clone()),
            StorageBackend::Unavailable => Rc::new(UnavailableStore),
        }
    }
}

/// Shared state behind the fake document and its mount point
#[derive(Debug, Clone)]
pub struct DocumentState {
    pub ready_state: ReadyState,
    pub mount_present: bool,
    pub mount_markup: Option<String>,
    pub mount_children: u32,
    pub placeholder_present: bool,
    pub ready_waits: u32,
}

impl Default for DocumentState {
    fn default() -> Self {
        Self {
            ready_state: ReadyState::Complete,
            mount_present: true,
            mount_markup: None,
            mount_children: 0,
            placeholder_present: true,
            ready_waits: 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeDocument {
    pub state: Arc<Mutex<DocumentState>>,
}

impl FakeDocument {
    pub fn snapshot(&self) -> DocumentState {
        self.state.lock().unwrap().clone()
    }
}

struct FakeMount {
    state: Arc<Mutex<DocumentState>>,
}

impl MountPoint for FakeMount {
    fn replace_contents(&self, markup: &str) {
        let mut state = self.state.lock().unwrap();
        state.mount_markup = Some(markup.to_string());
        state.mount_children = 1;
    }

    fn child_count(&self) -> u32 {
        self.state.lock().unwrap().mount_children
    }
}

#[async_trait(?Send)]
impl HostDocument for FakeDocument {
    fn ready_state(&self) -> ReadyState {
        self.state.lock().unwrap().ready_state
    }

    async fn document_ready(&self) {
        let mut state = self.state.lock().unwrap();
        state.ready_waits += 1;
        state.ready_state = ReadyState::Interactive;
    }

    fn mount_point(&self, _id: &str) -> Option<Box<dyn MountPoint>> {
        if !self.state.lock().unwrap().mount_present {
            return None;
        }
        Some(Box::new(FakeMount {
            state: Arc::clone(&self.state),
        }))
    }

    fn remove_placeholder(&self, _selector: &str) -> bool {
        let mut state = self.state.lock().unwrap();
        std::mem::replace(&mut state.placeholder_present, false)
    }
}

/// Rendering runtime whose activation outcome is set by the scenario
#[derive(Debug, Clone, Default)]
pub struct ScriptedRuntime {
    pub failure: Option<String>,
    pub document: FakeDocument,
    pub activations: Arc<Mutex<u32>>,
}

#[async_trait(?Send)]
impl RenderingRuntime for ScriptedRuntime {
    async fn activate(&self, _mount_point_id: &str) -> skylight_resilience::Result<()> {
        *self.activations.lock().unwrap() += 1;
        match &self.failure {
            Some(message) => Err(ResilienceError::Activation(message.clone())),
            None => {
                self.document.state.lock().unwrap().mount_children = 4;
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    pub latest: Arc<Mutex<Option<DebugEntry>>>,
}

impl DebugSurface for RecordingSurface {
    fn expose(&self, entry: &DebugEntry) {
        *self.latest.lock().unwrap() = Some(entry.clone());
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingPage {
    pub reloads: Arc<Mutex<u32>>,
}

impl PageControl for RecordingPage {
    fn reload(&self) {
        *self.reloads.lock().unwrap() += 1;
    }
}

/// A file offered for download: name, mime type, contents
pub type OfferedFile = (String, String, String);

#[derive(Debug, Clone, Default)]
pub struct RecordingDownloads {
    pub offered: Arc<Mutex<Vec<OfferedFile>>>,
}

impl ArtifactSink for RecordingDownloads {
    fn offer_download(
        &self,
        filename: &str,
        mime_type: &str,
        contents: &str,
    ) -> skylight_resilience::Result<()> {
        self.offered.lock().unwrap().push((
            filename.to_string(),
            mime_type.to_string(),
            contents.to_string(),
        ));
        Ok(())
    }
}

#[derive(Debug, Default, World)]
pub struct ResilienceWorld {
    pub config: ResilienceConfig,
    pub storage: StorageBackend,
    pub debug_surface: RecordingSurface,
    pub page: RecordingPage,
    pub downloads: RecordingDownloads,

    // Boundary testing
    pub boundary: Option<RenderBoundary>,
    pub has_custom_fallback: bool,
    pub interceptions: Vec<Interception>,

    // Bootstrap testing
    pub document: FakeDocument,
    pub runtime: ScriptedRuntime,
    pub bootstrap_state: Option<BootstrapState>,
    pub bootstrap_history: Vec<BootstrapState>,
    pub bootstrap_failure: Option<String>,
    pub health: Option<HealthReport>,

    // Storage testing
    pub reported: Option<ErrorRecord>,
    pub exported: Option<String>,

    // Fault testing
    pub disposition: Option<Disposition>,
    pub fault_count: u32,
    pub observed_panics: Vec<String>,
}

impl ResilienceWorld {
    /// A fresh capture pipeline over the scenario's storage and surfaces
    pub fn diagnostics(&self) -> Rc<Diagnostics> {
        Rc::new(Diagnostics::new(
            DiagnosticStore::new(self.storage.backend(), Rc::new(self.config.clone())),
            Rc::new(StaticEnvironment::default()),
            DebugSlot::new(Rc::new(self.debug_surface.clone())),
        ))
    }
}
