//! Browser implementations of the host traits

use std::rc::Rc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{ErrorEvent, PromiseRejectionEvent};

use crate::config::{parse_config, ResilienceConfig};
use crate::debug_slot::{DebugEntry, DebugSurface};
use crate::fault::{Disposition, FaultHost, GlobalFaultCapture, UnhandledFailure};
use crate::host::{
    ArtifactSink, ClientEnvironment, HostDocument, MountPoint, PageControl, ReadyState,
    RenderingRuntime,
};
use crate::logging::{init_logging, parse_level};
use crate::runtime::{HostBindings, ResilienceRuntime};
use crate::store::KeyValueStore;

/// Best-effort text of a thrown JS value
pub fn js_error_message(value: &JsValue) -> String {
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

fn window() -> crate::Result<web_sys::Window> {
    web_sys::window().ok_or_else(|| crate::ResilienceError::Config("no window".to_string()))
}

/// Map `document.readyState` text; unknown values count as complete
fn parse_ready_state(value: &str) -> ReadyState {
    match value {
        "loading" => ReadyState::Loading,
        "interactive" => ReadyState::Interactive,
        _ => ReadyState::Complete,
    }
}

pub struct WebDocument {
    document: web_sys::Document,
}

impl WebDocument {
    pub fn new() -> crate::Result<Self> {
        let document = window()?
            .document()
            .ok_or_else(|| crate::ResilienceError::Config("no document".to_string()))?;
        Ok(Self { document })
    }

    /// Text of an inline `<script type="application/json">` element
    pub fn inline_json(&self, id: &str) -> Option<String> {
        self.document
            .get_element_by_id(id)
            .and_then(|element| element.text_content())
    }
}

struct WebMountPoint {
    element: web_sys::Element,
}

impl MountPoint for WebMountPoint {
    fn replace_contents(&self, markup: &str) {
        self.element.set_inner_html(markup);
    }

    fn child_count(&self) -> u32 {
        self.element.child_element_count()
    }
}

#[async_trait(?Send)]
impl HostDocument for WebDocument {
    fn ready_state(&self) -> ReadyState {
        parse_ready_state(&self.document.ready_state())
    }

    async fn document_ready(&self) {
        if !self.ready_state().is_loading() {
            return;
        }

        let document = self.document.clone();
        let ready = js_sys::Promise::new(&mut |resolve, _reject| {
            let options = web_sys::AddEventListenerOptions::new();
            options.set_once(true);
            if let Err(e) = document.add_event_listener_with_callback_and_add_event_listener_options(
                "DOMContentLoaded",
                &resolve,
                &options,
            ) {
                tracing::warn!("Could not wait for DOMContentLoaded: {}", js_error_message(&e));
                let _ = resolve.call0(&JsValue::UNDEFINED);
            }
        });
        let _ = wasm_bindgen_futures::JsFuture::from(ready).await;
    }

    fn mount_point(&self, id: &str) -> Option<Box<dyn MountPoint>> {
        self.document
            .get_element_by_id(id)
            .map(|element| Box::new(WebMountPoint { element }) as Box<dyn MountPoint>)
    }

    fn remove_placeholder(&self, selector: &str) -> bool {
        match self.document.query_selector(selector) {
            Ok(Some(placeholder)) => {
                placeholder.remove();
                true
            }
            Ok(None) => false,
            Err(e) => {
                tracing::warn!("Invalid placeholder selector '{}': {}", selector, js_error_message(&e));
                false
            }
        }
    }
}

/// `window.localStorage`, looked up on every call since it can vanish
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

impl LocalStorage {
    fn storage() -> crate::Result<web_sys::Storage> {
        window()?
            .local_storage()
            .map_err(|e| crate::ResilienceError::Storage(js_error_message(&e)))?
            .ok_or_else(|| crate::ResilienceError::Storage("localStorage unavailable".to_string()))
    }
}

impl KeyValueStore for LocalStorage {
    fn get_item(&self, key: &str) -> crate::Result<Option<String>> {
        Self::storage()?
            .get_item(key)
            .map_err(|e| crate::ResilienceError::Storage(js_error_message(&e)))
    }

    fn set_item(&self, key: &str, value: &str) -> crate::Result<()> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|e| crate::ResilienceError::Storage(js_error_message(&e)))
    }

    fn remove_item(&self, key: &str) -> crate::Result<()> {
        Self::storage()?
            .remove_item(key)
            .map_err(|e| crate::ResilienceError::Storage(js_error_message(&e)))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserEnvironment;

impl ClientEnvironment for BrowserEnvironment {
    fn page_url(&self) -> String {
        window()
            .ok()
            .and_then(|w| w.location().href().ok())
            .unwrap_or_default()
    }

    fn client_signature(&self) -> String {
        window()
            .ok()
            .and_then(|w| w.navigator().user_agent().ok())
            .unwrap_or_else(|| "unknown".to_string())
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Downloads through a temporary object URL and anchor click
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserDownloads;

impl ArtifactSink for BrowserDownloads {
    fn offer_download(&self, filename: &str, mime_type: &str, contents: &str) -> crate::Result<()> {
        let export_err = |e: JsValue| crate::ResilienceError::Export(js_error_message(&e));
        let document = window()?
            .document()
            .ok_or_else(|| crate::ResilienceError::Export("no document".to_string()))?;

        let parts = js_sys::Array::of1(&JsValue::from_str(contents));
        let options = web_sys::BlobPropertyBag::new();
        options.set_type(mime_type);
        let blob = web_sys::Blob::new_with_str_sequence_and_options(&parts, &options)
            .map_err(export_err)?;
        let url = web_sys::Url::create_object_url_with_blob(&blob).map_err(export_err)?;

        let anchor = document
            .create_element("a")
            .map_err(export_err)?
            .dyn_into::<web_sys::HtmlAnchorElement>()
            .map_err(|_| crate::ResilienceError::Export("anchor cast failed".to_string()))?;
        anchor.set_href(&url);
        anchor.set_download(filename);
        anchor.click();

        let _ = web_sys::Url::revoke_object_url(&url);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserPage;

impl PageControl for BrowserPage {
    fn reload(&self) {
        let result = window().and_then(|w| {
            w.location()
                .reload()
                .map_err(|e| crate::ResilienceError::Config(js_error_message(&e)))
        });
        if let Err(e) = result {
            tracing::error!("Could not reload page: {}", e);
        }
    }
}

/// Mirrors debug entries onto `window[slot]`
#[derive(Debug, Clone)]
pub struct WindowDebugSurface {
    slot: String,
}

impl WindowDebugSurface {
    pub fn new(slot: impl Into<String>) -> Self {
        Self { slot: slot.into() }
    }
}

impl DebugSurface for WindowDebugSurface {
    fn expose(&self, entry: &DebugEntry) {
        let result = serde_json::to_string(entry)
            .map_err(|e| e.to_string())
            .and_then(|json| js_sys::JSON::parse(&json).map_err(|e| js_error_message(&e)))
            .and_then(|value| {
                let window = window().map_err(|e| e.to_string())?;
                js_sys::Reflect::set(&window, &JsValue::from_str(&self.slot), &value)
                    .map(|_| ())
                    .map_err(|e| js_error_message(&e))
            });
        if let Err(e) = result {
            tracing::warn!("Could not publish debug slot '{}': {}", self.slot, e);
        }
    }
}

/// Wires `error` and `unhandledrejection` on `window` to the capture
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserFaultHost;

impl FaultHost for BrowserFaultHost {
    fn attach(&self, capture: Rc<GlobalFaultCapture>) {
        let window = match window() {
            Ok(window) => window,
            Err(e) => {
                tracing::error!("Cannot attach fault listeners: {}", e);
                return;
            }
        };

        let on_error_capture = Rc::clone(&capture);
        let on_error = Closure::<dyn FnMut(ErrorEvent)>::new(move |event: ErrorEvent| {
            let filename = event.filename();
            let location = (!filename.is_empty())
                .then(|| format!("{}:{}:{}", filename, event.lineno(), event.colno()));
            let failure = UnhandledFailure::uncaught_exception(event.message(), location);
            if on_error_capture.handle(&failure) == Disposition::Suppress {
                event.prevent_default();
            }
        });

        let on_rejection =
            Closure::<dyn FnMut(PromiseRejectionEvent)>::new(move |event: PromiseRejectionEvent| {
                let failure = UnhandledFailure::unhandled_rejection(js_error_message(&event.reason()));
                if capture.handle(&failure) == Disposition::Suppress {
                    event.prevent_default();
                }
            });

        for (name, listener) in [
            ("error", on_error.as_ref().unchecked_ref::<js_sys::Function>()),
            (
                "unhandledrejection",
                on_rejection.as_ref().unchecked_ref::<js_sys::Function>(),
            ),
        ] {
            if let Err(e) = window.add_event_listener_with_callback(name, listener) {
                tracing::error!("Could not listen for '{}': {}", name, js_error_message(&e));
            }
        }

        // Listeners stay attached for the page lifetime
        on_error.forget();
        on_rejection.forget();
    }
}

/// Browser bindings around the given rendering runtime
pub fn bindings(
    config: &ResilienceConfig,
    rendering: Rc<dyn RenderingRuntime>,
) -> crate::Result<HostBindings> {
    Ok(HostBindings {
        document: Rc::new(WebDocument::new()?),
        rendering,
        storage: Rc::new(LocalStorage),
        environment: Rc::new(BrowserEnvironment),
        debug_surface: Rc::new(WindowDebugSurface::new(config.debug_slot.clone())),
        page: Rc::new(BrowserPage),
        artifacts: Rc::new(BrowserDownloads),
    })
}

/// Element id of the optional inline configuration
pub const CONFIG_ELEMENT_ID: &str = "skylight-config";

/// Read the inline configuration, falling back to defaults
pub fn load_config() -> ResilienceConfig {
    let inline = WebDocument::new()
        .ok()
        .and_then(|document| document.inline_json(CONFIG_ELEMENT_ID));
    match inline.map(|json| parse_config(&json)) {
        Some(Ok(config)) => config,
        Some(Err(e)) => {
            tracing::warn!("Ignoring inline configuration: {}", e);
            ResilienceConfig::default()
        }
        None => ResilienceConfig::default(),
    }
}

fn log_environment(config: &ResilienceConfig) {
    let environment = BrowserEnvironment;
    let (ready_state, mount_present) = match WebDocument::new() {
        Ok(document) => (
            document.ready_state().to_string(),
            document.mount_point(&config.mount_point_id).is_some(),
        ),
        Err(_) => ("unknown".to_string(), false),
    };
    tracing::info!(
        url = %environment.page_url(),
        user_agent = %environment.client_signature(),
        ready_state = %ready_state,
        mount_point_present = mount_present,
        "Environment info"
    );
}

fn schedule_health_check(runtime: &Rc<ResilienceRuntime>) {
    let Ok(window) = window() else {
        return;
    };
    let delay_ms = i32::try_from(runtime.config().health_check_delay.as_millis()).unwrap_or(i32::MAX);
    let bootstrap = runtime.bootstrap();
    let check = Closure::once_into_js(move || {
        bootstrap.health_report();
    });
    if let Err(e) = window
        .set_timeout_with_callback_and_timeout_and_arguments_0(
            check.unchecked_ref::<js_sys::Function>(),
            delay_ms,
        )
    {
        tracing::warn!("Could not schedule health check: {}", js_error_message(&e));
    }
}

/// Page entry: logging, global capture, runtime, then the bootstrap.
///
/// The bootstrap runs as a local task; this returns immediately.
pub fn start(rendering: Rc<dyn RenderingRuntime>) {
    let config = load_config();
    init_logging(parse_level(&config.log_level));

    if let Err(e) = GlobalFaultCapture::install(&BrowserFaultHost) {
        tracing::warn!("{}", e);
    }
    log_environment(&config);

    let runtime = match bindings(&config, rendering)
        .and_then(|host| ResilienceRuntime::init(config, host))
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Cannot start resilience runtime: {}", e);
            return;
        }
    };

    wasm_bindgen_futures::spawn_local(async move {
        let bootstrap = runtime.bootstrap();
        if bootstrap.run().await == crate::bootstrap::BootstrapState::Activated {
            schedule_health_check(&runtime);
        }
    });
}
