//! Skylight - Leptos frontend
//!
//! The UI tree is wrapped in render boundaries; startup goes through the
//! resilience layer's hydration bootstrap.

pub mod app;
pub mod components;
#[cfg(feature = "hydrate")]
pub mod hydration;

pub use app::App;

/// Hydration entry point for WASM client
#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    skylight_resilience::web::start(std::rc::Rc::new(hydration::LeptosRuntime));
}
