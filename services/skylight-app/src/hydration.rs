//! Leptos as the bootstrap's rendering runtime

use async_trait::async_trait;
use leptos::prelude::document;
use skylight_resilience::host::RenderingRuntime;
use skylight_resilience::ResilienceError;
use wasm_bindgen::JsCast;

use crate::app::App;

/// Hydrates [`App`] onto the server-rendered mount point
#[derive(Debug, Clone, Copy, Default)]
pub struct LeptosRuntime;

#[async_trait(?Send)]
impl RenderingRuntime for LeptosRuntime {
    async fn activate(&self, mount_point_id: &str) -> skylight_resilience::Result<()> {
        let mount = document()
            .get_element_by_id(mount_point_id)
            .ok_or_else(|| {
                ResilienceError::Activation(format!("Mount point #{} not found", mount_point_id))
            })?
            .dyn_into::<web_sys::HtmlElement>()
            .map_err(|_| {
                ResilienceError::Activation(format!(
                    "Mount point #{} is not an HTML element",
                    mount_point_id
                ))
            })?;

        // The page is never unmounted
        leptos::mount::hydrate_from(mount, App).forget();
        Ok(())
    }
}
