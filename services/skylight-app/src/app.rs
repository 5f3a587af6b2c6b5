//! Main App component

use crate::components::boundary::{with_error_boundary, RenderErrorBoundary};
use crate::components::last_failure::LastFailureNotice;
use leptos::prelude::*;

/// Root application component
#[component]
pub fn App() -> impl IntoView {
    let notice = with_error_boundary("LastFailureNotice", LastFailureNotice, None);

    view! {
        <main style="font-family: system-ui, sans-serif; max-width: 960px; margin: 0 auto; padding: 1rem;">
            <RenderErrorBoundary name="App">
                <h1>"Skylight"</h1>
                {notice()}
            </RenderErrorBoundary>
        </main>
    }
}
