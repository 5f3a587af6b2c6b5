//! Notice about a failure persisted by an earlier page load

use leptos::prelude::*;
use skylight_resilience::{with_diagnostics, Channel, ErrorRecord};

/// Stored record shown by the notice
#[derive(Debug, Clone, PartialEq, Eq)]
struct StoredFailure {
    channel: Channel,
    message: String,
    captured_at: String,
}

impl StoredFailure {
    fn from_record(channel: Channel, record: &ErrorRecord) -> Self {
        Self {
            channel,
            message: record.message().to_string(),
            captured_at: record.captured_at_iso(),
        }
    }
}

fn load_stored_failure() -> Option<StoredFailure> {
    with_diagnostics(|diagnostics| {
        [Channel::Bootstrap, Channel::RenderBoundary]
            .into_iter()
            .find_map(|channel| {
                diagnostics
                    .store()
                    .get(channel)
                    .map(|record| StoredFailure::from_record(channel, &record))
            })
    })
}

/// Shows a stored failure until it is dismissed
#[component]
pub fn LastFailureNotice() -> impl IntoView {
    let stored = RwSignal::new(None::<StoredFailure>);

    // Storage is client-only; read it after hydration
    Effect::new(move |_| stored.set(load_stored_failure()));

    let dismiss = move |_| {
        if let Some(failure) = stored.get_untracked() {
            with_diagnostics(|diagnostics| diagnostics.store().clear(failure.channel));
            tracing::info!("Dismissed stored {} failure", failure.channel);
        }
        stored.set(load_stored_failure());
    };

    view! {
        {move || stored.get().map(|failure| view! {
            <aside style="padding: 0.75rem 1rem; margin-bottom: 1rem; border: 1px solid #FDE68A; border-radius: 6px; background-color: #FFFBEB;">
                <strong>"A previous session hit an error (" {failure.channel.to_string()} ")"</strong>
                <p style="margin: 0.5rem 0;">{failure.message}</p>
                <small>{failure.captured_at}</small>
                <div style="margin-top: 0.5rem;">
                    <button type="button" on:click=dismiss>"Dismiss"</button>
                </div>
            </aside>
        })}
    }
}
