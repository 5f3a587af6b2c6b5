//! Render boundary component and manual error capture
//!
//! [`RenderErrorBoundary`] puts a [`RenderBoundary`] latch behind a Leptos
//! `ErrorBoundary`. Every `Err` rendered below it is forwarded to the latch;
//! once tripped, a latch child keeps the boundary in its error state so the
//! children are never swapped back in.

use std::error::Error;

use leptos::context::Provider;
use leptos::error::Errors;
use leptos::prelude::*;
use skylight_resilience::boundary::{DefaultFallback, Presentation};
use skylight_resilience::{
    with_diagnostics, ErrorRecord, FallbackAction, Failure, RenderBoundary, RenderTrace,
    ResilienceRuntime,
};

/// Render trace of the innermost enclosing boundary
#[derive(Debug, Clone)]
struct TraceContext(RenderTrace);

/// Rendered below a tripped boundary to keep it in its error state
#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("render boundary latched")]
pub struct BoundaryLatched;

/// Failures to forward to the latch, ordered by message.
///
/// Errors raised in the same pass arrive unordered; sorting makes the one that
/// trips the latch deterministic. The latch's own marker error is skipped.
fn render_failures<'a>(
    errors: impl IntoIterator<Item = &'a (dyn Error + Send + Sync + 'static)>,
) -> Vec<Failure> {
    let mut failures: Vec<Failure> = errors
        .into_iter()
        .filter(|error| error.downcast_ref::<BoundaryLatched>().is_none())
        .map(|error| Failure::from_error(error))
        .collect();
    failures.sort_by(|a, b| a.message().cmp(b.message()));
    failures
}

/// Catches render failures in its children and shows a fallback instead
#[component]
pub fn RenderErrorBoundary(
    /// Identifier appended to the render trace
    #[prop(into)]
    name: String,
    /// Shown once tripped instead of the built-in fallback
    #[prop(optional, into)]
    fallback: Option<ViewFn>,
    children: Children,
) -> impl IntoView {
    let trace = use_context::<TraceContext>()
        .map(|parent| parent.0.enter(name.as_str()))
        .unwrap_or_else(|| RenderTrace::root(name.as_str()));

    let boundary = RenderBoundary::new(trace.clone());
    let tripped = RwSignal::new(false);

    let show_fallback = move |errors: ArcRwSignal<Errors>| {
        let errors: Vec<_> = errors
            .get_untracked()
            .into_iter()
            .map(|(_, error)| error)
            .collect();
        for failure in render_failures(errors.iter().map(|error| &***error)) {
            with_diagnostics(|diagnostics| boundary.intercept(&failure, diagnostics));
        }
        tripped.set(true);

        match boundary.presentation(fallback.is_some()) {
            Presentation::CustomFallback => fallback
                .as_ref()
                .map(|custom| custom.run())
                .unwrap_or_else(|| ().into_any()),
            Presentation::DefaultFallback(content) => {
                view! { <DefaultFallbackView content=content /> }.into_any()
            }
            Presentation::Children => ().into_any(),
        }
    };

    // Children get their own owner so the trace never leaks to siblings
    view! {
        <ErrorBoundary fallback=show_fallback>
            <Provider value=TraceContext(trace)>{children()}</Provider>
            {move || if tripped.get() { Err(BoundaryLatched) } else { Ok(()) }}
        </ErrorBoundary>
    }
}

fn perform(action: FallbackAction) {
    match ResilienceRuntime::current() {
        Some(runtime) => runtime.perform(action),
        None => tracing::warn!("'{}' is unavailable before startup", action.label()),
    }
}

/// Built-in fallback: message, render trace, actions and tips
#[component]
pub fn DefaultFallbackView(content: DefaultFallback) -> impl IntoView {
    let DefaultFallback {
        title,
        message,
        render_trace,
        actions,
        tips,
    } = content;

    view! {
        <div role="alert" style="padding: 1.5rem; border: 2px solid #FECACA; border-radius: 8px; background-color: #FEF2F2; color: #7F1D1D;">
            <h2 style="margin-top: 0; color: #DC2626;">{title}</h2>
            <pre style="white-space: pre-wrap;">{message}</pre>
            {render_trace.map(|trace| view! {
                <details>
                    <summary>"Component trace"</summary>
                    <pre style="font-size: 0.8rem;">{trace}</pre>
                </details>
            })}
            <div style="display: flex; gap: 0.5rem; margin: 1rem 0;">
                {actions.into_iter().map(|action| view! {
                    <button type="button" on:click=move |_| perform(action)>
                        {action.label()}
                    </button>
                }).collect::<Vec<_>>()}
            </div>
            <strong>"Troubleshooting Tips:"</strong>
            <ul>
                {tips.iter().map(|tip| view! { <li>{*tip}</li> }).collect::<Vec<_>>()}
            </ul>
        </div>
    }
}

/// Wrap `component` in a [`RenderErrorBoundary`] named `name`
pub fn with_error_boundary<F, V>(
    name: impl Into<String>,
    component: F,
    fallback: Option<ViewFn>,
) -> impl Fn() -> AnyView + Clone + Send + Sync + 'static
where
    F: Fn() -> V + Clone + Send + Sync + 'static,
    V: IntoView + 'static,
{
    let name = name.into();
    move || {
        let component = component.clone();
        match fallback.clone() {
            Some(fallback) => view! {
                <RenderErrorBoundary name=name.clone() fallback=fallback>
                    {component()}
                </RenderErrorBoundary>
            }
            .into_any(),
            None => view! {
                <RenderErrorBoundary name=name.clone()>
                    {component()}
                </RenderErrorBoundary>
            }
            .into_any(),
        }
    }
}

/// Reports failures from event handlers and effects without tripping a boundary
#[derive(Debug, Clone, Default)]
pub struct ErrorHandler {
    trace: Option<RenderTrace>,
}

impl ErrorHandler {
    pub fn capture(
        &self,
        error: &(dyn std::error::Error + 'static),
        detail: Option<&str>,
    ) -> ErrorRecord {
        self.report(Failure::from_error(error), detail)
    }

    pub fn capture_message(&self, message: impl Into<String>, detail: Option<&str>) -> ErrorRecord {
        self.report(Failure::new(message), detail)
    }

    fn report(&self, failure: Failure, detail: Option<&str>) -> ErrorRecord {
        let detail = match (&self.trace, detail) {
            (Some(trace), Some(detail)) => Some(format!("{}\n{}", detail, trace)),
            (Some(trace), None) => Some(trace.to_string()),
            (None, detail) => detail.map(str::to_string),
        };
        with_diagnostics(|diagnostics| diagnostics.report(&failure, detail.as_deref()))
    }
}

/// Manual capture handle for the calling component
pub fn use_error_handler() -> ErrorHandler {
    ErrorHandler {
        trace: use_context::<TraceContext>().map(|context| context.0),
    }
}
