//! BDD step definitions for render boundaries

use cucumber::{given, then, when};

use skylight_resilience::boundary::{FallbackAction, Interception, Presentation};
use skylight_resilience::{Failure, RenderBoundary, RenderTrace};

use crate::world::ResilienceWorld;

fn boundary(world: &ResilienceWorld) -> &RenderBoundary {
    world.boundary.as_ref().expect("boundary not set")
}

#[given(expr = "a render boundary around {string} inside {string}")]
fn render_boundary(world: &mut ResilienceWorld, inner: String, outer: String) {
    world.boundary = Some(RenderBoundary::new(RenderTrace::root(outer).enter(inner)));
}

#[given("the boundary has a custom fallback")]
fn custom_fallback(world: &mut ResilienceWorld) {
    world.has_custom_fallback = true;
}

#[when(expr = "a descendant fails to render with {string}")]
fn descendant_fails(world: &mut ResilienceWorld, message: String) {
    let diagnostics = world.diagnostics();
    let outcome = boundary(world).intercept(&Failure::new(message), &diagnostics);
    world.interceptions.push(outcome);
}

#[when(expr = "the user chooses {string}")]
fn user_chooses(world: &mut ResilienceWorld, label: String) {
    let action = [FallbackAction::Reload, FallbackAction::ExportErrorLog]
        .into_iter()
        .find(|action| action.label() == label)
        .unwrap_or_else(|| panic!("Unknown fallback action: {}", label));
    let diagnostics = world.diagnostics();
    action.perform(&diagnostics, &world.page, &world.downloads);
}

#[then("the boundary should be tripped")]
fn boundary_tripped(world: &mut ResilienceWorld) {
    assert!(boundary(world).is_tripped());
}

#[then("the children should be shown")]
fn children_shown(world: &mut ResilienceWorld) {
    let presentation = boundary(world).presentation(world.has_custom_fallback);
    assert_eq!(presentation, Presentation::Children);
}

#[then("the custom fallback should be shown")]
fn custom_fallback_shown(world: &mut ResilienceWorld) {
    let presentation = boundary(world).presentation(world.has_custom_fallback);
    assert_eq!(presentation, Presentation::CustomFallback);
}

#[then(expr = "the default fallback should show {string}")]
fn default_fallback_shows(world: &mut ResilienceWorld, message: String) {
    match boundary(world).presentation(world.has_custom_fallback) {
        Presentation::DefaultFallback(fallback) => {
            assert_eq!(fallback.title, "Something went wrong");
            assert_eq!(fallback.message, message);
            assert!(!fallback.tips.is_empty());
        }
        other => panic!("Expected the default fallback, got {:?}", other),
    }
}

#[then(expr = "the fallback should offer {string} and {string}")]
fn fallback_offers(world: &mut ResilienceWorld, first: String, second: String) {
    let Presentation::DefaultFallback(fallback) =
        boundary(world).presentation(world.has_custom_fallback)
    else {
        panic!("Expected the default fallback");
    };
    let labels: Vec<&str> = fallback.actions.iter().map(|a| a.label()).collect();
    assert_eq!(labels, vec![first.as_str(), second.as_str()]);
}

#[then(expr = "the render trace should start with {string}")]
fn render_trace_starts_with(world: &mut ResilienceWorld, frame: String) {
    let state = boundary(world).state();
    let record = state.record().expect("boundary holds no record");
    let trace = record.render_trace().expect("record has no render trace");
    assert!(
        trace.trim_start().starts_with(&frame),
        "Render trace does not start with {}: {}",
        frame,
        trace
    );
}

#[then(expr = "{int} failure(s) should have been captured")]
fn failures_captured(world: &mut ResilienceWorld, expected: usize) {
    let captured = world
        .interceptions
        .iter()
        .filter(|outcome| matches!(outcome, Interception::Captured(_)))
        .count();
    assert_eq!(captured, expected);
}

#[then(expr = "the debug slot should hold {string}")]
fn debug_slot_holds(world: &mut ResilienceWorld, message: String) {
    let latest = world.debug_surface.latest.lock().unwrap().clone();
    let entry = latest.expect("debug slot is empty");
    assert_eq!(entry.error, message);
    assert!(entry.render_trace.is_some());
}

#[then("the page should have been reloaded")]
fn page_reloaded(world: &mut ResilienceWorld) {
    assert_eq!(*world.page.reloads.lock().unwrap(), 1);
}
