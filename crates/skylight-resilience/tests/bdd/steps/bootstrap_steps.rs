//! BDD step definitions for the hydration bootstrap

use std::rc::Rc;

use cucumber::{given, then, when};

use skylight_resilience::fallback::BOOTSTRAP_FALLBACK_MARKER;
use skylight_resilience::host::ReadyState;
use skylight_resilience::{BootstrapState, HydrationBootstrap};

use crate::world::ResilienceWorld;

fn parse_ready_state(s: &str) -> ReadyState {
    match s {
        "loading" => ReadyState::Loading,
        "interactive" => ReadyState::Interactive,
        "complete" => ReadyState::Complete,
        other => panic!("Unknown ready state: {}", other),
    }
}

fn parse_bootstrap_state(s: &str) -> BootstrapState {
    match s {
        "Idle" => BootstrapState::Idle,
        "AwaitingDocumentReady" => BootstrapState::AwaitingDocumentReady,
        "Activating" => BootstrapState::Activating,
        "Activated" => BootstrapState::Activated,
        "Failed" => BootstrapState::Failed,
        other => panic!("Unknown bootstrap state: {}", other),
    }
}

async fn run_bootstrap(world: &mut ResilienceWorld, runs: usize) {
    let mut runtime = world.runtime.clone();
    runtime.document = world.document.clone();
    let bootstrap = HydrationBootstrap::new(
        Rc::new(world.document.clone()),
        Rc::new(runtime),
        world.diagnostics(),
        Rc::new(world.config.clone()),
    );

    let mut state = bootstrap.state();
    for _ in 0..runs {
        state = bootstrap.run().await;
    }

    world.bootstrap_state = Some(state);
    world.bootstrap_history = bootstrap.history();
    world.bootstrap_failure = bootstrap.failure().map(|f| f.to_string());
    world.health = Some(bootstrap.health_report());
}

#[given(expr = "the document is {string}")]
fn document_ready_state(world: &mut ResilienceWorld, ready_state: String) {
    world.document.state.lock().unwrap().ready_state = parse_ready_state(&ready_state);
}

#[given("the mount point exists")]
fn mount_point_exists(world: &mut ResilienceWorld) {
    world.document.state.lock().unwrap().mount_present = true;
}

#[given("the mount point is missing")]
fn mount_point_missing(world: &mut ResilienceWorld) {
    world.document.state.lock().unwrap().mount_present = false;
}

#[given(expr = "activation fails with {string}")]
fn activation_fails(world: &mut ResilienceWorld, message: String) {
    world.runtime.failure = Some(message);
}

#[when("the bootstrap runs")]
async fn bootstrap_runs(world: &mut ResilienceWorld) {
    run_bootstrap(world, 1).await;
}

#[when("the bootstrap is run twice")]
async fn bootstrap_runs_twice(world: &mut ResilienceWorld) {
    run_bootstrap(world, 2).await;
}

#[then(expr = "the bootstrap should end {string}")]
fn bootstrap_ends(world: &mut ResilienceWorld, expected: String) {
    let expected = parse_bootstrap_state(&expected);
    assert_eq!(world.bootstrap_state, Some(expected));
    assert_eq!(world.bootstrap_history.last(), Some(&expected));
    assert_eq!(world.bootstrap_history.first(), Some(&BootstrapState::Idle));
}

#[then("the document should not have been waited on")]
fn not_waited(world: &mut ResilienceWorld) {
    assert_eq!(world.document.snapshot().ready_waits, 0);
}

#[then("the document should have been waited on once")]
fn waited_once(world: &mut ResilienceWorld) {
    assert_eq!(world.document.snapshot().ready_waits, 1);
}

#[then("the loading placeholder should be gone")]
fn placeholder_gone(world: &mut ResilienceWorld) {
    assert!(!world.document.snapshot().placeholder_present);
}

#[then(expr = "activation should have been attempted {int} time(s)")]
fn activation_attempts(world: &mut ResilienceWorld, expected: u32) {
    assert_eq!(*world.runtime.activations.lock().unwrap(), expected);
}

#[then(expr = "the mount point should show {string}")]
fn mount_point_shows(world: &mut ResilienceWorld, text: String) {
    let markup = world
        .document
        .snapshot()
        .mount_markup
        .expect("mount point was never replaced");
    assert!(markup.contains(BOOTSTRAP_FALLBACK_MARKER));
    assert!(markup.contains(&text), "Fallback lacks {}: {}", text, markup);
}

#[then("the mount point should offer exactly one reload control")]
fn one_reload_control(world: &mut ResilienceWorld) {
    let markup = world
        .document
        .snapshot()
        .mount_markup
        .expect("mount point was never replaced");
    assert_eq!(markup.matches("<button").count(), 1);
    assert_eq!(markup.matches("window.location.reload()").count(), 1);
}

#[then("the mount point should be untouched")]
fn mount_point_untouched(world: &mut ResilienceWorld) {
    assert!(world.document.snapshot().mount_markup.is_none());
}

#[then(expr = "the bootstrap failure should read {string}")]
fn bootstrap_failure_reads(world: &mut ResilienceWorld, message: String) {
    assert_eq!(world.bootstrap_failure.as_deref(), Some(message.as_str()));
}

#[then(expr = "the health check should report {int} mounted element(s)")]
fn health_check_children(world: &mut ResilienceWorld, expected: u32) {
    let health = world.health.expect("no health report");
    assert!(health.mount_point_present);
    assert_eq!(health.mount_children, expected);
}
