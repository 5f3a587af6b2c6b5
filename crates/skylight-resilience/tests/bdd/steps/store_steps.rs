//! BDD step definitions for diagnostic storage

use cucumber::{given, then, when};

use skylight_resilience::store::MemoryStore;
use skylight_resilience::Failure;

use super::parse_channel;
use crate::world::{ResilienceWorld, StorageBackend};

#[given("working storage")]
fn working_storage(world: &mut ResilienceWorld) {
    world.storage = StorageBackend::Memory(MemoryStore::new());
}

#[given("storage is unavailable")]
fn storage_unavailable(world: &mut ResilienceWorld) {
    world.storage = StorageBackend::Unavailable;
}

#[given(expr = "storage limited to {int} bytes")]
fn storage_with_quota(world: &mut ResilienceWorld, bytes: usize) {
    world.storage = StorageBackend::Memory(MemoryStore::with_quota(bytes));
}

fn put_record(world: &ResilienceWorld, message: String, channel: &str) {
    let diagnostics = world.diagnostics();
    let record = diagnostics.capture(&Failure::new(message));
    diagnostics.store().put(parse_channel(channel), &record);
}

#[given(expr = "a record {string} was stored on the {string} channel")]
fn record_was_stored(world: &mut ResilienceWorld, message: String, channel: String) {
    put_record(world, message, &channel);
}

#[when(expr = "a record {string} is stored on the {string} channel")]
fn store_record(world: &mut ResilienceWorld, message: String, channel: String) {
    put_record(world, message, &channel);
}

#[when(expr = "the {string} channel is cleared")]
fn clear_channel(world: &mut ResilienceWorld, channel: String) {
    world.diagnostics().store().clear(parse_channel(&channel));
}

#[when(expr = "the {string} channel is exported")]
fn export_channel(world: &mut ResilienceWorld, channel: String) {
    let downloads = world.downloads.clone();
    world.exported = world
        .diagnostics()
        .store()
        .export_as_download(parse_channel(&channel), &downloads);
}

#[when(expr = "{string} is reported with detail {string}")]
fn manual_report(world: &mut ResilienceWorld, message: String, detail: String) {
    let record = world
        .diagnostics()
        .report(&Failure::new(message), Some(&detail));
    world.reported = Some(record);
}

#[then(expr = "the {string} channel should hold {string}")]
fn channel_holds(world: &mut ResilienceWorld, channel: String, message: String) {
    let record = world
        .diagnostics()
        .store()
        .get(parse_channel(&channel))
        .unwrap_or_else(|| panic!("Expected a record on the {} channel", channel));
    assert_eq!(record.message(), message);
}

#[then(expr = "the {string} channel should be empty")]
fn channel_empty(world: &mut ResilienceWorld, channel: String) {
    let record = world.diagnostics().store().get(parse_channel(&channel));
    assert!(
        record.is_none(),
        "Expected no record on the {} channel, found {:?}",
        channel,
        record
    );
}

#[then(expr = "the stored {string} record should carry the page url and client signature")]
fn record_carries_environment(world: &mut ResilienceWorld, channel: String) {
    let record = world
        .diagnostics()
        .store()
        .get(parse_channel(&channel))
        .expect("record not stored");
    assert_eq!(record.page_url(), "http://localhost/");
    assert!(record.client_signature().starts_with("skylight/"));
    assert!(record.captured_at_iso().ends_with('Z'));
}

#[then(expr = "the reported record detail should be {string}")]
fn reported_detail(world: &mut ResilienceWorld, detail: String) {
    let record = world.reported.as_ref().expect("nothing reported");
    assert_eq!(record.detail(), Some(detail.as_str()));
}

#[then("no file should be offered")]
fn no_file_offered(world: &mut ResilienceWorld) {
    assert!(world.exported.is_none());
    assert!(world.downloads.offered.lock().unwrap().is_empty());
}

#[then(expr = "a file starting with {string} should be offered")]
fn file_offered(world: &mut ResilienceWorld, prefix: String) {
    let offered = world.downloads.offered.lock().unwrap();
    assert_eq!(offered.len(), 1, "Expected exactly one download");
    let (filename, mime_type, _) = &offered[0];
    assert!(
        filename.starts_with(&prefix) && filename.ends_with(".json"),
        "Unexpected file name {}",
        filename
    );
    assert_eq!(mime_type, "application/json");
}

#[then(expr = "the downloaded file should contain {string}")]
fn downloaded_contains(world: &mut ResilienceWorld, text: String) {
    let offered = world.downloads.offered.lock().unwrap();
    let (_, _, contents) = offered.last().expect("no download offered");
    assert!(contents.contains(&text), "Download lacks {}: {}", text, contents);
}
