//! Skylight resilience - client-side failure capture for the Skylight UI
//!
//! Catches render failures at component boundaries, escalates unhandled page
//! errors and panics to the logs, guards hydration of the server-rendered page,
//! and keeps the latest diagnostic record per channel in persistent storage.
//!
//! Browser specifics sit behind the traits in [`host`] and [`store`]; the `web`
//! feature provides their DOM implementations.

pub mod bootstrap;
pub mod boundary;
pub mod config;
pub mod debug_slot;
pub mod diagnostics;
pub mod error;
pub mod fallback;
pub mod fault;
pub mod host;
pub mod logging;
pub mod record;
pub mod runtime;
pub mod store;
#[cfg(feature = "web")]
pub mod web;

pub use boundary::{FallbackAction, RenderBoundary};
pub use bootstrap::{BootstrapState, HydrationBootstrap};
pub use config::{parse_config, ResilienceConfig};
pub use diagnostics::Diagnostics;
pub use error::{ResilienceError, Result};
pub use fault::GlobalFaultCapture;
pub use record::{Channel, ErrorRecord, Failure, RenderTrace};
pub use runtime::{with_diagnostics, ResilienceRuntime};
