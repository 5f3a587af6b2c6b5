//! Host environment abstractions for testability
//!
//! Everything the resilience layer needs from the browser goes through these
//! traits. Browser implementations live in [`crate::web`] behind the `web`
//! feature; tests substitute mocks or in-memory doubles.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Document readiness as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadyState {
    Loading,
    Interactive,
    Complete,
}

impl ReadyState {
    pub fn is_loading(&self) -> bool {
        matches!(self, ReadyState::Loading)
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadyState::Loading => write!(f, "loading"),
            ReadyState::Interactive => write!(f, "interactive"),
            ReadyState::Complete => write!(f, "complete"),
        }
    }
}

/// The element the UI runtime renders under
#[cfg_attr(test, mockall::automock)]
pub trait MountPoint {
    /// Discard current contents and set raw markup
    fn replace_contents(&self, markup: &str);

    /// Number of element children currently attached
    fn child_count(&self) -> u32;
}

/// The host document
#[cfg_attr(test, mockall::automock)]
#[async_trait(?Send)]
pub trait HostDocument {
    fn ready_state(&self) -> ReadyState;

    /// Resolve once the document has finished loading
    async fn document_ready(&self);

    /// Look up the mount point by element id
    fn mount_point(&self, id: &str) -> Option<Box<dyn MountPoint>>;

    /// Remove the pre-rendered loading placeholder, returning true if one was removed
    fn remove_placeholder(&self, selector: &str) -> bool;
}

/// The rendering runtime's activation entry point
#[cfg_attr(test, mockall::automock)]
#[async_trait(?Send)]
pub trait RenderingRuntime {
    /// Attach the live UI to the mount point identified by `mount_id`
    async fn activate(&self, mount_id: &str) -> crate::Result<()>;
}

/// Identity of the client a record is captured on
#[cfg_attr(test, mockall::automock)]
pub trait ClientEnvironment {
    fn page_url(&self) -> String;
    fn client_signature(&self) -> String;
    fn now(&self) -> DateTime<Utc>;
}

/// Offers a file to the user for download
#[cfg_attr(test, mockall::automock)]
pub trait ArtifactSink {
    fn offer_download(&self, filename: &str, mime_type: &str, contents: &str)
        -> crate::Result<()>;
}

/// Page-level controls exposed to fallback actions
#[cfg_attr(test, mockall::automock)]
pub trait PageControl {
    fn reload(&self);
}

/// Fixed environment, used off-browser and in tests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticEnvironment {
    pub page_url: String,
    pub client_signature: String,
    pub now: DateTime<Utc>,
}

impl Default for StaticEnvironment {
    fn default() -> Self {
        Self {
            page_url: "http://localhost/".to_string(),
            client_signature: concat!("skylight/", env!("CARGO_PKG_VERSION")).to_string(),
            now: Utc
                .with_ymd_and_hms(2026, 1, 15, 12, 30, 0)
                .single()
                .unwrap_or_default(),
        }
    }
}

impl ClientEnvironment for StaticEnvironment {
    fn page_url(&self) -> String {
        self.page_url.clone()
    }

    fn client_signature(&self) -> String {
        self.client_signature.clone()
    }

    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

/// Environment for native builds: real clock, no page
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnvironment;

impl ClientEnvironment for SystemEnvironment {
    fn page_url(&self) -> String {
        "about:blank".to_string()
    }

    fn client_signature(&self) -> String {
        format!(
            "skylight/{} ({})",
            env!("CARGO_PKG_VERSION"),
            std::env::consts::OS
        )
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Page control that only logs, for hosts without a page
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPageControl;

impl PageControl for NoopPageControl {
    fn reload(&self) {
        tracing::info!("Reload requested but no page is attached");
    }
}
