//! Diagnostic records and the failures they describe

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::host::{ClientEnvironment, ReadyState};

/// Named slot in the diagnostic store, distinguishing failure origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Channel {
    RenderBoundary,
    Bootstrap,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::RenderBoundary => "render-boundary",
            Channel::Bootstrap => "bootstrap",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure as observed by one of the capture components
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    message: String,
    stack_trace: Option<String>,
}

impl Failure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack_trace: None,
        }
    }

    pub fn with_stack_trace(mut self, stack_trace: impl Into<String>) -> Self {
        let stack_trace = stack_trace.into();
        self.stack_trace = (!stack_trace.trim().is_empty()).then_some(stack_trace);
        self
    }

    /// Build a failure from a Rust error. The `source()` chain stands in for
    /// the call stack since wasm32 has no usable backtraces.
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            causes.push(format!("caused by: {cause}"));
            source = cause.source();
        }

        let failure = Self::new(err.to_string());
        if causes.is_empty() {
            failure
        } else {
            failure.with_stack_trace(causes.join("\n"))
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn stack_trace(&self) -> Option<&str> {
        self.stack_trace.as_deref()
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl<E: std::error::Error + 'static> From<&E> for Failure {
    fn from(err: &E) -> Self {
        Failure::from_error(err)
    }
}

/// Chain of UI component identifiers, outermost first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderTrace {
    frames: Vec<String>,
}

impl RenderTrace {
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            frames: vec![name.into()],
        }
    }

    /// Returns a new trace with `name` nested inside this one
    pub fn enter(&self, name: impl Into<String>) -> Self {
        let mut frames = self.frames.clone();
        frames.push(name.into());
        Self { frames }
    }

    pub fn frames(&self) -> &[String] {
        &self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl fmt::Display for RenderTrace {
    /// Innermost component first, one `in <name>` line per frame
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for frame in self.frames.iter().rev() {
            writeln!(f, "    in {frame}")?;
        }
        Ok(())
    }
}

/// Host document state at capture time, attached to bootstrap records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSnapshot {
    pub ready_state: ReadyState,
    pub mount_point_present: bool,
}

/// Unit of captured diagnostic information.
///
/// Fields are only readable; a new failure always produces a new record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stack_trace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    render_trace: Option<String>,
    captured_at: DateTime<Utc>,
    page_url: String,
    client_signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    document_state: Option<DocumentSnapshot>,
}

impl ErrorRecord {
    /// Capture a failure against the current client environment
    pub fn capture(failure: &Failure, env: &dyn ClientEnvironment) -> Self {
        Self {
            message: failure.message().to_string(),
            stack_trace: failure.stack_trace().map(str::to_string),
            render_trace: None,
            captured_at: env.now(),
            page_url: env.page_url(),
            client_signature: env.client_signature(),
            detail: None,
            document_state: None,
        }
    }

    pub fn with_render_trace(mut self, trace: &RenderTrace) -> Self {
        self.render_trace = Some(trace.to_string());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_document_state(mut self, snapshot: DocumentSnapshot) -> Self {
        self.document_state = Some(snapshot);
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn stack_trace(&self) -> Option<&str> {
        self.stack_trace.as_deref()
    }

    pub fn render_trace(&self) -> Option<&str> {
        self.render_trace.as_deref()
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// ISO-8601 capture time with millisecond precision
    pub fn captured_at_iso(&self) -> String {
        self.captured_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn page_url(&self) -> &str {
        &self.page_url
    }

    pub fn client_signature(&self) -> &str {
        &self.client_signature
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn document_state(&self) -> Option<DocumentSnapshot> {
        self.document_state
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
