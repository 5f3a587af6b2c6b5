//! Best-effort persistence of the latest error record per channel

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use crate::config::ResilienceConfig;
use crate::host::ArtifactSink;
use crate::record::{Channel, ErrorRecord};

/// Key-value backend, `localStorage` in the browser
#[cfg_attr(test, mockall::automock)]
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> crate::Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> crate::Result<()>;
    fn remove_item(&self, key: &str) -> crate::Result<()>;
}

/// In-memory backend with an optional size quota
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: Arc<Mutex<HashMap<String, String>>>,
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that rejects writes once stored keys and values exceed `bytes`
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            items: Arc::default(),
            quota_bytes: Some(bytes),
        }
    }

    pub fn len(&self) -> usize {
        self.items.lock().map(|items| items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> crate::Result<Option<String>> {
        let items = self
            .items
            .lock()
            .map_err(|_| crate::ResilienceError::Storage("store lock poisoned".to_string()))?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> crate::Result<()> {
        let mut items = self
            .items
            .lock()
            .map_err(|_| crate::ResilienceError::Storage("store lock poisoned".to_string()))?;

        if let Some(quota) = self.quota_bytes {
            let used: usize = items
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            if used + key.len() + value.len() > quota {
                return Err(crate::ResilienceError::Storage(format!(
                    "quota of {} bytes exceeded",
                    quota
                )));
            }
        }

        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> crate::Result<()> {
        let mut items = self
            .items
            .lock()
            .map_err(|_| crate::ResilienceError::Storage("store lock poisoned".to_string()))?;
        items.remove(key);
        Ok(())
    }
}

/// Backend for hosts where persistent storage is disabled
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableStore;

impl KeyValueStore for UnavailableStore {
    fn get_item(&self, _key: &str) -> crate::Result<Option<String>> {
        Err(crate::ResilienceError::Storage(
            "storage unavailable".to_string(),
        ))
    }

    fn set_item(&self, _key: &str, _value: &str) -> crate::Result<()> {
        Err(crate::ResilienceError::Storage(
            "storage unavailable".to_string(),
        ))
    }

    fn remove_item(&self, _key: &str) -> crate::Result<()> {
        Err(crate::ResilienceError::Storage(
            "storage unavailable".to_string(),
        ))
    }
}

/// Latest record per channel, persisted through a [`KeyValueStore`].
///
/// None of the operations fail: persistence problems are logged and
/// swallowed so diagnostics can never take the page down with them.
#[derive(Clone)]
pub struct DiagnosticStore {
    backend: Rc<dyn KeyValueStore>,
    config: Rc<ResilienceConfig>,
}

impl DiagnosticStore {
    pub fn new(backend: Rc<dyn KeyValueStore>, config: Rc<ResilienceConfig>) -> Self {
        Self { backend, config }
    }

    /// Store `record` as the latest record of `channel`, replacing any previous one
    pub fn put(&self, channel: Channel, record: &ErrorRecord) {
        let key = self.config.storage_key(channel);
        let result = record
            .to_json()
            .and_then(|json| self.backend.set_item(&key, &json));
        match result {
            Ok(()) => tracing::debug!("Persisted {} record under '{}'", channel, key),
            Err(e) => tracing::warn!("Could not persist {} record: {}", channel, e),
        }
    }

    pub fn get(&self, channel: Channel) -> Option<ErrorRecord> {
        let key = self.config.storage_key(channel);
        let raw = match self.backend.get_item(&key) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!("Could not read {} record: {}", channel, e);
                return None;
            }
        };

        match ErrorRecord::from_json(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Discarding unreadable {} record: {}", channel, e);
                None
            }
        }
    }

    pub fn clear(&self, channel: Channel) {
        let key = self.config.storage_key(channel);
        if let Err(e) = self.backend.remove_item(&key) {
            tracing::warn!("Could not clear {} record: {}", channel, e);
        }
    }

    /// Offer the stored record of `channel` as a JSON download.
    ///
    /// Returns the artifact file name, or `None` when nothing was exported.
    pub fn export_as_download(&self, channel: Channel, sink: &dyn ArtifactSink) -> Option<String> {
        let Some(record) = self.get(channel) else {
            tracing::warn!("No {} record to export", channel);
            return None;
        };

        let filename = self
            .config
            .export_file_name(record.captured_at().timestamp_millis());
        let result = record
            .to_json()
            .and_then(|json| sink.offer_download(&filename, "application/json", &json));

        match result {
            Ok(()) => {
                tracing::info!("Exported {} record as {}", channel, filename);
                Some(filename)
            }
            Err(e) => {
                tracing::error!("Could not export {} record: {}", channel, e);
                None
            }
        }
    }
}

impl std::fmt::Debug for DiagnosticStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagnosticStore")
            .field("storage_key_prefix", &self.config.storage_key_prefix)
            .finish_non_exhaustive()
    }
}
