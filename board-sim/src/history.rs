use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;
use uuid::Uuid;

use crate::{
    error::{Result, SimError},
    metrics::PerformanceMetrics,
};

/// Immutable record of a finished (or superseded) case session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub case_label: String,
    pub metrics: PerformanceMetrics,
}

impl HistoryEntry {
    pub fn new(case_label: impl Into<String>, metrics: PerformanceMetrics) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            case_label: case_label.into(),
            metrics,
        }
    }
}

/// Repository of archived sessions, most recent first.
///
/// Entries are never mutated or removed and capacity is unbounded; any bound
/// is applied at presentation time.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn load(&self) -> Result<Vec<HistoryEntry>>;
    async fn append(&self, entry: HistoryEntry) -> Result<()>;
}

/// In-memory implementation of HistoryStore
#[derive(Default)]
pub struct InMemoryHistoryStore {
    entries: Mutex<Vec<HistoryEntry>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn load(&self) -> Result<Vec<HistoryEntry>> {
        Ok(self.entries.lock().unwrap().clone())
    }

    async fn append(&self, entry: HistoryEntry) -> Result<()> {
        self.entries.lock().unwrap().insert(0, entry);
        Ok(())
    }
}

/// File-backed implementation of HistoryStore.
///
/// The whole list lives in one JSON document that is rewritten on every
/// append. A missing or unreadable file yields an empty history rather than
/// an error, so a corrupt record can never block the simulation.
pub struct FileHistoryStore {
    path: PathBuf,
}

impl FileHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_entries(&self) -> Vec<HistoryEntry> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(_) => return Vec::new(),
        };
        match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "history record is unreadable, starting empty");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl HistoryStore for FileHistoryStore {
    async fn load(&self) -> Result<Vec<HistoryEntry>> {
        Ok(self.read_entries().await)
    }

    async fn append(&self, entry: HistoryEntry) -> Result<()> {
        let mut entries = self.read_entries().await;
        entries.insert(0, entry);

        let serialized = serde_json::to_string_pretty(&entries)
            .map_err(|e| SimError::Storage(e.to_string()))?;
        tokio::fs::write(&self.path, serialized)
            .await
            .map_err(|e| SimError::Storage(e.to_string()))?;
        Ok(())
    }
}
