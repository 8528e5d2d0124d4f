//! Enhancement log - ordered, append-only record of enhancement attempts
//!
//! The in-memory list is the source of truth for a running session. Every
//! mutation rewrites the full array under the `enhancement_log` storage key.
//! Storage failures are logged and swallowed: the in-memory mutation still
//! succeeds so the session's view stays consistent even when durability
//! does not.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use super::events::{EventBus, LogEvent};
use super::record::{EnhancementRecord, NewEnhancement};
use crate::analytics::{self, EnhancementTrends, Insight, PromptPerformance};
use crate::config::AnalyticsConfig;
use crate::storage::{KeyValueStore, StorageResult};

/// Storage key holding the persisted record array
pub const LOG_KEY: &str = "enhancement_log";

/// The last `n` records, newest first
pub fn take_recent(records: &[EnhancementRecord], n: usize) -> Vec<EnhancementRecord> {
    records.iter().rev().take(n).cloned().collect()
}

pub struct EnhancementLog {
    records: Arc<RwLock<Vec<EnhancementRecord>>>,
    storage: Arc<dyn KeyValueStore>,
    session_id: String,
    analytics: AnalyticsConfig,
    events: EventBus,
}

impl EnhancementLog {
    /// Create an empty log over `storage`. Nothing is read until `load`.
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
            storage,
            session_id: format!("session_{}", uuid::Uuid::new_v4()),
            analytics: AnalyticsConfig::default(),
            events: EventBus::new(),
        }
    }

    /// Create a log and load whatever is persisted
    pub async fn open(storage: Arc<dyn KeyValueStore>) -> Self {
        let log = Self::new(storage);
        log.load().await;
        log
    }

    /// Override the analytics windows and thresholds
    pub fn with_analytics_config(mut self, analytics: AnalyticsConfig) -> Self {
        self.analytics = analytics;
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Receive `LogEvent`s for every subsequent mutation
    pub fn subscribe(&self) -> broadcast::Receiver<LogEvent> {
        self.events.subscribe()
    }

    /// Log a completed enhancement
    ///
    /// Fails only for input holding NaN or infinite values; the log is left
    /// unchanged in that case.
    pub async fn append(&self, input: NewEnhancement) -> Result<EnhancementRecord> {
        input.validate().context("Rejected enhancement")?;
        let record = EnhancementRecord::create(input, &self.session_id);

        let total = {
            let mut records = self.records.write().await;
            records.push(record.clone());
            self.persist(&records).await;
            records.len()
        };

        debug!(
            "Logged enhancement {} ({}, score {}), total: {}",
            record.id,
            record.prompt_type,
            record.score(),
            total
        );
        self.events.publish(LogEvent::Appended { id: record.id.clone() });
        Ok(record)
    }

    /// Append already-built records verbatim; stored categories and
    /// success flags are kept as they are
    ///
    /// Records whose id is already in the log (or earlier in `imported`)
    /// are skipped, as are records holding non-finite values. Returns the
    /// number actually appended.
    pub async fn import(&self, imported: Vec<EnhancementRecord>) -> usize {
        let count = {
            let mut records = self.records.write().await;
            let mut seen: HashSet<String> = records.iter().map(|r| r.id.clone()).collect();
            let before = records.len();

            for record in imported {
                if let Err(e) = record.validate() {
                    warn!("Skipping imported record {}: {}", record.id, e);
                } else if !seen.insert(record.id.clone()) {
                    debug!("Skipping imported record {}: id already logged", record.id);
                } else {
                    records.push(record);
                }
            }

            let count = records.len() - before;
            if count > 0 {
                self.persist(&records).await;
            }
            count
        };

        if count == 0 {
            return 0;
        }

        info!("Imported {} enhancement records", count);
        self.events.publish(LogEvent::Imported { count });
        count
    }

    /// All records, oldest first
    pub async fn all(&self) -> Vec<EnhancementRecord> {
        self.records.read().await.clone()
    }

    /// The last `n` records, newest first
    pub async fn recent(&self, n: usize) -> Vec<EnhancementRecord> {
        take_recent(&self.records.read().await, n)
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Remove every record and persist the empty log. Irreversible.
    pub async fn clear(&self) {
        let removed = {
            let mut records = self.records.write().await;
            let removed = records.len();
            records.clear();
            self.persist(&records).await;
            removed
        };

        info!("Cleared enhancement log ({} records removed)", removed);
        self.events.publish(LogEvent::Cleared);
    }

    /// Replace the in-memory log with the persisted copy
    ///
    /// A missing key gives an empty log. Unreadable or malformed data also
    /// gives an empty log, with a warning; the stored value is left alone
    /// until the next write replaces it.
    pub async fn load(&self) -> usize {
        let loaded = match self.storage.get(LOG_KEY).await {
            Ok(Some(json)) => match serde_json::from_str::<Vec<EnhancementRecord>>(&json) {
                Ok(records) => records,
                Err(e) => {
                    warn!("Discarding malformed enhancement log from {} storage: {}", self.storage.name(), e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Failed to read enhancement log: {}", e);
                Vec::new()
            }
        };

        let count = loaded.len();
        *self.records.write().await = loaded;

        info!("Loaded {} enhancement records from {} storage", count, self.storage.name());
        self.events.publish(LogEvent::Loaded { count });
        count
    }

    /// Pretty-printed JSON array of all records
    pub async fn export_json(&self) -> Result<String> {
        let records = self.records.read().await;
        serde_json::to_string_pretty(&*records).context("Failed to serialize enhancement log")
    }

    /// Per-category performance over the whole log
    pub async fn prompt_performance(&self) -> Vec<PromptPerformance> {
        let records = self.records.read().await;
        analytics::prompt_performance(&records, &self.analytics)
    }

    /// Trend snapshot over the most recent records
    pub async fn enhancement_trends(&self) -> EnhancementTrends {
        let records = self.records.read().await;
        analytics::enhancement_trends(&records, &self.analytics)
    }

    /// Insights comparing recent behaviour to the whole history
    pub async fn generate_insights(&self) -> Vec<Insight> {
        let records = self.records.read().await;
        analytics::generate_insights(&records, &self.analytics)
    }

    async fn persist(&self, records: &[EnhancementRecord]) {
        if let Err(e) = self.write_all(records).await {
            warn!("Failed to persist enhancement log ({} records): {}", records.len(), e);
        }
    }

    async fn write_all(&self, records: &[EnhancementRecord]) -> StorageResult<()> {
        let json = serde_json::to_string(records)?;
        self.storage.set(LOG_KEY, &json).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enhancement::record::{PromptType, Scorecard};
    use crate::storage::{MemoryStore, StorageError};

    /// Store whose writes always fail
    struct FullStore;

    #[async_trait::async_trait]
    impl KeyValueStore for FullStore {
        async fn get(&self, _key: &str) -> StorageResult<Option<String>> {
            Ok(None)
        }

        async fn set(&self, key: &str, _value: &str) -> StorageResult<()> {
            Err(StorageError::io(
                key,
                std::io::Error::new(std::io::ErrorKind::Other, "quota exceeded"),
            ))
        }

        async fn remove(&self, _key: &str) -> StorageResult<()> {
            Ok(())
        }

        async fn keys(&self) -> StorageResult<Vec<String>> {
            Ok(vec![])
        }

        fn name(&self) -> &'static str {
            "full"
        }
    }

    fn entry(prompt: &str, score: f64) -> NewEnhancement {
        NewEnhancement::new("vid", prompt, Scorecard::uniform(score))
    }

    #[tokio::test]
    async fn test_append_assigns_identity() {
        let log = EnhancementLog::new(Arc::new(MemoryStore::new()));
        let record = log.append(entry("make this cinematic", 90.0)).await.unwrap();

        assert_eq!(record.session_id, log.session_id());
        assert_eq!(record.prompt_type, PromptType::Cinematic);
        assert_eq!(record.success_rate, 1.0);
        assert_eq!(log.len().await, 1);
    }

    #[tokio::test]
    async fn test_recent_is_newest_first() {
        let log = EnhancementLog::new(Arc::new(MemoryStore::new()));
        for i in 0..5 {
            log.append(entry(&format!("prompt {}", i), 70.0)).await.unwrap();
        }

        let recent = log.recent(3).await;
        let prompts: Vec<_> = recent.iter().map(|r| r.prompt.as_str()).collect();
        assert_eq!(prompts, vec!["prompt 4", "prompt 3", "prompt 2"]);
        assert_eq!(log.recent(10).await.len(), 5);
        assert!(log.recent(0).await.is_empty());
    }

    #[tokio::test]
    async fn test_append_persists_full_array() {
        let storage = Arc::new(MemoryStore::new());
        let log = EnhancementLog::new(storage.clone());
        log.append(entry("a", 50.0)).await.unwrap();
        log.append(entry("b", 60.0)).await.unwrap();

        let json = storage.get(LOG_KEY).await.unwrap().unwrap();
        let stored: Vec<EnhancementRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(stored, log.all().await);
    }

    #[tokio::test]
    async fn test_write_failure_is_not_surfaced() {
        let log = EnhancementLog::new(Arc::new(FullStore));
        log.append(entry("a", 80.0)).await.unwrap();
        log.append(entry("b", 80.0)).await.unwrap();
        assert_eq!(log.len().await, 2);

        log.clear().await;
        assert!(log.is_empty().await);
    }

    #[tokio::test]
    async fn test_malformed_storage_loads_empty() {
        let storage = Arc::new(MemoryStore::new());
        storage.set(LOG_KEY, r#"[{"id": "truncated"#).await.unwrap();

        let log = EnhancementLog::open(storage).await;
        assert!(log.is_empty().await);
    }

    #[tokio::test]
    async fn test_load_replaces_in_memory_state() {
        let storage = Arc::new(MemoryStore::new());
        let writer = EnhancementLog::new(storage.clone());
        writer.append(entry("a", 80.0)).await.unwrap();

        let reader = EnhancementLog::new(storage.clone());
        reader.append(entry("local only", 10.0)).await.unwrap();
        writer.append(entry("b", 80.0)).await.unwrap();

        assert_eq!(reader.load().await, 2);
        let prompts: Vec<_> = reader.all().await.into_iter().map(|r| r.prompt).collect();
        assert_eq!(prompts, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_import_keeps_stored_fields() {
        let source = EnhancementLog::new(Arc::new(MemoryStore::new()));
        let mut record = source.append(entry("cinematic", 40.0)).await.unwrap();
        record.prompt_type = PromptType::Custom;
        record.success_rate = 0.5;

        let target = EnhancementLog::new(Arc::new(MemoryStore::new()));
        assert_eq!(target.import(vec![record.clone()]).await, 1);
        assert_eq!(target.all().await, vec![record]);
        assert_eq!(target.import(vec![]).await, 0);
    }

    #[tokio::test]
    async fn test_non_finite_append_keeps_history() {
        let storage = Arc::new(MemoryStore::new());
        let log = EnhancementLog::new(storage.clone());
        for i in 0..5 {
            log.append(entry(&format!("clip {}", i), 80.0)).await.unwrap();
        }

        let nan = NewEnhancement::new("vid", "broken", Scorecard::new(f64::NAN, 80.0, 80.0, 80.0));
        assert!(log.append(nan).await.is_err());
        let slow = entry("slow", 80.0).with_processing_time(f64::INFINITY);
        assert!(log.append(slow).await.is_err());
        assert_eq!(log.len().await, 5);

        let reloaded = EnhancementLog::open(storage.clone()).await;
        assert_eq!(reloaded.len().await, 5);
        reloaded.append(entry("after", 80.0)).await.unwrap();
        assert_eq!(EnhancementLog::open(storage).await.len().await, 6);
    }

    #[tokio::test]
    async fn test_import_skips_known_ids_and_non_finite() {
        let storage = Arc::new(MemoryStore::new());
        let log = EnhancementLog::new(storage.clone());
        log.append(entry("a", 80.0)).await.unwrap();
        log.append(entry("b", 70.0)).await.unwrap();
        let exported: Vec<EnhancementRecord> = serde_json::from_str(&log.export_json().await.unwrap()).unwrap();

        assert_eq!(log.import(exported.clone()).await, 0);
        assert_eq!(log.len().await, 2);

        let other = EnhancementLog::new(Arc::new(MemoryStore::new()));
        let fresh = other.append(entry("c", 90.0)).await.unwrap();
        let mut broken = other.append(entry("d", 90.0)).await.unwrap();
        broken.scorecard.coherence = f64::INFINITY;

        let batch = vec![exported[0].clone(), fresh.clone(), fresh.clone(), broken];
        assert_eq!(log.import(batch).await, 1);

        let ids: Vec<_> = log.all().await.into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![exported[0].id.clone(), exported[1].id.clone(), fresh.id]);
        assert_eq!(EnhancementLog::open(storage).await.len().await, 3);
    }

    #[tokio::test]
    async fn test_events_for_mutations() {
        let log = EnhancementLog::new(Arc::new(MemoryStore::new()));
        let mut rx = log.subscribe();

        let record = log.append(entry("a", 80.0)).await.unwrap();
        log.clear().await;
        log.load().await;

        assert_eq!(rx.recv().await.unwrap(), LogEvent::Appended { id: record.id });
        assert_eq!(rx.recv().await.unwrap(), LogEvent::Cleared);
        assert_eq!(rx.recv().await.unwrap(), LogEvent::Loaded { count: 0 });
    }

    #[tokio::test]
    async fn test_export_json() {
        let log = EnhancementLog::new(Arc::new(MemoryStore::new()));
        assert_eq!(log.export_json().await.unwrap(), "[]");

        log.append(entry("a", 80.0)).await.unwrap();
        let exported: Vec<EnhancementRecord> = serde_json::from_str(&log.export_json().await.unwrap()).unwrap();
        assert_eq!(exported.len(), 1);
    }
}
