//! End-to-end behaviour of the enhancement log over real storage backends

use comet_insights::enhancement::{EnhancementLog, LogEvent, NewEnhancement, PromptType, Scorecard, LOG_KEY};
use comet_insights::storage::{JsonFileStore, KeyValueStore, MemoryStore, SqliteStore};
use std::sync::Arc;

fn entry(prompt: &str, score: f64) -> NewEnhancement {
    NewEnhancement::new("clip-1", prompt, Scorecard::uniform(score))
}

#[tokio::test]
async fn test_length_tracks_appends_and_clear() {
    let log = EnhancementLog::new(Arc::new(MemoryStore::new()));
    for i in 0..7 {
        log.append(entry(&format!("prompt {}", i), 65.0)).await.unwrap();
        assert_eq!(log.all().await.len(), i + 1);
    }

    log.clear().await;
    assert_eq!(log.all().await.len(), 0);
}

#[tokio::test]
async fn test_recent_reverses_insertion_order() {
    let log = EnhancementLog::new(Arc::new(MemoryStore::new()));
    let mut ids = Vec::new();
    for i in 0..6 {
        ids.push(log.append(entry(&format!("p{}", i), 70.0)).await.unwrap().id);
    }

    for n in [0, 1, 4, 6, 25] {
        let recent = log.recent(n).await;
        assert_eq!(recent.len(), n.min(6));
        let expected: Vec<_> = ids.iter().rev().take(n).cloned().collect();
        let actual: Vec<_> = recent.into_iter().map(|r| r.id).collect();
        assert_eq!(actual, expected);
    }
}

#[tokio::test]
async fn test_performance_scenario() {
    let log = EnhancementLog::new(Arc::new(MemoryStore::new()));
    log.append(entry("make this cinematic", 90.0)).await.unwrap();
    log.append(NewEnhancement::new("clip-2", "fast paced montage", Scorecard::new(60.0, 70.0, 80.0, 90.0)))
        .await
        .unwrap();

    let performance = log.prompt_performance().await;
    assert_eq!(performance.len(), 5);

    let by_type = |t: PromptType| performance.iter().find(|p| p.prompt_type == t).unwrap();
    assert_eq!(by_type(PromptType::Cinematic).usage_count, 1);
    assert_eq!(by_type(PromptType::Cinematic).average_score, 90);
    assert_eq!(by_type(PromptType::Action).usage_count, 1);
    assert_eq!(by_type(PromptType::Action).average_score, 75);
    for t in [PromptType::Artistic, PromptType::Professional, PromptType::Custom] {
        assert_eq!(by_type(t).usage_count, 0);
    }
}

#[tokio::test]
async fn test_trends_scenario() {
    let log = EnhancementLog::new(Arc::new(MemoryStore::new()));
    for i in 0..25 {
        log.append(NewEnhancement::new(&format!("clip-{}", i), "upscale", Scorecard::new(80.0, 80.0, 80.0, 80.0)))
            .await
            .unwrap();
    }

    let trends = log.enhancement_trends().await;
    assert_eq!(trends.total_enhancements, 25);
    assert_eq!(trends.average_score, 80);
    assert_eq!(trends.success_rate, 1.0);
}

#[tokio::test]
async fn test_trends_window_caps_at_fifty() {
    let log = EnhancementLog::new(Arc::new(MemoryStore::new()));
    for _ in 0..120 {
        log.append(entry("plain", 70.0)).await.unwrap();
    }
    assert_eq!(log.enhancement_trends().await.total_enhancements, 50);
}

#[tokio::test]
async fn test_insights_need_three_records() {
    let log = EnhancementLog::new(Arc::new(MemoryStore::new()));
    log.append(entry("cinematic", 95.0)).await.unwrap();
    log.append(entry("plain", 20.0)).await.unwrap();
    assert!(log.generate_insights().await.is_empty());
}

#[tokio::test]
async fn test_clear_survives_reload_json_files() {
    let dir = tempfile::tempdir().unwrap();
    let storage: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::new(dir.path()).await.unwrap());

    let log = EnhancementLog::open(storage.clone()).await;
    log.append(entry("movie look", 88.0)).await.unwrap();
    log.append(entry("color grading", 66.0)).await.unwrap();

    let reloaded = EnhancementLog::open(storage.clone()).await;
    assert_eq!(reloaded.all().await, log.all().await);

    log.clear().await;
    assert!(log.all().await.is_empty());
    assert_eq!(log.load().await, 0);
    assert!(log.all().await.is_empty());
    assert_eq!(storage.get(LOG_KEY).await.unwrap().as_deref(), Some("[]"));
}

#[tokio::test]
async fn test_stored_fields_stable_across_reads_and_reload() {
    let storage: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::in_memory().unwrap());
    let log = EnhancementLog::open(storage.clone()).await;
    let record = log.append(entry("dramatic slow-motion", 62.0)).await.unwrap();
    assert_eq!(record.success_rate, 0.5);
    assert_eq!(record.prompt_type, PromptType::Cinematic);

    let first = log.all().await;
    let second = log.all().await;
    assert_eq!(first, second);

    let reloaded = EnhancementLog::open(storage).await;
    let stored = &reloaded.all().await[0];
    assert_eq!(stored.success_rate, 0.5);
    assert_eq!(stored.prompt_type, PromptType::Cinematic);
    assert_eq!(stored.timestamp, record.timestamp);
}

#[tokio::test]
async fn test_unrelated_keys_are_untouched() {
    let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    storage.set("minted_nfts", r#"[{"tokenId": 1}]"#).await.unwrap();

    let log = EnhancementLog::open(storage.clone()).await;
    log.append(entry("a", 70.0)).await.unwrap();
    log.clear().await;

    assert_eq!(storage.get("minted_nfts").await.unwrap().as_deref(), Some(r#"[{"tokenId": 1}]"#));
}

#[tokio::test]
async fn test_subscriber_recomputes_view() {
    let log = Arc::new(EnhancementLog::new(Arc::new(MemoryStore::new())));
    let mut rx = log.subscribe();

    let view = {
        let log = log.clone();
        tokio::spawn(async move {
            let mut seen = Vec::new();
            while let Ok(event) = rx.recv().await {
                let total = log.enhancement_trends().await.total_enhancements;
                let done = event == LogEvent::Cleared;
                seen.push((event, total));
                if done {
                    break;
                }
            }
            seen
        })
    };

    let record = log.append(entry("fast", 80.0)).await.unwrap();
    log.clear().await;

    let seen = view.await.unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].0, LogEvent::Appended { id: record.id });
    assert_eq!(seen[1], (LogEvent::Cleared, 0));
}
