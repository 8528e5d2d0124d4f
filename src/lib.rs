//! Comet Insights - enhancement logging and analytics
//!
//! Logs every enhancement applied to a video clip, mirrors the log to
//! key-value storage, and derives reports from it:
//! - Per-category prompt performance
//! - Trend snapshot of recent enhancements
//! - Insights comparing recent and all-time results
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use comet_insights::enhancement::{EnhancementLog, NewEnhancement, Scorecard};
//! use comet_insights::storage::MemoryStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let log = EnhancementLog::open(Arc::new(MemoryStore::new())).await;
//!     log.append(NewEnhancement::new("clip-1", "make this cinematic", Scorecard::uniform(90.0))).await?;
//!     println!("{:?}", log.prompt_performance().await);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod storage;
pub mod enhancement;
pub mod analytics;
pub mod report;
pub mod cli;

pub use config::Config;

pub use enhancement::{
    EnhancementLog,
    EnhancementRecord,
    EnhancementType,
    LogEvent,
    NewEnhancement,
    PromptType,
    Scorecard,
};

pub use analytics::{
    EnhancementTrends,
    Insight,
    InsightKind,
    PromptPerformance,
};

pub use storage::{KeyValueStore, StorageError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get the library info
pub fn info() -> String {
    format!("{} v{} - Enhancement analytics", NAME, VERSION)
}
