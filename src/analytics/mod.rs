//! Enhancement analytics
//!
//! Pure functions over a slice of records (oldest first):
//! - per-category prompt performance
//! - trend snapshot of the most recent enhancements
//! - insights comparing recent to all-time behaviour

pub mod aggregator;
pub mod insights;

pub use aggregator::{enhancement_trends, prompt_performance, EnhancementTrends, PromptPerformance};
pub use insights::{generate_insights, Insight, InsightKind};
