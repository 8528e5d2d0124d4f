//! Insight generation
//!
//! Compares the recent window of enhancements to the whole history and
//! emits short advisory observations. Rules are evaluated independently;
//! any number of them may fire. Confidence values are fixed per rule and
//! do not depend on sample size.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::aggregator::{mean_score, prompt_performance, PromptPerformance};
use crate::config::AnalyticsConfig;
use crate::enhancement::log::take_recent;
use crate::enhancement::record::EnhancementRecord;

pub const IMPROVING_CONFIDENCE: f64 = 0.85;
pub const DECLINING_CONFIDENCE: f64 = 0.80;
pub const OPPORTUNITY_CONFIDENCE: f64 = 0.75;
pub const MODEL_COMPARISON_CONFIDENCE: f64 = 0.70;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    PerformanceImproving,
    PerformanceDeclining,
    PromptTypeOpportunity,
    ModelComparison,
}

/// A generated observation about enhancement behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub kind: InsightKind,
    pub title: String,
    pub description: String,
    pub confidence: f64,
    /// Whether the insight suggests something the user can do
    pub actionable: bool,
    pub generated_at: DateTime<Utc>,
}

impl Insight {
    fn new(kind: InsightKind, title: &str, description: String, confidence: f64, actionable: bool) -> Self {
        Self {
            kind,
            title: title.to_string(),
            description,
            confidence,
            actionable,
            generated_at: Utc::now(),
        }
    }
}

/// Generate insights from the full log, oldest record first
///
/// Returns an empty list when the recent window holds fewer than
/// `min_insight_records` records.
pub fn generate_insights(records: &[EnhancementRecord], config: &AnalyticsConfig) -> Vec<Insight> {
    let recent = take_recent(records, config.insight_window);
    if recent.len() < config.min_insight_records {
        debug!("Skipping insights: {} recent records", recent.len());
        return Vec::new();
    }

    let mut insights = Vec::new();

    if let Some(insight) = performance_trend(records, &recent, config) {
        insights.push(insight);
    }

    let performance = prompt_performance(records, config);
    if let Some(insight) = prompt_type_opportunity(&performance, config) {
        insights.push(insight);
    }

    if let Some(insight) = model_comparison(&recent) {
        insights.push(insight);
    }

    debug!("Generated {} insights from {} records", insights.len(), records.len());
    insights
}

fn performance_trend(
    all: &[EnhancementRecord],
    recent: &[EnhancementRecord],
    config: &AnalyticsConfig,
) -> Option<Insight> {
    let recent_avg = mean_score(recent)?;
    let overall_avg = mean_score(all)?;
    let delta = recent_avg - overall_avg;

    if delta > config.trend_delta {
        Some(Insight::new(
            InsightKind::PerformanceImproving,
            "Performance Improving",
            format!(
                "Your recent enhancements average {:.1}, {:.1} points above your all-time average of {:.1}.",
                recent_avg, delta, overall_avg
            ),
            IMPROVING_CONFIDENCE,
            false,
        ))
    } else if delta < -config.trend_delta {
        Some(Insight::new(
            InsightKind::PerformanceDeclining,
            "Performance Declining",
            format!(
                "Your recent enhancements average {:.1}, {:.1} points below your all-time average of {:.1}. Revisit the prompts that worked before.",
                recent_avg, -delta, overall_avg
            ),
            DECLINING_CONFIDENCE,
            true,
        ))
    } else {
        None
    }
}

fn prompt_type_opportunity(performance: &[PromptPerformance], config: &AnalyticsConfig) -> Option<Insight> {
    // strict comparisons keep the earliest category on ties
    let mut best = performance.first()?;
    let mut most_used = best;
    for entry in performance {
        if entry.average_score > best.average_score {
            best = entry;
        }
        if entry.usage_count > most_used.usage_count {
            most_used = entry;
        }
    }

    if best.prompt_type == most_used.prompt_type || best.average_score as f64 <= config.opportunity_threshold {
        return None;
    }

    Some(Insight::new(
        InsightKind::PromptTypeOpportunity,
        "Prompt Type Opportunity",
        format!(
            "{} prompts score {} on average, but you mostly use {} prompts ({} uses, average {}). Try more {} prompts.",
            best.prompt_type,
            best.average_score,
            most_used.prompt_type,
            most_used.usage_count,
            most_used.average_score,
            best.prompt_type
        ),
        OPPORTUNITY_CONFIDENCE,
        true,
    ))
}

fn model_comparison(recent: &[EnhancementRecord]) -> Option<Insight> {
    // (version, score sum, count) in first-seen order
    let mut versions: Vec<(&str, f64, usize)> = Vec::new();
    for record in recent {
        let Some(version) = record.model_version.as_deref() else {
            continue;
        };
        match versions.iter_mut().find(|(v, _, _)| *v == version) {
            Some(entry) => {
                entry.1 += record.score() as f64;
                entry.2 += 1;
            }
            None => versions.push((version, record.score() as f64, 1)),
        }
    }

    if versions.len() < 2 {
        return None;
    }

    let means: Vec<(&str, f64)> = versions
        .iter()
        .map(|(v, sum, count)| (*v, *sum / *count as f64))
        .collect();

    let mut best = means[0];
    for &candidate in &means[1..] {
        if candidate.1 > best.1 {
            best = candidate;
        }
    }

    let breakdown = means
        .iter()
        .map(|(v, mean)| format!("{} {:.1}", v, mean))
        .collect::<Vec<_>>()
        .join(", ");

    Some(Insight::new(
        InsightKind::ModelComparison,
        "Model Version Comparison",
        format!(
            "Model {} performs best in your recent enhancements (average {:.1}; {}).",
            best.0, best.1, breakdown
        ),
        MODEL_COMPARISON_CONFIDENCE,
        false,
    ))
}
