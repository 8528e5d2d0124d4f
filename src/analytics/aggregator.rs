//! Aggregate statistics over enhancement records
//!
//! Every average is built from per-record scores that are already rounded
//! (see `Scorecard::rounded_average`), then rounded again at the end.
//! Rounding the aggregate alone gives different numbers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::AnalyticsConfig;
use crate::enhancement::record::{round_half_up, EnhancementRecord, PromptType};

/// Performance of one prompt category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptPerformance {
    pub prompt_type: PromptType,
    /// Rounded mean of per-record scores, 0 when unused
    pub average_score: i64,
    /// Fraction of records at or above the success threshold
    pub success_rate: f64,
    pub usage_count: usize,
    /// High-scoring prompts in record order
    pub top_examples: Vec<String>,
}

/// Snapshot of the most recent enhancements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancementTrends {
    pub total_enhancements: usize,
    pub average_score: i64,
    pub success_rate: f64,
    /// Only categories that occur in the window
    pub prompt_type_distribution: BTreeMap<PromptType, usize>,
    /// Mean over the records that carry a processing time; `None` if none do
    pub average_processing_time: Option<f64>,
}

/// Mean of the rounded per-record scores, unrounded
///
/// Summed as `f64`: scores are not range-checked, so an integer sum could
/// overflow.
pub(crate) fn mean_score<'a, I>(records: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a EnhancementRecord>,
{
    let (sum, count) = records
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), r| (sum + r.score() as f64, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

fn success_fraction(records: &[&EnhancementRecord], threshold: f64) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    let successes = records.iter().filter(|r| r.score() as f64 >= threshold).count();
    successes as f64 / records.len() as f64
}

/// One entry per category, in fixed category order, including unused ones
pub fn prompt_performance(records: &[EnhancementRecord], config: &AnalyticsConfig) -> Vec<PromptPerformance> {
    PromptType::ALL
        .iter()
        .map(|&prompt_type| {
            let matching: Vec<&EnhancementRecord> =
                records.iter().filter(|r| r.prompt_type == prompt_type).collect();

            let average_score = mean_score(matching.iter().copied()).map(round_half_up).unwrap_or(0);
            let top_examples = matching
                .iter()
                .filter(|r| r.score() as f64 >= config.example_threshold)
                .take(config.max_examples)
                .map(|r| r.prompt.clone())
                .collect();

            PromptPerformance {
                prompt_type,
                average_score,
                success_rate: success_fraction(&matching, config.success_threshold),
                usage_count: matching.len(),
                top_examples,
            }
        })
        .collect()
}

/// Trend snapshot over at most the last `trend_window` records
pub fn enhancement_trends(records: &[EnhancementRecord], config: &AnalyticsConfig) -> EnhancementTrends {
    let start = records.len().saturating_sub(config.trend_window);
    let window: Vec<&EnhancementRecord> = records[start..].iter().collect();

    let mut distribution = BTreeMap::new();
    for record in &window {
        *distribution.entry(record.prompt_type).or_insert(0) += 1;
    }

    let timed: Vec<f64> = window.iter().filter_map(|r| r.processing_time).collect();
    let average_processing_time = if timed.is_empty() {
        None
    } else {
        Some(timed.iter().sum::<f64>() / timed.len() as f64)
    };

    EnhancementTrends {
        total_enhancements: window.len(),
        average_score: mean_score(window.iter().copied()).map(round_half_up).unwrap_or(0),
        success_rate: success_fraction(&window, config.success_threshold),
        prompt_type_distribution: distribution,
        average_processing_time,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enhancement::record::{NewEnhancement, Scorecard};

    fn record(prompt: &str, card: Scorecard) -> EnhancementRecord {
        EnhancementRecord::create(NewEnhancement::new("vid", prompt, card), "session_test")
    }

    fn uniform(prompt: &str, score: f64) -> EnhancementRecord {
        record(prompt, Scorecard::uniform(score))
    }

    #[test]
    fn test_performance_has_five_entries_when_empty() {
        let perf = prompt_performance(&[], &AnalyticsConfig::default());
        assert_eq!(perf.len(), 5);
        for (entry, expected) in perf.iter().zip(PromptType::ALL) {
            assert_eq!(entry.prompt_type, expected);
            assert_eq!(entry.usage_count, 0);
            assert_eq!(entry.average_score, 0);
            assert_eq!(entry.success_rate, 0.0);
            assert!(entry.top_examples.is_empty());
        }
    }

    #[test]
    fn test_performance_per_category() {
        let records = vec![
            uniform("make this cinematic", 90.0),
            record("fast paced montage", Scorecard::new(70.0, 80.0, 90.0, 100.0)),
        ];
        let perf = prompt_performance(&records, &AnalyticsConfig::default());

        assert_eq!(perf[0].prompt_type, PromptType::Cinematic);
        assert_eq!(perf[0].usage_count, 1);
        assert_eq!(perf[0].average_score, 90);
        assert_eq!(perf[0].top_examples, vec!["make this cinematic"]);

        assert_eq!(perf[1].prompt_type, PromptType::Action);
        assert_eq!(perf[1].usage_count, 1);
        assert_eq!(perf[1].average_score, 85);

        for entry in &perf[2..] {
            assert_eq!(entry.usage_count, 0);
        }
    }

    #[test]
    fn test_round_per_record_before_aggregating() {
        // per-record means 80.5 and 80.5 round to 81 each; mean 81
        let card = Scorecard::new(80.0, 81.0, 80.0, 81.0);
        let records = vec![record("movie", card), record("movie", card)];
        let perf = prompt_performance(&records, &AnalyticsConfig::default());
        assert_eq!(perf[0].average_score, 81);

    }

    #[test]
    fn test_borderline_mean_stored_partial_but_counted_success() {
        // mean 74.5: below 75 for the stored flag, rounds to 75 for aggregates
        let records = vec![record("custom", Scorecard::new(74.0, 75.0, 74.0, 75.0))];
        assert_eq!(records[0].success_rate, 0.5);
        assert_eq!(records[0].score(), 75);

        let perf = prompt_performance(&records, &AnalyticsConfig::default());
        assert_eq!(perf[4].success_rate, 1.0);
        assert_eq!(enhancement_trends(&records, &AnalyticsConfig::default()).success_rate, 1.0);
    }

    #[test]
    fn test_huge_scores_do_not_overflow() {
        let records = vec![uniform("cinematic", 1e300), uniform("cinematic", 1e300), uniform("fast", -1e300)];
        let perf = prompt_performance(&records, &AnalyticsConfig::default());
        assert_eq!(perf[0].usage_count, 2);
        assert_eq!(perf[0].average_score, i64::MAX);
        assert_eq!(perf[1].average_score, i64::MIN);

        let trends = enhancement_trends(&records, &AnalyticsConfig::default());
        assert_eq!(trends.total_enhancements, 3);
    }

    #[test]
    fn test_top_examples_in_record_order_and_capped() {
        let records = vec![
            uniform("cinematic one", 85.0),
            uniform("cinematic low", 50.0),
            uniform("cinematic two", 99.0),
            uniform("cinematic three", 80.0),
            uniform("cinematic four", 100.0),
        ];
        let perf = prompt_performance(&records, &AnalyticsConfig::default());
        assert_eq!(perf[0].top_examples, vec!["cinematic one", "cinematic two", "cinematic three"]);
        assert_eq!(perf[0].success_rate, 0.8);
    }

    #[test]
    fn test_trends_uniform_scores() {
        let records: Vec<_> = (0..25).map(|i| uniform(&format!("clip {}", i), 80.0)).collect();
        let trends = enhancement_trends(&records, &AnalyticsConfig::default());

        assert_eq!(trends.total_enhancements, 25);
        assert_eq!(trends.average_score, 80);
        assert_eq!(trends.success_rate, 1.0);
        assert_eq!(trends.prompt_type_distribution.get(&PromptType::Custom), Some(&25));
    }

    #[test]
    fn test_trends_window_ignores_older_records() {
        let mut records: Vec<_> = (0..30).map(|_| uniform("old movie", 10.0)).collect();
        records.extend((0..50).map(|_| uniform("fast", 90.0)));
        let trends = enhancement_trends(&records, &AnalyticsConfig::default());

        assert_eq!(trends.total_enhancements, 50);
        assert_eq!(trends.average_score, 90);
        assert_eq!(trends.prompt_type_distribution.len(), 1);
        assert_eq!(trends.prompt_type_distribution.get(&PromptType::Action), Some(&50));
    }

    #[test]
    fn test_trends_processing_time_skips_missing() {
        let mut with_time = uniform("a", 80.0);
        with_time.processing_time = Some(1200.0);
        let mut other = uniform("b", 80.0);
        other.processing_time = Some(800.0);
        let without = uniform("c", 80.0);

        let trends = enhancement_trends(&[with_time, without.clone(), other], &AnalyticsConfig::default());
        assert_eq!(trends.average_processing_time, Some(1000.0));

        let trends = enhancement_trends(&[without], &AnalyticsConfig::default());
        assert_eq!(trends.average_processing_time, None);
    }

    #[test]
    fn test_trends_empty() {
        let trends = enhancement_trends(&[], &AnalyticsConfig::default());
        assert_eq!(trends.total_enhancements, 0);
        assert_eq!(trends.average_score, 0);
        assert_eq!(trends.success_rate, 0.0);
        assert!(trends.prompt_type_distribution.is_empty());
    }
}
