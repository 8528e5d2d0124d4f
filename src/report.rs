//! Plain-text rendering of the log and its derived views

use std::fmt::Write;

use crate::analytics::{EnhancementTrends, Insight, PromptPerformance};
use crate::enhancement::EnhancementRecord;

const PROMPT_WIDTH: usize = 40;

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let cut: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

/// One line per record
pub fn render_records(records: &[EnhancementRecord]) -> String {
    if records.is_empty() {
        return "No enhancements logged.\n".to_string();
    }

    let mut out = String::new();
    for r in records {
        let _ = writeln!(
            out,
            "{}  {}  {:<12} score {:>3}  success {:.1}  {:<10} \"{}\"",
            r.timestamp.format("%Y-%m-%d %H:%M:%S"),
            r.id,
            r.prompt_type.to_string(),
            r.score(),
            r.success_rate,
            r.video_id,
            truncate(&r.prompt, PROMPT_WIDTH)
        );
    }
    out
}

pub fn render_performance(performance: &[PromptPerformance]) -> String {
    let mut out = String::from("Prompt performance\n");
    let _ = writeln!(out, "  {:<13} {:>5} {:>7} {:>8}  examples", "type", "uses", "avg", "success");
    for p in performance {
        let examples = if p.top_examples.is_empty() {
            "-".to_string()
        } else {
            p.top_examples
                .iter()
                .map(|e| format!("\"{}\"", truncate(e, PROMPT_WIDTH)))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let _ = writeln!(
            out,
            "  {:<13} {:>5} {:>7} {:>7.0}%  {}",
            p.prompt_type.to_string(),
            p.usage_count,
            p.average_score,
            p.success_rate * 100.0,
            examples
        );
    }
    out
}

pub fn render_trends(trends: &EnhancementTrends) -> String {
    let mut out = String::from("Recent trends\n");
    let _ = writeln!(out, "  enhancements:     {}", trends.total_enhancements);
    let _ = writeln!(out, "  average score:    {}", trends.average_score);
    let _ = writeln!(out, "  success rate:     {:.0}%", trends.success_rate * 100.0);
    match trends.average_processing_time {
        Some(ms) => {
            let _ = writeln!(out, "  avg processing:   {:.0}ms", ms);
        }
        None => {
            let _ = writeln!(out, "  avg processing:   n/a");
        }
    }
    if !trends.prompt_type_distribution.is_empty() {
        let _ = writeln!(out, "  distribution:");
        for (prompt_type, count) in &trends.prompt_type_distribution {
            let _ = writeln!(out, "    {:<13} {}", prompt_type.to_string(), count);
        }
    }
    out
}

pub fn render_insights(insights: &[Insight]) -> String {
    if insights.is_empty() {
        return "No insights yet. Log a few more enhancements.\n".to_string();
    }

    let mut out = String::from("Insights\n");
    for insight in insights {
        let marker = if insight.actionable { "*" } else { "-" };
        let _ = writeln!(
            out,
            "  {} {} ({:.0}% confidence)\n    {}",
            marker,
            insight.title,
            insight.confidence * 100.0,
            insight.description
        );
    }
    out
}
