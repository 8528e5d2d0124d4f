//! Prompt categorization
//!
//! Maps a free-text prompt to exactly one category by case-insensitive
//! keyword search. Rules are checked in order and the first match wins.

use super::record::PromptType;

const RULES: &[(PromptType, &[&str])] = &[
    (PromptType::Cinematic, &["cinematic", "dramatic", "movie"]),
    (PromptType::Action, &["action", "fast", "dynamic"]),
    (PromptType::Artistic, &["artistic", "creative", "slow-motion"]),
    (PromptType::Professional, &["professional", "color", "grading"]),
];

/// Categorize a prompt; anything without a keyword hit is `Custom`
pub fn categorize(prompt: &str) -> PromptType {
    let lower = prompt.to_lowercase();

    RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(prompt_type, _)| *prompt_type)
        .unwrap_or(PromptType::Custom)
}
