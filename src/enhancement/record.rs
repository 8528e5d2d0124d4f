//! Enhancement records
//!
//! One record per completed enhancement attempt. The prompt category and the
//! success flag are computed once when the record is built and stored as
//! data, so later changes to the categorization rules never rewrite history.

use anyhow::Result;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::categorizer::categorize;

/// Per-record score at or above which an enhancement counts as a success
pub const SUCCESS_THRESHOLD: f64 = 75.0;

/// Per-record score at or above which an enhancement counts as a partial success
pub const PARTIAL_SUCCESS_THRESHOLD: f64 = 60.0;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Round to the nearest integer, halves rounding towards positive infinity
///
/// Values beyond the `i64` range saturate.
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// NaN and infinities serialize to JSON `null` and would make the stored log
/// unreadable, so they never enter a record
fn ensure_finite(field: &str, value: f64) -> Result<()> {
    anyhow::ensure!(value.is_finite(), "{} must be a finite number, got {}", field, value);
    Ok(())
}

/// Fixed prompt categories used to bucket prompts for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptType {
    Cinematic,
    Action,
    Artistic,
    Professional,
    Custom,
}

impl PromptType {
    /// All categories in reporting order
    pub const ALL: [PromptType; 5] = [
        PromptType::Cinematic,
        PromptType::Action,
        PromptType::Artistic,
        PromptType::Professional,
        PromptType::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PromptType::Cinematic => "cinematic",
            PromptType::Action => "action",
            PromptType::Artistic => "artistic",
            PromptType::Professional => "professional",
            PromptType::Custom => "custom",
        }
    }
}

impl std::fmt::Display for PromptType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the enhancement was triggered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnhancementType {
    Smart,
    Manual,
    Auto,
}

impl std::fmt::Display for EnhancementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnhancementType::Smart => write!(f, "smart"),
            EnhancementType::Manual => write!(f, "manual"),
            EnhancementType::Auto => write!(f, "auto"),
        }
    }
}

impl std::str::FromStr for EnhancementType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "smart" => Ok(EnhancementType::Smart),
            "manual" => Ok(EnhancementType::Manual),
            "auto" => Ok(EnhancementType::Auto),
            other => anyhow::bail!("Unknown enhancement type '{}' (expected smart, manual or auto)", other),
        }
    }
}

/// Four-dimension quality rating of one enhancement attempt
///
/// Values are conventionally in [0, 100] but are not validated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scorecard {
    pub coherence: f64,
    pub prompt_coverage: f64,
    pub hallucination: f64,
    pub visual_quality: f64,
}

impl Scorecard {
    pub fn new(coherence: f64, prompt_coverage: f64, hallucination: f64, visual_quality: f64) -> Self {
        Self {
            coherence,
            prompt_coverage,
            hallucination,
            visual_quality,
        }
    }

    /// Same value on all four dimensions
    pub fn uniform(score: f64) -> Self {
        Self::new(score, score, score, score)
    }

    /// Arithmetic mean of the four sub-scores
    pub fn average(&self) -> f64 {
        (self.coherence + self.prompt_coverage + self.hallucination + self.visual_quality) / 4.0
    }

    /// Mean rounded half-up; every aggregate is built from this value
    pub fn rounded_average(&self) -> i64 {
        round_half_up(self.average())
    }

    /// 1.0 for a success, 0.5 for a partial success, otherwise 0.0
    pub fn success_rate(&self) -> f64 {
        let avg = self.average();
        if avg >= SUCCESS_THRESHOLD {
            1.0
        } else if avg >= PARTIAL_SUCCESS_THRESHOLD {
            0.5
        } else {
            0.0
        }
    }

    /// Fail on the first sub-score that is NaN or infinite
    pub fn validate(&self) -> Result<()> {
        ensure_finite("coherence", self.coherence)?;
        ensure_finite("promptCoverage", self.prompt_coverage)?;
        ensure_finite("hallucination", self.hallucination)?;
        ensure_finite("visualQuality", self.visual_quality)
    }
}

/// Input for a new log entry; the log fills in identity and derived fields
#[derive(Debug, Clone)]
pub struct NewEnhancement {
    pub video_id: String,
    pub prompt: String,
    pub scorecard: Scorecard,
    pub enhancement_type: Option<EnhancementType>,
    pub processing_time: Option<f64>,
    pub user_satisfaction: Option<f64>,
    pub model_version: Option<String>,
}

impl NewEnhancement {
    pub fn new(video_id: &str, prompt: &str, scorecard: Scorecard) -> Self {
        Self {
            video_id: video_id.to_string(),
            prompt: prompt.to_string(),
            scorecard,
            enhancement_type: None,
            processing_time: None,
            user_satisfaction: None,
            model_version: None,
        }
    }

    pub fn with_type(mut self, enhancement_type: EnhancementType) -> Self {
        self.enhancement_type = Some(enhancement_type);
        self
    }

    pub fn with_processing_time(mut self, millis: f64) -> Self {
        self.processing_time = Some(millis);
        self
    }

    pub fn with_user_satisfaction(mut self, satisfaction: f64) -> Self {
        self.user_satisfaction = Some(satisfaction);
        self
    }

    pub fn with_model_version(mut self, version: &str) -> Self {
        self.model_version = Some(version.to_string());
        self
    }

    /// Reject scores and measurements that cannot be persisted
    pub fn validate(&self) -> Result<()> {
        self.scorecard.validate()?;
        if let Some(millis) = self.processing_time {
            ensure_finite("processingTime", millis)?;
        }
        if let Some(satisfaction) = self.user_satisfaction {
            ensure_finite("userSatisfaction", satisfaction)?;
        }
        Ok(())
    }
}

/// A logged enhancement attempt. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancementRecord {
    pub id: String,
    pub video_id: String,
    pub prompt: String,
    pub scorecard: Scorecard,
    /// Category assigned at write time
    pub prompt_type: PromptType,
    /// Success flag assigned at write time
    pub success_rate: f64,
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_satisfaction: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enhancement_type: Option<EnhancementType>,
}

impl EnhancementRecord {
    /// Build a record, deriving the category and success flag from the input
    pub fn create(input: NewEnhancement, session_id: &str) -> Self {
        let timestamp = Utc::now();
        Self {
            id: generate_id(timestamp),
            prompt_type: categorize(&input.prompt),
            success_rate: input.scorecard.success_rate(),
            video_id: input.video_id,
            prompt: input.prompt,
            scorecard: input.scorecard,
            timestamp,
            session_id: session_id.to_string(),
            processing_time: input.processing_time,
            user_satisfaction: input.user_satisfaction,
            model_version: input.model_version,
            enhancement_type: input.enhancement_type,
        }
    }

    /// Rounded four-score mean of this record
    pub fn score(&self) -> i64 {
        self.scorecard.rounded_average()
    }

    /// Same checks as `NewEnhancement::validate`, plus the stored success flag
    pub fn validate(&self) -> Result<()> {
        self.scorecard.validate()?;
        ensure_finite("successRate", self.success_rate)?;
        if let Some(millis) = self.processing_time {
            ensure_finite("processingTime", millis)?;
        }
        if let Some(satisfaction) = self.user_satisfaction {
            ensure_finite("userSatisfaction", satisfaction)?;
        }
        Ok(())
    }
}

/// `enh_<unix millis>_<9 base36 chars>`
fn generate_id(timestamp: DateTime<Utc>) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..9)
        .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!("enh_{}_{}", timestamp.timestamp_millis(), suffix)
}
