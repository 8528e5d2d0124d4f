//! Configuration management
//!
//! Manages storage backend selection, analytics windows and thresholds, and
//! the mock enhancement settings.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Where the enhancement log is persisted
    #[serde(default)]
    pub storage: StorageConfig,
    /// Aggregation windows and thresholds
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    /// Mock enhancement settings
    #[serde(default)]
    pub simulator: SimulatorConfig,
}

/// Storage backend kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Json,
    Sqlite,
    Memory,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::Json => write!(f, "json"),
            StorageBackend::Sqlite => write!(f, "sqlite"),
            StorageBackend::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend: json, sqlite or memory
    #[serde(default)]
    pub backend: StorageBackend,
    /// Storage directory (defaults to the data directory)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    /// Configured directory, or the platform data directory
    pub fn resolved_path(&self) -> Result<PathBuf> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => data_dir(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Records considered by the trend snapshot
    #[serde(default = "default_trend_window")]
    pub trend_window: usize,
    /// Records in the "recent" window used by insights
    #[serde(default = "default_insight_window")]
    pub insight_window: usize,
    /// Minimum recent records before any insight is generated
    #[serde(default = "default_min_insight_records")]
    pub min_insight_records: usize,
    /// Per-record score counted as a success
    #[serde(default = "default_success_threshold")]
    pub success_threshold: f64,
    /// Per-record score for a prompt to be listed as an example
    #[serde(default = "default_example_threshold")]
    pub example_threshold: f64,
    /// Example prompts listed per category
    #[serde(default = "default_max_examples")]
    pub max_examples: usize,
    /// Points between recent and all-time averages that count as a trend
    #[serde(default = "default_trend_delta")]
    pub trend_delta: f64,
    /// Average a category must exceed to be suggested
    #[serde(default = "default_opportunity_threshold")]
    pub opportunity_threshold: f64,
}

fn default_trend_window() -> usize {
    50
}

fn default_insight_window() -> usize {
    20
}

fn default_min_insight_records() -> usize {
    3
}

fn default_success_threshold() -> f64 {
    75.0
}

fn default_example_threshold() -> f64 {
    80.0
}

fn default_max_examples() -> usize {
    3
}

fn default_trend_delta() -> f64 {
    5.0
}

fn default_opportunity_threshold() -> f64 {
    80.0
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            trend_window: default_trend_window(),
            insight_window: default_insight_window(),
            min_insight_records: default_min_insight_records(),
            success_threshold: default_success_threshold(),
            example_threshold: default_example_threshold(),
            max_examples: default_max_examples(),
            trend_delta: default_trend_delta(),
            opportunity_threshold: default_opportunity_threshold(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Lowest score drawn per dimension
    #[serde(default = "default_min_score")]
    pub min_score: u32,
    /// Highest score drawn per dimension
    #[serde(default = "default_max_score")]
    pub max_score: u32,
    /// Artificial processing delay
    #[serde(default)]
    pub delay_ms: u64,
    /// Model version stamped on simulated enhancements
    #[serde(default = "default_model_version")]
    pub model_version: String,
}

fn default_min_score() -> u32 {
    60
}

fn default_max_score() -> u32 {
    100
}

fn default_model_version() -> String {
    "comet-v1".to_string()
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            min_score: default_min_score(),
            max_score: default_max_score(),
            delay_ms: 0,
            model_version: default_model_version(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, writing defaults there first if it is missing
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from(path)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let parent = path.parent().context("Config path has no parent")?;
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }
}

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "comet", "comet").context("Failed to get project directories")
}

/// Get the configuration file path
pub fn config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join("config.toml"))
}

/// Get the data directory path
pub fn data_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().to_path_buf())
}

/// Show a configuration
pub fn show_config(config: &Config) -> Result<()> {
    let storage_path = config
        .storage
        .resolved_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "unavailable".to_string());

    println!("Storage:");
    println!("  backend:               {}", config.storage.backend);
    println!("  path:                  {}", storage_path);
    println!("Analytics:");
    println!("  trend_window:          {}", config.analytics.trend_window);
    println!("  insight_window:        {}", config.analytics.insight_window);
    println!("  min_insight_records:   {}", config.analytics.min_insight_records);
    println!("  success_threshold:     {}", config.analytics.success_threshold);
    println!("  example_threshold:     {}", config.analytics.example_threshold);
    println!("  max_examples:          {}", config.analytics.max_examples);
    println!("  trend_delta:           {}", config.analytics.trend_delta);
    println!("  opportunity_threshold: {}", config.analytics.opportunity_threshold);
    println!("Simulator:");
    println!("  score range:           {}-{}", config.simulator.min_score, config.simulator.max_score);
    println!("  delay_ms:              {}", config.simulator.delay_ms);
    println!("  model_version:         {}", config.simulator.model_version);
    Ok(())
}

/// Reset the configuration file at `path` to defaults
pub fn reset_config(path: &Path) -> Result<()> {
    Config::default().save_to(path)?;
    println!("Configuration at {} reset to defaults.", path.display());
    Ok(())
}

/// Get default configuration as TOML string
pub fn default_config_toml() -> String {
    toml::to_string_pretty(&Config::default()).unwrap_or_else(|_| "# Default configuration\n".to_string())
}
