//! CLI interface for comet

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::{self, Config};
use crate::enhancement::{EnhancementLog, EnhancementRecord, EnhancementType, NewEnhancement, Scorecard, Simulator};
use crate::report;
use crate::storage;

#[derive(Parser)]
#[command(name = "comet")]
#[command(about = "Log video enhancements and report on how prompts perform", long_about = None)]
#[command(version)]
struct Cli {
    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Use this config file instead of the default location
    #[arg(long, global = true, env = "COMET_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Records(RecordCommands),
    /// Show or reset configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
        /// Print the config file path
        #[arg(long)]
        path: bool,
        /// Reset configuration to defaults
        #[arg(long)]
        reset: bool,
    },
}

/// Commands that open the enhancement log
#[derive(Subcommand)]
enum RecordCommands {
    /// Log a completed enhancement with its scorecard
    Log {
        /// Video the enhancement was applied to
        #[arg(long)]
        video: String,
        /// Prompt used for the enhancement
        #[arg(long)]
        prompt: String,
        #[arg(long, value_parser = parse_finite)]
        coherence: f64,
        /// Prompt coverage score
        #[arg(long, value_parser = parse_finite)]
        coverage: f64,
        #[arg(long, value_parser = parse_finite)]
        hallucination: f64,
        /// Visual quality score
        #[arg(long, value_parser = parse_finite)]
        quality: f64,
        /// Enhancement type: smart, manual or auto
        #[arg(short = 't', long = "type", default_value = "smart")]
        enhancement_type: String,
        #[arg(long)]
        model_version: Option<String>,
        /// Processing time in milliseconds
        #[arg(long, value_parser = parse_finite)]
        processing_ms: Option<f64>,
        /// User satisfaction rating
        #[arg(long, value_parser = parse_finite)]
        satisfaction: Option<f64>,
    },
    /// Run a mock enhancement and log its result
    Enhance {
        #[arg(long)]
        video: String,
        #[arg(long)]
        prompt: String,
        /// Enhancement type: smart, manual or auto
        #[arg(short = 't', long = "type", default_value = "smart")]
        enhancement_type: String,
    },
    /// List logged enhancements, oldest first
    List {
        /// Show only the first N records
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Show the most recent enhancements, newest first
    Recent {
        #[arg(short, default_value = "10")]
        n: usize,
    },
    /// Per-category prompt performance
    Performance,
    /// Trend snapshot of recent enhancements
    Trends,
    /// Insights comparing recent and all-time results
    Insights,
    /// Performance, trends and insights together
    Report,
    /// Write all records to a JSON file
    Export {
        path: PathBuf,
    },
    /// Append records from a JSON file, skipping ids already logged
    Import {
        path: PathBuf,
    },
    /// Delete all logged enhancements
    Clear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let config_file = match &cli.config {
        Some(path) => path.clone(),
        None => config::config_path()?,
    };

    match cli.command {
        Commands::Config { show, path, reset } => run_config(&config_file, show, path, reset),
        Commands::Records(command) => {
            let config = Config::load_or_create(&config_file)?;
            let log = open_log(&config).await?;
            run_records(command, &config, &log, cli.json).await
        }
    }
}

async fn run_records(command: RecordCommands, config: &Config, log: &EnhancementLog, json: bool) -> Result<()> {
    match command {
        RecordCommands::Log {
            video,
            prompt,
            coherence,
            coverage,
            hallucination,
            quality,
            enhancement_type,
            model_version,
            processing_ms,
            satisfaction,
        } => {
            let mut entry = NewEnhancement::new(&video, &prompt, Scorecard::new(coherence, coverage, hallucination, quality))
                .with_type(enhancement_type.parse::<EnhancementType>()?);
            entry.model_version = model_version;
            entry.processing_time = processing_ms;
            entry.user_satisfaction = satisfaction;

            let record = log.append(entry).await?;
            print_record(&record, json)?;
        }
        RecordCommands::Enhance {
            video,
            prompt,
            enhancement_type,
        } => {
            let simulator = Simulator::new(config.simulator.clone());
            let entry = simulator
                .enhance(&video, &prompt, enhancement_type.parse::<EnhancementType>()?)
                .await;
            let record = log.append(entry).await?;
            print_record(&record, json)?;
        }
        RecordCommands::List { limit } => {
            let mut records = log.all().await;
            if let Some(limit) = limit {
                records.truncate(limit);
            }
            output(records.as_slice(), json, report::render_records)?;
        }
        RecordCommands::Recent { n } => {
            let records = log.recent(n).await;
            output(records.as_slice(), json, report::render_records)?;
        }
        RecordCommands::Performance => {
            let performance = log.prompt_performance().await;
            output(performance.as_slice(), json, report::render_performance)?;
        }
        RecordCommands::Trends => {
            let trends = log.enhancement_trends().await;
            output(&trends, json, report::render_trends)?;
        }
        RecordCommands::Insights => {
            let insights = log.generate_insights().await;
            output(insights.as_slice(), json, report::render_insights)?;
        }
        RecordCommands::Report => {
            let performance = log.prompt_performance().await;
            let trends = log.enhancement_trends().await;
            let insights = log.generate_insights().await;
            if json {
                let value = serde_json::json!({
                    "performance": performance,
                    "trends": trends,
                    "insights": insights,
                });
                print_json(&value)?;
            } else {
                println!("{}", report::render_performance(&performance));
                println!("{}", report::render_trends(&trends));
                print!("{}", report::render_insights(&insights));
            }
        }
        RecordCommands::Export { path } => {
            let contents = log.export_json().await?;
            std::fs::write(&path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Exported {} records to {}", log.len().await, path.display());
        }
        RecordCommands::Import { path } => {
            let records = read_records(&path)?;
            let count = log.import(records).await;
            println!("Imported {} records from {}", count, path.display());
        }
        RecordCommands::Clear { yes } => {
            let count = log.len().await;
            if !yes && !confirm(&format!("Delete all {} logged enhancements?", count))? {
                println!("Cancelled.");
                return Ok(());
            }
            log.clear().await;
            println!("Cleared {} records.", count);
        }
    }

    Ok(())
}

async fn open_log(config: &Config) -> Result<EnhancementLog> {
    let store = storage::open_store(&config.storage).await?;
    Ok(EnhancementLog::open(store).await.with_analytics_config(config.analytics.clone()))
}

fn run_config(config_file: &Path, show: bool, path: bool, reset: bool) -> Result<()> {
    if reset {
        config::reset_config(config_file)?;
    } else if path {
        println!("{}", config_file.display());
    } else if show {
        config::show_config(&Config::load_or_create(config_file)?)?;
    } else {
        println!("Configuration options:");
        println!("  --show    Display current configuration");
        println!("  --path    Print the config file path");
        println!("  --reset   Reset configuration to defaults");
        println!();
        println!("Default configuration:");
        print!("{}", config::default_config_toml());
    }
    Ok(())
}

/// Parse an `f64` that can be stored as a JSON number
fn parse_finite(value: &str) -> std::result::Result<f64, String> {
    let number: f64 = value.parse().map_err(|e| format!("{}", e))?;
    if number.is_finite() {
        Ok(number)
    } else {
        Err(format!("{} is not a finite number", value))
    }
}

fn read_records(path: &Path) -> Result<Vec<EnhancementRecord>> {
    let contents = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("{} is not a JSON array of enhancement records", path.display()))
}

fn print_record(record: &EnhancementRecord, json: bool) -> Result<()> {
    if json {
        print_json(record)
    } else {
        print!("{}", report::render_records(std::slice::from_ref(record)));
        Ok(())
    }
}

fn output<T, F>(value: &T, json: bool, render: F) -> Result<()>
where
    T: Serialize + ?Sized,
    F: Fn(&T) -> String,
{
    if json {
        print_json(value)
    } else {
        print!("{}", render(value));
        Ok(())
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", text);
    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
