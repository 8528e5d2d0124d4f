//! Enhancement logging
//!
//! Records every enhancement attempt with its scorecard, assigns a prompt
//! category at write time, and mirrors the log to key-value storage.

pub mod categorizer;
pub mod events;
pub mod log;
pub mod record;
pub mod simulator;

pub use categorizer::categorize;
pub use events::{EventBus, LogEvent};
pub use log::{EnhancementLog, LOG_KEY};
pub use record::{EnhancementRecord, EnhancementType, NewEnhancement, PromptType, Scorecard};
pub use simulator::Simulator;
