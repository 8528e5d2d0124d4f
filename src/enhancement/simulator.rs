//! Mock enhancement pass
//!
//! There is no inference backend: an enhancement waits a fixed delay and
//! draws four random scores in the configured range.

use rand::Rng;
use std::time::{Duration, Instant};
use tracing::debug;

use super::record::{EnhancementType, NewEnhancement, Scorecard};
use crate::config::SimulatorConfig;

pub struct Simulator {
    config: SimulatorConfig,
}

impl Simulator {
    pub fn new(config: SimulatorConfig) -> Self {
        Self { config }
    }

    /// Run a mocked enhancement and return the entry to log
    pub async fn enhance(
        &self,
        video_id: &str,
        prompt: &str,
        enhancement_type: EnhancementType,
    ) -> NewEnhancement {
        let started = Instant::now();
        if self.config.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.delay_ms)).await;
        }

        let scorecard = self.draw_scorecard();
        let elapsed = started.elapsed().as_secs_f64() * 1000.0;
        debug!(
            "Simulated {} enhancement of {} in {:.0}ms (avg {:.1})",
            enhancement_type,
            video_id,
            elapsed,
            scorecard.average()
        );

        NewEnhancement::new(video_id, prompt, scorecard)
            .with_type(enhancement_type)
            .with_processing_time(elapsed)
            .with_model_version(&self.config.model_version)
    }

    fn draw_scorecard(&self) -> Scorecard {
        let mut rng = rand::rng();
        let (low, high) = self.bounds();
        let mut draw = || rng.random_range(low..=high) as f64;
        Scorecard::new(draw(), draw(), draw(), draw())
    }

    /// Inclusive integer bounds, tolerating a reversed range in the config
    fn bounds(&self) -> (u32, u32) {
        let (a, b) = (self.config.min_score, self.config.max_score);
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }
}
