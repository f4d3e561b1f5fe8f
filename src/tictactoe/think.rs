use std::time::Duration;

use rand::RngCore;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use super::{
    Mark,
    ai::Strategies,
    session::{AiDecision, AiTicket},
};

/// Pause before the computer answers, normally distributed around `mean_ms`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThinkingDelay {
    pub mean_ms: f64,
    pub std_dev_ms: f64,
    /// Lower bound, samples are clamped to it
    #[serde(default)]
    pub min_ms: f64,
}

impl Default for ThinkingDelay {
    fn default() -> Self {
        Self {
            mean_ms: 600.0,
            std_dev_ms: 200.0,
            min_ms: 150.0,
        }
    }
}

impl ThinkingDelay {
    /// Constant delay
    pub fn fixed(ms: f64) -> Self {
        Self {
            mean_ms: ms,
            std_dev_ms: 0.0,
            min_ms: 0.0,
        }
    }

    /// No delay at all
    pub fn none() -> Self {
        Self::fixed(0.0)
    }

    pub fn sample(&self, rng: &mut dyn RngCore) -> Duration {
        let ms = match Normal::new(self.mean_ms, self.std_dev_ms) {
            Ok(dist) => dist.sample(rng),
            Err(e) => {
                log::warn!("Invalid thinking delay {self:?}: {e}");
                self.mean_ms
            }
        };
        // Saturating cast, NaN maps to zero
        Duration::from_micros((ms.max(self.min_ms) * 1000.0).round() as u64)
    }

    /// Sleep for a sampled delay, then decide the computer move for `ticket`.
    ///
    /// The session may be reset meanwhile. Resolving the returned decision then fails as stale.
    pub async fn decide<M: Mark, R: RngCore>(
        &self,
        ticket: &AiTicket<M>,
        strategies: &Strategies,
        rng: &mut R,
    ) -> AiDecision {
        let delay = self.sample(rng);
        log::trace!("Thinking for {delay:?}");
        tokio::time::sleep(delay).await;
        ticket.decide(strategies, rng)
    }
}
