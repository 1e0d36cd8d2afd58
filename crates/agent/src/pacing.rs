use std::time::Duration;

use folio_core::config::PacingConfig;
use rand::Rng;

/// Which artificial "typing" delay precedes a reply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pace {
    /// Uniform random delay between the configured bounds.
    Random,
    Guard,
    Offer,
    Capture,
    /// The reply already waited on a remote call.
    None,
}

#[derive(Clone, Debug)]
pub struct Pacer {
    config: PacingConfig,
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new(PacingConfig::default())
    }
}

impl Pacer {
    pub fn new(config: PacingConfig) -> Self {
        Self { config }
    }

    pub fn instant() -> Self {
        Self::new(PacingConfig::instant())
    }

    pub fn delay_for(&self, pace: Pace) -> Duration {
        let millis = match pace {
            Pace::Random => {
                let (min, max) = (self.config.min_delay_ms, self.config.max_delay_ms);
                if min >= max {
                    min
                } else {
                    rand::thread_rng().gen_range(min..=max)
                }
            }
            Pace::Guard => self.config.guard_delay_ms,
            Pace::Offer => self.config.offer_delay_ms,
            Pace::Capture => self.config.capture_delay_ms,
            Pace::None => 0,
        };
        Duration::from_millis(millis)
    }

    pub async fn wait(&self, pace: Pace) {
        let delay = self.delay_for(pace);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
