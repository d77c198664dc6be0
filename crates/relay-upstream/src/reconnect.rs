//! Reconnect policy for the upstream connection

use rand::Rng;
use relay_common::{ReconnectMode, UpstreamConfig};
use std::time::Duration;

/// Delay applied before each reconnect attempt
///
/// Attempts are never capped; only the delay between them is bounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReconnectPolicy {
    /// The same delay before every attempt
    Fixed { delay: Duration },
    /// Doubling delay from `min` up to `max`, spread by `±jitter` (a fraction)
    Backoff {
        min: Duration,
        max: Duration,
        jitter: f64,
    },
}

impl ReconnectPolicy {
    /// Delay before reconnect attempt number `attempt` (1-based)
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Self::Fixed { delay } => delay,
            Self::Backoff { min, max, jitter } => {
                let base = Self::backoff_base(attempt, min, max);
                let jitter = jitter.min(1.0);
                if jitter <= 0.0 {
                    return base;
                }
                let factor = rand::thread_rng().gen_range((1.0 - jitter)..=(1.0 + jitter));
                base.mul_f64(factor).max(min).min(max)
            }
        }
    }

    fn backoff_base(attempt: u32, min: Duration, max: Duration) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        min.saturating_mul(1u32 << exponent).min(max)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::Fixed {
            delay: Duration::from_secs(5),
        }
    }
}

impl From<&UpstreamConfig> for ReconnectPolicy {
    fn from(config: &UpstreamConfig) -> Self {
        let delay = Duration::from_millis(config.reconnect_delay_ms);
        match config.reconnect {
            ReconnectMode::Fixed => Self::Fixed { delay },
            ReconnectMode::Backoff => Self::Backoff {
                min: delay,
                max: Duration::from_millis(config.backoff_max_ms),
                jitter: config.backoff_jitter,
            },
        }
    }
}
