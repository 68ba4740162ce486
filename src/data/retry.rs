use chrono::NaiveDate;
use std::time::Duration;

use crate::core::error::{HedgingError, HedgingResult};
use crate::core::series::PriceSeries;
use crate::data::source::PriceHistorySource;

/// Bounded exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: usize,
    pub initial_backoff: Duration,
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based).
    pub fn backoff(&self, attempt: usize) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16) as u32;
        self.initial_backoff
            .saturating_mul(self.multiplier.max(1).saturating_pow(exponent))
    }
}

/// Retries `DataSource` failures of the wrapped source; every other error
/// is returned immediately.
pub struct RetryingPriceSource<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: PriceHistorySource> RetryingPriceSource<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

impl<S: PriceHistorySource> PriceHistorySource for RetryingPriceSource<S> {
    fn price_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> HedgingResult<PriceSeries> {
        let attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.inner.price_history(ticker, start, end) {
                Ok(series) => return Ok(series),
                Err(e @ HedgingError::DataSource(_)) if attempt < attempts => {
                    let delay = self.policy.backoff(attempt);
                    log::warn!(
                        "fetching {} failed (attempt {}/{}): {}; retrying in {:?}",
                        ticker,
                        attempt,
                        attempts,
                        e,
                        delay
                    );
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
