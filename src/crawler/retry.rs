//! Retry policy shared by the fetcher and the translator
//!
//! A policy is a retry budget plus a backoff schedule. The retryable-condition predicate is
//! supplied per call, so the same policy type drives HTTP status retries and translation
//! retries.

use std::future::Future;
use std::time::Duration;

/// Delay schedule between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// `factor * 2^(retry - 1)`: factor, 2x factor, 4x factor, ...
    Exponential { factor: Duration },
    /// The same delay before every retry
    Fixed(Duration),
}

/// Retry budget and backoff schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn exponential(max_retries: u32, factor: Duration) -> Self {
        Self {
            max_retries,
            backoff: Backoff::Exponential { factor },
        }
    }

    pub fn fixed(max_retries: u32, delay: Duration) -> Self {
        Self {
            max_retries,
            backoff: Backoff::Fixed(delay),
        }
    }

    /// A policy that never retries
    pub fn none() -> Self {
        Self::fixed(0, Duration::ZERO)
    }

    /// Total number of attempts, first one included
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Delay before the given retry (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential { factor } => {
                let exponent = retry.saturating_sub(1).min(16);
                factor.saturating_mul(1u32 << exponent)
            }
        }
    }

    /// Runs `op` until it succeeds, fails with a non-retryable error, or the budget is spent
    ///
    /// `op` receives the 1-based attempt number. The last error is returned on exhaustion.
    pub async fn run<T, E, F, Fut, P>(&self, mut op: F, is_retryable: P) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
    {
        let mut attempt = 1;

        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if attempt > self.max_retries || !is_retryable(&e) {
                        return Err(e);
                    }

                    let delay = self.delay_for(attempt);
                    tracing::trace!(
                        "Attempt {}/{} failed, retrying in {:?}",
                        attempt,
                        self.max_attempts(),
                        delay
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::exponential(3, Duration::from_millis(100))
    }
}
