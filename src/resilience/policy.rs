use anyhow::Error;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How often to retry a failed append to a channel output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RetryPolicy {
    /// Report the failure and move on to the next frame
    #[default]
    Never,

    /// Retry straight away, up to `max_attempts` times
    Immediate { max_attempts: usize },

    /// Doubling delay between retries, capped at `max_ms`
    Exponential {
        base_ms: u64,
        max_ms: u64,
        max_attempts: usize,
    },
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based), `None` once exhausted
    pub fn backoff(&self, retry: usize) -> Option<Duration> {
        match *self {
            RetryPolicy::Never => None,
            RetryPolicy::Immediate { max_attempts } => {
                (retry <= max_attempts).then_some(Duration::ZERO)
            }
            RetryPolicy::Exponential {
                base_ms,
                max_ms,
                max_attempts,
            } => {
                if retry > max_attempts {
                    return None;
                }
                let shift = (retry.saturating_sub(1)).min(32) as u32;
                let delay = base_ms.saturating_mul(1u64 << shift).min(max_ms);
                Some(Duration::from_millis(delay))
            }
        }
    }

    /// Start tracking retries of one operation
    pub fn start(&self) -> Backoff<'_> {
        Backoff {
            policy: self,
            retries: 0,
        }
    }

    pub fn max_attempts(&self) -> usize {
        match *self {
            RetryPolicy::Never => 0,
            RetryPolicy::Immediate { max_attempts } => max_attempts,
            RetryPolicy::Exponential { max_attempts, .. } => max_attempts,
        }
    }
}

/// Retry bookkeeping for a single operation.
///
/// The caller owns the loop and the sleep, so the same tracker drives both
/// blocking and async retries:
///
/// ```text
/// let mut backoff = policy.start();
/// loop {
///     match op() {
///         Ok(v) => return Ok(v),
///         Err(e) => sleep(backoff.next(e)?),
///     }
/// }
/// ```
#[derive(Debug)]
pub struct Backoff<'a> {
    policy: &'a RetryPolicy,
    retries: usize,
}

impl Backoff<'_> {
    /// Delay before retrying after `err`, or the final error once the
    /// policy is exhausted
    pub fn next(&mut self, err: Error) -> Result<Duration, Error> {
        match self.policy.backoff(self.retries + 1) {
            Some(delay) => {
                self.retries += 1;
                tracing::debug!(retry = self.retries, ?delay, "retrying: {:#}", err);
                Ok(delay)
            }
            None if self.retries == 0 => Err(err),
            None => Err(err.context(format!("gave up after {} retries", self.retries))),
        }
    }

    /// Retries granted so far
    pub fn retries(&self) -> usize {
        self.retries
    }
}
