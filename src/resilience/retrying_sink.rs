use super::RetryPolicy;
use crate::core::ChannelId;
use crate::io::ChannelSink;
use anyhow::{Context, Result};
use std::thread;

/// Wraps a sink and retries failed appends according to a [`RetryPolicy`]
pub struct RetryingSink<S> {
    inner: S,
    policy: RetryPolicy,
    retries: u64,
}

impl<S: ChannelSink> RetryingSink<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self {
            inner,
            policy,
            retries: 0,
        }
    }

    /// Total retries issued so far, across all channels
    pub fn retries(&self) -> u64 {
        self.retries
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: ChannelSink> ChannelSink for RetryingSink<S> {
    fn append(&mut self, channel: ChannelId, values: &[f32]) -> Result<()> {
        let mut backoff = self.policy.start();
        loop {
            let err = match self.inner.append(channel, values) {
                Ok(()) => return Ok(()),
                Err(e) => e,
            };

            let delay = backoff
                .next(err)
                .with_context(|| format!("append to {} failed", channel))?;
            self.retries += 1;
            if !delay.is_zero() {
                thread::sleep(delay);
            }
        }
    }
}
