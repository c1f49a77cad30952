// SPDX-FileCopyrightText: 2026 Telexport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The wait controller: every provider call goes through here.
//!
//! Provider-demanded waits (flood waits) within the configured budget are
//! slept through and retried; waits beyond the budget surface immediately
//! as a rate-limit failure so the caller can resume later from a cursor.
//! Transient failures retry with jittered exponential backoff. Everything
//! else propagates untouched.

use std::future::Future;
use std::time::Duration;

use telexport_core::ProviderError;
use tracing::{debug, warn};

/// Tunables for the wait controller. All values come from `[retry]` config.
#[derive(Debug, Clone)]
pub struct WaitPolicy {
    /// Sleep through provider waits up to this long; surface beyond it.
    pub wait_budget: Duration,
    /// Upper bound on attempts per call (first try included).
    pub max_attempts: u32,
    /// Base backoff for transient failures, doubled per attempt.
    pub base_backoff: Duration,
    /// Proportional jitter applied to every sleep, in `[0, 1]`.
    pub jitter_ratio: f64,
    /// Deadline for a single provider attempt.
    pub request_timeout: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            wait_budget: Duration::from_secs(60),
            max_attempts: 3,
            base_backoff: Duration::from_millis(250),
            jitter_ratio: 0.1,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Outcome of a controlled call that did not produce a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitError {
    /// The provider demanded a wait beyond the budget. Do not sleep;
    /// the caller attaches a resumable cursor and surfaces this.
    RateLimited { retry_after: u64 },
    /// Transient failures exhausted the attempt budget.
    Unavailable { message: String },
    /// A non-retryable provider error, passed through for classification.
    Fatal(ProviderError),
}

/// Gates access to the shared provider session.
///
/// Stateless apart from its policy; cheap to clone per subsystem.
#[derive(Debug, Clone, Default)]
pub struct WaitController {
    policy: WaitPolicy,
}

impl WaitController {
    pub fn new(policy: WaitPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &WaitPolicy {
        &self.policy
    }

    /// Run `op` under the retry policy.
    ///
    /// `op` is re-invoked for each attempt; it must be safe to repeat
    /// (all provider calls here are reads).
    pub async fn invoke<T, F, Fut>(&self, mut op: F) -> Result<T, WaitError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            let outcome = match tokio::time::timeout(self.policy.request_timeout, op()).await {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout),
            };

            let error = match outcome {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            match error {
                ProviderError::FloodWait { seconds } => {
                    if Duration::from_secs(seconds) > self.policy.wait_budget {
                        warn!(
                            retry_after = seconds,
                            budget = self.policy.wait_budget.as_secs(),
                            "provider wait exceeds budget, surfacing rate limit"
                        );
                        return Err(WaitError::RateLimited {
                            retry_after: seconds,
                        });
                    }
                    if attempt >= self.policy.max_attempts {
                        return Err(WaitError::RateLimited {
                            retry_after: seconds,
                        });
                    }
                    let wait = self.jittered(Duration::from_secs(seconds));
                    debug!(
                        seconds,
                        attempt, "provider demanded a wait within budget, sleeping"
                    );
                    tokio::time::sleep(wait).await;
                }
                e if e.is_transient() => {
                    if attempt >= self.policy.max_attempts {
                        return Err(WaitError::Unavailable {
                            message: e.to_string(),
                        });
                    }
                    let backoff = self
                        .policy
                        .base_backoff
                        .saturating_mul(1 << (attempt - 1).min(16));
                    let backoff = self.jittered(backoff);
                    debug!(error = %e, attempt, backoff_ms = backoff.as_millis() as u64, "transient provider failure, backing off");
                    tokio::time::sleep(backoff).await;
                }
                e => return Err(WaitError::Fatal(e)),
            }
        }
    }

    /// Apply proportional jitter to a sleep duration.
    fn jittered(&self, base: Duration) -> Duration {
        if self.policy.jitter_ratio <= 0.0 {
            return base;
        }
        // Uniform in [1 - ratio, 1 + ratio].
        let factor = 1.0 + self.policy.jitter_ratio * (rand::random::<f64>() * 2.0 - 1.0);
        base.mul_f64(factor.max(0.0))
    }
}
