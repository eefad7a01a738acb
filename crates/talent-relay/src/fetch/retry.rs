use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

/// Backoff schedule applied to rate-limited (HTTP 429) responses.
///
/// The wait before retry `n` (1-based) is `base_delay * 2^(n-1)`. No wait
/// follows the final attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    pub fn delay_before_retry(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(31);
        self.base_delay.saturating_mul(1u32 << exponent)
    }

    /// Every wait the policy would apply if all attempts were rate limited.
    pub fn schedule(&self) -> Vec<Duration> {
        (1..self.max_attempts)
            .map(|retry| self.delay_before_retry(retry))
            .collect()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(2))
    }
}

/// Terminal state of one upstream call.
#[derive(Debug, Clone, PartialEq)]
pub enum Attempt {
    Success(Value),
    /// Still rate limited after the last permitted attempt.
    Exhausted,
    Rejected {
        status: StatusCode,
        body: String,
    },
    Transport(String),
    Malformed(String),
}

/// An upstream call together with how much effort it took.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempted {
    pub outcome: Attempt,
    pub attempts: u32,
    pub backoff: Vec<Duration>,
}

impl Attempted {
    pub fn into_value(self) -> Option<Value> {
        match self.outcome {
            Attempt::Success(value) => Some(value),
            _ => None,
        }
    }
}
