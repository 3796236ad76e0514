//! Bounded retry combinator.
//!
//! Used at both retry sites of the engine: per-item fetches (flat delay
//! between attempts) and whole-round extraction (immediate re-attempts).
//! Exhaustion is reported as a value; the caller decides whether that
//! abandons one item or fails the run.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// Attempt budget and flat back-off between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Zero is treated as one.
    pub max_attempts: u32,
    /// Pause between a failed attempt and the next one. Not exponential.
    pub delay: Duration,
}

/// Why a retried operation gave up.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RetryError<E> {
    /// Every attempt failed with a retryable error.
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        /// Attempts made.
        attempts: u32,
        /// Error from the final attempt.
        last: E,
    },
    /// An attempt failed with an error the classifier refused to retry.
    #[error("attempt {attempt} failed permanently: {error}")]
    Permanent {
        /// The attempt that failed.
        attempt: u32,
        /// The non-retryable error.
        error: E,
    },
}

impl<E> RetryError<E> {
    /// Number of attempts made before giving up.
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Exhausted { attempts, .. } => *attempts,
            Self::Permanent { attempt, .. } => *attempt,
        }
    }

    /// The underlying error of the final attempt.
    pub fn into_inner(self) -> E {
        match self {
            Self::Exhausted { last, .. } => last,
            Self::Permanent { error, .. } => error,
        }
    }
}

impl RetryPolicy {
    /// Create a policy.
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Re-attempt without pausing.
    pub const fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO)
    }

    const fn budget(&self) -> u32 {
        if self.max_attempts == 0 {
            1
        } else {
            self.max_attempts
        }
    }

    /// Run `op` until it succeeds, fails permanently or the budget runs out.
    ///
    /// `op` receives the 1-based attempt number. `retryable` classifies each
    /// failure; a `false` stops immediately.
    pub async fn run<T, E, F, Fut, C>(&self, mut op: F, retryable: C) -> Result<T, RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: Fn(&E) -> bool,
    {
        let budget = self.budget();
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(error) if !retryable(&error) => {
                    return Err(RetryError::Permanent { attempt, error });
                }
                Err(last) if attempt >= budget => {
                    return Err(RetryError::Exhausted {
                        attempts: attempt,
                        last,
                    });
                }
                Err(_) => {
                    if !self.delay.is_zero() {
                        tokio::time::sleep(self.delay).await;
                    }
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[tokio::test]
    async fn test_succeeds_after_failures() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::immediate(3);

        let result: Result<u32, RetryError<&str>> = policy
            .run(
                |attempt| {
                    calls.set(calls.get() + 1);
                    async move { if attempt < 3 { Err("flaky") } else { Ok(attempt) } }
                },
                |_| true,
            )
            .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_exhausts_budget() {
        let calls = Cell::new(0);
        let result: Result<(), _> = RetryPolicy::immediate(3)
            .run(
                |_| {
                    calls.set(calls.get() + 1);
                    async { Err::<(), _>("down") }
                },
                |_| true,
            )
            .await;

        assert_eq!(
            result,
            Err(RetryError::Exhausted {
                attempts: 3,
                last: "down"
            })
        );
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_stops_early() {
        let calls = Cell::new(0);
        let result: Result<(), _> = RetryPolicy::immediate(5)
            .run(
                |_| {
                    calls.set(calls.get() + 1);
                    async { Err::<(), _>("corrupt") }
                },
                |_| false,
            )
            .await;

        assert_eq!(result.unwrap_err().attempts(), 1);
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn test_zero_budget_still_attempts_once() {
        let calls = Cell::new(0);
        let _ = RetryPolicy::immediate(0)
            .run(
                |_| {
                    calls.set(calls.get() + 1);
                    async { Err::<(), _>("x") }
                },
                |_| true,
            )
            .await;
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flat_delay_between_attempts() {
        let start = tokio::time::Instant::now();
        let _ = RetryPolicy::new(3, Duration::from_secs(2))
            .run(|_| async { Err::<(), _>("x") }, |_| true)
            .await;

        // Two pauses between three attempts, none after the last
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(4));
        assert!(elapsed < Duration::from_secs(6));
    }
}
