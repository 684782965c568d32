//! Bounded retry with a caller-supplied backoff.

use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Every attempt failed. Carries the error from the final attempt.
#[derive(Debug)]
pub struct Exhausted<E> {
    pub attempts: u32,
    pub last_error: E,
}

impl<E: fmt::Display> fmt::Display for Exhausted<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "gave up after {} attempts: {}",
            self.attempts, self.last_error
        )
    }
}

/// Linear backoff: attempt `n` (1-based) waits `(n - 1) * unit`.
pub fn linear_backoff(unit: Duration) -> impl Fn(u32) -> Duration {
    move |attempt| unit * attempt.saturating_sub(1)
}

/// Runs `op` up to `max_attempts` times (at least once), sleeping
/// `backoff(n)` before attempt `n`. The attempt number is passed to `op`.
pub async fn attempt<T, E, F, Fut, B>(
    mut op: F,
    max_attempts: u32,
    backoff: B,
) -> Result<T, Exhausted<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    B: Fn(u32) -> Duration,
{
    let max_attempts = max_attempts.max(1);
    let mut n = 1;
    loop {
        let delay = backoff(n);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match op(n).await {
            Ok(value) => return Ok(value),
            Err(error) if n >= max_attempts => {
                return Err(Exhausted {
                    attempts: n,
                    last_error: error,
                })
            }
            Err(_) => n += 1,
        }
    }
}
