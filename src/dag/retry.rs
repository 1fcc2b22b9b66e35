use std::{fmt::Display, future::Future, time::Duration};
use tracing::warn;

/// Bounded retries with a fixed delay between tries.
///
/// Every error is treated the same; there is no retryable/terminal split.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first try.
    pub retries: u32,
    pub retry_delay: Duration,
}

/// Outcome of [`RetryPolicy::execute`] together with how many tries it took.
#[derive(Debug)]
pub struct Attempts<T, E> {
    pub result: Result<T, E>,
    pub tries: u32,
}

impl RetryPolicy {
    pub fn new(retries: u32, retry_delay: Duration) -> Self {
        Self {
            retries,
            retry_delay,
        }
    }

    pub fn max_tries(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Run `op` until it succeeds or the budget is spent. `op` receives the
    /// 1-based try number.
    pub async fn execute<T, E, F, Fut>(&self, mut op: F) -> Attempts<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut try_number = 1;
        loop {
            match op(try_number).await {
                Ok(v) => {
                    return Attempts {
                        result: Ok(v),
                        tries: try_number,
                    }
                }
                Err(e) if try_number < self.max_tries() => {
                    warn!(
                        try_number,
                        max_tries = self.max_tries(),
                        delay = ?self.retry_delay,
                        error = %e,
                        "try failed; up for retry"
                    );
                    tokio::time::sleep(self.retry_delay).await;
                    try_number += 1;
                }
                Err(e) => {
                    return Attempts {
                        result: Err(e),
                        tries: try_number,
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn succeeds_on_the_retry() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(1, Duration::ZERO);
        let out = policy
            .execute(|n| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 1 {
                        Err("boom")
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;
        assert_eq!(out.result, Ok(2));
        assert_eq!(out.tries, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn gives_up_after_budget() {
        let policy = RetryPolicy::new(2, Duration::ZERO);
        let out: Attempts<(), String> = policy
            .execute(|n| async move { Err(format!("fail {}", n)) })
            .await;
        assert_eq!(out.tries, 3);
        assert_eq!(out.result.unwrap_err(), "fail 3");
    }

    #[tokio::test(start_paused = true)]
    async fn waits_the_fixed_delay_between_tries() {
        let policy = RetryPolicy::new(1, Duration::from_secs(300));
        let start = tokio::time::Instant::now();
        let out: Attempts<(), &str> = policy.execute(|_| async { Err("x") }).await;
        assert_eq!(out.tries, 2);
        assert!(start.elapsed() >= Duration::from_secs(300));
    }

    #[tokio::test]
    async fn zero_retries_means_one_try() {
        let policy = RetryPolicy::new(0, Duration::from_secs(300));
        assert_eq!(policy.max_tries(), 1);
        let out: Attempts<(), &str> = policy.execute(|_| async { Err("x") }).await;
        assert_eq!(out.tries, 1);
    }
}
