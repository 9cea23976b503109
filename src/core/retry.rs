use crate::utils::error::{Result, ScraperError};
use std::future::Future;
use std::time::Duration;

/// 固定間隔重試，`max_attempts` 包含第一次嘗試
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            backoff: Duration::from_millis(2000),
        }
    }
}

#[derive(Debug)]
pub enum Attempted<T> {
    Succeeded { value: T, attempts: u32 },
    Failed { error: ScraperError, attempts: u32 },
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }

    /// 執行 `operation`；不可重試的錯誤立即結束，可重試的錯誤在預算內等待後再試
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Attempted<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation(attempt).await {
                Ok(value) => {
                    return Attempted::Succeeded {
                        value,
                        attempts: attempt,
                    }
                }
                Err(error) if error.is_retryable() && attempt < max_attempts => {
                    tracing::warn!(
                        "⚠️ Attempt {}/{} failed: {}; retrying in {:?}",
                        attempt,
                        max_attempts,
                        error,
                        self.backoff
                    );
                    tokio::time::sleep(self.backoff).await;
                    attempt += 1;
                }
                Err(error) => {
                    return Attempted::Failed {
                        error,
                        attempts: attempt,
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

    fn quick(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::ZERO)
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);

        let result = quick(3)
            .run(|attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 3 {
                        Err(ScraperError::TransportMessage {
                            message: "connection reset".to_string(),
                        })
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;

        match result {
            Attempted::Succeeded { value, attempts } => {
                assert_eq!(value, "done");
                assert_eq!(attempts, 3);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_stops_when_budget_exhausted() {
        let calls = AtomicU32::new(0);

        let result: Attempted<()> = quick(2)
            .run(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ScraperError::parse("no brackets")) }
            })
            .await;

        assert!(matches!(result, Attempted::Failed { attempts: 2, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_terminal_error_is_not_retried() {
        let calls = AtomicU32::new(0);

        let result: Attempted<()> = quick(5)
            .run(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ScraperError::BogusProfile) }
            })
            .await;

        match result {
            Attempted::Failed { error, attempts } => {
                assert!(matches!(error, ScraperError::BogusProfile));
                assert_eq!(attempts, 1);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_runs_once() {
        let result = quick(0).run(|_| async { Ok(1) }).await;
        assert!(matches!(result, Attempted::Succeeded { value: 1, attempts: 1 }));
    }
}
