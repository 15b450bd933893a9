//! Bounded retry and polling helpers shared by every resource

use super::error::ApiError;
use std::future::Future;
use std::time::{Duration, Instant};

/// Time budgets for retried calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub read: Duration,
    pub write: Duration,
    pub interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            read: Duration::from_secs(3 * 60),
            write: Duration::from_secs(5 * 60),
            interval: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Budget for polling an asynchronous flow to completion
    pub fn flow(&self) -> Duration {
        self.write * 10
    }

    /// Budget for waiting on a state transition after a write
    pub fn state_wait(&self) -> Duration {
        self.read * 2
    }
}

/// Outcome of one failed attempt
#[derive(Debug)]
pub enum RetryError {
    Retryable(ApiError),
    NonRetryable(ApiError),
}

impl RetryError {
    pub fn into_inner(self) -> ApiError {
        match self {
            RetryError::Retryable(e) | RetryError::NonRetryable(e) => e,
        }
    }
}

/// Classifies an API error for the retry loop
pub fn retry_error(err: ApiError) -> RetryError {
    if err.is_retryable() {
        RetryError::Retryable(err)
    } else {
        RetryError::NonRetryable(err)
    }
}

/// Runs `op` until it succeeds, fails permanently or the budget runs out.
///
/// On exhaustion the last retryable error is returned.
pub async fn retry<T, F, Fut>(budget: Duration, interval: Duration, mut op: F) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RetryError>>,
{
    let started = Instant::now();
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(RetryError::NonRetryable(e)) => return Err(e),
            Err(RetryError::Retryable(e)) => {
                if started.elapsed() + interval > budget {
                    tracing::warn!(
                        "Giving up after {} attempts in {:?}: {}",
                        attempt,
                        started.elapsed(),
                        e
                    );
                    return Err(e);
                }
                tracing::debug!("Attempt {} failed, retrying in {:?}: {}", attempt, interval, e);
                tokio::time::sleep(interval).await;
            }
        }
    }
}

pub const FLOW_SUCCESS: i64 = 0;
pub const FLOW_FAILED: i64 = 1;
pub const FLOW_RUNNING: i64 = 2;

/// Polls an asynchronous flow until it reports success.
///
/// `status` fetches the current flow status code once per attempt.
pub async fn poll_flow<F, Fut>(
    budget: Duration,
    interval: Duration,
    flow_id: i64,
    status: F,
) -> Result<(), ApiError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<i64, ApiError>>,
{
    retry(budget, interval, || {
        let fut = status();
        async move {
            match fut.await.map_err(retry_error)? {
                FLOW_SUCCESS => Ok(()),
                FLOW_RUNNING => Err(RetryError::Retryable(ApiError::Operation(format!(
                    "flow {} is still running",
                    flow_id
                )))),
                FLOW_FAILED => Err(RetryError::NonRetryable(ApiError::Operation(format!(
                    "flow {} failed",
                    flow_id
                )))),
                other => Err(RetryError::NonRetryable(ApiError::Operation(format!(
                    "flow {} reported illegal status {}",
                    flow_id, other
                )))),
            }
        }
    })
    .await
}

/// Refreshes a remote object until it reports `target`.
///
/// Fails with `ApiError::WaitTimeout` carrying the last observed state when
/// the budget runs out. Errors from `refresh` are classified as usual.
pub async fn wait_for_state<F, Fut>(
    target: &str,
    budget: Duration,
    interval: Duration,
    refresh: F,
) -> Result<(), ApiError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<String, ApiError>>,
{
    let started = Instant::now();

    loop {
        let state = match refresh().await {
            Ok(state) => state,
            Err(e) if e.is_retryable() => {
                tracing::debug!("Refresh failed while waiting for '{}': {}", target, e);
                String::new()
            }
            Err(e) => return Err(e),
        };

        if state == target {
            return Ok(());
        }

        if started.elapsed() + interval > budget {
            return Err(ApiError::WaitTimeout {
                target: target.to_string(),
                last: state,
            });
        }

        tracing::debug!("Waiting for state '{}', currently '{}'", target, state);
        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const SHORT: Duration = Duration::from_millis(200);
    const TICK: Duration = Duration::from_millis(5);

    fn busy() -> ApiError {
        ApiError::Api {
            code: "FailedOperation.InstanceBusy".to_string(),
            message: "busy".to_string(),
            request_id: "r".to_string(),
        }
    }

    fn invalid() -> ApiError {
        ApiError::Api {
            code: "InvalidParameter".to_string(),
            message: "bad".to_string(),
            request_id: "r".to_string(),
        }
    }

    #[test]
    fn default_budgets() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.read, Duration::from_secs(180));
        assert_eq!(policy.write, Duration::from_secs(300));
        assert_eq!(policy.flow(), Duration::from_secs(3000));
        assert_eq!(policy.state_wait(), Duration::from_secs(360));
    }

    #[tokio::test]
    async fn retry_returns_first_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let result = retry(SHORT, TICK, || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(retry_error(busy()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retry_stops_on_permanent_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let result: Result<(), ApiError> = retry(SHORT, TICK, || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(retry_error(invalid())) }
        })
        .await;

        assert_eq!(result.unwrap_err().code(), Some("InvalidParameter"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retry_surfaces_last_error_when_budget_is_spent() {
        let result: Result<(), ApiError> =
            retry(Duration::from_millis(30), TICK, || async { Err(retry_error(busy())) }).await;

        assert_eq!(
            result.unwrap_err().code(),
            Some("FailedOperation.InstanceBusy")
        );
    }

    #[tokio::test]
    async fn poll_flow_waits_while_running() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let result = poll_flow(SHORT, TICK, 42, || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move { Ok(if n < 2 { FLOW_RUNNING } else { FLOW_SUCCESS }) }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn poll_flow_fails_on_failed_status() {
        let err = poll_flow(SHORT, TICK, 7, || async { Ok(FLOW_FAILED) })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "flow 7 failed");
    }

    #[tokio::test]
    async fn poll_flow_rejects_illegal_status() {
        let err = poll_flow(SHORT, TICK, 7, || async { Ok(9) })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("illegal status 9"));
    }

    #[tokio::test]
    async fn wait_for_state_reaches_target() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let result = wait_for_state("Paused", SHORT, TICK, || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                Ok(if n == 0 { "Running" } else { "Paused" }.to_string())
            }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn wait_for_state_times_out_with_last_state() {
        let err = wait_for_state("Paused", Duration::from_millis(20), TICK, || async {
            Ok("Running".to_string())
        })
        .await
        .unwrap_err();

        match err {
            ApiError::WaitTimeout { target, last } => {
                assert_eq!(target, "Paused");
                assert_eq!(last, "Running");
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
