//! Bounded exponential-backoff retry kernel.
//!
//! Runs an async operation repeatedly until it succeeds or the backoff
//! schedule is exhausted, classifying the operation's errors as
//! retry/ignore/terminal per [`classify`]. This is the shared substrate
//! every Alibaba Cloud client call runs through.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

use crate::aliyun::CloudError;
use crate::error::{Error, Result};

/// Backoff schedule. The default mirrors the upstream controller's policy:
/// initial 1s, factor 2, 32 steps, cap 20s, jitter 4 (added as up to ±jitter
/// seconds of uniform noise per step, not a multiplier).
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    pub initial: Duration,
    pub factor: f64,
    pub steps: u32,
    pub cap: Duration,
    pub jitter: f64,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            factor: 2.0,
            steps: 32,
            cap: Duration::from_secs(20),
            jitter: 4.0,
        }
    }
}

impl Backoff {
    /// The delay to sleep before the step-th retry (0-indexed), capped and jittered.
    fn delay_for_step(&self, step: u32) -> Duration {
        let scaled = self.initial.as_secs_f64() * self.factor.powi(step as i32);
        let capped = scaled.min(self.cap.as_secs_f64());
        let jitter = if self.jitter > 0.0 {
            rand::rng().random_range(0.0..self.jitter)
        } else {
            0.0
        };
        Duration::from_secs_f64((capped + jitter).max(0.0))
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Classification {
    Retry,
    Success,
    Terminal,
}

/// Classifies an operation's error per the taxonomy in the reconciliation
/// design: timeouts and 5xx retry, 404 is treated as success (resource
/// absence is fine for idempotent describe/delete calls), the internal
/// retry sentinel always retries, and everything else is terminal.
fn classify(err: &Error) -> Classification {
    match err {
        Error::Retry => Classification::Retry,
        Error::Cloud(cloud) => classify_cloud(cloud),
        _ => Classification::Terminal,
    }
}

fn classify_cloud(err: &CloudError) -> Classification {
    if err.code == "timeout" || err.http_status >= 500 {
        Classification::Retry
    } else if err.http_status == 404 {
        Classification::Success
    } else {
        Classification::Terminal
    }
}

/// Runs `op` under `backoff` until it returns `Ok`, the error classifies as
/// terminal, or the step budget elapses. A 404-classified error yields
/// `T::default()` rather than the value `op` would have produced on success,
/// since the operation never actually completed — callers whose `T` is
/// `Option<_>` or `()` get exactly the "absence is fine" semantics the
/// classifier intends.
pub async fn try_op<T, F, Fut>(backoff: Backoff, mut op: F) -> Result<T>
where
    T: Default,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_err: Option<Error> = None;
    for step in 0..backoff.steps {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) => match classify(&e) {
                Classification::Success => {
                    debug!(step, "operation error classified as success (absence)");
                    return Ok(T::default());
                }
                Classification::Retry => {
                    let delay = backoff.delay_for_step(step);
                    debug!(step, ?delay, "retrying after classified-retryable error");
                    last_err = Some(e);
                    tokio::time::sleep(delay).await;
                }
                Classification::Terminal => {
                    warn!(step, "operation failed with terminal error");
                    return Err(e);
                }
            },
        }
    }

    Err(Error::Timeout {
        cause: Box::new(last_err.unwrap_or(Error::Retry)),
    })
}

/// Loops `describe` under the default backoff until it returns a value
/// satisfying `is_ready`. A `None` result (resource not yet observable) and
/// a not-ready observed value both drive another step via the retry
/// sentinel, matching `waitReady`/`waitAbsent` semantics.
pub async fn wait_until<T, D, Fut>(backoff: Backoff, mut describe: D, is_ready: impl Fn(&T) -> bool) -> Result<T>
where
    T: Clone + Default,
    D: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    try_op(backoff, move || {
        let fut = describe();
        async {
            match fut.await? {
                Some(observed) if is_ready(&observed) => Ok(observed),
                _ => Err(Error::Retry),
            }
        }
    })
    .await
}

/// Loops `describe` under the default backoff until the resource is no
/// longer observable (`describe` returns `None`). Used by the deletion
/// path's `waitAbsent` steps.
pub async fn wait_absent<T, D, Fut>(backoff: Backoff, mut describe: D) -> Result<()>
where
    T: Clone,
    D: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    try_op(backoff, move || {
        let fut = describe();
        async {
            match fut.await? {
                None => Ok(()),
                Some(_) => Err(Error::Retry),
            }
        }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn cloud(code: &str, status: u16) -> Error {
        Error::Cloud(CloudError {
            code: code.to_string(),
            message: "boom".to_string(),
            http_status: status,
            request_id: "req-1".to_string(),
        })
    }

    fn fast_backoff() -> Backoff {
        Backoff {
            initial: Duration::from_millis(1),
            factor: 1.0,
            steps: 4,
            cap: Duration::from_millis(1),
            jitter: 0.0,
        }
    }

    #[tokio::test]
    async fn classifies_timeout_as_retry_then_succeeds() {
        let calls = Cell::new(0);
        let result: Result<i32> = try_op(fast_backoff(), || {
            calls.set(calls.get() + 1);
            async {
                if calls.get() < 2 {
                    Err(cloud("timeout", 0))
                } else {
                    Ok(7)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.get(), 2);
    }

    #[tokio::test]
    async fn classifies_500_as_retry() {
        let calls = Cell::new(0);
        let result: Result<i32> = try_op(fast_backoff(), || {
            calls.set(calls.get() + 1);
            async {
                if calls.get() < 3 {
                    Err(cloud("ServiceUnavailable", 503))
                } else {
                    Ok(1)
                }
            }
        })
        .await;
        assert!(result.is_ok());
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn classifies_404_as_success_default() {
        let result: Result<Option<i32>> = try_op(fast_backoff(), || async { Err(cloud("NotFound", 404)) }).await;
        assert_eq!(result.unwrap(), None);
    }

    #[tokio::test]
    async fn classifies_dependency_as_retry_via_sentinel() {
        let calls = Cell::new(0);
        let result: Result<()> = try_op(fast_backoff(), || {
            calls.set(calls.get() + 1);
            async {
                if calls.get() < 2 {
                    Err(Error::Retry)
                } else {
                    Ok(())
                }
            }
        })
        .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn classifies_other_4xx_as_terminal() {
        let result: Result<i32> = try_op(fast_backoff(), || async { Err(cloud("InvalidParameter", 400)) }).await;
        assert!(matches!(result, Err(Error::Cloud(_))));
    }

    #[tokio::test]
    async fn exhausting_steps_reports_timeout() {
        let result: Result<i32> = try_op(fast_backoff(), || async { Err(Error::Retry) }).await;
        assert!(matches!(result, Err(Error::Timeout { .. })));
    }

    #[tokio::test]
    async fn wait_until_retries_while_not_ready() {
        let calls = Cell::new(0);
        #[derive(Clone, Default, Debug, PartialEq)]
        struct Observed {
            status: String,
        }
        let result = wait_until(
            fast_backoff(),
            || {
                calls.set(calls.get() + 1);
                async move {
                    if calls.get() < 3 {
                        Ok(Some(Observed { status: "Pending".into() }))
                    } else {
                        Ok(Some(Observed { status: "Available".into() }))
                    }
                }
            },
            |o: &Observed| o.status == "Available",
        )
        .await;
        assert_eq!(result.unwrap().status, "Available");
        assert_eq!(calls.get(), 3);
    }
}
