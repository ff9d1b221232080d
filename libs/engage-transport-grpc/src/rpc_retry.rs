//! Retry policy and helper for idempotent unary calls.
//!
//! Only transient transport failures are retried:
//! - [`tonic::Code::Unavailable`]
//! - [`tonic::Code::DeadlineExceeded`]
//!
//! Every other status is returned to the caller immediately.
//!
//! **The wrapped call must be idempotent.** Mutating platform operations
//! (sending a message, initiating a payment) are never routed through
//! [`call_with_retry`]; a retry could duplicate the side effect.
//!
//! The same [`RetryPolicy`] drives connect retries in [`crate::client`] and
//! the notification stream reconnect loop in the SDK.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tonic::{Code, Status};
use tracing::Instrument;

fn duration_to_u64_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Backoff and attempt budget for retried operations.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct RetryPolicy {
    /// Retries after the initial attempt.
    pub max_retries: u32,

    /// Delay before the first retry; later retries wait `base_backoff * attempt`.
    pub base_backoff: Duration,

    /// Upper bound for any single delay.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    pub fn with_base_backoff(mut self, duration: Duration) -> Self {
        self.base_backoff = duration;
        self
    }

    pub fn with_max_backoff(mut self, duration: Duration) -> Self {
        self.max_backoff = duration;
        self
    }

    /// Delay to wait after the failed attempt number `attempt` (1-based).
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_backoff
            .saturating_mul(attempt.max(1))
            .min(self.max_backoff)
    }
}

/// Whether a status describes a transient transport condition.
#[must_use]
pub fn is_retryable(code: Code) -> bool {
    matches!(code, Code::Unavailable | Code::DeadlineExceeded)
}

/// Run an idempotent unary call, retrying transient failures with backoff.
///
/// `call` receives the client and a clone of `req` for every attempt, so
/// credentials and deadlines attached inside `call` are rebuilt each time.
///
/// # Errors
/// Returns the first non-retryable status, or the last status once
/// `policy.max_retries` is exhausted.
pub async fn call_with_retry<TClient, F, Fut, Req, Res>(
    client: &mut TClient,
    policy: &RetryPolicy,
    req: Req,
    call: F,
    op_name: &'static str,
) -> Result<Res, Status>
where
    F: Fn(&mut TClient, Req) -> Fut,
    Fut: Future<Output = Result<Res, Status>>,
    Req: Clone,
{
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;

        let span = tracing::debug_span!("grpc_call", op = op_name, attempt);
        let result = call(client, req.clone()).instrument(span).await;

        let status = match result {
            Ok(res) => {
                if attempt > 1 {
                    tracing::info!(op = op_name, attempt, "gRPC call succeeded after retries");
                }
                return Ok(res);
            }
            Err(status) => status,
        };

        let code = status.code();
        if !is_retryable(code) || attempt > policy.max_retries {
            tracing::warn!(
                op = op_name,
                attempt,
                code = ?code,
                message = %status.message(),
                "gRPC call failed"
            );
            return Err(status);
        }

        let backoff = policy.backoff(attempt);
        tracing::debug!(
            op = op_name,
            attempt,
            code = ?code,
            backoff_ms = duration_to_u64_ms(backoff),
            "retrying gRPC call after backoff"
        );
        sleep(backoff).await;
    }
}
