//! Per-operation deadline and cancellation.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::types::{PilotError, PilotResult};

/// Deadline and cancellation signal carried by every public operation.
#[derive(Debug, Clone)]
pub struct OpContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
    budget: Option<Duration>,
}

impl Default for OpContext {
    fn default() -> Self {
        Self::new()
    }
}

impl OpContext {
    /// A context with no deadline and a fresh cancellation token.
    pub fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
            deadline: None,
            budget: None,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new().timeout(timeout)
    }

    /// Tighten the deadline. An earlier existing deadline wins.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        match self.deadline {
            Some(existing) if existing <= candidate => {}
            _ => {
                self.deadline = Some(candidate);
                self.budget = Some(timeout);
            }
        }
        self
    }

    /// Use an externally owned token, e.g. one registered per request.
    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Run `fut` until it completes, the token is cancelled, or the deadline passes.
    pub async fn guard<T, F>(&self, fut: F) -> PilotResult<T>
    where
        F: Future<Output = PilotResult<T>>,
    {
        if self.is_cancelled() {
            return Err(PilotError::Cancelled);
        }

        let deadline = async {
            match self.deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(PilotError::Cancelled),
            _ = deadline => Err(PilotError::DeadlineExceeded(
                self.budget.map(|b| b.as_millis() as u64).unwrap_or_default(),
            )),
            result = fut => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_guard_passes_result_through() {
        let ctx = OpContext::new();
        let value = ctx.guard(async { Ok::<_, PilotError>(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_guard_deadline() {
        let ctx = OpContext::with_timeout(Duration::from_secs(2));
        let result = ctx
            .guard(async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok::<_, PilotError>(())
            })
            .await;
        assert!(matches!(result, Err(PilotError::DeadlineExceeded(2000))));
    }

    #[tokio::test]
    async fn test_guard_cancellation() {
        let ctx = OpContext::new();
        let token = ctx.token().clone();
        let handle = tokio::spawn(async move {
            ctx.guard(async {
                std::future::pending::<()>().await;
                Ok::<_, PilotError>(())
            })
            .await
        });
        token.cancel();
        let result = handle.await.unwrap();
        assert!(matches!(result, Err(PilotError::Cancelled)));
    }

    #[test]
    fn test_earlier_deadline_wins() {
        let ctx = OpContext::with_timeout(Duration::from_secs(5)).timeout(Duration::from_secs(60));
        assert!(ctx.remaining().unwrap() <= Duration::from_secs(5));
    }
}
