//! Executors for read-only extraction and state-changing interactions.
//!
//! Every executor works on a page it is handed and never closes it; page
//! lifetime belongs to the service.

pub mod comment;
pub mod feed_detail;
pub mod feeds;
pub mod interact;
pub mod login;
pub mod publish;
pub mod search;
pub mod user_profile;

use std::future::Future;
use std::time::Duration;

use crate::browser::PageHandle;
use crate::platform::selectors;
use crate::types::{PilotError, PilotResult};

/// Poll `check` until it reports `true`, failing with
/// [`PilotError::VerificationTimeout`] once `limit` has passed.
///
/// Errors from `check` end polling immediately.
pub(crate) async fn poll_until<F, Fut>(
    limit: Duration,
    poll: Duration,
    action: &str,
    target: &str,
    mut check: F,
) -> PilotResult<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = PilotResult<bool>>,
{
    let attempts = async {
        loop {
            if check().await? {
                return Ok(());
            }
            tokio::time::sleep(poll).await;
        }
    };

    match tokio::time::timeout(limit, attempts).await {
        Ok(result) => result,
        Err(_) => Err(PilotError::VerificationTimeout {
            action: action.to_string(),
            target: target.to_string(),
            timeout_ms: limit.as_millis() as u64,
        }),
    }
}

/// Fail when the platform put a login wall in front of the page.
pub(crate) async fn ensure_no_login_wall(page: &dyn PageHandle, action: &str) -> PilotResult<()> {
    if page.element_exists(selectors::LOGIN_MODAL).await? {
        return Err(PilotError::InteractionRejected(format!(
            "{action} requires login"
        )));
    }
    Ok(())
}

/// Reject blank inputs before navigating anywhere.
pub(crate) fn require(value: &str, name: &str) -> PilotResult<()> {
    if value.trim().is_empty() {
        return Err(PilotError::Validation(format!("{name} must not be empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_poll_until_succeeds_eventually() {
        let calls = AtomicUsize::new(0);
        poll_until(Duration::from_secs(5), Duration::from_millis(100), "like", "n1", || async {
            Ok(calls.fetch_add(1, Ordering::SeqCst) >= 3)
        })
        .await
        .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_until_times_out() {
        let err = poll_until(Duration::from_secs(1), Duration::from_millis(100), "like", "n1", || async {
            Ok(false)
        })
        .await
        .unwrap_err();
        match err {
            PilotError::VerificationTimeout { action, target, timeout_ms } => {
                assert_eq!((action.as_str(), target.as_str(), timeout_ms), ("like", "n1", 1000));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_poll_until_stops_on_error() {
        let err = poll_until(Duration::from_secs(1), Duration::from_millis(10), "comment", "n1", || async {
            Err::<bool, _>(PilotError::InteractionRejected("login".into()))
        })
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "interaction_rejected");
    }

    #[test]
    fn test_require() {
        assert!(require("abc", "feed_id").is_ok());
        assert_eq!(require("  ", "feed_id").unwrap_err().to_string(), "Invalid input: feed_id must not be empty");
    }
}
