//! Bounded navigation with readiness waiting.

use std::time::Duration;

use crate::browser::{PageHandle, HYDRATION_PROBE};
use crate::config::Timings;
use crate::types::{PilotError, PilotResult};

/// Navigate, wait for DOM stability, then wait the settle delay.
///
/// Navigation and stability share `timings.navigation_budget`; exceeding it
/// yields [`PilotError::NavigationTimeout`]. The settle delay is not part of
/// the budget.
pub async fn navigate(page: &dyn PageHandle, url: &str, timings: &Timings) -> PilotResult<()> {
    tracing::debug!("Navigating to {url}");
    let budget = timings.navigation_budget;

    let ready = async {
        page.goto(url).await?;
        page.wait_for_stable(timings.quiet_window, timings.stability_poll)
            .await
    };

    match tokio::time::timeout(budget, ready).await {
        Ok(result) => result?,
        Err(_) => {
            tracing::warn!("Navigation to {url} exceeded {}ms", budget.as_millis());
            return Err(PilotError::NavigationTimeout {
                url: url.to_string(),
                budget_ms: budget.as_millis() as u64,
            });
        }
    }

    tokio::time::sleep(timings.settle_delay).await;
    Ok(())
}

/// Poll until the client state global exists. Best effort: `false` on timeout
/// or driver errors, and callers proceed to extraction anyway.
pub async fn wait_until_hydrated(page: &dyn PageHandle, limit: Duration, poll: Duration) -> bool {
    let probe = async {
        loop {
            match page.evaluate(HYDRATION_PROBE).await {
                Ok(serde_json::Value::Bool(true)) => return true,
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!("Hydration probe failed: {e}");
                    return false;
                }
            }
            tokio::time::sleep(poll).await;
        }
    };
    tokio::time::timeout(limit, probe).await.unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::scripted::{Fixture, ScriptedBrowser};
    use crate::browser::Browser;
    use serde_json::json;

    fn fast() -> Timings {
        Timings {
            navigation_budget: Duration::from_secs(3),
            quiet_window: Duration::from_millis(200),
            stability_poll: Duration::from_millis(50),
            settle_delay: Duration::from_millis(100),
            ..Timings::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigate_settles() {
        let browser = ScriptedBrowser::new();
        browser.route("https://x.test/", Fixture::new());
        let page = browser.new_page().await.unwrap();
        navigate(page.as_ref(), "https://x.test/a", &fast()).await.unwrap();
        assert_eq!(browser.visited(), vec!["https://x.test/a".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigate_times_out_on_busy_page() {
        let browser = ScriptedBrowser::new();
        browser.set_never_stable(true);
        let page = browser.new_page().await.unwrap();

        let err = navigate(page.as_ref(), "https://x.test/busy", &fast())
            .await
            .unwrap_err();
        match err {
            PilotError::NavigationTimeout { url, budget_ms } => {
                assert_eq!(url, "https://x.test/busy");
                assert_eq!(budget_ms, 3000);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigate_propagates_driver_failure() {
        let browser = ScriptedBrowser::new();
        browser.set_fail_navigation(true);
        let page = browser.new_page().await.unwrap();
        let err = navigate(page.as_ref(), "https://x.test/", &fast()).await.unwrap_err();
        assert_eq!(err.kind(), "browser_error");
    }

    #[tokio::test(start_paused = true)]
    async fn test_hydration_wait() {
        let browser = ScriptedBrowser::new();
        browser.route("https://x.test/cold", Fixture::new());
        browser.route("https://x.test/warm", Fixture::new().with_state(json!({ "feed": {} })));
        let page = browser.new_page().await.unwrap();

        page.goto("https://x.test/warm").await.unwrap();
        assert!(wait_until_hydrated(page.as_ref(), Duration::from_secs(1), Duration::from_millis(100)).await);

        page.goto("https://x.test/cold").await.unwrap();
        assert!(!wait_until_hydrated(page.as_ref(), Duration::from_secs(1), Duration::from_millis(100)).await);
    }
}
