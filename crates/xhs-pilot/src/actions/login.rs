//! Login status and QR code login.

use std::time::Duration;

use crate::browser::PageHandle;
use crate::config::Timings;
use crate::navigator;
use crate::platform::{self, selectors};
use crate::types::{PilotError, PilotResult};

use super::poll_until;

/// Result of asking for a login QR code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QrCode {
    /// The session is already logged in; no code is shown.
    LoggedIn,
    /// Image source of the code, usually a `data:` URL.
    Pending(String),
}

pub async fn check_login_status(page: &dyn PageHandle, timings: &Timings) -> PilotResult<bool> {
    navigator::navigate(page, &platform::explore_url(), timings).await?;
    page.element_exists(selectors::LOGGED_IN_MARKER).await
}

/// Open the explore page and read the login QR code.
pub async fn fetch_qrcode(page: &dyn PageHandle, timings: &Timings) -> PilotResult<QrCode> {
    navigator::navigate(page, &platform::explore_url(), timings).await?;
    if page.element_exists(selectors::LOGGED_IN_MARKER).await? {
        return Ok(QrCode::LoggedIn);
    }

    poll_until(
        timings.hydration_timeout,
        timings.stability_poll,
        "qrcode",
        selectors::LOGIN_QRCODE,
        || async { page.element_exists(selectors::LOGIN_QRCODE).await },
    )
    .await
    .map_err(|_| PilotError::ElementNotFound(selectors::LOGIN_QRCODE.to_string()))?;

    match page.attribute(selectors::LOGIN_QRCODE, "src").await? {
        Some(src) if !src.is_empty() => Ok(QrCode::Pending(src)),
        _ => Err(PilotError::ElementNotFound(format!(
            "{}[src]",
            selectors::LOGIN_QRCODE
        ))),
    }
}

/// Poll the page until the logged-in marker appears. `false` on timeout.
pub async fn wait_for_login(page: &dyn PageHandle, limit: Duration, poll: Duration) -> bool {
    let result = poll_until(limit, poll, "login", "qrcode", || async {
        page.element_exists(selectors::LOGGED_IN_MARKER).await
    })
    .await;
    match result {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!("Login wait ended: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::scripted::{Fixture, ScriptedBrowser, ScriptedElement};
    use crate::browser::Browser;

    fn timings() -> Timings {
        Timings {
            quiet_window: Duration::from_millis(10),
            stability_poll: Duration::from_millis(10),
            settle_delay: Duration::ZERO,
            hydration_timeout: Duration::from_secs(1),
            ..Timings::default()
        }
    }

    fn explore(fixture: Fixture) -> ScriptedBrowser {
        let browser = ScriptedBrowser::new();
        browser.route(platform::explore_url(), fixture);
        browser
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_status() {
        let logged_in = explore(Fixture::new().with_element(selectors::LOGGED_IN_MARKER, ScriptedElement::new()));
        let page = logged_in.new_page().await.unwrap();
        assert!(check_login_status(page.as_ref(), &timings()).await.unwrap());

        let anonymous = explore(Fixture::new());
        let page = anonymous.new_page().await.unwrap();
        assert!(!check_login_status(page.as_ref(), &timings()).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_qrcode() {
        let browser = explore(Fixture::new().with_element(
            selectors::LOGIN_QRCODE,
            ScriptedElement::new().attr("src", "data:image/png;base64,AAAA"),
        ));
        let page = browser.new_page().await.unwrap();
        assert_eq!(
            fetch_qrcode(page.as_ref(), &timings()).await.unwrap(),
            QrCode::Pending("data:image/png;base64,AAAA".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_qrcode_when_logged_in() {
        let browser = explore(Fixture::new().with_element(selectors::LOGGED_IN_MARKER, ScriptedElement::new()));
        let page = browser.new_page().await.unwrap();
        assert_eq!(fetch_qrcode(page.as_ref(), &timings()).await.unwrap(), QrCode::LoggedIn);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_qrcode_missing() {
        let browser = explore(Fixture::new());
        let page = browser.new_page().await.unwrap();
        let err = fetch_qrcode(page.as_ref(), &timings()).await.unwrap_err();
        assert_eq!(err.kind(), "element_not_found");
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_login() {
        let browser = explore(Fixture::new());
        let page = browser.new_page().await.unwrap();
        page.goto(&platform::explore_url()).await.unwrap();
        assert!(!wait_for_login(page.as_ref(), Duration::from_secs(1), Duration::from_millis(100)).await);

        browser.update(&platform::explore_url(), |f| {
            f.add_element(selectors::LOGGED_IN_MARKER, ScriptedElement::new());
        });
        assert!(wait_for_login(page.as_ref(), Duration::from_secs(1), Duration::from_millis(100)).await);
    }
}
