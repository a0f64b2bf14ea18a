//! Like and favorite toggles.
//!
//! Both follow the same state machine: read the current state from the
//! detail view, return early when it already matches the target, otherwise
//! click the control and poll until the state flips.

use crate::browser::PageHandle;
use crate::config::Timings;
use crate::extractor;
use crate::mapper;
use crate::navigator;
use crate::platform::{self, selectors};
use crate::schema::Recipe;
use crate::types::{InteractInfo, PilotError, PilotResult};

use super::{ensure_no_login_wall, poll_until, require};

/// A two-state control on the detail page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Like,
    Favorite,
}

impl Toggle {
    fn selector(self) -> &'static str {
        match self {
            Toggle::Like => selectors::LIKE_BUTTON,
            Toggle::Favorite => selectors::COLLECT_BUTTON,
        }
    }

    fn is_on(self, info: &InteractInfo) -> bool {
        match self {
            Toggle::Like => info.liked,
            Toggle::Favorite => info.collected,
        }
    }

    /// Verb for the transition towards `on`.
    pub fn verb(self, on: bool) -> &'static str {
        match (self, on) {
            (Toggle::Like, true) => "like",
            (Toggle::Like, false) => "unlike",
            (Toggle::Favorite, true) => "favorite",
            (Toggle::Favorite, false) => "unfavorite",
        }
    }
}

/// Observed state of a toggle. `Unknown` when the state could not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleState {
    Unknown,
    On,
    Off,
}

impl ToggleState {
    fn target(on: bool) -> Self {
        if on {
            ToggleState::On
        } else {
            ToggleState::Off
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Target state was already in place; nothing was clicked.
    AlreadyInState,
    /// The control was clicked and the new state confirmed.
    Applied,
}

/// Read the toggle state of `feed_id` from the current page.
pub async fn read_state(page: &dyn PageHandle, feed_id: &str, toggle: Toggle) -> ToggleState {
    let json = extractor::extract(page, &Recipe::feed_detail()).await;
    match mapper::map_feed_detail(&json, feed_id) {
        Ok(detail) if toggle.is_on(&detail.note.interact_info) => ToggleState::On,
        Ok(_) => ToggleState::Off,
        Err(e) => {
            tracing::debug!("Could not read {toggle:?} state of {feed_id}: {e}");
            ToggleState::Unknown
        }
    }
}

/// Drive `toggle` on `feed_id` to `on`.
///
/// An unreadable pre-state does not block the click; verification then
/// decides the outcome.
pub async fn set_toggle(
    page: &dyn PageHandle,
    timings: &Timings,
    feed_id: &str,
    xsec_token: &str,
    toggle: Toggle,
    on: bool,
) -> PilotResult<ToggleOutcome> {
    require(feed_id, "feed_id")?;
    require(xsec_token, "xsec_token")?;
    let verb = toggle.verb(on);
    let want = ToggleState::target(on);

    navigator::navigate(page, &platform::feed_detail_url(feed_id, xsec_token), timings).await?;

    let before = read_state(page, feed_id, toggle).await;
    if before == want {
        tracing::info!("{feed_id} already in target state for {verb}, skipping click");
        return Ok(ToggleOutcome::AlreadyInState);
    }

    if !page.click(toggle.selector()).await? {
        return Err(PilotError::ElementNotFound(toggle.selector().to_string()));
    }

    poll_until(
        timings.verification_timeout,
        timings.verification_poll,
        verb,
        feed_id,
        || async {
            ensure_no_login_wall(page, verb).await?;
            Ok(read_state(page, feed_id, toggle).await == want)
        },
    )
    .await?;

    tracing::info!("{verb} applied to {feed_id}");
    Ok(ToggleOutcome::Applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::scripted::{Fixture, ScriptedBrowser, ScriptedElement};
    use crate::browser::Browser;
    use serde_json::json;
    use std::time::Duration;

    const ID: &str = "n1";

    fn route() -> String {
        platform::feed_detail_url(ID, "tok")
    }

    fn timings() -> Timings {
        Timings {
            quiet_window: Duration::from_millis(10),
            stability_poll: Duration::from_millis(10),
            settle_delay: Duration::ZERO,
            verification_timeout: Duration::from_secs(2),
            verification_poll: Duration::from_millis(100),
            ..Timings::default()
        }
    }

    fn browser(liked: bool, wired: bool) -> ScriptedBrowser {
        let browser = ScriptedBrowser::new();
        browser.route(
            route(),
            Fixture::new()
                .with_state(json!({
                    "note": { "noteDetailMap": { ID: { "note": {
                        "id": ID,
                        "interactInfo": { "liked": liked, "collected": false }
                    } } } }
                }))
                .with_element(selectors::LIKE_BUTTON, ScriptedElement::new()),
        );
        if wired {
            browser.on(selectors::LIKE_BUTTON, |f| {
                let path = format!("note.noteDetailMap.{ID}.note.interactInfo.liked");
                if let Some(v) = f.state_at(&path) {
                    let now = v.as_bool().unwrap_or(false);
                    *v = json!(!now);
                }
            });
        }
        browser
    }

    fn favorite_browser(collected: bool) -> ScriptedBrowser {
        let browser = ScriptedBrowser::new();
        browser.route(
            route(),
            Fixture::new()
                .with_state(json!({
                    "note": { "noteDetailMap": { ID: { "note": {
                        "id": ID,
                        "interactInfo": { "liked": false, "collected": collected }
                    } } } }
                }))
                .with_element(selectors::LIKE_BUTTON, ScriptedElement::new())
                .with_element(selectors::COLLECT_BUTTON, ScriptedElement::new()),
        );
        browser.on(selectors::COLLECT_BUTTON, |f| {
            let path = format!("note.noteDetailMap.{ID}.note.interactInfo.collected");
            if let Some(v) = f.state_at(&path) {
                let now = v.as_bool().unwrap_or(false);
                *v = json!(!now);
            }
        });
        browser
    }

    fn collected(browser: &ScriptedBrowser) -> bool {
        let mut fixture = browser.fixture(&route()).unwrap();
        let path = format!("note.noteDetailMap.{ID}.note.interactInfo.collected");
        fixture.state_at(&path).and_then(|v| v.as_bool()).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_like_applies_and_verifies() {
        let browser = browser(false, true);
        let page = browser.new_page().await.unwrap();
        let outcome = set_toggle(page.as_ref(), &timings(), ID, "tok", Toggle::Like, true)
            .await
            .unwrap();
        assert_eq!(outcome, ToggleOutcome::Applied);
        assert_eq!(browser.clicks(), vec![selectors::LIKE_BUTTON.to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_like_when_already_liked_does_not_click() {
        let browser = browser(true, true);
        let page = browser.new_page().await.unwrap();
        let outcome = set_toggle(page.as_ref(), &timings(), ID, "tok", Toggle::Like, true)
            .await
            .unwrap();
        assert_eq!(outcome, ToggleOutcome::AlreadyInState);
        assert!(browser.clicks().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unlike_applies() {
        let browser = browser(true, true);
        let page = browser.new_page().await.unwrap();
        let outcome = set_toggle(page.as_ref(), &timings(), ID, "tok", Toggle::Like, false)
            .await
            .unwrap();
        assert_eq!(outcome, ToggleOutcome::Applied);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unresponsive_control_times_out() {
        let browser = browser(false, false);
        let page = browser.new_page().await.unwrap();
        let err = set_toggle(page.as_ref(), &timings(), ID, "tok", Toggle::Like, true)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "verification_timeout");
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_control() {
        let browser = browser(false, true);
        let page = browser.new_page().await.unwrap();
        let err = set_toggle(page.as_ref(), &timings(), ID, "tok", Toggle::Favorite, true)
            .await
            .unwrap_err();
        assert!(matches!(err, PilotError::ElementNotFound(s) if s == selectors::COLLECT_BUTTON));
    }

    #[tokio::test(start_paused = true)]
    async fn test_favorite_applies_and_verifies() {
        let browser = favorite_browser(false);
        let page = browser.new_page().await.unwrap();
        let outcome = set_toggle(page.as_ref(), &timings(), ID, "tok", Toggle::Favorite, true)
            .await
            .unwrap();
        assert_eq!(outcome, ToggleOutcome::Applied);
        assert_eq!(browser.clicks(), vec![selectors::COLLECT_BUTTON.to_string()]);
        assert!(collected(&browser));
    }

    #[tokio::test(start_paused = true)]
    async fn test_favorite_when_already_favorited_does_not_click() {
        let browser = favorite_browser(true);
        let page = browser.new_page().await.unwrap();
        let outcome = set_toggle(page.as_ref(), &timings(), ID, "tok", Toggle::Favorite, true)
            .await
            .unwrap();
        assert_eq!(outcome, ToggleOutcome::AlreadyInState);
        assert!(browser.clicks().is_empty());
        assert!(collected(&browser));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unfavorite_mirrors_favorite() {
        let browser = favorite_browser(true);
        let page = browser.new_page().await.unwrap();
        let outcome = set_toggle(page.as_ref(), &timings(), ID, "tok", Toggle::Favorite, false)
            .await
            .unwrap();
        assert_eq!(outcome, ToggleOutcome::Applied);
        assert!(!collected(&browser));

        let outcome = set_toggle(page.as_ref(), &timings(), ID, "tok", Toggle::Favorite, false)
            .await
            .unwrap();
        assert_eq!(outcome, ToggleOutcome::AlreadyInState);
        assert_eq!(browser.clicks(), vec![selectors::COLLECT_BUTTON.to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_wall_rejects() {
        let browser = browser(false, false);
        browser.on(selectors::LIKE_BUTTON, |f| {
            f.add_element(selectors::LOGIN_MODAL, ScriptedElement::new());
        });
        let page = browser.new_page().await.unwrap();
        let err = set_toggle(page.as_ref(), &timings(), ID, "tok", Toggle::Like, true)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "interaction_rejected");
    }

    #[test]
    fn test_verbs() {
        assert_eq!(Toggle::Like.verb(false), "unlike");
        assert_eq!(Toggle::Favorite.verb(true), "favorite");
    }
}
