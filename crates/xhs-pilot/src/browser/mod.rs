//! Browser abstraction for page-level automation.
//!
//! Defines the `Browser` and `PageHandle` traits that abstract over the
//! browser engine (Chromium via chromiumoxide, or the in-memory scripted
//! driver used in tests).

pub mod chromium;
#[cfg(any(test, feature = "testing"))]
pub mod scripted;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::types::{PilotError, PilotResult};

/// Script returning a cheap DOM fingerprint. Two equal consecutive values mean
/// the document did not change between polls.
pub const STABILITY_PROBE: &str = r#"(() => {
  const body = document.body;
  return [
    document.readyState,
    document.getElementsByTagName("*").length,
    body ? body.innerText.length : 0
  ].join(":");
})()"#;

/// Script answering whether the client state global has been populated.
pub const HYDRATION_PROBE: &str = r#"(() => {
  const state = window.__INITIAL_STATE__;
  return typeof state === "object" && state !== null;
})()"#;

/// A browser engine that hands out pages.
#[async_trait]
pub trait Browser: Send + Sync {
    /// Open a new page (tab). Persisted cookies are applied before it is returned.
    async fn new_page(&self) -> PilotResult<Arc<dyn PageHandle>>;
    /// Shut down the browser engine.
    async fn shutdown(&self) -> PilotResult<()>;
    /// Number of currently open pages.
    fn active_pages(&self) -> usize;
}

/// A single page. Implementations must tolerate concurrent readers.
#[async_trait]
pub trait PageHandle: Send + Sync {
    /// Start navigation and wait for the load event.
    async fn goto(&self, url: &str) -> PilotResult<()>;

    /// Evaluate a script in the page and return its JSON-converted result.
    async fn evaluate(&self, script: &str) -> PilotResult<serde_json::Value>;

    /// Poll the DOM fingerprint until it stays unchanged for `quiet`.
    ///
    /// Callers bound this with their own timeout; on a page that never
    /// settles it keeps polling.
    async fn wait_for_stable(&self, quiet: Duration, poll: Duration) -> PilotResult<()> {
        let mut last = self.evaluate(STABILITY_PROBE).await?;
        let mut quiet_since = tokio::time::Instant::now();
        loop {
            tokio::time::sleep(poll).await;
            let current = self.evaluate(STABILITY_PROBE).await?;
            if current == last {
                if quiet_since.elapsed() >= quiet {
                    return Ok(());
                }
            } else {
                last = current;
                quiet_since = tokio::time::Instant::now();
            }
        }
    }

    /// Click the first element matching `selector`. `false` when nothing matched.
    async fn click(&self, selector: &str) -> PilotResult<bool>;

    /// Click the first element under `selector` whose visible text contains `text`.
    async fn click_text(&self, selector: &str, text: &str) -> PilotResult<bool>;

    /// Focus `selector` and type `text` into it.
    async fn type_text(&self, selector: &str, text: &str) -> PilotResult<()>;

    /// Attach local files to the file input matching `selector`.
    async fn upload_files(&self, selector: &str, paths: &[PathBuf]) -> PilotResult<()>;

    async fn element_exists(&self, selector: &str) -> PilotResult<bool> {
        Ok(self.element_count(selector).await? > 0)
    }

    async fn element_count(&self, selector: &str) -> PilotResult<usize>;

    /// Attribute of the first element matching `selector`.
    async fn attribute(&self, selector: &str, name: &str) -> PilotResult<Option<String>>;

    /// Trimmed text of every element matching `selector`, in document order.
    async fn text_contents(&self, selector: &str) -> PilotResult<Vec<String>>;

    async fn current_url(&self) -> PilotResult<String>;

    /// Cookies of the page's browser context as CDP cookie objects.
    async fn export_cookies(&self) -> PilotResult<Vec<serde_json::Value>>;

    async fn import_cookies(&self, cookies: &[serde_json::Value]) -> PilotResult<()>;

    /// Close the page. Safe to call more than once.
    async fn close(&self) -> PilotResult<()>;
}

/// A browser used when no engine could be launched. Every page request fails.
pub struct NoopBrowser;

#[async_trait]
impl Browser for NoopBrowser {
    async fn new_page(&self) -> PilotResult<Arc<dyn PageHandle>> {
        Err(PilotError::Browser("Browser not available".to_string()))
    }

    async fn shutdown(&self) -> PilotResult<()> {
        Ok(())
    }

    fn active_pages(&self) -> usize {
        0
    }
}
