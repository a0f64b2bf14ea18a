//! Chromium-backed browser using chromiumoxide.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use chromiumoxide::cdp::browser_protocol::network::CookieParam;
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde_json::Value;

use super::{Browser, PageHandle};
use crate::config::PilotConfig;
use crate::cookies::CookieJar;
use crate::types::{PilotError, PilotResult};

/// Find the browser binary.
///
/// Order: explicit path, `XHS_BROWSER_BIN`, `~/.xhs-pilot/chromium`, `PATH`,
/// then the usual macOS install location.
pub fn find_chromium(explicit: Option<&PathBuf>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Some(path.clone());
        }
        tracing::warn!("Configured browser binary {} does not exist", path.display());
    }

    if let Ok(p) = std::env::var("XHS_BROWSER_BIN") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        let candidates = if cfg!(target_os = "macos") {
            vec![
                home.join(".xhs-pilot/chromium/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".xhs-pilot/chromium/chrome"),
            ]
        } else {
            vec![
                home.join(".xhs-pilot/chromium/chrome-linux64/chrome"),
                home.join(".xhs-pilot/chromium/chrome"),
            ]
        };
        if let Some(found) = candidates.into_iter().find(|c| c.exists()) {
            return Some(found);
        }
    }

    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    if cfg!(target_os = "macos") {
        let common = PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// A shared Chromium process. Each operation gets its own page.
pub struct ChromiumBrowser {
    browser: CdpBrowser,
    jar: CookieJar,
    active_count: Arc<AtomicUsize>,
}

impl ChromiumBrowser {
    /// Launch Chromium according to `config`.
    pub async fn launch(config: &PilotConfig) -> PilotResult<Self> {
        let chrome_path = find_chromium(config.browser_bin.as_ref()).ok_or_else(|| {
            PilotError::Browser("Chromium not found. Set XHS_BROWSER_BIN.".to_string())
        })?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-blink-features=AutomationControlled");
        builder = if config.headless {
            builder.arg("--headless=new")
        } else {
            builder.with_head()
        };
        let browser_config = builder
            .build()
            .map_err(|e| PilotError::Browser(format!("failed to build browser config: {e}")))?;

        let (browser, mut handler) = CdpBrowser::launch(browser_config)
            .await
            .map_err(|e| PilotError::Browser(format!("failed to launch Chromium: {e}")))?;

        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!("CDP handler event error: {e}");
                }
            }
        });

        tracing::info!("Chromium launched (headless: {})", config.headless);

        Ok(Self {
            browser,
            jar: CookieJar::new(&config.cookies_path),
            active_count: Arc::new(AtomicUsize::new(0)),
        })
    }
}

#[async_trait]
impl Browser for ChromiumBrowser {
    async fn new_page(&self) -> PilotResult<Arc<dyn PageHandle>> {
        let page = self.browser.new_page("about:blank").await?;
        self.active_count.fetch_add(1, Ordering::Relaxed);

        let handle = ChromiumPage {
            page,
            active_count: Arc::clone(&self.active_count),
            closed: AtomicBool::new(false),
        };

        match self.jar.load() {
            Ok(cookies) if !cookies.is_empty() => {
                if let Err(e) = handle.import_cookies(&cookies).await {
                    tracing::warn!("Failed to apply saved cookies: {e}");
                }
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("Ignoring unreadable cookie jar: {e}"),
        }

        Ok(Arc::new(handle))
    }

    async fn shutdown(&self) -> PilotResult<()> {
        // The process exits when the last handle drops.
        Ok(())
    }

    fn active_pages(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }
}

/// A single Chromium tab.
pub struct ChromiumPage {
    page: Page,
    active_count: Arc<AtomicUsize>,
    closed: AtomicBool,
}

#[async_trait]
impl PageHandle for ChromiumPage {
    async fn goto(&self, url: &str) -> PilotResult<()> {
        self.page.goto(url).await?;
        self.page.wait_for_navigation().await?;
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> PilotResult<Value> {
        let result = self.page.evaluate(script).await?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn click(&self, selector: &str) -> PilotResult<bool> {
        match self.page.find_element(selector).await {
            Ok(element) => {
                element.click().await?;
                Ok(true)
            }
            Err(_) => Ok(false),
        }
    }

    async fn click_text(&self, selector: &str, text: &str) -> PilotResult<bool> {
        let script = format!(
            r#"(() => {{
  const wanted = {text};
  for (const el of document.querySelectorAll({selector})) {{
    if ((el.innerText || "").includes(wanted)) {{ el.click(); return true; }}
  }}
  return false;
}})()"#,
            text = quote(text),
            selector = quote(selector),
        );
        Ok(self.evaluate(&script).await?.as_bool().unwrap_or(false))
    }

    async fn type_text(&self, selector: &str, text: &str) -> PilotResult<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| PilotError::ElementNotFound(selector.to_string()))?;
        element.click().await?;
        element.type_str(text).await?;
        Ok(())
    }

    async fn upload_files(&self, selector: &str, paths: &[PathBuf]) -> PilotResult<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| PilotError::ElementNotFound(selector.to_string()))?;
        let files = paths.iter().map(|p| p.to_string_lossy().into_owned()).collect::<Vec<_>>();
        let params = SetFileInputFilesParams::builder()
            .files(files)
            .backend_node_id(element.backend_node_id)
            .build()
            .map_err(PilotError::Browser)?;
        self.page.execute(params).await?;
        Ok(())
    }

    async fn element_count(&self, selector: &str) -> PilotResult<usize> {
        Ok(self.page.find_elements(selector).await.map(|els| els.len()).unwrap_or(0))
    }

    async fn attribute(&self, selector: &str, name: &str) -> PilotResult<Option<String>> {
        match self.page.find_element(selector).await {
            Ok(element) => Ok(element.attribute(name).await?),
            Err(_) => Ok(None),
        }
    }

    async fn text_contents(&self, selector: &str) -> PilotResult<Vec<String>> {
        let script = format!(
            "Array.from(document.querySelectorAll({})).map(el => (el.innerText || '').trim())",
            quote(selector)
        );
        let value = self.evaluate(&script).await?;
        Ok(value
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn current_url(&self) -> PilotResult<String> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    async fn export_cookies(&self) -> PilotResult<Vec<Value>> {
        let cookies = self.page.get_cookies().await?;
        cookies
            .into_iter()
            .map(|c| {
                serde_json::to_value(c).map_err(|source| PilotError::Parse {
                    context: "cookie",
                    source,
                })
            })
            .collect()
    }

    async fn import_cookies(&self, cookies: &[Value]) -> PilotResult<()> {
        let params = cookies
            .iter()
            .filter_map(|c| match serde_json::from_value::<CookieParam>(c.clone()) {
                Ok(p) => Some(p),
                Err(e) => {
                    tracing::debug!("Skipping malformed cookie: {e}");
                    None
                }
            })
            .collect::<Vec<_>>();
        if !params.is_empty() {
            self.page.set_cookies(params).await?;
        }
        Ok(())
    }

    async fn close(&self) -> PilotResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.active_count.fetch_sub(1, Ordering::Relaxed);
        if let Err(e) = self.page.clone().close().await {
            tracing::debug!("Page close failed: {e}");
        }
        Ok(())
    }
}

fn quote(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}
