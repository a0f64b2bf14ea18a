//! Service facade over the executors.
//!
//! Each operation gets a fresh page from the shared browser, runs inside the
//! caller's [`OpContext`] (deadline plus cancellation), converts panics into
//! [`PilotError::Internal`], and closes the page on every exit path.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use serde::{Deserialize, Serialize};

use crate::actions::interact::{Toggle, ToggleOutcome};
use crate::actions::login::QrCode;
use crate::actions::publish::{ImagePost, VideoPost};
use crate::actions::{comment, feed_detail, feeds, interact, login, publish, search, user_profile};
use crate::browser::chromium::ChromiumBrowser;
use crate::browser::{Browser, PageHandle};
use crate::config::PilotConfig;
use crate::context::OpContext;
use crate::cookies::CookieJar;
use crate::downloader::ImageDownloader;
use crate::types::{ActionResult, Feed, FeedDetailResponse, PilotError, PilotResult, UserProfile};
use crate::validation;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublishRequest {
    pub title: String,
    pub content: String,
    /// HTTP(S) URLs or local paths, in display order.
    pub images: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublishVideoRequest {
    pub title: String,
    pub content: String,
    /// Local video file.
    pub video: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginStatusResponse {
    pub is_logged_in: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginQrcodeResponse {
    /// How long the background waiter keeps watching, e.g. `4m0s`.
    pub timeout: String,
    pub is_logged_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub img: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishResponse {
    pub title: String,
    pub content: String,
    /// Image count for image notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedsListResponse {
    pub feeds: Vec<Feed>,
    pub count: usize,
}

impl From<Vec<Feed>> for FeedsListResponse {
    fn from(feeds: Vec<Feed>) -> Self {
        Self {
            count: feeds.len(),
            feeds,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostCommentResponse {
    pub feed_id: String,
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadImagesResponse {
    pub saved_paths: Vec<String>,
    pub count: usize,
}

/// Entry point for every platform operation.
pub struct PilotService {
    browser: Arc<dyn Browser>,
    config: PilotConfig,
    jar: CookieJar,
}

impl PilotService {
    pub fn new(browser: Arc<dyn Browser>, config: PilotConfig) -> Self {
        let jar = CookieJar::new(&config.cookies_path);
        Self {
            browser,
            config,
            jar,
        }
    }

    /// Launch Chromium and build a service around it.
    pub async fn launch(config: PilotConfig) -> PilotResult<Self> {
        let browser = ChromiumBrowser::launch(&config).await?;
        Ok(Self::new(Arc::new(browser), config))
    }

    pub fn config(&self) -> &PilotConfig {
        &self.config
    }

    pub fn active_pages(&self) -> usize {
        self.browser.active_pages()
    }

    /// A context carrying the configured operation deadline.
    pub fn context(&self) -> OpContext {
        OpContext::with_timeout(self.config.timings.operation_timeout)
    }

    /// Run `op` on a fresh page and close the page afterwards.
    async fn with_page<T, F, Fut>(&self, ctx: &OpContext, name: &'static str, op: F) -> PilotResult<T>
    where
        F: FnOnce(Arc<dyn PageHandle>) -> Fut,
        Fut: Future<Output = PilotResult<T>>,
    {
        let page = PageGuard::new(self.browser.new_page().await?, name);
        tracing::debug!("{name}: page opened");

        let result = guarded(ctx, name, op(page.handle())).await;

        page.close().await;
        if let Err(e) = &result {
            tracing::warn!("{name} failed: {e}");
        }
        result
    }

    pub async fn check_login_status(&self, ctx: &OpContext) -> PilotResult<LoginStatusResponse> {
        let timings = &self.config.timings;
        let is_logged_in = self
            .with_page(ctx, "check_login_status", |page| async move {
                login::check_login_status(page.as_ref(), timings).await
            })
            .await?;
        Ok(LoginStatusResponse { is_logged_in })
    }

    /// Fetch the login QR code.
    ///
    /// When a code is shown, the page stays open in a background task that
    /// waits for the scan, saves the session cookies, then closes the page.
    pub async fn get_login_qrcode(&self, ctx: &OpContext) -> PilotResult<LoginQrcodeResponse> {
        let timings = self.config.timings.clone();
        let page = PageGuard::new(self.browser.new_page().await?, "get_login_qrcode");

        let handle = page.handle();
        let fetched = guarded(ctx, "get_login_qrcode", login::fetch_qrcode(handle.as_ref(), &timings)).await;

        match fetched {
            Ok(QrCode::Pending(img)) => {
                let limit = timings.login_timeout;
                let poll = timings.verification_poll;
                let jar = self.jar.clone();
                let waiter_page = page.detach();
                tokio::spawn(async move {
                    if login::wait_for_login(waiter_page.as_ref(), limit, poll).await {
                        match waiter_page.export_cookies().await {
                            Ok(cookies) => match jar.save(&cookies) {
                                Ok(()) => tracing::info!("Login completed, session saved"),
                                Err(e) => tracing::error!("Failed to save cookies: {e}"),
                            },
                            Err(e) => tracing::error!("Failed to export cookies: {e}"),
                        }
                    } else {
                        tracing::info!("QR login not completed within {}", format_duration(limit));
                    }
                    if let Err(e) = waiter_page.close().await {
                        tracing::debug!("Failed to close login page: {e}");
                    }
                });
                Ok(LoginQrcodeResponse {
                    timeout: format_duration(limit),
                    is_logged_in: false,
                    img: Some(img),
                })
            }
            other => {
                page.close().await;
                other.map(|_| LoginQrcodeResponse {
                    timeout: "0s".to_string(),
                    is_logged_in: true,
                    img: None,
                })
            }
        }
    }

    pub async fn publish_content(&self, ctx: &OpContext, req: PublishRequest) -> PilotResult<PublishResponse> {
        validation::validate_title(&req.title)?;
        validation::validate_content(&req.content)?;
        validation::validate_image_count(req.images.len())?;

        let downloader = ImageDownloader::new(&self.config.images_dir)?;
        let images = ctx.guard(downloader.acquire(&req.images)).await?;

        let post = ImagePost {
            title: req.title,
            content: req.content,
            tags: req.tags,
            images,
        };
        let timings = &self.config.timings;
        let post_ref = &post;
        self.with_page(ctx, "publish_content", |page| async move {
            publish::publish_images(page.as_ref(), timings, post_ref).await
        })
        .await?;

        Ok(PublishResponse {
            images: Some(post.images.len()),
            title: post.title,
            content: post.content,
            video: None,
            status: "published".to_string(),
        })
    }

    pub async fn publish_video(&self, ctx: &OpContext, req: PublishVideoRequest) -> PilotResult<PublishResponse> {
        let post = VideoPost {
            title: req.title,
            content: req.content,
            tags: req.tags,
            video: PathBuf::from(req.video.trim()),
        };
        post.validate()?;

        let timings = &self.config.timings;
        let post_ref = &post;
        self.with_page(ctx, "publish_video", |page| async move {
            publish::publish_video(page.as_ref(), timings, post_ref).await
        })
        .await?;

        Ok(PublishResponse {
            video: Some(post.video.display().to_string()),
            title: post.title,
            content: post.content,
            images: None,
            status: "published".to_string(),
        })
    }

    pub async fn list_feeds(&self, ctx: &OpContext) -> PilotResult<FeedsListResponse> {
        let timings = &self.config.timings;
        self.with_page(ctx, "list_feeds", |page| async move {
            feeds::home_feeds(page.as_ref(), timings).await
        })
        .await
        .map(FeedsListResponse::from)
    }

    pub async fn search_feeds(&self, ctx: &OpContext, keyword: &str) -> PilotResult<FeedsListResponse> {
        let timings = &self.config.timings;
        self.with_page(ctx, "search_feeds", |page| async move {
            search::search(page.as_ref(), timings, keyword).await
        })
        .await
        .map(FeedsListResponse::from)
    }

    pub async fn get_feed_detail(
        &self,
        ctx: &OpContext,
        feed_id: &str,
        xsec_token: &str,
    ) -> PilotResult<FeedDetailResponse> {
        let timings = &self.config.timings;
        self.with_page(ctx, "get_feed_detail", |page| async move {
            feed_detail::feed_detail(page.as_ref(), timings, feed_id, xsec_token).await
        })
        .await
    }

    pub async fn user_profile(&self, ctx: &OpContext, user_id: &str, xsec_token: &str) -> PilotResult<UserProfile> {
        let timings = &self.config.timings;
        self.with_page(ctx, "user_profile", |page| async move {
            user_profile::user_profile(page.as_ref(), timings, user_id, xsec_token).await
        })
        .await
    }

    pub async fn post_comment(
        &self,
        ctx: &OpContext,
        feed_id: &str,
        xsec_token: &str,
        content: &str,
    ) -> PilotResult<PostCommentResponse> {
        let timings = &self.config.timings;
        self.with_page(ctx, "post_comment", |page| async move {
            comment::post_comment(page.as_ref(), timings, feed_id, xsec_token, content).await
        })
        .await?;
        Ok(PostCommentResponse {
            feed_id: feed_id.to_string(),
            success: true,
            message: "comment posted".to_string(),
        })
    }

    pub async fn like_feed(&self, ctx: &OpContext, feed_id: &str, xsec_token: &str) -> PilotResult<ActionResult> {
        self.toggle(ctx, feed_id, xsec_token, Toggle::Like, true).await
    }

    pub async fn unlike_feed(&self, ctx: &OpContext, feed_id: &str, xsec_token: &str) -> PilotResult<ActionResult> {
        self.toggle(ctx, feed_id, xsec_token, Toggle::Like, false).await
    }

    pub async fn favorite_feed(&self, ctx: &OpContext, feed_id: &str, xsec_token: &str) -> PilotResult<ActionResult> {
        self.toggle(ctx, feed_id, xsec_token, Toggle::Favorite, true).await
    }

    pub async fn unfavorite_feed(&self, ctx: &OpContext, feed_id: &str, xsec_token: &str) -> PilotResult<ActionResult> {
        self.toggle(ctx, feed_id, xsec_token, Toggle::Favorite, false).await
    }

    async fn toggle(
        &self,
        ctx: &OpContext,
        feed_id: &str,
        xsec_token: &str,
        toggle: Toggle,
        on: bool,
    ) -> PilotResult<ActionResult> {
        let timings = &self.config.timings;
        let verb = toggle.verb(on);
        let outcome = self
            .with_page(ctx, verb, |page| async move {
                interact::set_toggle(page.as_ref(), timings, feed_id, xsec_token, toggle, on).await
            })
            .await?;

        let message = match outcome {
            ToggleOutcome::AlreadyInState => format!("already {verb}d, nothing to do"),
            ToggleOutcome::Applied => format!("{verb}d"),
        };
        Ok(ActionResult {
            feed_id: feed_id.to_string(),
            success: true,
            message,
        })
    }

    /// Download images for later publishing. `dir` defaults to the configured images directory.
    pub async fn download_images(
        &self,
        ctx: &OpContext,
        images: &[String],
        dir: Option<PathBuf>,
    ) -> PilotResult<DownloadImagesResponse> {
        if images.is_empty() {
            return Err(PilotError::Validation("no images given".to_string()));
        }
        let downloader = ImageDownloader::new(dir.unwrap_or_else(|| self.config.images_dir.clone()))?;
        let saved = guarded(ctx, "download_images", downloader.acquire(images)).await?;
        let saved_paths: Vec<String> = saved.iter().map(|p| p.display().to_string()).collect();
        Ok(DownloadImagesResponse {
            count: saved_paths.len(),
            saved_paths,
        })
    }

    pub async fn shutdown(&self) -> PilotResult<()> {
        tracing::info!("Shutting down browser ({} pages open)", self.browser.active_pages());
        self.browser.shutdown().await
    }
}

/// Owns an operation's page until it is closed or handed off.
///
/// Dropping an armed guard, e.g. when the caller abandons the operation
/// future, closes the page on a spawned task.
struct PageGuard {
    page: Arc<dyn PageHandle>,
    name: &'static str,
    armed: bool,
}

impl PageGuard {
    fn new(page: Arc<dyn PageHandle>, name: &'static str) -> Self {
        Self {
            page,
            name,
            armed: true,
        }
    }

    fn handle(&self) -> Arc<dyn PageHandle> {
        Arc::clone(&self.page)
    }

    async fn close(mut self) {
        if let Err(e) = self.page.close().await {
            tracing::warn!("{}: failed to close page: {e}", self.name);
        }
        self.armed = false;
    }

    /// Hand the page to a new owner, who becomes responsible for closing it.
    fn detach(mut self) -> Arc<dyn PageHandle> {
        self.armed = false;
        Arc::clone(&self.page)
    }
}

impl Drop for PageGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let page = Arc::clone(&self.page);
        let name = self.name;
        tracing::debug!("{name}: abandoned, closing page");
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    if let Err(e) = page.close().await {
                        tracing::warn!("{name}: failed to close abandoned page: {e}");
                    }
                });
            }
            Err(_) => tracing::warn!("{name}: no runtime to close abandoned page"),
        }
    }
}

/// Run `fut` under `ctx`, turning a panic into [`PilotError::Internal`].
async fn guarded<T, Fut>(ctx: &OpContext, name: &str, fut: Fut) -> PilotResult<T>
where
    Fut: Future<Output = PilotResult<T>>,
{
    ctx.guard(async {
        match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::error!("{name} panicked: {message}");
                Err(PilotError::Internal(format!("{name} panicked: {message}")))
            }
        }
    })
    .await
}

/// `4m0s` style rendering.
fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs >= 60 {
        format!("{}m{}s", secs / 60, secs % 60)
    } else {
        format!("{secs}s")
    }
}
