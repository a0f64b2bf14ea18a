//! Runtime configuration and environment resolution.

use std::path::PathBuf;
use std::time::Duration;

/// Timing knobs for navigation, hydration and action verification.
///
/// The settle delay and quiescence window are empirical values tuned against
/// the platform's hydration behaviour; slower networks may need larger ones.
#[derive(Debug, Clone)]
pub struct Timings {
    /// Hard budget for navigation plus DOM stability.
    pub navigation_budget: Duration,
    /// Window during which the DOM fingerprint must not change.
    pub quiet_window: Duration,
    /// Poll interval while waiting for stability.
    pub stability_poll: Duration,
    /// Extra wait after stability so client-side state can populate.
    pub settle_delay: Duration,
    /// Upper bound for waiting on the global state object.
    pub hydration_timeout: Duration,
    /// How long an action waits for its state change to show up.
    pub verification_timeout: Duration,
    pub verification_poll: Duration,
    pub upload_timeout: Duration,
    pub video_processing_timeout: Duration,
    /// Lifetime of the background QR login waiter.
    pub login_timeout: Duration,
    /// Default deadline for a whole operation.
    pub operation_timeout: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            navigation_budget: Duration::from_secs(60),
            quiet_window: Duration::from_secs(1),
            stability_poll: Duration::from_millis(200),
            settle_delay: Duration::from_secs(1),
            hydration_timeout: Duration::from_secs(10),
            verification_timeout: Duration::from_secs(10),
            verification_poll: Duration::from_millis(300),
            upload_timeout: Duration::from_secs(60),
            video_processing_timeout: Duration::from_secs(600),
            login_timeout: Duration::from_secs(240),
            operation_timeout: Duration::from_secs(300),
        }
    }
}

/// Top-level configuration for the pilot service.
#[derive(Debug, Clone)]
pub struct PilotConfig {
    pub headless: bool,
    /// Explicit browser binary; discovered automatically when `None`.
    pub browser_bin: Option<PathBuf>,
    pub cookies_path: PathBuf,
    /// Where downloaded images are stored before upload.
    pub images_dir: PathBuf,
    pub timings: Timings,
}

impl Default for PilotConfig {
    fn default() -> Self {
        Self {
            headless: true,
            browser_bin: None,
            cookies_path: default_data_dir().join("cookies.json"),
            images_dir: default_data_dir().join("images"),
            timings: Timings::default(),
        }
    }
}

impl PilotConfig {
    /// Build a configuration from defaults overridden by `XHS_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(headless) = env_bool("XHS_HEADLESS") {
            config.headless = headless;
        }
        if let Ok(bin) = std::env::var("XHS_BROWSER_BIN") {
            if !bin.is_empty() {
                config.browser_bin = Some(PathBuf::from(bin));
            }
        }
        if let Ok(path) = std::env::var("XHS_COOKIES_PATH") {
            if !path.is_empty() {
                config.cookies_path = PathBuf::from(path);
            }
        }
        if let Ok(dir) = std::env::var("XHS_IMAGES_DIR") {
            if !dir.is_empty() {
                config.images_dir = PathBuf::from(dir);
            }
        }
        if let Some(secs) = env_u64("XHS_NAV_TIMEOUT_SECS") {
            config.timings.navigation_budget = Duration::from_secs(secs);
        }
        if let Some(ms) = env_u64("XHS_SETTLE_DELAY_MS") {
            config.timings.settle_delay = Duration::from_millis(ms);
        }
        if let Some(secs) = env_u64("XHS_OPERATION_TIMEOUT_SECS") {
            config.timings.operation_timeout = Duration::from_secs(secs);
        }

        config
    }
}

/// `~/.xhs-pilot`, or `./.xhs-pilot` when no home directory is known.
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".xhs-pilot")
}

fn env_bool(key: &str) -> Option<bool> {
    let value = std::env::var(key).ok()?;
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        other => {
            tracing::warn!("Ignoring {key}={other}: expected a boolean");
            None
        }
    }
}

fn env_u64(key: &str) -> Option<u64> {
    let value = std::env::var(key).ok()?;
    match value.trim().parse() {
        Ok(n) => Some(n),
        Err(_) => {
            tracing::warn!("Ignoring {key}={value}: expected an integer");
            None
        }
    }
}
