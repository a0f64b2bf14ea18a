//! Resolve the service configuration from CLI flags over `XHS_*` environment
//! variables over defaults.

use std::path::PathBuf;

use xhs_pilot::PilotConfig;

/// Settings the command line may override.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// `Some(false)` shows the browser window.
    pub headless: Option<bool>,
    pub browser_bin: Option<PathBuf>,
    pub cookies: Option<PathBuf>,
    pub images_dir: Option<PathBuf>,
}

pub fn resolve_config(overrides: CliOverrides) -> PilotConfig {
    apply(PilotConfig::from_env(), overrides)
}

fn apply(mut config: PilotConfig, overrides: CliOverrides) -> PilotConfig {
    if let Some(headless) = overrides.headless {
        config.headless = headless;
    }
    if overrides.browser_bin.is_some() {
        config.browser_bin = overrides.browser_bin;
    }
    if let Some(cookies) = overrides.cookies {
        config.cookies_path = cookies;
    }
    if let Some(dir) = overrides.images_dir {
        config.images_dir = dir;
    }
    config
}

/// Bearer token for the HTTP transport: flag, then `XHS_PILOT_TOKEN`.
pub fn resolve_token(explicit: Option<String>) -> Option<String> {
    explicit
        .or_else(|| std::env::var("XHS_PILOT_TOKEN").ok())
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let base = PilotConfig::default();
        let config = apply(
            base.clone(),
            CliOverrides {
                headless: Some(false),
                cookies: Some(PathBuf::from("/tmp/jar.json")),
                ..CliOverrides::default()
            },
        );
        assert!(!config.headless);
        assert_eq!(config.cookies_path, PathBuf::from("/tmp/jar.json"));
        assert_eq!(config.images_dir, base.images_dir);
        assert_eq!(config.browser_bin, base.browser_bin);
    }

    #[test]
    fn test_explicit_token_wins() {
        assert_eq!(resolve_token(Some("abc".into())), Some("abc".to_string()));
        assert_eq!(resolve_token(Some(String::new())), None);
    }
}
