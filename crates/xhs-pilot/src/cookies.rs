//! Session cookie persistence.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::types::{PilotError, PilotResult};

/// A JSON file holding the browser's cookies between runs.
#[derive(Debug, Clone)]
pub struct CookieJar {
    path: PathBuf,
}

impl CookieJar {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load saved cookies. A missing file is an empty jar.
    pub fn load(&self) -> PilotResult<Vec<Value>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = std::fs::read_to_string(&self.path)?;
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&data).map_err(|source| PilotError::Parse {
            context: "cookie jar",
            source,
        })
    }

    pub fn save(&self, cookies: &[Value]) -> PilotResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(cookies).map_err(|source| PilotError::Parse {
            context: "cookie jar",
            source,
        })?;
        std::fs::write(&self.path, data)?;
        tracing::debug!("Saved {} cookies to {}", cookies.len(), self.path.display());
        Ok(())
    }

    /// Remove the saved session.
    pub fn clear(&self) -> PilotResult<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let jar = CookieJar::new(dir.path().join("cookies.json"));
        assert!(jar.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let jar = CookieJar::new(dir.path().join("nested/cookies.json"));
        let cookies = vec![json!({ "name": "web_session", "value": "abc", "domain": ".xiaohongshu.com" })];
        jar.save(&cookies).unwrap();
        assert_eq!(jar.load().unwrap(), cookies);
        jar.clear().unwrap();
        assert!(jar.load().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = CookieJar::new(path).load().unwrap_err();
        assert_eq!(err.kind(), "parse_error");
    }
}
