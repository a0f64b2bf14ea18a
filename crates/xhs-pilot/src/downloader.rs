//! Image acquisition for publishing.
//!
//! HTTP(S) inputs are downloaded into the images directory; anything else is
//! treated as a local path and must exist.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::types::{PilotError, PilotResult};

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Largest accepted image body.
pub const MAX_IMAGE_BYTES: u64 = 20 * 1024 * 1024;

/// Whether `input` should be fetched over HTTP.
pub fn is_image_url(input: &str) -> bool {
    let lower = input.trim().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

pub struct ImageDownloader {
    dir: PathBuf,
    client: reqwest::Client,
    max_bytes: u64,
}

impl ImageDownloader {
    pub fn new(dir: impl Into<PathBuf>) -> PilotResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .map_err(|e| PilotError::Download(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            dir: dir.into(),
            client,
            max_bytes: MAX_IMAGE_BYTES,
        })
    }

    /// Override the body size limit.
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Download one image and return where it was saved.
    pub async fn download(&self, url: &str) -> PilotResult<PathBuf> {
        let parsed = url::Url::parse(url)
            .map_err(|e| PilotError::Validation(format!("invalid image URL {url}: {e}")))?;
        if parsed.host_str().is_none() {
            return Err(PilotError::Validation(format!("image URL {url} has no host")));
        }

        let mut response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| PilotError::Download(format!("{url}: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(PilotError::Download(format!("{url}: HTTP {status}")));
        }
        let too_large = || {
            PilotError::Download(format!("{url}: image exceeds {} bytes", self.max_bytes))
        };
        if response.content_length().is_some_and(|len| len > self.max_bytes) {
            return Err(too_large());
        }
        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| PilotError::Download(format!("{url}: {e}")))?
        {
            if (bytes.len() + chunk.len()) as u64 > self.max_bytes {
                return Err(too_large());
            }
            bytes.extend_from_slice(&chunk);
        }

        let format = image::guess_format(&bytes)
            .map_err(|_| PilotError::Download(format!("{url}: not a recognised image")))?;
        let ext = format.extensions_str().first().copied().unwrap_or("img");

        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(format!("img_{}.{ext}", uuid::Uuid::new_v4().simple()));
        tokio::fs::write(&path, &bytes).await?;
        tracing::debug!("Downloaded {url} to {}", path.display());
        Ok(path)
    }

    /// Resolve a mixed list of URLs and local paths, keeping input order.
    ///
    /// Every input is attempted; any failure fails the whole batch with all
    /// failures listed, and the files it downloaded are removed.
    pub async fn acquire(&self, inputs: &[String]) -> PilotResult<Vec<PathBuf>> {
        let mut paths = Vec::with_capacity(inputs.len());
        let mut downloaded = Vec::new();
        let mut failures = Vec::new();

        for input in inputs {
            let input = input.trim();
            if is_image_url(input) {
                match self.download(input).await {
                    Ok(path) => {
                        downloaded.push(path.clone());
                        paths.push(path);
                    }
                    Err(e) => failures.push(e.to_string()),
                }
            } else {
                let path = PathBuf::from(input);
                if path.is_file() {
                    paths.push(path);
                } else {
                    failures.push(format!("local image {input} does not exist"));
                }
            }
        }

        if failures.is_empty() {
            return Ok(paths);
        }
        for path in &downloaded {
            if let Err(e) = tokio::fs::remove_file(path).await {
                tracing::warn!("Failed to remove {}: {e}", path.display());
            }
        }
        Err(PilotError::Download(failures.join("; ")))
    }
}
