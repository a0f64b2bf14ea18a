//! Publishing image and video notes through the creator page.

use std::path::PathBuf;

use crate::browser::PageHandle;
use crate::config::Timings;
use crate::navigator;
use crate::platform::{self, selectors};
use crate::types::{PilotError, PilotResult};
use crate::validation;

use super::poll_until;

/// An image note ready for upload. Images are local files.
#[derive(Debug, Clone, Default)]
pub struct ImagePost {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub images: Vec<PathBuf>,
}

impl ImagePost {
    pub fn validate(&self) -> PilotResult<()> {
        validation::validate_title(&self.title)?;
        validation::validate_content(&self.content)?;
        validation::validate_image_count(self.images.len())?;
        self.images
            .iter()
            .try_for_each(|p| validation::validate_media_file(p))
    }
}

#[derive(Debug, Clone, Default)]
pub struct VideoPost {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub video: PathBuf,
}

impl VideoPost {
    pub fn validate(&self) -> PilotResult<()> {
        validation::validate_title(&self.title)?;
        validation::validate_content(&self.content)?;
        validation::validate_media_file(&self.video)
    }
}

pub async fn publish_images(page: &dyn PageHandle, timings: &Timings, post: &ImagePost) -> PilotResult<()> {
    post.validate()?;

    navigator::navigate(page, platform::PUBLISH_URL, timings).await?;
    select_tab(page, platform::IMAGE_TAB_LABEL).await?;

    page.upload_files(selectors::UPLOAD_INPUT, &post.images).await?;
    let expected = post.images.len();
    poll_until(
        timings.upload_timeout,
        timings.verification_poll,
        "upload",
        &format!("{expected} images"),
        || async { Ok(page.element_count(selectors::IMAGE_PREVIEW).await? >= expected) },
    )
    .await?;
    tracing::debug!("{expected} image previews ready");

    fill_and_submit(page, timings, &post.title, &post.content, &post.tags).await
}

pub async fn publish_video(page: &dyn PageHandle, timings: &Timings, post: &VideoPost) -> PilotResult<()> {
    post.validate()?;

    navigator::navigate(page, platform::PUBLISH_URL, timings).await?;
    select_tab(page, platform::VIDEO_TAB_LABEL).await?;

    page.upload_files(selectors::UPLOAD_INPUT, std::slice::from_ref(&post.video))
        .await?;

    // The submit button stays disabled until transcoding finishes.
    let video_name = post.video.display().to_string();
    poll_until(
        timings.video_processing_timeout,
        timings.verification_poll,
        "video processing",
        &video_name,
        || async {
            Ok(page.element_exists(selectors::PUBLISH_BUTTON).await?
                && page
                    .attribute(selectors::PUBLISH_BUTTON, "disabled")
                    .await?
                    .is_none())
        },
    )
    .await?;

    fill_and_submit(page, timings, &post.title, &post.content, &post.tags).await
}

async fn select_tab(page: &dyn PageHandle, label: &str) -> PilotResult<()> {
    if page.click_text(selectors::CREATOR_TAB, label).await? {
        Ok(())
    } else {
        Err(PilotError::ElementNotFound(format!(
            "{} \"{label}\"",
            selectors::CREATOR_TAB
        )))
    }
}

async fn fill_and_submit(
    page: &dyn PageHandle,
    timings: &Timings,
    title: &str,
    content: &str,
    tags: &[String],
) -> PilotResult<()> {
    page.type_text(selectors::TITLE_INPUT, title.trim()).await?;
    page.type_text(selectors::CONTENT_EDITOR, content.trim()).await?;

    for tag in tags {
        let tag = tag.trim().trim_start_matches('#');
        if tag.is_empty() {
            continue;
        }
        page.type_text(selectors::CONTENT_EDITOR, &format!(" #{tag}"))
            .await?;
        tokio::time::sleep(timings.stability_poll).await;
        if page.element_exists(selectors::TOPIC_SUGGESTION).await? {
            page.click(selectors::TOPIC_SUGGESTION).await?;
        }
    }

    if page
        .attribute(selectors::PUBLISH_BUTTON, "disabled")
        .await?
        .is_some()
    {
        return Err(PilotError::InteractionRejected(
            "publish button is disabled".to_string(),
        ));
    }
    if !page.click(selectors::PUBLISH_BUTTON).await? {
        return Err(PilotError::ElementNotFound(selectors::PUBLISH_BUTTON.to_string()));
    }

    poll_until(
        timings.verification_timeout,
        timings.verification_poll,
        "publish",
        title,
        || async {
            let url = page.current_url().await?;
            Ok(url.contains("published=true") || page.element_exists(selectors::PUBLISH_SUCCESS).await?)
        },
    )
    .await?;

    tracing::info!("Published {title:?}");
    Ok(())
}
