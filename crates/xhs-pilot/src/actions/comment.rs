//! Top-level comments on a note.

use crate::browser::PageHandle;
use crate::config::Timings;
use crate::navigator;
use crate::platform::{self, selectors};
use crate::types::{PilotError, PilotResult};
use crate::validation;

use super::{ensure_no_login_wall, poll_until, require};

/// Post `content` under `feed_id` and wait until it shows up in the list.
pub async fn post_comment(
    page: &dyn PageHandle,
    timings: &Timings,
    feed_id: &str,
    xsec_token: &str,
    content: &str,
) -> PilotResult<()> {
    require(feed_id, "feed_id")?;
    require(xsec_token, "xsec_token")?;
    validation::validate_content(content)?;
    let content = content.trim();

    navigator::navigate(page, &platform::feed_detail_url(feed_id, xsec_token), timings).await?;

    if !page.click(selectors::COMMENT_TRIGGER).await? {
        return Err(PilotError::ElementNotFound(selectors::COMMENT_TRIGGER.to_string()));
    }
    page.type_text(selectors::COMMENT_INPUT, content).await?;

    // Identical comments may already be shown; only a new one counts.
    let before = matching_comments(page, content).await?;

    if page
        .attribute(selectors::COMMENT_SUBMIT, "disabled")
        .await?
        .is_some()
    {
        return Err(PilotError::InteractionRejected(
            "comment submit button is disabled".to_string(),
        ));
    }
    if !page.click(selectors::COMMENT_SUBMIT).await? {
        return Err(PilotError::ElementNotFound(selectors::COMMENT_SUBMIT.to_string()));
    }

    poll_until(
        timings.verification_timeout,
        timings.verification_poll,
        "comment",
        feed_id,
        || async {
            ensure_no_login_wall(page, "comment").await?;
            Ok(matching_comments(page, content).await? > before)
        },
    )
    .await?;

    tracing::info!("Comment posted on {feed_id}");
    Ok(())
}

async fn matching_comments(page: &dyn PageHandle, content: &str) -> PilotResult<usize> {
    let visible = page.text_contents(selectors::COMMENT_TEXT).await?;
    Ok(visible.iter().filter(|text| text.trim() == content).count())
}
