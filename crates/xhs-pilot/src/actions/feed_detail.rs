//! Single note with its first page of comments.

use crate::browser::PageHandle;
use crate::config::Timings;
use crate::extractor;
use crate::mapper;
use crate::navigator;
use crate::platform;
use crate::schema::Recipe;
use crate::types::{FeedDetailResponse, PilotResult};

use super::require;

pub async fn feed_detail(
    page: &dyn PageHandle,
    timings: &Timings,
    feed_id: &str,
    xsec_token: &str,
) -> PilotResult<FeedDetailResponse> {
    require(feed_id, "feed_id")?;
    require(xsec_token, "xsec_token")?;

    navigator::navigate(page, &platform::feed_detail_url(feed_id, xsec_token), timings).await?;
    let json = extractor::extract(page, &Recipe::feed_detail()).await;
    mapper::map_feed_detail(&json, feed_id)
}
