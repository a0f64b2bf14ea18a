//! Keyword search.

use crate::browser::PageHandle;
use crate::config::Timings;
use crate::extractor;
use crate::mapper;
use crate::navigator;
use crate::platform;
use crate::schema::Recipe;
use crate::types::{Feed, PilotResult};

use super::require;

/// Search for `keyword` and return the result cards in page order.
pub async fn search(page: &dyn PageHandle, timings: &Timings, keyword: &str) -> PilotResult<Vec<Feed>> {
    require(keyword, "keyword")?;
    let keyword = keyword.trim();

    navigator::navigate(page, &platform::search_url(keyword), timings).await?;
    if !navigator::wait_until_hydrated(page, timings.hydration_timeout, timings.stability_poll).await {
        tracing::debug!("Search page for {keyword:?} did not hydrate in time");
    }

    let json = extractor::extract(page, &Recipe::search()).await;
    let feeds = mapper::map_search(&json)?;
    tracing::info!("Search {keyword:?} returned {} feeds", feeds.len());
    Ok(feeds)
}
