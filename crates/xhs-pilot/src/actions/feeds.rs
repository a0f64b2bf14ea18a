//! Home page recommendations.

use crate::browser::PageHandle;
use crate::config::Timings;
use crate::extractor;
use crate::mapper;
use crate::navigator;
use crate::platform;
use crate::schema::Recipe;
use crate::types::{Feed, PilotResult};

pub async fn home_feeds(page: &dyn PageHandle, timings: &Timings) -> PilotResult<Vec<Feed>> {
    navigator::navigate(page, &platform::explore_url(), timings).await?;
    let json = extractor::extract(page, &Recipe::home_feeds()).await;
    mapper::map_home_feeds(&json)
}
