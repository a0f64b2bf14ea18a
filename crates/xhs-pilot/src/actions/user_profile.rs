//! Author profile with the notes shown on it.

use crate::browser::PageHandle;
use crate::config::Timings;
use crate::extractor;
use crate::mapper;
use crate::navigator;
use crate::platform;
use crate::schema::Recipe;
use crate::types::{PilotResult, UserProfile};

use super::require;

pub async fn user_profile(
    page: &dyn PageHandle,
    timings: &Timings,
    user_id: &str,
    xsec_token: &str,
) -> PilotResult<UserProfile> {
    require(user_id, "user_id")?;
    require(xsec_token, "xsec_token")?;

    navigator::navigate(page, &platform::user_profile_url(user_id, xsec_token), timings).await?;
    let json = extractor::extract(page, &Recipe::user_profile()).await;
    let profile = mapper::map_user_profile(&json, user_id)?;
    tracing::debug!("Profile {user_id} has {} notes", profile.feeds.len());
    Ok(profile)
}
