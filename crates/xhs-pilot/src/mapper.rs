//! Typed mapping of extracted state.
//!
//! Pure and synchronous: the same input always maps to the same output.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;

use crate::types::{Feed, FeedDetailResponse, PilotError, PilotResult, UserProfile};

#[derive(Deserialize)]
struct FeedsRef {
    #[serde(rename = "_value")]
    value: Vec<Feed>,
}

#[derive(Deserialize)]
struct SearchRoot {
    search: SearchFeeds,
}

#[derive(Deserialize)]
struct SearchFeeds {
    feeds: FeedsRef,
}

#[derive(Deserialize)]
struct HomeRoot {
    feed: HomeFeeds,
}

#[derive(Deserialize)]
struct HomeFeeds {
    feeds: FeedsRef,
}

#[derive(Deserialize)]
struct DetailRoot {
    note: DetailMap,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetailMap {
    note_detail_map: HashMap<String, FeedDetailResponse>,
}

#[derive(Deserialize)]
struct ProfileRoot {
    user: ProfilePage,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfilePage {
    user_page_data: UserProfile,
    #[serde(default)]
    notes: Vec<Vec<Feed>>,
}

/// Decode an extractor result. The empty sentinel means the page had no state.
fn decode<T: DeserializeOwned>(json: &str, context: &'static str) -> PilotResult<T> {
    if json.trim().is_empty() {
        return Err(PilotError::StateUnavailable(format!(
            "no {context} state on the page"
        )));
    }
    serde_json::from_str(json).map_err(|source| PilotError::Parse { context, source })
}

pub fn map_search(json: &str) -> PilotResult<Vec<Feed>> {
    let root: SearchRoot = decode(json, "search")?;
    Ok(root.search.feeds.value)
}

pub fn map_home_feeds(json: &str) -> PilotResult<Vec<Feed>> {
    let root: HomeRoot = decode(json, "home feeds")?;
    Ok(root.feed.feeds.value)
}

/// Select `feed_id` from the keyed detail mapping.
pub fn map_feed_detail(json: &str, feed_id: &str) -> PilotResult<FeedDetailResponse> {
    let mut root: DetailRoot = decode(json, "feed detail")?;
    root.note
        .note_detail_map
        .remove(feed_id)
        .ok_or_else(|| PilotError::NotFound {
            entity: "feed",
            id: feed_id.to_string(),
        })
}

/// Profile with its note tabs flattened in order.
pub fn map_user_profile(json: &str, user_id: &str) -> PilotResult<UserProfile> {
    let root: ProfileRoot = decode(json, "user profile")?;
    let mut profile = root.user.user_page_data;
    profile.user_id = user_id.to_string();
    profile.feeds = root.user.notes.into_iter().flatten().collect();
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH: &str = r#"{"search":{"feeds":{"_value":[
        {"id":"n1","xsecToken":"t1","noteCard":{"displayTitle":"Kyoto in autumn","interactInfo":{"likedCount":"1.2k"}}},
        {"id":"n2","xsecToken":"t2","noteCard":{}}
    ]}}}"#;

    #[test]
    fn test_map_search() {
        let feeds = map_search(SEARCH).unwrap();
        assert_eq!(feeds.len(), 2);
        assert_eq!(feeds[0].note_card.display_title, "Kyoto in autumn");
        assert_eq!(feeds[0].note_card.interact_info.liked_count, "1.2k");
        assert_eq!(feeds[1].note_card.display_title, "");
    }

    #[test]
    fn test_map_is_idempotent() {
        assert_eq!(map_search(SEARCH).unwrap(), map_search(SEARCH).unwrap());
    }

    #[test]
    fn test_empty_is_state_unavailable() {
        assert!(matches!(map_search(""), Err(PilotError::StateUnavailable(_))));
        assert!(matches!(
            map_feed_detail("", "abc"),
            Err(PilotError::StateUnavailable(_))
        ));
    }

    #[test]
    fn test_malformed_is_parse_error() {
        assert!(matches!(map_search("{\"search\":"), Err(PilotError::Parse { .. })));
        assert!(matches!(
            map_home_feeds(r#"{"feed":{"feeds":{"_value":"nope"}}}"#),
            Err(PilotError::Parse { context: "home feeds", .. })
        ));
    }

    #[test]
    fn test_detail_missing_id_is_not_found() {
        let json = r#"{"note":{"noteDetailMap":{"abc123":{"note":{"id":"abc123","title":"T"}}}}}"#;
        let found = map_feed_detail(json, "abc123").unwrap();
        assert_eq!(found.note.title, "T");
        assert!(found.comments.comments.is_empty());

        match map_feed_detail(json, "xyz999") {
            Err(PilotError::NotFound { entity, id }) => {
                assert_eq!(entity, "feed");
                assert_eq!(id, "xyz999");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_profile_flattens_tabs() {
        let json = r#"{"user":{
            "userPageData":{"basicInfo":{"nickname":"Mia","redId":"42"},
                "interactions":[{"type":"fans","name":"粉丝","count":"10"}]},
            "notes":[[{"id":"a"},{"id":"b"}],[],[{"id":"c"}]]
        }}"#;
        let profile = map_user_profile(json, "u1").unwrap();
        assert_eq!(profile.user_id, "u1");
        assert_eq!(profile.basic_info.nickname, "Mia");
        assert_eq!(profile.interactions[0].kind, "fans");
        let ids: Vec<_> = profile.feeds.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }
}
