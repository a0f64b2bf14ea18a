//! Core data types for feeds, details, profiles, and action outcomes.

use serde::{Deserialize, Serialize};

/// One content item as it appears in search results and feed lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Feed {
    pub id: String,
    /// Access token required to deep-link to the detail or profile view.
    pub xsec_token: String,
    pub model_type: String,
    pub index: i64,
    pub note_card: NoteCard,
}

/// Card-level summary of a note.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NoteCard {
    #[serde(rename = "type")]
    pub note_type: String,
    pub display_title: String,
    pub user: User,
    pub interact_info: InteractInfo,
    pub cover: Cover,
    pub video: Option<Video>,
}

/// Author reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    pub user_id: String,
    pub nickname: String,
    pub avatar: String,
}

/// Interaction counters as the platform renders them ("1.2k", "10w+").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InteractInfo {
    pub liked: bool,
    pub liked_count: String,
    pub shared_count: String,
    pub comment_count: String,
    pub collected_count: String,
    pub collected: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Cover {
    pub width: u32,
    pub height: u32,
    pub url: String,
    pub file_id: String,
    pub url_pre: String,
    pub url_default: String,
    pub info_list: Vec<ImageScene>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageScene {
    pub image_scene: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Video {
    pub capa: VideoCapa,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoCapa {
    pub duration: f64,
}

/// Full view of a single note.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedDetail {
    pub id: String,
    pub title: String,
    pub desc: String,
    #[serde(rename = "type")]
    pub note_type: String,
    pub time: i64,
    pub last_update_time: i64,
    pub ip_location: String,
    pub user: User,
    pub image_list: Vec<DetailImage>,
    pub video: Option<DetailVideo>,
    pub interact_info: InteractInfo,
    pub tag_list: Vec<Tag>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DetailImage {
    pub width: u32,
    pub height: u32,
    pub url_default: String,
    pub url_pre: String,
    pub live_photo: bool,
}

/// Embedded video stream reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DetailVideo {
    pub media: VideoMedia,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoMedia {
    pub stream: VideoStream,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoStream {
    pub h264: StreamUrl,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StreamUrl {
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Tag {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub tag_type: String,
}

/// A comment on a note. Lists keep the source order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Comment {
    pub id: String,
    pub content: String,
    pub user: User,
    pub create_time: i64,
    pub ip_location: String,
    pub liked: bool,
    pub like_count: String,
    pub sub_comment_count: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommentList {
    pub comments: Vec<Comment>,
    pub has_more: bool,
    pub cursor: String,
}

/// One entry of the keyed detail mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedDetailResponse {
    pub note: FeedDetail,
    pub comments: CommentList,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserBasicInfo {
    pub nickname: String,
    /// Avatar URL.
    pub images: String,
    pub red_id: String,
    pub desc: String,
    pub gender: i64,
    pub ip_location: String,
}

/// Follows / followers / likes-received summary entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserInteraction {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub count: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub user_id: String,
    pub basic_info: UserBasicInfo,
    pub interactions: Vec<UserInteraction>,
    pub feeds: Vec<Feed>,
}

/// Outcome of a state-changing operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    pub feed_id: String,
    pub success: bool,
    pub message: String,
}

/// Errors that can occur while driving the platform.
#[derive(thiserror::Error, Debug)]
pub enum PilotError {
    #[error("Navigation to {url} timed out after {budget_ms}ms")]
    NavigationTimeout { url: String, budget_ms: u64 },

    #[error("Page state unavailable: {0}")]
    StateUnavailable(String),

    #[error("Failed to parse {context} state: {source}")]
    Parse {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Interaction rejected: {0}")]
    InteractionRejected(String),

    #[error("{action} on {target} was not confirmed within {timeout_ms}ms")]
    VerificationTimeout {
        action: String,
        target: String,
        timeout_ms: u64,
    },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Operation deadline of {0}ms exceeded")]
    DeadlineExceeded(u64),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Download error: {0}")]
    Download(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal fault: {0}")]
    Internal(String),
}

impl PilotError {
    /// Stable machine-readable code for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            PilotError::NavigationTimeout { .. } => "navigation_timeout",
            PilotError::StateUnavailable(_) => "state_unavailable",
            PilotError::Parse { .. } => "parse_error",
            PilotError::NotFound { .. } => "not_found",
            PilotError::ElementNotFound(_) => "element_not_found",
            PilotError::InteractionRejected(_) => "interaction_rejected",
            PilotError::VerificationTimeout { .. } => "verification_timeout",
            PilotError::Validation(_) => "validation_error",
            PilotError::Cancelled => "cancelled",
            PilotError::DeadlineExceeded(_) => "deadline_exceeded",
            PilotError::Browser(_) => "browser_error",
            PilotError::Download(_) => "download_error",
            PilotError::Io(_) => "io_error",
            PilotError::Internal(_) => "internal_error",
        }
    }
}

impl From<chromiumoxide::error::CdpError> for PilotError {
    fn from(e: chromiumoxide::error::CdpError) -> Self {
        PilotError::Browser(e.to_string())
    }
}

/// Convenience result type.
pub type PilotResult<T> = Result<T, PilotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_defaults_from_empty_object() {
        let feed: Feed = serde_json::from_str("{}").unwrap();
        assert_eq!(feed.id, "");
        assert_eq!(feed.note_card.interact_info.liked_count, "");
        assert!(feed.note_card.video.is_none());
        assert!(feed.note_card.cover.info_list.is_empty());
    }

    #[test]
    fn test_feed_uses_platform_field_names() {
        let feed = Feed {
            id: "n1".into(),
            xsec_token: "tok".into(),
            ..Default::default()
        };
        let json = serde_json::to_value(&feed).unwrap();
        assert_eq!(json["xsecToken"], "tok");
        assert!(json["noteCard"].get("displayTitle").is_some());
        assert!(json["noteCard"].get("type").is_some());
    }

    #[test]
    fn test_error_kinds_are_distinct() {
        let errors = [
            PilotError::StateUnavailable("x".into()),
            PilotError::NotFound {
                entity: "feed",
                id: "abc".into(),
            },
            PilotError::Parse {
                context: "search",
                source: serde_json::from_str::<Feed>("[").unwrap_err(),
            },
            PilotError::Validation("x".into()),
        ];
        let kinds: std::collections::HashSet<_> = errors.iter().map(|e| e.kind()).collect();
        assert_eq!(kinds.len(), errors.len());
    }

    #[test]
    fn test_not_found_message_names_id() {
        let err = PilotError::NotFound {
            entity: "feed",
            id: "abc123".into(),
        };
        assert_eq!(err.to_string(), "feed abc123 not found");
    }
}
