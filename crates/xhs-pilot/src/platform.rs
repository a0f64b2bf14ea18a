//! Platform URLs and DOM selectors.
//!
//! Query parameter names are required verbatim by the platform.

pub const BASE_URL: &str = "https://www.xiaohongshu.com";
pub const PUBLISH_URL: &str = "https://creator.xiaohongshu.com/publish/publish?source=official";

/// Name of the global object the client hydrates.
pub const STATE_GLOBAL: &str = "__INITIAL_STATE__";

pub fn explore_url() -> String {
    format!("{BASE_URL}/explore")
}

pub fn feed_detail_url(feed_id: &str, xsec_token: &str) -> String {
    format!("{BASE_URL}/explore/{feed_id}?xsec_token={xsec_token}&xsec_source=pc_feed")
}

pub fn search_url(keyword: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("keyword", keyword)
        .append_pair("source", "web_explore_feed")
        .finish();
    format!("{BASE_URL}/search_result?{query}")
}

pub fn user_profile_url(user_id: &str, xsec_token: &str) -> String {
    format!("{BASE_URL}/user/profile/{user_id}?xsec_token={xsec_token}&xsec_source=pc_note")
}

/// CSS selectors for the controls the executors drive.
pub mod selectors {
    /// Present only for a logged-in session.
    pub const LOGGED_IN_MARKER: &str = ".main-container .user .link-wrapper .channel";
    pub const LOGIN_QRCODE: &str = ".login-container .qrcode-img";
    pub const LOGIN_MODAL: &str = ".login-container";

    pub const LIKE_BUTTON: &str = ".interact-container .left .like-lottie";
    pub const COLLECT_BUTTON: &str = ".interact-container .left .reds-icon.collect-icon";

    pub const COMMENT_TRIGGER: &str = "div.input-box div.content-edit span";
    pub const COMMENT_INPUT: &str = "div.input-box div.content-edit p.content-input";
    pub const COMMENT_SUBMIT: &str = "div.bottom button.submit";
    pub const COMMENT_TEXT: &str = ".comments-container .comment-item .content";

    pub const CREATOR_TAB: &str = "div.creator-tab";
    pub const UPLOAD_INPUT: &str = ".upload-input";
    pub const IMAGE_PREVIEW: &str = ".img-preview-area .pr";
    pub const TITLE_INPUT: &str = "div.d-input input";
    pub const CONTENT_EDITOR: &str = "div.ql-editor";
    pub const TOPIC_SUGGESTION: &str = "#creator-editor-topic-container .item";
    pub const PUBLISH_BUTTON: &str = ".publish-page-publish-btn button.bg-red";
    pub const PUBLISH_SUCCESS: &str = ".success-container";
}

/// Creator tab labels, matched by visible text.
pub const IMAGE_TAB_LABEL: &str = "上传图文";
pub const VIDEO_TAB_LABEL: &str = "上传视频";
