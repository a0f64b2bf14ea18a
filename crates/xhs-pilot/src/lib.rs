//! xhs-pilot: browser-driven feed extraction and social actions for Xiaohongshu.

pub mod actions;
pub mod browser;
pub mod config;
pub mod context;
pub mod cookies;
pub mod downloader;
pub mod extractor;
pub mod mapper;
pub mod navigator;
pub mod platform;
pub mod schema;
pub mod service;
pub mod types;
pub mod validation;

pub use browser::chromium::ChromiumBrowser;
#[cfg(any(test, feature = "testing"))]
pub use browser::scripted::{Fixture, ScriptedBrowser, ScriptedElement};
pub use browser::{Browser, NoopBrowser, PageHandle};
pub use config::{PilotConfig, Timings};
pub use context::OpContext;
pub use cookies::CookieJar;
pub use schema::{Recipe, Shape};
pub use service::{
    DownloadImagesResponse, FeedsListResponse, LoginQrcodeResponse, LoginStatusResponse,
    PilotService, PostCommentResponse, PublishRequest, PublishResponse, PublishVideoRequest,
};
pub use types::*;
