//! Local preconditions checked before any page is opened.

use std::path::Path;

use unicode_width::UnicodeWidthStr;

use crate::types::{PilotError, PilotResult};

/// Maximum title width in display columns.
pub const MAX_TITLE_WIDTH: usize = 40;
pub const MAX_IMAGES: usize = 18;

/// Display width in terminal columns. Wide East Asian characters and emoji
/// take two columns, combining marks none.
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

pub fn validate_title(title: &str) -> PilotResult<()> {
    if title.trim().is_empty() {
        return Err(PilotError::Validation("title must not be empty".to_string()));
    }
    let width = display_width(title);
    if width > MAX_TITLE_WIDTH {
        return Err(PilotError::Validation(format!(
            "title is {width} columns wide, limit is {MAX_TITLE_WIDTH}"
        )));
    }
    Ok(())
}

pub fn validate_content(content: &str) -> PilotResult<()> {
    if content.trim().is_empty() {
        return Err(PilotError::Validation("content must not be empty".to_string()));
    }
    Ok(())
}

pub fn validate_image_count(count: usize) -> PilotResult<()> {
    if count == 0 {
        return Err(PilotError::Validation("at least one image is required".to_string()));
    }
    if count > MAX_IMAGES {
        return Err(PilotError::Validation(format!(
            "{count} images given, at most {MAX_IMAGES} are allowed"
        )));
    }
    Ok(())
}

pub fn validate_media_file(path: &Path) -> PilotResult<()> {
    if !path.is_file() {
        return Err(PilotError::Validation(format!(
            "file {} does not exist",
            path.display()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_counts_cjk_double() {
        assert_eq!(display_width("travel"), 6);
        assert_eq!(display_width("旅行"), 4);
        assert_eq!(display_width("京都 trip"), 9);
        assert_eq!(display_width("e\u{0301}"), 1);
    }

    #[test]
    fn test_title_limit() {
        assert!(validate_title(&"a".repeat(40)).is_ok());
        assert!(validate_title(&"a".repeat(41)).is_err());
        assert!(validate_title(&"字".repeat(20)).is_ok());
        assert!(validate_title(&"字".repeat(21)).is_err());
        assert!(validate_title("   ").is_err());
    }

    #[test]
    fn test_title_emoji_are_double_width() {
        assert_eq!(display_width("🚀"), 2);
        assert_eq!(display_width("东京🍜"), 6);
        assert!(validate_title(&"🚀".repeat(20)).is_ok());
        assert!(validate_title(&"🚀".repeat(21)).is_err());
    }

    #[test]
    fn test_image_count_bounds() {
        assert!(validate_image_count(0).is_err());
        assert!(validate_image_count(1).is_ok());
        assert!(validate_image_count(18).is_ok());
        assert_eq!(validate_image_count(19).unwrap_err().kind(), "validation_error");
    }

    #[test]
    fn test_media_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("clip.mp4");
        assert!(validate_media_file(&file).is_err());
        std::fs::write(&file, b"x").unwrap();
        assert!(validate_media_file(&file).is_ok());
        assert!(validate_media_file(dir.path()).is_err());
    }

    #[test]
    fn test_content_non_empty() {
        assert!(validate_content("\n\t ").is_err());
        assert!(validate_content("hello").is_ok());
    }
}
