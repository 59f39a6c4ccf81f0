//! Story projection configuration

use chrono::Duration;
use hearth_core::{ConfigError, MemberId};
use serde::{Deserialize, Serialize};

use crate::story::VideoReference;

/// Default width of a basic-income bundle: three hours
pub const DEFAULT_MINT_BUNDLE_WINDOW_SECS: u64 = 3 * 60 * 60;

/// Default public location of member videos
pub const DEFAULT_VIDEO_BASE_URI: &str = "https://storage.googleapis.com/hearth-public-videos";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoryConfig {
    /// Basic-income mints within this many seconds of a bundle's first mint
    /// join that bundle (inclusive)
    pub mint_bundle_window_secs: u64,
    /// Base URI member invite videos live under
    pub video_base_uri: String,
}

impl Default for StoryConfig {
    fn default() -> Self {
        Self {
            mint_bundle_window_secs: DEFAULT_MINT_BUNDLE_WINDOW_SECS,
            video_base_uri: DEFAULT_VIDEO_BASE_URI.to_string(),
        }
    }
}

impl StoryConfig {
    pub fn with_mint_bundle_window_secs(mut self, secs: u64) -> Self {
        self.mint_bundle_window_secs = secs;
        self
    }

    pub fn with_video_base_uri(mut self, uri: impl Into<String>) -> Self {
        self.video_base_uri = uri.into();
        self
    }

    /// Load from a JSON document. Missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn mint_bundle_window(&self) -> Duration {
        i64::try_from(self.mint_bundle_window_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX)
    }

    /// The invite video a member recorded when joining
    pub fn member_video(&self, member: &MemberId) -> VideoReference {
        VideoReference::for_uri(format!(
            "{}/{}/invite.mp4",
            self.video_base_uri.trim_end_matches('/'),
            member
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoryConfig::default();
        assert_eq!(config.mint_bundle_window(), Duration::hours(3));
    }

    #[test]
    fn test_member_video() {
        let config = StoryConfig::default().with_video_base_uri("https://cdn.test/videos/");
        let video = config.member_video(&MemberId::from("alice"));
        assert_eq!(video.video_uri, "https://cdn.test/videos/alice/invite.mp4");
        assert_eq!(video.thumbnail_uri, "https://cdn.test/videos/alice/invite.mp4.thumb.jpg");
    }

    #[test]
    fn test_from_json() {
        let config = StoryConfig::from_json_str(r#"{"mint_bundle_window_secs": 60}"#).unwrap();
        assert_eq!(config.mint_bundle_window(), Duration::minutes(1));
        assert_eq!(config.video_base_uri, DEFAULT_VIDEO_BASE_URI);

        assert!(StoryConfig::from_json_str(r#"{"mint_bundle_window_secs": "soon"}"#).is_err());
    }
}
