pub mod config;
pub mod error;
pub mod llm;
pub mod metadata;
pub mod outcome;
pub mod output;
pub mod pipeline;
pub mod prompt;
pub mod response;
pub mod server;
pub mod youtube;

use std::sync::LazyLock;

use regex::Regex;

pub use error::{PipelineError, Result};
pub use outcome::{Outcome, Recipe, RecipeResult, RecipeStep, Summary, SummaryResult};

pub const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

static VIDEO_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:youtube\.com/(?:watch\?v=|shorts/)|youtu\.be/)([a-zA-Z0-9_-]{11})").unwrap()
});

/// A single captioned segment
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub text: String,
    pub start: f64,
    pub duration: f64,
    pub start_label: String,
    pub end_label: String,
}

impl Segment {
    pub fn new(text: impl Into<String>, start: f64, duration: f64) -> Self {
        let start = start.max(0.0);
        let duration = duration.max(0.0);
        Segment {
            text: text.into(),
            start,
            duration,
            start_label: format_timestamp(start),
            end_label: format_timestamp(start + duration),
        }
    }

    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Title, description and canonical watch URL scraped for one video
#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub canonical_url: String,
}

impl VideoInfo {
    pub fn new(video_id: &str, title: String, description: String) -> Self {
        VideoInfo {
            video_id: video_id.to_string(),
            title,
            description,
            canonical_url: format!("{WATCH_URL}{video_id}"),
        }
    }

    /// Metadata block embedded in both prompt modes
    pub fn content_for_prompt(&self) -> String {
        format!("Title: {}\n\nDescription: {}", self.title, self.description)
    }
}

/// Extract the video ID from a watch, shorts or youtu.be URL.
///
/// The match is unanchored, so surrounding text and trailing query
/// parameters are ignored.
pub fn extract_video_id(input: &str) -> Option<String> {
    VIDEO_ID_RE.captures(input).map(|caps| caps[1].to_string())
}

/// Render seconds as `M:SS`. Minutes never roll over into hours.
pub fn format_timestamp(seconds: f64) -> String {
    let minutes = (seconds / 60.0) as u64;
    let secs = (seconds % 60.0) as u64;
    format!("{minutes}:{secs:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "dQw4w9WgXcQ";

    #[test]
    fn test_watch_url() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some(ID.to_string())
        );
    }

    #[test]
    fn test_watch_url_with_extra_params() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=120&list=PL123"),
            Some(ID.to_string())
        );
    }

    #[test]
    fn test_short_url() {
        assert_eq!(extract_video_id("https://youtu.be/dQw4w9WgXcQ"), Some(ID.to_string()));
    }

    #[test]
    fn test_short_url_with_share_param() {
        assert_eq!(
            extract_video_id("https://youtu.be/dQw4w9WgXcQ?si=abcdef"),
            Some(ID.to_string())
        );
    }

    #[test]
    fn test_shorts_url() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/shorts/dQw4w9WgXcQ?feature=share"),
            Some(ID.to_string())
        );
    }

    #[test]
    fn test_surrounding_noise() {
        assert_eq!(
            extract_video_id("look at this: youtube.com/watch?v=dQw4w9WgXcQ!!"),
            Some(ID.to_string())
        );
    }

    #[test]
    fn test_same_id_across_shapes() {
        let shapes = [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=1s",
            "http://m.youtube.com/shorts/dQw4w9WgXcQ?x=y",
            "youtu.be/dQw4w9WgXcQ#frag",
        ];
        for shape in shapes {
            assert_eq!(extract_video_id(shape).as_deref(), Some(ID), "shape: {shape}");
        }
    }

    #[test]
    fn test_invalid_url() {
        assert_eq!(extract_video_id("not-a-youtube-link"), None);
    }

    #[test]
    fn test_bare_id_is_not_accepted() {
        assert_eq!(extract_video_id("dQw4w9WgXcQ"), None);
    }

    #[test]
    fn test_embed_url_is_not_accepted() {
        assert_eq!(extract_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ"), None);
    }

    #[test]
    fn test_short_id_rejected() {
        assert_eq!(extract_video_id("https://youtu.be/abc123"), None);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(extract_video_id(""), None);
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0), "0:00");
        assert_eq!(format_timestamp(65.2), "1:05");
        assert_eq!(format_timestamp(599.99), "9:59");
    }

    #[test]
    fn test_format_timestamp_no_hour_rollover() {
        assert_eq!(format_timestamp(3723.0), "62:03");
        assert_eq!(format_timestamp(4503.0), "75:03");
    }

    #[test]
    fn test_segment_labels() {
        let seg = Segment::new("hello", 58.5, 3.0);
        assert_eq!(seg.start_label, "0:58");
        assert_eq!(seg.end_label, "1:01");
        assert!(seg.end() >= seg.start);
    }

    #[test]
    fn test_video_info_canonical_url() {
        let info = VideoInfo::new(ID, "T".to_string(), "D".to_string());
        assert_eq!(info.canonical_url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert_eq!(info.content_for_prompt(), "Title: T\n\nDescription: D");
    }
}
