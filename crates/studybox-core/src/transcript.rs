//! Transcript and document collaborators.
//!
//! Fetching captions and extracting document text happen outside the core;
//! these traits are the seams, and the helpers here only shape their output.

use crate::error::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// One caption line of a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    #[serde(rename = "offset")]
    pub offset_seconds: f64,
    pub text: String,
}

/// Yields the caption track of a video.
///
/// A video without captions is an `InvalidInput` error and is never retried.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn fetch_transcript(&self, video_id: &str) -> Result<Vec<TranscriptSegment>>;
}

/// Extracts plain text from an uploaded document.
///
/// Returns an empty string when nothing could be extracted.
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    async fn extract_text(&self, bytes: &[u8], mime_type: &str) -> String;
}

static VIDEO_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:youtube\.com/(?:watch\?(?:[^#\s]*&)?v=|shorts/|embed/|live/)|youtu\.be/)([A-Za-z0-9_-]{11})",
    )
    .expect("video id pattern is valid")
});

/// Pulls the 11-character video id out of a recognizable video link.
pub fn extract_video_id(url: &str) -> Option<String> {
    VIDEO_ID
        .captures(url.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Formats an offset as `[MM:SS]`; minutes keep counting past an hour.
pub fn format_timestamp(offset_seconds: f64) -> String {
    let total = if offset_seconds.is_finite() && offset_seconds > 0.0 {
        offset_seconds.floor() as u64
    } else {
        0
    };
    format!("[{:02}:{:02}]", total / 60, total % 60)
}

/// Renders segments one per line, each prefixed with its timestamp.
pub fn format_transcript(segments: &[TranscriptSegment]) -> String {
    segments
        .iter()
        .map(|segment| {
            format!(
                "{} {}",
                format_timestamp(segment.offset_seconds),
                segment.text.trim()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_video_id_variants() {
        let id = Some("dQw4w9WgXcQ".to_string());
        assert_eq!(extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"), id);
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ"),
            id
        );
        assert_eq!(extract_video_id("https://youtu.be/dQw4w9WgXcQ?t=42"), id);
        assert_eq!(extract_video_id("https://youtube.com/shorts/dQw4w9WgXcQ"), id);
        assert_eq!(extract_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ"), id);
    }

    #[test]
    fn test_extract_video_id_rejects_other_links() {
        assert_eq!(extract_video_id("https://vimeo.com/123456"), None);
        assert_eq!(extract_video_id("https://youtu.be/short"), None);
        assert_eq!(extract_video_id("Photosynthesis"), None);
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0), "[00:00]");
        assert_eq!(format_timestamp(65.9), "[01:05]");
        assert_eq!(format_timestamp(3723.0), "[62:03]");
        assert_eq!(format_timestamp(-4.0), "[00:00]");
    }

    #[test]
    fn test_format_transcript_lines() {
        let segments = vec![
            TranscriptSegment {
                offset_seconds: 1.2,
                text: " Welcome back ".into(),
            },
            TranscriptSegment {
                offset_seconds: 75.0,
                text: "Chlorophyll absorbs light".into(),
            },
        ];
        assert_eq!(
            format_transcript(&segments),
            "[00:01] Welcome back\n[01:15] Chlorophyll absorbs light"
        );
    }
}
