//! Caption tracks stored as `<dir>/<video_id>.json`.

use async_trait::async_trait;
use std::path::PathBuf;
use studybox_core::error::{Result, StudyError};
use studybox_core::transcript::{TranscriptSegment, TranscriptSource};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct FileTranscriptSource {
    dir: PathBuf,
}

impl FileTranscriptSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl TranscriptSource for FileTranscriptSource {
    async fn fetch_transcript(&self, video_id: &str) -> Result<Vec<TranscriptSegment>> {
        if video_id.is_empty()
            || !video_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(StudyError::invalid_input(format!(
                "'{video_id}' is not a video id"
            )));
        }

        let path = self.dir.join(format!("{video_id}.json"));
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(StudyError::invalid_input(format!(
                    "no captions are available for video {video_id}"
                )));
            }
            Err(err) => return Err(err.into()),
        };

        let segments: Vec<TranscriptSegment> = serde_json::from_str(&content).map_err(|err| {
            StudyError::invalid_input(format!("captions for video {video_id} are unreadable: {err}"))
        })?;
        if segments.iter().all(|segment| segment.text.trim().is_empty()) {
            return Err(StudyError::invalid_input(format!(
                "captions for video {video_id} are empty"
            )));
        }

        debug!(video_id, segments = segments.len(), "[Transcript] Loaded captions");
        Ok(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_reads_segments() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("dQw4w9WgXcQ.json"),
            r#"[{"offset": 0.0, "text": "Hello"}, {"offset": 75.5, "text": "Chlorophyll"}]"#,
        )
        .unwrap();

        let segments = FileTranscriptSource::new(dir.path())
            .fetch_transcript("dQw4w9WgXcQ")
            .await
            .unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].offset_seconds, 75.5);
    }

    #[tokio::test]
    async fn test_missing_captions_are_invalid_input() {
        let dir = TempDir::new().unwrap();
        let err = FileTranscriptSource::new(dir.path())
            .fetch_transcript("dQw4w9WgXcQ")
            .await
            .unwrap_err();
        assert!(err.is_invalid_input());
        assert_eq!(err.http_status(), 400);
    }

    #[tokio::test]
    async fn test_empty_track_is_invalid_input() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("abcdefghijk.json"), "[]").unwrap();
        let err = FileTranscriptSource::new(dir.path())
            .fetch_transcript("abcdefghijk")
            .await
            .unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[tokio::test]
    async fn test_path_like_ids_are_rejected() {
        let dir = TempDir::new().unwrap();
        let err = FileTranscriptSource::new(dir.path())
            .fetch_transcript("../secret")
            .await
            .unwrap_err();
        assert!(err.is_invalid_input());
    }
}
