//! Plain-text document extraction.

use async_trait::async_trait;
use std::path::Path;
use studybox_core::transcript::DocumentExtractor;
use tracing::debug;

/// Mime type for a file, guessed from its extension.
pub fn mime_for_path(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

pub fn is_image(mime_type: &str) -> bool {
    mime_type.starts_with("image/")
}

/// Extracts text from text-like documents.
///
/// `text/*`, JSON, XML and unknown types that happen to be valid UTF-8 are
/// returned as-is; anything else (binary formats) yields an empty string.
#[derive(Debug, Clone, Default)]
pub struct PlainTextExtractor;

fn is_text_like(mime_type: &str) -> bool {
    mime_type.starts_with("text/")
        || matches!(
            mime_type,
            "application/json" | "application/xml" | "application/x-yaml" | "application/toml"
        )
}

#[async_trait]
impl DocumentExtractor for PlainTextExtractor {
    async fn extract_text(&self, bytes: &[u8], mime_type: &str) -> String {
        let text = match std::str::from_utf8(bytes) {
            Ok(text) => text.to_string(),
            Err(_) if is_text_like(mime_type) => String::from_utf8_lossy(bytes).into_owned(),
            Err(_) => {
                debug!(mime_type, bytes = bytes.len(), "[Document] No extractable text");
                return String::new();
            }
        };
        // NUL bytes mean a binary format that happened to decode.
        if text.contains('\0') {
            return String::new();
        }
        text.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_text_passes_through() {
        let text = PlainTextExtractor
            .extract_text(b"  Notes on photosynthesis\n", "text/plain")
            .await;
        assert_eq!(text, "Notes on photosynthesis");
    }

    #[tokio::test]
    async fn test_binary_yields_empty() {
        let text = PlainTextExtractor
            .extract_text(&[0xff, 0xfe, 0x00, 0x81], "application/pdf")
            .await;
        assert!(text.is_empty());
    }

    #[tokio::test]
    async fn test_lossy_for_text_mimes() {
        let text = PlainTextExtractor
            .extract_text(&[b'a', 0xff, b'b'], "text/markdown")
            .await;
        assert!(text.starts_with('a') && text.ends_with('b'));
    }

    #[test]
    fn test_mime_guessing() {
        assert_eq!(mime_for_path(Path::new("notes.txt")), "text/plain");
        assert_eq!(mime_for_path(Path::new("scan.png")), "image/png");
        assert_eq!(mime_for_path(Path::new("blob")), "application/octet-stream");
        assert!(is_image("image/jpeg"));
        assert!(!is_image("application/pdf"));
    }
}
