use crate::bundle::StudyBundle;

/// Derives the grounding text sent with every chat request.
///
/// Pure function of the bundle: the same bundle always yields the same text,
/// so chat answers stay consistent with what is on screen.
pub fn chat_context(bundle: &StudyBundle) -> String {
    let mut out = String::new();
    out.push_str(&format!("Title: {}\n\n", bundle.title.trim()));
    out.push_str(&format!("Summary:\n{}\n\n", bundle.summary.trim()));

    out.push_str("Key points:\n");
    for point in &bundle.key_points {
        out.push_str(&format!("- {}\n", point.trim()));
    }

    out.push_str("\nFlashcards:\n");
    for card in &bundle.flashcards {
        out.push_str(&format!("- {} :: {}\n", card.front.trim(), card.back.trim()));
    }
    out
}
