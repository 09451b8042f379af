//! Response Validator.
//!
//! Strips Markdown code fences from a raw reply and parses what remains into
//! the typed result of the action. There is no field-level repair: anything
//! that does not match the contract is a `MalformedResponse`.

use crate::bundle::{MindMapEdge, StudyBundle, validate_edges};
use crate::error::{Result, StudyError};
use crate::exam::{ExamQuestion, Grading, validate_questions};
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// The contract a reply must satisfy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectedShape {
    StudyBundle,
    Expansion,
    Exam,
    /// Grading must cover exactly these questions.
    Grading { question_ids: Vec<u32> },
    /// Free text (chat replies).
    Text,
}

/// A validated reply.
#[derive(Debug, Clone, PartialEq)]
pub enum StructuredResult {
    Bundle(StudyBundle),
    Expansion(Vec<MindMapEdge>),
    Exam(Vec<ExamQuestion>),
    Grading(Grading),
    Text(String),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExpansionReply {
    new_edges: Vec<MindMapEdge>,
}

#[derive(Deserialize)]
struct ExamReply {
    exam: Vec<ExamQuestion>,
}

/// Removes surrounding Markdown code-fence delimiters (```` ``` ```` or ```` ```json ````).
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json", "JSON", ...) up to the first newline.
    let body = match rest.find('\n') {
        Some(newline) if rest[..newline].chars().all(|c| c.is_ascii_alphanumeric()) => {
            &rest[newline + 1..]
        }
        _ => rest,
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

fn parse_json<T: DeserializeOwned>(body: &str, what: &str) -> Result<T> {
    serde_json::from_str(body)
        .map_err(|err| StudyError::malformed(format!("reply is not a valid {what}: {err}")))
}

/// Parses `raw` into the structure `shape` demands.
pub fn parse(raw: &str, shape: &ExpectedShape) -> Result<StructuredResult> {
    let body = strip_code_fences(raw);
    if body.is_empty() {
        return Err(StudyError::malformed("reply is empty"));
    }

    match shape {
        ExpectedShape::StudyBundle => {
            let bundle: StudyBundle = parse_json(body, "study bundle")?;
            bundle.validate()?;
            Ok(StructuredResult::Bundle(bundle))
        }
        ExpectedShape::Expansion => {
            let reply: ExpansionReply = parse_json(body, "expansion")?;
            validate_edges(&reply.new_edges)?;
            Ok(StructuredResult::Expansion(reply.new_edges))
        }
        ExpectedShape::Exam => {
            let reply: ExamReply = parse_json(body, "exam")?;
            validate_questions(&reply.exam)?;
            Ok(StructuredResult::Exam(reply.exam))
        }
        ExpectedShape::Grading { question_ids } => {
            let grading: Grading = parse_json(body, "grading")?;
            grading.validate_against(question_ids)?;
            Ok(StructuredResult::Grading(grading))
        }
        ExpectedShape::Text => Ok(StructuredResult::Text(body.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::fixtures::photosynthesis;
    use serde_json::json;

    #[test]
    fn test_fenced_reply_parses() {
        let raw = format!("```json\n{}\n```", serde_json::to_string(&photosynthesis()).unwrap());
        assert_eq!(
            parse(&raw, &ExpectedShape::StudyBundle).unwrap(),
            StructuredResult::Bundle(photosynthesis())
        );
    }

    #[test]
    fn test_prose_is_malformed() {
        let err = parse("not json at all", &ExpectedShape::StudyBundle).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_strip_code_fences_variants() {
        assert_eq!(strip_code_fences("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("  {}  "), "{}");
        assert_eq!(strip_code_fences("```{\"a\":1}```"), "{\"a\":1}");
    }

    #[test]
    fn test_bundle_reply_is_validated() {
        let mut bundle = json!(photosynthesis());
        let raw = format!("```json\n{}\n```", bundle);
        assert!(matches!(
            parse(&raw, &ExpectedShape::StudyBundle).unwrap(),
            StructuredResult::Bundle(b) if b.title == "Photosynthesis"
        ));

        bundle["quiz"][0]["correctOption"] = json!("Nucleolus");
        let err = parse(&bundle.to_string(), &ExpectedShape::StudyBundle).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let err = parse(r#"{"title":"T"}"#, &ExpectedShape::StudyBundle).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_expansion_reply() {
        let raw = r#"{"newEdges":[{"source":"Calvin cycle","target":"RuBisCO"}]}"#;
        let parsed = parse(raw, &ExpectedShape::Expansion).unwrap();
        assert_eq!(
            parsed,
            StructuredResult::Expansion(vec![MindMapEdge::new("Calvin cycle", "RuBisCO")])
        );
    }

    #[test]
    fn test_exam_reply() {
        let raw = json!({"exam": [
            {"id": 1, "type": "mcq", "question": "Pigment?", "options": ["Chlorophyll", "Keratin"], "correctAnswer": "Chlorophyll"},
            {"id": 2, "type": "mcq", "question": "Gas released?", "options": ["Oxygen", "Neon"], "correctAnswer": "Oxygen"},
            {"id": 3, "type": "mcq", "question": "Organelle?", "options": ["Chloroplast", "Ribosome"], "correctAnswer": "Chloroplast"},
            {"id": 4, "type": "text", "question": "Explain.", "correctAnswer": "Because."},
            {"id": 5, "type": "text", "question": "Why?"}
        ]});
        match parse(&raw.to_string(), &ExpectedShape::Exam).unwrap() {
            StructuredResult::Exam(questions) => assert_eq!(questions.len(), 5),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_grading_reply_must_cover_questions() {
        let raw = json!({
            "score": 50,
            "feedback": "Half right",
            "corrections": [
                {"questionId": 1, "isCorrect": true, "remark": "Yes"},
                {"questionId": 2, "isCorrect": false, "remark": "No"}
            ]
        })
        .to_string();
        assert!(parse(&raw, &ExpectedShape::Grading { question_ids: vec![1, 2] }).is_ok());
        assert!(
            parse(&raw, &ExpectedShape::Grading { question_ids: vec![1, 2, 3] })
                .unwrap_err()
                .is_malformed()
        );
    }

    #[test]
    fn test_text_reply_is_trimmed() {
        assert_eq!(
            parse("  Chlorophyll is green.\n", &ExpectedShape::Text).unwrap(),
            StructuredResult::Text("Chlorophyll is green.".to_string())
        );
    }
}
