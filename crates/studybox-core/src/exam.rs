//! Exam questions, submitted answers and grading.

use crate::error::{Result, StudyError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum QuestionKind {
    Mcq,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamQuestion {
    pub id: u32,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
}

/// Multiple-choice questions in every generated exam.
pub const EXAM_MCQ_COUNT: usize = 3;
/// Free-text questions in every generated exam.
pub const EXAM_TEXT_COUNT: usize = 2;

/// Checks a freshly generated question set.
///
/// Ids must be strictly increasing; multiple-choice questions need at least
/// two options and a correct answer among them. The set must have exactly
/// [`EXAM_MCQ_COUNT`] multiple-choice and [`EXAM_TEXT_COUNT`] free-text
/// questions.
pub fn validate_questions(questions: &[ExamQuestion]) -> Result<()> {
    if questions.is_empty() {
        return Err(StudyError::malformed("exam contains no questions"));
    }
    let mut previous: Option<u32> = None;
    for question in questions {
        if previous.is_some_and(|p| question.id <= p) {
            return Err(StudyError::malformed(format!(
                "exam question ids must be unique and increasing (saw {} after {})",
                question.id,
                previous.unwrap_or_default()
            )));
        }
        previous = Some(question.id);

        if question.kind == QuestionKind::Mcq {
            let options = question.options.as_deref().unwrap_or_default();
            if options.len() < 2 {
                return Err(StudyError::malformed(format!(
                    "multiple-choice question {} needs at least 2 options",
                    question.id
                )));
            }
            match &question.correct_answer {
                Some(answer) if options.contains(answer) => {}
                _ => {
                    return Err(StudyError::malformed(format!(
                        "multiple-choice question {} has no correct answer among its options",
                        question.id
                    )));
                }
            }
        }
    }

    let mcq = questions
        .iter()
        .filter(|q| q.kind == QuestionKind::Mcq)
        .count();
    let text = questions.len() - mcq;
    if mcq != EXAM_MCQ_COUNT || text != EXAM_TEXT_COUNT {
        return Err(StudyError::malformed(format!(
            "exam must have {EXAM_MCQ_COUNT} multiple-choice and {EXAM_TEXT_COUNT} free-text questions, got {mcq} and {text}"
        )));
    }
    Ok(())
}

/// Per-question verdict returned by the grader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Correction {
    pub question_id: u32,
    pub is_correct: bool,
    pub remark: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grading {
    /// 0..=100
    pub score: u32,
    pub feedback: String,
    pub corrections: Vec<Correction>,
}

impl Grading {
    /// Ensures exactly one correction per question and a score in range.
    pub fn validate_against(&self, question_ids: &[u32]) -> Result<()> {
        if self.score > 100 {
            return Err(StudyError::malformed(format!(
                "score {} is outside 0..=100",
                self.score
            )));
        }
        let expected: BTreeSet<u32> = question_ids.iter().copied().collect();
        let mut seen = BTreeSet::new();
        for correction in &self.corrections {
            if !expected.contains(&correction.question_id) {
                return Err(StudyError::malformed(format!(
                    "correction refers to unknown question {}",
                    correction.question_id
                )));
            }
            if !seen.insert(correction.question_id) {
                return Err(StudyError::malformed(format!(
                    "question {} was graded twice",
                    correction.question_id
                )));
            }
        }
        if seen.len() != expected.len() {
            return Err(StudyError::malformed(format!(
                "expected {} corrections, got {}",
                expected.len(),
                seen.len()
            )));
        }
        Ok(())
    }
}

/// Questions, the user's answers and, once graded, the grading.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamSession {
    pub questions: Vec<ExamQuestion>,
    pub answers: BTreeMap<u32, String>,
    pub grading: Option<Grading>,
}

impl ExamSession {
    pub fn new(questions: Vec<ExamQuestion>) -> Self {
        Self {
            questions,
            answers: BTreeMap::new(),
            grading: None,
        }
    }

    pub fn question(&self, id: u32) -> Option<&ExamQuestion> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Records an answer; the latest submission for a question wins.
    pub fn submit_answer(&mut self, id: u32, answer: impl Into<String>) -> Result<()> {
        if self.question(id).is_none() {
            return Err(StudyError::not_found("exam question", id.to_string()));
        }
        self.answers.insert(id, answer.into());
        Ok(())
    }

    /// Drops answers and grading, keeping the questions.
    pub fn clear_attempt(&mut self) {
        self.answers.clear();
        self.grading = None;
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_standard_exam_is_valid() {
        assert!(validate_questions(&standard_exam()).is_ok());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut questions = standard_exam();
        questions[1].id = 1;
        assert!(validate_questions(&questions).unwrap_err().is_malformed());
    }

    #[test]
    fn test_exam_shape_is_fixed() {
        let all_mcq: Vec<_> = (1..=10)
            .map(|id| mcq(id, "Pigment?", &["Chlorophyll", "Keratin"], "Chlorophyll"))
            .collect();
        let err = validate_questions(&all_mcq).unwrap_err();
        assert!(err.to_string().contains("got 10 and 0"));

        let short = standard_exam()[..4].to_vec();
        assert!(validate_questions(&short).unwrap_err().is_malformed());
    }

    #[test]
    fn test_mcq_answer_must_be_an_option() {
        let questions = vec![mcq(1, "Pigment?", &["Chlorophyll", "Keratin"], "Melanin")];
        assert!(validate_questions(&questions).unwrap_err().is_malformed());
    }

    #[test]
    fn test_question_type_wire_name() {
        let json = serde_json::to_value(text(4, "Explain.")).unwrap();
        assert_eq!(json["type"], "text");
        assert!(json.get("options").is_none());
    }

    #[test]
    fn test_grading_requires_one_correction_per_question() {
        let grading = Grading {
            score: 60,
            feedback: "Good effort".to_string(),
            corrections: vec![Correction {
                question_id: 1,
                is_correct: true,
                remark: "Right".to_string(),
            }],
        };
        assert!(grading.validate_against(&[1]).is_ok());
        assert!(grading.validate_against(&[1, 2]).unwrap_err().is_malformed());
        assert!(grading.validate_against(&[2]).unwrap_err().is_malformed());
    }

    #[test]
    fn test_submit_answer_unknown_question() {
        let mut session = ExamSession::new(standard_exam());
        assert!(session.submit_answer(3, "Chloroplast").is_ok());
        assert!(session.submit_answer(42, "??").is_err());
        session.clear_attempt();
        assert!(session.answers.is_empty());
        assert_eq!(session.questions.len(), 5);
    }
}
