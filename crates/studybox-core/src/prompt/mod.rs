//! Prompt Compiler.
//!
//! Pure functions from a [`GenerationRequest`] (or [`ChatRequest`]) to
//! [`PromptParts`] plus the [`ExpectedShape`] the reply must satisfy. Each
//! action maps to one template pair: a system instruction demanding a raw JSON
//! object of a documented shape, and the content turn with the truncated
//! material.

pub mod templates;

use crate::config::LimitsConfig;
use crate::error::Result;
use crate::exam::ExamQuestion;
use crate::provider::{PromptContent, PromptPart, PromptParts, PromptRole};
use crate::request::{ChatRequest, ChatRole, GenerationRequest, Settings, SourceMaterial};
use crate::response::ExpectedShape;
use crate::transcript::format_transcript;
use minijinja::{Environment, context};
use serde::Serialize;
use std::collections::BTreeMap;
use templates::*;

/// Output of the compiler.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPrompt {
    pub parts: PromptParts,
    pub shape: ExpectedShape,
}

/// Returns the longest prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

fn environment() -> Result<Environment<'static>> {
    let mut env = Environment::new();
    env.add_template("generate_system", GENERATE_SYSTEM)?;
    env.add_template("generate_text", GENERATE_TEXT)?;
    env.add_template("generate_image", GENERATE_IMAGE)?;
    env.add_template("expand_system", EXPAND_SYSTEM)?;
    env.add_template("expand_text", EXPAND_TEXT)?;
    env.add_template("exam_system", EXAM_SYSTEM)?;
    env.add_template("exam_text", EXAM_TEXT)?;
    env.add_template("grade_system", GRADE_SYSTEM)?;
    env.add_template("grade_text", GRADE_TEXT)?;
    env.add_template("chat_system", CHAT_SYSTEM)?;
    Ok(env)
}

fn render<S: Serialize>(env: &Environment<'_>, name: &str, ctx: S) -> Result<String> {
    Ok(env.get_template(name)?.render(ctx)?)
}

/// Compiles one generation request.
pub fn compile_prompt(request: &GenerationRequest, limits: &LimitsConfig) -> Result<CompiledPrompt> {
    let env = environment()?;
    let settings = request.settings();

    match request {
        GenerationRequest::Generate { topic, source, .. } => {
            compile_generate(&env, topic, source, settings, limits)
        }
        GenerationRequest::Expand {
            node_label,
            context,
            ..
        } => {
            let system = render(
                &env,
                "expand_system",
                context! {
                    language => &settings.language,
                    json_rule => JSON_ONLY_RULE,
                    shape => EXPANSION_SHAPE,
                },
            )?;
            let text = render(
                &env,
                "expand_text",
                context! {
                    node_label => node_label.trim(),
                    context => truncate_chars(context, limits.expand_chars),
                },
            )?;
            Ok(CompiledPrompt {
                parts: PromptParts::single(system, vec![PromptPart::Text(text)]),
                shape: ExpectedShape::Expansion,
            })
        }
        GenerationRequest::Exam { context, .. } => {
            let system = render(
                &env,
                "exam_system",
                context! {
                    language => &settings.language,
                    difficulty => settings.difficulty.to_string(),
                    json_rule => JSON_ONLY_RULE,
                    shape => EXAM_SHAPE,
                },
            )?;
            let text = render(
                &env,
                "exam_text",
                context! { context => truncate_chars(context, limits.exam_chars) },
            )?;
            Ok(CompiledPrompt {
                parts: PromptParts::single(system, vec![PromptPart::Text(text)]),
                shape: ExpectedShape::Exam,
            })
        }
        GenerationRequest::Grade {
            context,
            questions,
            answers,
            ..
        } => {
            let system = render(
                &env,
                "grade_system",
                context! {
                    language => &settings.language,
                    json_rule => JSON_ONLY_RULE,
                    shape => GRADING_SHAPE,
                },
            )?;
            let text = render(
                &env,
                "grade_text",
                context! {
                    context => truncate_chars(context, limits.grade_chars),
                    items => grade_items(questions, answers),
                },
            )?;
            Ok(CompiledPrompt {
                parts: PromptParts::single(system, vec![PromptPart::Text(text)]),
                shape: ExpectedShape::Grading {
                    question_ids: questions.iter().map(|q| q.id).collect(),
                },
            })
        }
    }
}

fn compile_generate(
    env: &Environment<'_>,
    topic: &str,
    source: &SourceMaterial,
    settings: &Settings,
    limits: &LimitsConfig,
) -> Result<CompiledPrompt> {
    let timestamps = matches!(source, SourceMaterial::Transcript(_));
    let system = render(
        env,
        "generate_system",
        context! {
            language => &settings.language,
            difficulty => settings.difficulty.to_string(),
            json_rule => JSON_ONLY_RULE,
            shape => STUDY_BUNDLE_SHAPE,
            timestamps => timestamps,
        },
    )?;

    let parts = match source {
        SourceMaterial::Image { mime_type, data } => vec![
            PromptPart::Text(render(env, "generate_image", context! { topic => topic })?),
            PromptPart::InlineData {
                mime_type: mime_type.clone(),
                data: data.clone(),
            },
        ],
        SourceMaterial::Text(text) | SourceMaterial::Document { text } => {
            vec![PromptPart::Text(render(
                env,
                "generate_text",
                context! {
                    topic => topic,
                    content => truncate_chars(text, limits.generate_chars),
                },
            )?)]
        }
        SourceMaterial::Transcript(segments) => {
            let transcript = format_transcript(segments);
            vec![PromptPart::Text(render(
                env,
                "generate_text",
                context! {
                    topic => topic,
                    content => truncate_chars(&transcript, limits.generate_chars),
                },
            )?)]
        }
    };

    Ok(CompiledPrompt {
        parts: PromptParts::single(system, parts),
        shape: ExpectedShape::StudyBundle,
    })
}

#[derive(Serialize)]
struct GradeItem<'a> {
    id: u32,
    kind: String,
    question: &'a str,
    options: Option<&'a [String]>,
    expected: &'a str,
    answer: &'a str,
}

fn grade_items<'a>(
    questions: &'a [ExamQuestion],
    answers: &'a BTreeMap<u32, String>,
) -> Vec<GradeItem<'a>> {
    questions
        .iter()
        .map(|q| GradeItem {
            id: q.id,
            kind: q.kind.to_string(),
            question: &q.question,
            options: q.options.as_deref(),
            expected: q.correct_answer.as_deref().unwrap_or("(not provided)"),
            answer: answers
                .get(&q.id)
                .map(String::as_str)
                .filter(|a| !a.trim().is_empty())
                .unwrap_or("(no answer)"),
        })
        .collect()
}

/// Compiles a grounded chat turn. The reply is plain text.
pub fn compile_chat(request: &ChatRequest) -> Result<CompiledPrompt> {
    let env = environment()?;
    let system = render(
        &env,
        "chat_system",
        context! {
            language => &request.settings.language,
            context => &request.context,
        },
    )?;
    let contents = request
        .messages
        .iter()
        .map(|message| PromptContent {
            role: match message.role {
                ChatRole::User => PromptRole::User,
                ChatRole::Ai => PromptRole::Model,
            },
            parts: vec![PromptPart::Text(message.content.clone())],
        })
        .collect();

    Ok(CompiledPrompt {
        parts: PromptParts {
            system_instruction: system,
            contents,
        },
        shape: ExpectedShape::Text,
    })
}
