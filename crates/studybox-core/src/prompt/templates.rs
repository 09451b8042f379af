//! Instruction templates and the JSON shapes they demand.
//!
//! Shapes are injected as variables rather than written into the template
//! source so their braces never meet the template syntax.

pub const STUDY_BUNDLE_SHAPE: &str = r#"{
  "title": "string",
  "summary": "string (Markdown)",
  "keyPoints": ["string"],
  "quiz": [{"question": "string", "options": ["string", "string", "string", "string"], "correctOption": "string (exactly one of options)"}],
  "flashcards": [{"front": "string", "back": "string"}],
  "mindMapEdges": [{"source": "string", "target": "string"}],
  "stats": {"accuracy": "string, e.g. 95%", "timeSaved": "string, e.g. 2 hours"}
}"#;

pub const EXPANSION_SHAPE: &str = r#"{"newEdges": [{"source": "string", "target": "string"}]}"#;

pub const EXAM_SHAPE: &str = r#"{
  "exam": [
    {"id": 1, "type": "mcq", "question": "string", "options": ["string", "string", "string", "string"], "correctAnswer": "string (exactly one of options)"},
    {"id": 4, "type": "text", "question": "string", "correctAnswer": "string (model answer)"}
  ]
}"#;

pub const GRADING_SHAPE: &str = r#"{
  "score": 0,
  "feedback": "string",
  "corrections": [{"questionId": 1, "isCorrect": true, "remark": "string"}]
}"#;

pub const JSON_ONLY_RULE: &str = "Respond with a single raw JSON object only. Do not wrap it in Markdown code fences and do not add any text before or after it.";

pub const GENERATE_SYSTEM: &str = r#"You are an expert tutor who turns study material into a complete study bundle.
Write every field in {{ language }}. Pitch the quiz at {{ difficulty }} difficulty.
{{ json_rule }}
The JSON object must match exactly this shape:
{{ shape }}
Rules:
- "summary" is well-structured Markdown covering the whole material.
- "keyPoints" holds 5 to 8 concise points.
- "quiz" holds 5 questions with 4 options each; "correctOption" is copied verbatim from "options".
- "flashcards" holds 6 to 10 cards.
- "mindMapEdges" holds 8 to 15 edges; the source of the first edge is the central topic.
{% if timestamps %}- The material is a timestamped transcript; cite [MM:SS] markers in the summary where helpful.
{% endif %}"#;

pub const GENERATE_TEXT: &str = r#"Topic: {{ topic }}

Study material:
{{ content }}"#;

pub const GENERATE_IMAGE: &str = r#"Topic: {{ topic }}

The attached image contains the study material. Perform OCR to read all of its text, include any diagrams you can interpret, then build the study bundle from what you read."#;

pub const EXPAND_SYSTEM: &str = r#"You extend an existing mind map with deeper sub-concepts.
Write every label in {{ language }}.
{{ json_rule }}
The JSON object must match exactly this shape:
{{ shape }}"#;

pub const EXPAND_TEXT: &str = r#"Add 3 to 5 new sub-concepts under the mind-map node "{{ node_label }}".
Every new edge must have "{{ node_label }}" or one of the new sub-concepts as its source, and must not repeat an existing concept.

Context:
{{ context }}"#;

pub const EXAM_SYSTEM: &str = r#"You are an examiner writing a short exam at {{ difficulty }} difficulty.
Write every question in {{ language }}.
{{ json_rule }}
The JSON object must match exactly this shape:
{{ shape }}
Rules:
- Exactly 5 questions with ids 1 to 5 in order.
- Questions 1 to 3 have "type": "mcq" with 4 options; "correctAnswer" is copied verbatim from "options".
- Questions 4 and 5 have "type": "text" and a model answer in "correctAnswer"."#;

pub const EXAM_TEXT: &str = r#"Write the exam from this study material:
{{ context }}"#;

pub const GRADE_SYSTEM: &str = r#"You are a fair examiner grading a student's exam. Write the feedback in {{ language }}.
{{ json_rule }}
The JSON object must match exactly this shape:
{{ shape }}
Rules:
- "score" is an integer from 0 to 100.
- "corrections" holds exactly one entry per question listed below, using its questionId.
- Free-text answers are correct when they capture the key idea of the model answer."#;

pub const GRADE_TEXT: &str = r#"Study material:
{{ context }}

Exam:
{% for item in items %}Question {{ item.id }} ({{ item.kind }}): {{ item.question }}
{% if item.options %}Options: {{ item.options | join(" | ") }}
{% endif %}Expected answer: {{ item.expected }}
Student answer: {{ item.answer }}

{% endfor %}"#;

pub const CHAT_SYSTEM: &str = r#"You are a study assistant. Answer strictly from the study material below.
If the material does not contain the answer, say that it is not covered.
Reply in {{ language }} with plain text.

Study material:
{{ context }}"#;
