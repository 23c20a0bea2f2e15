use serde_json::{Map, Value, json};

use crate::{
    answers::AnswerMap,
    engine::{Evaluation, walk_order},
    progress::{Progress, next_unanswered, progress},
    spec::{LOGIC_VERSION, survey::SurveyLogicSpec},
};

/// Status labels returned by the renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    /// An active question still needs input.
    NeedInput,
    /// Every active question has a value.
    Complete,
    /// An end rule fired and every question before it has a value.
    Terminated,
}

impl RenderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStatus::NeedInput => "need_input",
            RenderStatus::Complete => "complete",
            RenderStatus::Terminated => "terminated",
        }
    }
}

/// Describes a single question for render outputs.
#[derive(Debug, Clone)]
pub struct RenderQuestion {
    pub id: String,
    pub title: String,
    pub order: u32,
    pub required: bool,
    pub visible: bool,
    pub current_value: Option<Value>,
}

/// Collected payload used by both text and JSON renderers.
#[derive(Debug, Clone)]
pub struct RenderPayload {
    pub survey_id: String,
    pub survey_title: String,
    pub survey_version: String,
    pub logic_version: u32,
    pub status: RenderStatus,
    pub next_question_id: Option<String>,
    pub progress: Progress,
    pub help: Option<String>,
    pub questions: Vec<RenderQuestion>,
    pub hidden_question_ids: Vec<String>,
    pub termination_question_id: Option<String>,
}

impl RenderPayload {
    pub fn question(&self, id: &str) -> Option<&RenderQuestion> {
        self.questions.iter().find(|question| question.id == id)
    }
}

/// Build the renderer payload from the survey definition and answers.
pub fn build_render_payload(spec: &SurveyLogicSpec, answers: &AnswerMap) -> RenderPayload {
    let evaluation = spec.evaluate(answers);
    payload_from_evaluation(spec, answers, &evaluation)
}

pub fn payload_from_evaluation(
    spec: &SurveyLogicSpec,
    answers: &AnswerMap,
    evaluation: &Evaluation,
) -> RenderPayload {
    let next_question_id = next_unanswered(evaluation, answers).map(str::to_string);

    // Active questions in trace order, then the rest in walk order.
    let active = evaluation
        .active_order
        .iter()
        .filter_map(|id| spec.question(id));
    let hidden = walk_order(&spec.questions)
        .into_iter()
        .filter(|question| !evaluation.is_active(&question.id));
    let questions = active
        .chain(hidden)
        .map(|question| RenderQuestion {
            id: question.id.clone(),
            title: question.label().to_string(),
            order: question.order,
            required: question.required,
            visible: evaluation.is_active(&question.id),
            current_value: answers.get(&question.id).map(|answer| answer.to_plain_json()),
        })
        .collect::<Vec<_>>();

    let status = match (&next_question_id, evaluation.terminated) {
        (Some(_), _) => RenderStatus::NeedInput,
        (None, true) => RenderStatus::Terminated,
        (None, false) => RenderStatus::Complete,
    };

    RenderPayload {
        survey_id: spec.id.clone(),
        survey_title: spec.title.clone(),
        survey_version: spec.version.clone(),
        logic_version: LOGIC_VERSION,
        status,
        next_question_id,
        progress: progress(evaluation, answers),
        help: spec.description.clone(),
        questions,
        hidden_question_ids: evaluation.hidden_question_ids(),
        termination_question_id: evaluation.termination_question_id.clone(),
    }
}

/// Render the payload as a structured JSON-friendly value.
pub fn render_json_ui(payload: &RenderPayload) -> Value {
    let questions = payload
        .questions
        .iter()
        .map(|question| {
            let mut map = Map::new();
            map.insert("id".into(), Value::String(question.id.clone()));
            map.insert("title".into(), Value::String(question.title.clone()));
            map.insert("order".into(), Value::from(question.order));
            map.insert("required".into(), Value::Bool(question.required));
            map.insert("visible".into(), Value::Bool(question.visible));
            if let Some(current_value) = &question.current_value {
                map.insert("current_value".into(), current_value.clone());
            }
            Value::Object(map)
        })
        .collect::<Vec<_>>();

    json!({
        "survey_id": payload.survey_id,
        "survey_title": payload.survey_title,
        "survey_version": payload.survey_version,
        "logic_version": payload.logic_version,
        "status": payload.status.as_str(),
        "next_question_id": payload.next_question_id,
        "progress": {
            "answered": payload.progress.answered,
            "total": payload.progress.total,
        },
        "help": payload.help,
        "questions": questions,
        "hidden_question_ids": payload.hidden_question_ids,
        "termination_question_id": payload.termination_question_id,
    })
}

/// Render the payload as human-friendly text.
pub fn render_text(payload: &RenderPayload) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "Survey: {} ({})",
        payload.survey_title, payload.survey_id
    ));
    lines.push(format!(
        "Status: {} ({}/{})",
        payload.status.as_str(),
        payload.progress.answered,
        payload.progress.total
    ));
    if let Some(help) = &payload.help {
        lines.push(format!("Help: {}", help));
    }

    if let Some(next_question) = &payload.next_question_id {
        lines.push(format!("Next question: {}", next_question));
        if let Some(question) = payload.question(next_question) {
            lines.push(format!("  Title: {}", question.title));
            if question.required {
                lines.push("  Required: yes".to_string());
            }
        }
    } else if let Some(question_id) = &payload.termination_question_id {
        lines.push(format!("Survey ended at {}.", question_id));
    } else {
        lines.push("All active questions are answered.".to_string());
    }

    lines.push("Active questions:".to_string());
    for question in payload.questions.iter().filter(|question| question.visible) {
        let mut entry = format!(" - {} ({})", question.id, question.title);
        if question.required {
            entry.push_str(" [required]");
        }
        if let Some(current_value) = &question.current_value {
            entry.push_str(&format!(" = {}", value_to_display(current_value)));
        }
        lines.push(entry);
    }
    if !payload.hidden_question_ids.is_empty() {
        lines.push(format!(
            "Hidden questions: {}",
            payload.hidden_question_ids.join(", ")
        ));
    }

    lines.join("\n")
}

fn value_to_display(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(value_to_display)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Null => "<none>".to_string(),
        other => other.to_string(),
    }
}
