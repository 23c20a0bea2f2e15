use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;

use logic_spec::{
    AnswerMap, AnswerSet, Evaluation, LOGIC_VERSION, RenderPayload, SpecError, SurveyLogicSpec,
    answers_to_json, next_question, parse_answers as parse_answer_map, payload_from_evaluation,
    previous_question, progress, render_json_ui as logic_render_json_ui,
    render_text as logic_render_text,
};

const DEFAULT_SURVEY: &str = include_str!("../../logic-spec/tests/fixtures/customer_feedback.json");

#[derive(Debug, Error)]
enum ComponentError {
    #[error("failed to parse config/{0}")]
    ConfigParse(#[source] serde_json::Error),
    #[error("survey '{0}' is not available")]
    SurveyUnavailable(String),
    #[error("json encode error: {0}")]
    JsonEncode(#[source] serde_json::Error),
    #[error(transparent)]
    Spec(#[from] SpecError),
}

#[derive(Debug, Deserialize, Serialize, Default)]
struct ComponentConfig {
    #[serde(default)]
    survey_json: Option<String>,
}

/// Advisory view a client evaluated locally before submitting.
#[derive(Debug, Deserialize, Default)]
struct ClientView {
    #[serde(default)]
    logic_version: Option<u32>,
    #[serde(default)]
    active_order: Vec<String>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct Divergence {
    client_only: Vec<String>,
    server_only: Vec<String>,
    version_mismatch: bool,
}

impl Divergence {
    fn between(client: &ClientView, server: &Evaluation) -> Self {
        let client_ids: BTreeSet<&str> = client.active_order.iter().map(String::as_str).collect();
        let server_ids: BTreeSet<&str> = server.active_order.iter().map(String::as_str).collect();
        Self {
            client_only: client_ids
                .difference(&server_ids)
                .map(|id| id.to_string())
                .collect(),
            server_only: server_ids
                .difference(&client_ids)
                .map(|id| id.to_string())
                .collect(),
            version_mismatch: client
                .logic_version
                .is_some_and(|version| version != LOGIC_VERSION),
        }
    }

    fn is_empty(&self) -> bool {
        self.client_only.is_empty() && self.server_only.is_empty() && !self.version_mismatch
    }
}

fn load_survey(config_json: &str) -> Result<SurveyLogicSpec, ComponentError> {
    let config = if config_json.trim().is_empty() {
        ComponentConfig::default()
    } else {
        serde_json::from_str(config_json).map_err(ComponentError::ConfigParse)?
    };

    let survey_json = config.survey_json.as_deref().unwrap_or(DEFAULT_SURVEY);
    Ok(SurveyLogicSpec::from_json(survey_json)?)
}

fn ensure_survey(survey_id: &str, config_json: &str) -> Result<SurveyLogicSpec, ComponentError> {
    let spec = load_survey(config_json)?;
    if spec.id != survey_id {
        Err(ComponentError::SurveyUnavailable(survey_id.to_string()))
    } else {
        Ok(spec)
    }
}

/// Blank input means no answers yet; anything else must be a JSON value.
fn parse_answers(answers_json: &str) -> Result<AnswerMap, ComponentError> {
    if answers_json.trim().is_empty() {
        return Ok(AnswerMap::new());
    }
    let value: Value = serde_json::from_str(answers_json).map_err(ComponentError::ConfigParse)?;
    Ok(parse_answer_map(&value))
}

fn parse_client_view(client_json: &str) -> Result<Option<ClientView>, ComponentError> {
    if client_json.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(client_json)
        .map(Some)
        .map_err(ComponentError::ConfigParse)
}

fn respond(result: Result<Value, ComponentError>) -> String {
    match result {
        Ok(value) => serde_json::to_string(&value).unwrap_or_else(|error| {
            json!({"error": format!("json encode: {}", error)}).to_string()
        }),
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

fn respond_string(result: Result<String, ComponentError>) -> String {
    match result {
        Ok(value) => value,
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

fn to_value(value: impl Serialize) -> Result<Value, ComponentError> {
    serde_json::to_value(value).map_err(ComponentError::JsonEncode)
}

fn with_logic_version(value: Value) -> Value {
    match value {
        Value::Object(mut map) => {
            map.insert("logic_version".into(), Value::from(LOGIC_VERSION));
            Value::Object(map)
        }
        other => other,
    }
}

pub fn describe(survey_id: &str, config_json: &str) -> String {
    respond(ensure_survey(survey_id, config_json).and_then(to_value))
}

/// Full evaluation for the given answers, tagged with the logic version.
pub fn evaluate(survey_id: &str, config_json: &str, answers_json: &str) -> String {
    respond(ensure_survey(survey_id, config_json).and_then(|spec| {
        let answers = parse_answers(answers_json)?;
        to_value(spec.evaluate(&answers)).map(with_logic_version)
    }))
}

/// Navigation around `current_question_id`; an empty id starts the survey.
pub fn next(
    survey_id: &str,
    config_json: &str,
    answers_json: &str,
    current_question_id: &str,
) -> String {
    respond(ensure_survey(survey_id, config_json).and_then(|spec| {
        let answers = parse_answers(answers_json)?;
        let evaluation = spec.evaluate(&answers);
        let current = Some(current_question_id.trim()).filter(|id| !id.is_empty());
        let next_id = next_question(&evaluation, current);
        let previous_id = current.and_then(|id| previous_question(&evaluation, id));
        let progress = progress(&evaluation, &answers);

        let status = match next_id {
            Some(_) => "need_input",
            None if evaluation.terminated => "terminated",
            None => "complete",
        };
        Ok(json!({
            "status": status,
            "next_question_id": next_id,
            "previous_question_id": previous_id,
            "progress": {
                "answered": progress.answered,
                "total": progress.total,
            },
            "termination_question_id": evaluation.termination_question_id,
            "logic_version": LOGIC_VERSION,
        }))
    }))
}

pub fn validate_submission(survey_id: &str, config_json: &str, answers_json: &str) -> String {
    respond(ensure_survey(survey_id, config_json).and_then(|spec| {
        let answers = parse_answers(answers_json)?;
        to_value(spec.review_submission(&answers)).map(with_logic_version)
    }))
}

/// Authoritative submission. `client_json` optionally carries the client's
/// own `logic_version` and `active_order`; disagreements are reported but
/// the server result always stands.
pub fn submit(survey_id: &str, config_json: &str, answers_json: &str, client_json: &str) -> String {
    respond(ensure_survey(survey_id, config_json).and_then(|spec| {
        let answers = parse_answers(answers_json)?;
        let client = parse_client_view(client_json)?;
        let review = spec.review_submission(&answers);

        let divergence = client.map(|client| Divergence::between(&client, &review.evaluation));
        if let Some(divergence) = divergence.as_ref().filter(|divergence| !divergence.is_empty()) {
            tracing::warn!(
                survey_id = %spec.id,
                client_only = ?divergence.client_only,
                server_only = ?divergence.server_only,
                version_mismatch = divergence.version_mismatch,
                "client logic diverged from server evaluation"
            );
        }

        let mut response = Map::new();
        response.insert(
            "status".into(),
            Value::from(if review.valid { "accepted" } else { "error" }),
        );
        response.insert("trace".into(), to_value(&review.answers.trace)?);
        response.insert("errors".into(), to_value(&review.errors)?);
        response.insert("dropped".into(), to_value(&review.dropped)?);
        response.insert("terminated".into(), Value::Bool(review.answers.terminated));
        if review.valid {
            let answer_set = AnswerSet {
                survey_id: spec.id.clone(),
                survey_version: spec.version.clone(),
                logic_version: LOGIC_VERSION,
                answers: review.answers.answers.clone(),
            };
            response.insert("answer_set".into(), to_value(&answer_set)?);
        }
        response.insert("answers".into(), answers_to_json(&review.answers.answers));
        if let Some(divergence) = divergence {
            response.insert("divergence".into(), to_value(&divergence)?);
        }
        response.insert("logic_version".into(), Value::from(LOGIC_VERSION));
        Ok(Value::Object(response))
    }))
}

pub fn lint(survey_id: &str, config_json: &str) -> String {
    respond(ensure_survey(survey_id, config_json).and_then(|spec| {
        let issues = spec.lint();
        let errors = issues.iter().filter(|issue| issue.is_error()).count();
        Ok(json!({
            "valid": errors == 0,
            "issues": to_value(&issues)?,
        }))
    }))
}

fn render_payload(
    survey_id: &str,
    config_json: &str,
    answers_json: &str,
) -> Result<RenderPayload, ComponentError> {
    let spec = ensure_survey(survey_id, config_json)?;
    let answers = parse_answers(answers_json)?;
    let evaluation = spec.evaluate(&answers);
    Ok(payload_from_evaluation(&spec, &answers, &evaluation))
}

pub fn render_text(survey_id: &str, config_json: &str, answers_json: &str) -> String {
    respond_string(
        render_payload(survey_id, config_json, answers_json)
            .map(|payload| logic_render_text(&payload)),
    )
}

pub fn render_json_ui(survey_id: &str, config_json: &str, answers_json: &str) -> String {
    respond(
        render_payload(survey_id, config_json, answers_json)
            .map(|payload| logic_render_json_ui(&payload)),
    )
}

#[cfg(target_arch = "wasm32")]
mod bindings {
    wit_bindgen::generate!({
        world: "survey-logic",
        path: "wit",
    });

    struct Component;

    impl Guest for Component {
        fn describe(survey_id: String, config_json: String) -> String {
            super::describe(&survey_id, &config_json)
        }

        fn evaluate(survey_id: String, config_json: String, answers_json: String) -> String {
            super::evaluate(&survey_id, &config_json, &answers_json)
        }

        fn next(
            survey_id: String,
            config_json: String,
            answers_json: String,
            current_question_id: String,
        ) -> String {
            super::next(&survey_id, &config_json, &answers_json, &current_question_id)
        }

        fn validate_submission(
            survey_id: String,
            config_json: String,
            answers_json: String,
        ) -> String {
            super::validate_submission(&survey_id, &config_json, &answers_json)
        }

        fn submit(
            survey_id: String,
            config_json: String,
            answers_json: String,
            client_json: String,
        ) -> String {
            super::submit(&survey_id, &config_json, &answers_json, &client_json)
        }

        fn lint(survey_id: String, config_json: String) -> String {
            super::lint(&survey_id, &config_json)
        }

        fn render_text(survey_id: String, config_json: String, answers_json: String) -> String {
            super::render_text(&survey_id, &config_json, &answers_json)
        }

        fn render_json_ui(survey_id: String, config_json: String, answers_json: String) -> String {
            super::render_json_ui(&survey_id, &config_json, &answers_json)
        }
    }

    export!(Component);
}
