use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A single respondent answer.
///
/// The canonical JSON form is externally tagged (`{"text": "no"}`,
/// `{"number": "4.5"}`, `"none"`); [`AnswerValue::from_json`] also accepts the
/// untagged shapes clients usually send, where `null` stands for `none` and a
/// bare string is always text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AnswerValue {
    Text(String),
    Number(#[schemars(with = "String")] Decimal),
    Choice(String),
    Choices(Vec<String>),
    None,
}

/// Answers keyed by question id.
pub type AnswerMap = BTreeMap<String, AnswerValue>;

const TAGS: [&str; 5] = ["text", "number", "choice", "choices", "none"];

impl AnswerValue {
    /// Present and non-empty. Blank text and empty choice lists do not count.
    pub fn is_answered(&self) -> bool {
        match self {
            AnswerValue::Text(text) | AnswerValue::Choice(text) => !text.trim().is_empty(),
            AnswerValue::Number(_) => true,
            AnswerValue::Choices(choices) => !choices.is_empty(),
            AnswerValue::None => false,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, AnswerValue::None)
    }

    /// Numeric reading of the answer, if it has one.
    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            AnswerValue::Number(number) => Some(*number),
            AnswerValue::Text(text) | AnswerValue::Choice(text) => parse_number(text),
            AnswerValue::Choices(_) | AnswerValue::None => None,
        }
    }

    /// Converts tagged or loose client JSON into an answer.
    pub fn from_json(value: &Value) -> AnswerValue {
        match value {
            Value::Null => AnswerValue::None,
            Value::String(text) => AnswerValue::Text(text.clone()),
            Value::Bool(flag) => AnswerValue::Text(flag.to_string()),
            Value::Number(number) => {
                let raw = number.to_string();
                parse_number(&raw)
                    .map(AnswerValue::Number)
                    .unwrap_or(AnswerValue::Text(raw))
            }
            Value::Array(items) => AnswerValue::Choices(
                items
                    .iter()
                    .map(|item| match item {
                        Value::String(text) => text.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
            ),
            Value::Object(map) => {
                let tagged = map.len() == 1
                    && map.keys().all(|key| TAGS.contains(&key.as_str()));
                if tagged {
                    if let Some(Value::Number(number)) = map.get("number") {
                        return Self::from_json(&Value::Number(number.clone()));
                    }
                    if let Ok(answer) = serde_json::from_value(value.clone()) {
                        return answer;
                    }
                }
                AnswerValue::Text(value.to_string())
            }
        }
    }

    /// Plain JSON rendering used by UI payloads.
    pub fn to_plain_json(&self) -> Value {
        match self {
            AnswerValue::Text(text) | AnswerValue::Choice(text) => Value::String(text.clone()),
            AnswerValue::Number(number) => serde_json::from_str(&number.normalize().to_string())
                .unwrap_or_else(|_| Value::String(number.to_string())),
            AnswerValue::Choices(choices) => {
                Value::Array(choices.iter().cloned().map(Value::String).collect())
            }
            AnswerValue::None => Value::Null,
        }
    }
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerValue::Text(text) | AnswerValue::Choice(text) => f.write_str(text),
            AnswerValue::Number(number) => write!(f, "{}", number.normalize()),
            AnswerValue::Choices(choices) => f.write_str(&choices.join(", ")),
            AnswerValue::None => f.write_str("<none>"),
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(text: &str) -> Self {
        AnswerValue::Text(text.to_string())
    }
}

impl From<String> for AnswerValue {
    fn from(text: String) -> Self {
        AnswerValue::Text(text)
    }
}

impl From<Decimal> for AnswerValue {
    fn from(number: Decimal) -> Self {
        AnswerValue::Number(number)
    }
}

impl From<i64> for AnswerValue {
    fn from(number: i64) -> Self {
        AnswerValue::Number(Decimal::from(number))
    }
}

impl From<Vec<String>> for AnswerValue {
    fn from(choices: Vec<String>) -> Self {
        AnswerValue::Choices(choices)
    }
}

/// Parses a decimal in plain or scientific notation. Surrounding whitespace
/// is ignored; anything else that is not a number yields `None`.
///
/// Digit separators such as `1_000` are not numbers. Integers past the
/// `Decimal` range (about 7.9e28, 28-29 digits) do not parse either, so they
/// compare as text.
pub fn parse_number(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.contains('_') {
        return None;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

/// Reads an answers object. Non-object input yields an empty map.
pub fn parse_answers(value: &Value) -> AnswerMap {
    value
        .as_object()
        .map(|map| {
            map.iter()
                .map(|(question_id, answer)| (question_id.clone(), AnswerValue::from_json(answer)))
                .collect()
        })
        .unwrap_or_default()
}

/// Plain JSON object for an answer map.
pub fn answers_to_json(answers: &AnswerMap) -> Value {
    Value::Object(
        answers
            .iter()
            .map(|(question_id, answer)| (question_id.clone(), answer.to_plain_json()))
            .collect(),
    )
}

/// Completed response handed to the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerSet {
    pub survey_id: String,
    pub survey_version: String,
    pub logic_version: u32,
    pub answers: AnswerMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorKind {
    MissingRequiredAnswer,
}

impl ValidationErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationErrorKind::MissingRequiredAnswer => "missing_required_answer",
        }
    }
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{question_id}: {kind}")]
pub struct ValidationError {
    pub question_id: String,
    pub kind: ValidationErrorKind,
}

impl ValidationError {
    pub fn missing_required(question_id: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            kind: ValidationErrorKind::MissingRequiredAnswer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn loose_json_maps_to_answer_variants() {
        let answers = parse_answers(&json!({
            "q1": "no",
            "q2": 4.5,
            "q3": ["a", "b"],
            "q4": null,
            "q5": true,
        }));
        assert_eq!(answers["q1"], AnswerValue::Text("no".into()));
        assert_eq!(answers["q2"], AnswerValue::Number(Decimal::new(45, 1)));
        assert_eq!(
            answers["q3"],
            AnswerValue::Choices(vec!["a".into(), "b".into()])
        );
        assert_eq!(answers["q4"], AnswerValue::None);
        assert_eq!(answers["q5"], AnswerValue::Text("true".into()));
    }

    #[test]
    fn tagged_json_is_honoured() {
        let answers = parse_answers(&json!({
            "q1": { "choice": "yes" },
            "q2": { "number": "10" },
            "q3": { "number": 7 },
            "q4": { "none": null },
        }));
        assert_eq!(answers["q1"], AnswerValue::Choice("yes".into()));
        assert_eq!(answers["q2"], AnswerValue::Number(Decimal::from(10)));
        assert_eq!(answers["q3"], AnswerValue::Number(Decimal::from(7)));
        assert!(answers["q4"].is_none());
    }

    #[test]
    fn blank_text_and_empty_choices_are_not_answered() {
        assert!(!AnswerValue::Text("   ".into()).is_answered());
        assert!(!AnswerValue::Choices(vec![]).is_answered());
        assert!(!AnswerValue::None.is_answered());
        assert!(AnswerValue::from(0).is_answered());
    }

    #[test]
    fn parse_number_accepts_scientific_notation() {
        assert_eq!(parse_number(" 12 "), Some(Decimal::from(12)));
        assert_eq!(parse_number("1e3"), Some(Decimal::from(1000)));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("twelve"), None);
    }

    #[test]
    fn parse_number_rejects_separators_and_overflow() {
        assert_eq!(parse_number("1_000"), None);
        assert_eq!(parse_number("1000"), Some(Decimal::from(1000)));
        assert_eq!(parse_number("100000000000000000000000000000"), None);
        assert!(AnswerValue::from("1_000").as_number().is_none());
    }
}
