use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::answers::AnswerMap;
use crate::engine::{Evaluation, evaluate_all};
use crate::integrity::{RuleIssue, lint};
use crate::spec::question::Question;
use crate::spec::rule::LogicRule;
use crate::validate::{SubmissionReview, review_submission};

/// Revision of the operator, tie-break, and skip/cycle semantics.
///
/// Client and server builds must agree on this value; bump it whenever any of
/// those behaviours change.
pub const LOGIC_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SpecError {
    #[error("invalid survey definition: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("survey '{survey_id}' requires logic version {requested}, engine implements {}", LOGIC_VERSION)]
    UnsupportedLogicVersion { survey_id: String, requested: u32 },
}

/// Serialized survey definition: the read contract of the rule store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SurveyLogicSpec {
    pub id: String,
    pub title: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logic_version: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub questions: Vec<Question>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<LogicRule>,
}

impl SurveyLogicSpec {
    pub fn from_json(raw: &str) -> Result<Self, SpecError> {
        let spec: SurveyLogicSpec = serde_json::from_str(raw)?;
        spec.check_logic_version()?;
        Ok(spec)
    }

    fn check_logic_version(&self) -> Result<(), SpecError> {
        match self.logic_version {
            Some(requested) if requested != LOGIC_VERSION => {
                Err(SpecError::UnsupportedLogicVersion {
                    survey_id: self.id.clone(),
                    requested,
                })
            }
            _ => Ok(()),
        }
    }

    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|question| question.id == id)
    }

    pub fn evaluate(&self, answers: &AnswerMap) -> Evaluation {
        evaluate_all(&self.questions, &self.rules, answers)
    }

    pub fn review_submission(&self, answers: &AnswerMap) -> SubmissionReview {
        review_submission(&self.questions, &self.rules, answers)
    }

    /// Authoring diagnostics for every rule in the survey.
    pub fn lint(&self) -> Vec<RuleIssue> {
        lint(&self.questions, &self.rules)
    }
}
