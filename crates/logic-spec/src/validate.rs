use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::answers::{AnswerMap, ValidationError};
use crate::engine::{Evaluation, evaluate_all, walk_order};
use crate::spec::question::Question;
use crate::spec::rule::LogicRule;

/// Authoritative answer set ready for persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedAnswers {
    pub answers: AnswerMap,
    /// Canonical question trace: the active order of the final evaluation.
    pub trace: Vec<String>,
    pub terminated: bool,
    pub termination_question_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    Hidden,
    AfterTermination,
    UnknownQuestion,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedAnswer {
    pub question_id: String,
    pub reason: DropReason,
}

/// Everything the server learns from one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionReview {
    pub valid: bool,
    pub answers: ValidatedAnswers,
    pub errors: Vec<ValidationError>,
    pub dropped: Vec<DroppedAnswer>,
    pub evaluation: Evaluation,
}

impl SubmissionReview {
    pub fn into_result(self) -> Result<ValidatedAnswers, Vec<ValidationError>> {
        if self.errors.is_empty() {
            Ok(self.answers)
        } else {
            Err(self.errors)
        }
    }
}

pub fn validate_submission(
    questions: &[Question],
    rules: &[LogicRule],
    answers: &AnswerMap,
) -> Result<ValidatedAnswers, Vec<ValidationError>> {
    review_submission(questions, rules, answers).into_result()
}

/// Runs one evaluation over the full answer set, then prunes answers and
/// collects missing required answers in question order.
pub fn review_submission(
    questions: &[Question],
    rules: &[LogicRule],
    answers: &AnswerMap,
) -> SubmissionReview {
    let evaluation = evaluate_all(questions, rules, answers);

    let ordered = walk_order(questions);
    let known: BTreeMap<&str, &Question> = ordered
        .iter()
        .map(|question| (question.id.as_str(), *question))
        .collect();
    let cutoff = evaluation
        .termination_question_id
        .as_deref()
        .and_then(|id| known.get(id))
        .map(|question| question.order);

    let mut errors = Vec::new();
    for question in &ordered {
        if !evaluation.is_active(&question.id) || !question.required {
            continue;
        }
        let answered = answers
            .get(&question.id)
            .is_some_and(|answer| answer.is_answered());
        if !answered {
            errors.push(ValidationError::missing_required(question.id.clone()));
        }
    }

    let mut kept = AnswerMap::new();
    let mut dropped = Vec::new();
    for (question_id, answer) in answers {
        let reason = match known.get(question_id.as_str()) {
            None => Some(DropReason::UnknownQuestion),
            Some(_) if evaluation.is_active(question_id) => None,
            Some(question) if cutoff.is_some_and(|cutoff| question.order > cutoff) => {
                Some(DropReason::AfterTermination)
            }
            Some(_) => Some(DropReason::Hidden),
        };
        match reason {
            None => {
                kept.insert(question_id.clone(), answer.clone());
            }
            Some(reason) => {
                tracing::debug!(question = %question_id, ?reason, "dropping submitted answer");
                dropped.push(DroppedAnswer {
                    question_id: question_id.clone(),
                    reason,
                });
            }
        }
    }

    SubmissionReview {
        valid: errors.is_empty(),
        answers: ValidatedAnswers {
            answers: kept,
            trace: evaluation.active_order.clone(),
            terminated: evaluation.terminated,
            termination_question_id: evaluation.termination_question_id.clone(),
        },
        errors,
        dropped,
        evaluation,
    }
}
