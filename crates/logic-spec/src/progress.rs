use serde::{Deserialize, Serialize};

use crate::answers::AnswerMap;
use crate::engine::Evaluation;

/// Answered/total counters over the active questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Progress {
    pub answered: usize,
    pub total: usize,
}

impl Progress {
    pub fn is_complete(&self) -> bool {
        self.answered >= self.total
    }
}

pub fn progress(evaluation: &Evaluation, answers: &AnswerMap) -> Progress {
    let answered = evaluation
        .active_order
        .iter()
        .filter(|id| is_answered(answers, id))
        .count();
    Progress {
        answered,
        total: evaluation.active_order.len(),
    }
}

fn is_answered(answers: &AnswerMap, question_id: &str) -> bool {
    answers
        .get(question_id)
        .is_some_and(|answer| answer.is_answered())
}

/// Question shown after `current`. Without a current question this is the
/// first active question. `None` at the end of the active order, when
/// `current` is not active, or when the survey ended at `current`.
pub fn next_question<'e>(evaluation: &'e Evaluation, current: Option<&str>) -> Option<&'e str> {
    let Some(current) = current else {
        return evaluation.active_order.first().map(String::as_str);
    };
    if evaluation.termination_question_id.as_deref() == Some(current) {
        return None;
    }
    let position = evaluation.position(current)?;
    evaluation
        .active_order
        .get(position + 1)
        .map(String::as_str)
}

pub fn previous_question<'e>(evaluation: &'e Evaluation, current: &str) -> Option<&'e str> {
    let position = evaluation.position(current)?;
    position
        .checked_sub(1)
        .and_then(|previous| evaluation.active_order.get(previous))
        .map(String::as_str)
}

/// First active question with no submitted value at all. A blank value
/// counts as submitted so optional questions can be passed over.
pub fn next_unanswered<'e>(evaluation: &'e Evaluation, answers: &AnswerMap) -> Option<&'e str> {
    evaluation
        .active_order
        .iter()
        .find(|id| !answers.contains_key(id.as_str()))
        .map(String::as_str)
}
