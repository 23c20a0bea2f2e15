//! Whole-survey evaluation pass.
//!
//! [`evaluate_all`] is a pure function of its inputs. The respondent client
//! calls it after every answer change and the server calls it once per
//! submission; both must get the same [`Evaluation`].

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::answers::{AnswerMap, AnswerValue};
use crate::integrity::{check_rule, question_orders};
use crate::resolver::{Effect, resolve};
use crate::spec::question::Question;
use crate::spec::rule::LogicRule;
use crate::visibility::{Visibility, VisibilityMap};

/// Mutable state of one evaluation pass.
#[derive(Debug, Clone)]
pub struct EvaluationState<'a> {
    pub answers: &'a AnswerMap,
    pub visibility: VisibilityMap,
    pub terminated: bool,
    pub termination_question_id: Option<String>,
}

impl<'a> EvaluationState<'a> {
    pub fn new(answers: &'a AnswerMap) -> Self {
        Self {
            answers,
            visibility: VisibilityMap::new(),
            terminated: false,
            termination_question_id: None,
        }
    }

    pub fn answer(&self, question_id: &str) -> Option<&'a AnswerValue> {
        self.answers.get(question_id)
    }

    /// Questions default to visible until an effect says otherwise.
    pub fn is_hidden(&self, question_id: &str) -> bool {
        self.visibility.get(question_id) == Some(&Visibility::Hidden)
    }

    pub fn set(&mut self, question_id: &str, visibility: Visibility) {
        self.visibility.insert(question_id.to_string(), visibility);
    }

    fn terminate(&mut self, question_id: &str) {
        self.terminated = true;
        self.termination_question_id = Some(question_id.to_string());
    }
}

/// Result of a full pass over the survey.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Questions the respondent sees, in walk order.
    pub active_order: Vec<String>,
    pub terminated: bool,
    pub termination_question_id: Option<String>,
    /// `Visible` exactly for the questions in `active_order`.
    pub visibility: VisibilityMap,
    /// Malformed rules that were ignored.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_rules: Vec<String>,
}

impl Evaluation {
    pub fn is_active(&self, question_id: &str) -> bool {
        self.visibility
            .get(question_id)
            .is_some_and(|visibility| visibility.is_visible())
    }

    pub fn hidden_question_ids(&self) -> Vec<String> {
        crate::visibility::ids_with(&self.visibility, Visibility::Hidden)
    }

    pub fn position(&self, question_id: &str) -> Option<usize> {
        self.active_order.iter().position(|id| id == question_id)
    }
}

/// Questions sorted by `(order, id)`, duplicated ids dropped after the first.
pub(crate) fn walk_order(questions: &[Question]) -> Vec<&Question> {
    let mut seen = BTreeSet::new();
    let mut ordered: Vec<&Question> = questions
        .iter()
        .filter(|question| seen.insert(question.id.as_str()))
        .collect();
    ordered.sort_by(|left, right| left.order.cmp(&right.order).then_with(|| left.id.cmp(&right.id)));
    ordered
}

pub fn evaluate_all(questions: &[Question], rules: &[LogicRule], answers: &AnswerMap) -> Evaluation {
    let ordered = walk_order(questions);
    if ordered.len() < questions.len() {
        tracing::warn!(
            duplicates = questions.len() - ordered.len(),
            "duplicate question ids ignored"
        );
    }
    let positions: BTreeMap<&str, usize> = ordered
        .iter()
        .enumerate()
        .map(|(index, question)| (question.id.as_str(), index))
        .collect();

    let orders = question_orders(questions);
    let mut skipped_rules = Vec::new();
    let mut by_source: BTreeMap<&str, Vec<&LogicRule>> = BTreeMap::new();
    for rule in rules {
        match check_rule(rule, &orders) {
            Ok(()) => by_source
                .entry(rule.source_question_id.as_str())
                .or_default()
                .push(rule),
            Err(kind) => {
                tracing::warn!(rule = %rule.id, issue = kind.describe(), "skipping malformed rule");
                skipped_rules.push(rule.id.clone());
            }
        }
    }

    let mut state = EvaluationState::new(answers);
    let mut walked: Vec<&str> = Vec::new();
    let mut jumped: BTreeSet<&str> = BTreeSet::new();
    let mut index = 0;

    while index < ordered.len() {
        let question = ordered[index];
        let id = question.id.as_str();
        index += 1;
        if state.is_hidden(id) {
            continue;
        }
        if !walked.contains(&id) {
            walked.push(id);
        }

        let source_rules = by_source.get(id).into_iter().flatten().copied();
        for effect in resolve(id, source_rules, &state) {
            match effect {
                // A walked question already joined the active order and its
                // rules already ran; it keeps its place.
                Effect::Show(target) | Effect::Hide(target) if walked.contains(&target) => {
                    tracing::debug!(source = id, target, "ignoring visibility change for a walked question");
                }
                Effect::Show(target) => state.set(target, Visibility::Visible),
                Effect::Hide(target) => state.set(target, Visibility::Hidden),
                Effect::SkipTo(target) => {
                    if jumped.contains(id) || jumped.contains(target) {
                        tracing::debug!(source = id, target, "skip would revisit a jump; ending");
                        state.terminate(id);
                        break;
                    }
                    jumped.insert(id);
                    let Some(&target_index) = positions.get(target) else {
                        continue;
                    };
                    let current = index - 1;
                    let between = if target_index > current {
                        current + 1..target_index
                    } else {
                        target_index + 1..current
                    };
                    for skipped in &ordered[between] {
                        if !walked.contains(&skipped.id.as_str()) {
                            state.set(&skipped.id, Visibility::Hidden);
                        }
                    }
                    state.set(target, Visibility::Visible);
                    index = target_index;
                }
                Effect::End => {
                    jumped.insert(id);
                    state.terminate(id);
                }
            }
        }

        if state.terminated {
            tracing::debug!(question = id, "survey terminated early");
            break;
        }
    }

    let active_order: Vec<String> = walked.into_iter().map(str::to_string).collect();
    let visibility = ordered
        .iter()
        .map(|question| {
            let visibility = if active_order.contains(&question.id) {
                Visibility::Visible
            } else {
                Visibility::Hidden
            };
            (question.id.clone(), visibility)
        })
        .collect();

    Evaluation {
        active_order,
        terminated: state.terminated,
        termination_question_id: state.termination_question_id,
        visibility,
        skipped_rules,
    }
}
