use std::cmp::Ordering;

use crate::condition;
use crate::engine::EvaluationState;
use crate::spec::rule::{LogicAction, LogicRule};

/// A decision produced by a satisfied rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect<'r> {
    Show(&'r str),
    Hide(&'r str),
    SkipTo(&'r str),
    End,
}

/// Scan order: priority ascending, then rule id ascending. The first
/// satisfied `SkipTo`/`End` in this order is the one that fires.
pub fn scan_order(left: &LogicRule, right: &LogicRule) -> Ordering {
    left.priority
        .cmp(&right.priority)
        .then_with(|| left.id.cmp(&right.id))
}

/// Application order of visibility effects: the lowest priority number is
/// applied last, and within one priority the higher rule id is applied last.
fn application_order(left: &LogicRule, right: &LogicRule) -> Ordering {
    right
        .priority
        .cmp(&left.priority)
        .then_with(|| left.id.cmp(&right.id))
}

/// Resolves the rules sourced at `source_question_id` into effects, in the
/// order they must be applied.
///
/// Satisfied rules are scanned in [`scan_order`] up to the first `SkipTo` or
/// `End`; rules after it are not considered. The `Show`/`Hide` effects seen
/// before the cut are returned in application order, so for a shared target
/// the lowest priority number wins and a tie goes to the higher rule id. The
/// navigation effect, if any, comes last.
pub fn resolve<'r>(
    source_question_id: &str,
    rules: impl IntoIterator<Item = &'r LogicRule>,
    state: &EvaluationState<'_>,
) -> Vec<Effect<'r>> {
    let mut candidates: Vec<&LogicRule> = rules
        .into_iter()
        .filter(|rule| rule.source_question_id == source_question_id)
        .collect();
    candidates.sort_by(|left, right| scan_order(left, right));

    let answer = state.answer(source_question_id);
    let mut visibility: Vec<(&LogicRule, Effect<'r>)> = Vec::new();
    let mut navigation = None;

    for rule in candidates {
        if !condition::evaluate(rule.operator, &rule.condition_value, answer) {
            continue;
        }
        let effect = match (rule.action, rule.target()) {
            (LogicAction::Show, Some(target)) => Effect::Show(target),
            (LogicAction::Hide, Some(target)) => Effect::Hide(target),
            (LogicAction::SkipTo, Some(target)) => Effect::SkipTo(target),
            (LogicAction::End, _) => Effect::End,
            (_, None) => continue,
        };
        tracing::trace!(
            rule = %rule.id,
            source = source_question_id,
            operator = rule.operator.as_str(),
            action = rule.action.as_str(),
            "rule satisfied"
        );
        if rule.action.is_navigation() {
            navigation = Some(effect);
            break;
        }
        visibility.push((rule, effect));
    }

    visibility.sort_by(|(left, _), (right, _)| application_order(left, right));
    let mut effects: Vec<Effect<'r>> = visibility.into_iter().map(|(_, effect)| effect).collect();
    effects.extend(navigation);
    effects
}
