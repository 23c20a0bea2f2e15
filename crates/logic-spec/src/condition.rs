//! Condition evaluation for a single rule against a single answer.
//!
//! Everything here is total and locale-free: strings compare byte for byte and
//! numbers compare as decimals, so every build of the engine agrees.

use crate::answers::{AnswerValue, parse_number};
use crate::spec::rule::LogicOperator;

/// Separator for the literal set used by `IsOneOf` / `IsNotOneOf`.
pub const SET_DELIMITER: char = ',';

/// Tests `answer` against a rule condition. `None` and [`AnswerValue::None`]
/// both mean "no answer".
pub fn evaluate(
    operator: LogicOperator,
    condition_value: &str,
    answer: Option<&AnswerValue>,
) -> bool {
    let answer = answer.filter(|value| !value.is_none());
    match operator {
        LogicOperator::IsAnswered => answer.is_some_and(AnswerValue::is_answered),
        LogicOperator::IsNotAnswered => !answer.is_some_and(AnswerValue::is_answered),
        _ => match answer {
            // Vacuous non-equality is the only comparison an absent answer satisfies.
            None => operator == LogicOperator::NotEquals,
            Some(value) => compare(operator, condition_value, value),
        },
    }
}

fn compare(operator: LogicOperator, condition_value: &str, value: &AnswerValue) -> bool {
    match operator {
        LogicOperator::Equals => equals(value, condition_value),
        LogicOperator::NotEquals => !equals(value, condition_value),
        LogicOperator::Contains => contains(value, condition_value),
        LogicOperator::NotContains => !contains(value, condition_value),
        LogicOperator::GreaterThan => ordered(value, condition_value, |ord| ord.is_gt()),
        LogicOperator::LessThan => ordered(value, condition_value, |ord| ord.is_lt()),
        LogicOperator::GreaterOrEqual => ordered(value, condition_value, |ord| ord.is_ge()),
        LogicOperator::LessOrEqual => ordered(value, condition_value, |ord| ord.is_le()),
        LogicOperator::IsOneOf => one_of(value, condition_value),
        LogicOperator::IsNotOneOf => !one_of(value, condition_value),
        LogicOperator::IsAnswered => value.is_answered(),
        LogicOperator::IsNotAnswered => !value.is_answered(),
    }
}

fn scalar_equals(left: &str, right: &str) -> bool {
    match (parse_number(left), parse_number(right)) {
        (Some(left), Some(right)) => left == right,
        _ => left == right,
    }
}

fn equals(value: &AnswerValue, expected: &str) -> bool {
    match value {
        AnswerValue::Text(text) | AnswerValue::Choice(text) => scalar_equals(text, expected),
        AnswerValue::Number(number) => match parse_number(expected) {
            Some(expected) => *number == expected,
            None => number.normalize().to_string() == expected,
        },
        AnswerValue::Choices(choices) => choices
            .iter()
            .any(|choice| scalar_equals(choice, expected)),
        AnswerValue::None => false,
    }
}

fn contains(value: &AnswerValue, needle: &str) -> bool {
    match value {
        AnswerValue::Text(text) | AnswerValue::Choice(text) => text.contains(needle),
        AnswerValue::Number(number) => number.normalize().to_string().contains(needle),
        AnswerValue::Choices(choices) => choices.iter().any(|choice| choice.contains(needle)),
        AnswerValue::None => false,
    }
}

fn ordered(
    value: &AnswerValue,
    bound: &str,
    accept: impl Fn(std::cmp::Ordering) -> bool,
) -> bool {
    match (value.as_number(), parse_number(bound)) {
        (Some(answer), Some(bound)) => accept(answer.cmp(&bound)),
        _ => false,
    }
}

/// Splits a set literal such as `"red, green ,blue"`; blank items are dropped.
pub fn split_set(literal: &str) -> impl Iterator<Item = &str> {
    literal
        .split(SET_DELIMITER)
        .map(str::trim)
        .filter(|item| !item.is_empty())
}

fn one_of(value: &AnswerValue, literal: &str) -> bool {
    split_set(literal).any(|option| equals(value, option))
}
