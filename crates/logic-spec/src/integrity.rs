use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::spec::question::Question;
use crate::spec::rule::{LogicAction, LogicRule};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    /// The rule is ignored during evaluation.
    Error,
    /// The rule still runs but is probably not what the author meant.
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleIssueKind {
    UnknownSource,
    UnknownTarget,
    SelfTarget,
    MissingTarget,
    IgnoredTarget,
    MissingConditionValue,
    PriorityCollision,
    BackwardSkip,
    BackwardVisibility,
}

impl RuleIssueKind {
    pub fn severity(self) -> IssueSeverity {
        match self {
            RuleIssueKind::UnknownSource
            | RuleIssueKind::UnknownTarget
            | RuleIssueKind::SelfTarget
            | RuleIssueKind::MissingTarget => IssueSeverity::Error,
            RuleIssueKind::IgnoredTarget
            | RuleIssueKind::MissingConditionValue
            | RuleIssueKind::PriorityCollision
            | RuleIssueKind::BackwardSkip
            | RuleIssueKind::BackwardVisibility => IssueSeverity::Warning,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            RuleIssueKind::UnknownSource => "source question is not part of this survey",
            RuleIssueKind::UnknownTarget => "target question is not part of this survey",
            RuleIssueKind::SelfTarget => "rule targets its own source question",
            RuleIssueKind::MissingTarget => "action requires a target question",
            RuleIssueKind::IgnoredTarget => "end rules ignore their target question",
            RuleIssueKind::MissingConditionValue => "operator compares against an empty value",
            RuleIssueKind::PriorityCollision => {
                "another rule on the same source shares this priority"
            }
            RuleIssueKind::BackwardSkip => "skip jumps backwards and ends the survey when reached",
            RuleIssueKind::BackwardVisibility => {
                "show/hide aimed at an earlier question never changes the active order"
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleIssue {
    pub rule_id: String,
    pub kind: RuleIssueKind,
    pub severity: IssueSeverity,
    pub message: String,
}

impl RuleIssue {
    fn new(rule: &LogicRule, kind: RuleIssueKind) -> Self {
        Self {
            rule_id: rule.id.clone(),
            kind,
            severity: kind.severity(),
            message: kind.describe().to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == IssueSeverity::Error
    }
}

/// Question id to order, first occurrence wins.
pub fn question_orders(questions: &[Question]) -> BTreeMap<&str, u32> {
    let mut orders = BTreeMap::new();
    for question in questions {
        orders.entry(question.id.as_str()).or_insert(question.order);
    }
    orders
}

/// Checks the defects that make a rule unusable.
pub fn check_rule(rule: &LogicRule, orders: &BTreeMap<&str, u32>) -> Result<(), RuleIssueKind> {
    if !orders.contains_key(rule.source_question_id.as_str()) {
        return Err(RuleIssueKind::UnknownSource);
    }
    if !rule.action.needs_target() {
        return Ok(());
    }
    match rule.target() {
        None => Err(RuleIssueKind::MissingTarget),
        Some(target) if target == rule.source_question_id => Err(RuleIssueKind::SelfTarget),
        Some(target) if !orders.contains_key(target) => Err(RuleIssueKind::UnknownTarget),
        Some(_) => Ok(()),
    }
}

/// Authoring report: blocking defects plus warnings, in rule order.
pub fn lint(questions: &[Question], rules: &[LogicRule]) -> Vec<RuleIssue> {
    let orders = question_orders(questions);
    let mut issues = Vec::new();
    let mut seen_priorities = BTreeSet::new();

    for rule in rules {
        if let Err(kind) = check_rule(rule, &orders) {
            issues.push(RuleIssue::new(rule, kind));
            continue;
        }

        if rule.action == LogicAction::End && rule.target().is_some() {
            issues.push(RuleIssue::new(rule, RuleIssueKind::IgnoredTarget));
        }
        if rule.operator.uses_condition_value() && rule.condition_value.trim().is_empty() {
            issues.push(RuleIssue::new(rule, RuleIssueKind::MissingConditionValue));
        }
        if !seen_priorities.insert((rule.source_question_id.as_str(), rule.priority)) {
            issues.push(RuleIssue::new(rule, RuleIssueKind::PriorityCollision));
        }
        if let Some(target) = rule.target()
            && let (Some(source_order), Some(target_order)) = (
                orders.get(rule.source_question_id.as_str()),
                orders.get(target),
            )
            && target_order < source_order
        {
            match rule.action {
                LogicAction::SkipTo => issues.push(RuleIssue::new(rule, RuleIssueKind::BackwardSkip)),
                LogicAction::Show | LogicAction::Hide => {
                    issues.push(RuleIssue::new(rule, RuleIssueKind::BackwardVisibility))
                }
                LogicAction::End => {}
            }
        }
    }

    issues
}
