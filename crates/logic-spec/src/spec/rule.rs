use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Comparison applied to the source question's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LogicOperator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    GreaterThan,
    LessThan,
    GreaterOrEqual,
    LessOrEqual,
    IsAnswered,
    IsNotAnswered,
    IsOneOf,
    IsNotOneOf,
}

impl LogicOperator {
    /// Presence operators ignore the rule's condition value.
    pub fn uses_condition_value(self) -> bool {
        !matches!(self, LogicOperator::IsAnswered | LogicOperator::IsNotAnswered)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LogicOperator::Equals => "equals",
            LogicOperator::NotEquals => "not_equals",
            LogicOperator::Contains => "contains",
            LogicOperator::NotContains => "not_contains",
            LogicOperator::GreaterThan => "greater_than",
            LogicOperator::LessThan => "less_than",
            LogicOperator::GreaterOrEqual => "greater_or_equal",
            LogicOperator::LessOrEqual => "less_or_equal",
            LogicOperator::IsAnswered => "is_answered",
            LogicOperator::IsNotAnswered => "is_not_answered",
            LogicOperator::IsOneOf => "is_one_of",
            LogicOperator::IsNotOneOf => "is_not_one_of",
        }
    }
}

/// What happens when a rule's condition holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LogicAction {
    Show,
    Hide,
    SkipTo,
    End,
}

impl LogicAction {
    pub fn needs_target(self) -> bool {
        !matches!(self, LogicAction::End)
    }

    pub fn is_navigation(self) -> bool {
        matches!(self, LogicAction::SkipTo | LogicAction::End)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LogicAction::Show => "show",
            LogicAction::Hide => "hide",
            LogicAction::SkipTo => "skip_to",
            LogicAction::End => "end",
        }
    }
}

/// Author-defined condition/action pair attached to a source question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LogicRule {
    pub id: String,
    pub source_question_id: String,
    pub operator: LogicOperator,
    #[serde(default)]
    pub condition_value: String,
    pub action: LogicAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_question_id: Option<String>,
    /// Lower value means higher precedence.
    #[serde(default)]
    pub priority: u32,
}

impl LogicRule {
    pub fn new(
        id: impl Into<String>,
        source_question_id: impl Into<String>,
        operator: LogicOperator,
        condition_value: impl Into<String>,
        action: LogicAction,
    ) -> Self {
        Self {
            id: id.into(),
            source_question_id: source_question_id.into(),
            operator,
            condition_value: condition_value.into(),
            action,
            target_question_id: None,
            priority: 0,
        }
    }

    pub fn targeting(mut self, target_question_id: impl Into<String>) -> Self {
        self.target_question_id = Some(target_question_id.into());
        self
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    pub fn target(&self) -> Option<&str> {
        self.target_question_id.as_deref()
    }
}
