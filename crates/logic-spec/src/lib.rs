#![allow(missing_docs)]

pub mod answers;
pub mod condition;
pub mod engine;
pub mod integrity;
pub mod progress;
pub mod render;
pub mod resolver;
pub mod spec;
pub mod validate;
pub mod visibility;

pub use answers::{
    AnswerMap, AnswerSet, AnswerValue, ValidationError, ValidationErrorKind, answers_to_json,
    parse_answers, parse_number,
};
pub use engine::{Evaluation, EvaluationState, evaluate_all};
pub use integrity::{IssueSeverity, RuleIssue, RuleIssueKind, check_rule, lint};
pub use progress::{Progress, next_question, next_unanswered, previous_question, progress};
pub use render::{
    RenderPayload, RenderQuestion, RenderStatus, build_render_payload, payload_from_evaluation,
    render_json_ui, render_text,
};
pub use resolver::{Effect, resolve};
pub use spec::{
    LOGIC_VERSION, LogicAction, LogicOperator, LogicRule, Question, QuestionId, SpecError,
    SurveyLogicSpec,
};
pub use validate::{
    DropReason, DroppedAnswer, SubmissionReview, ValidatedAnswers, review_submission,
    validate_submission,
};
pub use visibility::{Visibility, VisibilityMap};
