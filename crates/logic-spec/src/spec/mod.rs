pub mod question;
pub mod rule;
pub mod survey;

pub use question::{Question, QuestionId};
pub use rule::{LogicAction, LogicOperator, LogicRule};
pub use survey::{LOGIC_VERSION, SpecError, SurveyLogicSpec};
