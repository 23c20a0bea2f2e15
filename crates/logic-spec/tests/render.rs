use serde_json::json;

use logic_spec::{
    LOGIC_VERSION, LogicAction, LogicOperator, LogicRule, Question, SurveyLogicSpec, parse_answers,
    render::{RenderStatus, build_render_payload, render_json_ui, render_text},
};

fn fixture() -> SurveyLogicSpec {
    SurveyLogicSpec::from_json(include_str!("../tests/fixtures/customer_feedback.json"))
        .expect("deserialize")
}

#[test]
fn render_text_includes_next_question() {
    let spec = fixture();
    let payload = build_render_payload(&spec, &parse_answers(&json!({})));

    assert_eq!(payload.status, RenderStatus::NeedInput);
    assert_eq!(payload.next_question_id.as_deref(), Some("q1"));

    let text = render_text(&payload);
    assert!(text.contains("Survey: Customer Feedback (customer-feedback)"));
    assert!(text.contains("Next question: q1"));
    assert!(text.contains("Active questions"));
    assert!(!text.contains("Hidden questions"));
}

#[test]
fn render_json_ui_exposes_structure() {
    let spec = fixture();
    let payload = build_render_payload(&spec, &parse_answers(&json!({ "q1": "no" })));

    let ui = render_json_ui(&payload);
    assert_eq!(ui["survey_id"], "customer-feedback");
    assert_eq!(ui["logic_version"], LOGIC_VERSION);
    assert_eq!(ui["status"], "need_input");
    assert_eq!(ui["next_question_id"], "q5");
    assert_eq!(ui["progress"]["answered"], 1);
    assert_eq!(ui["progress"]["total"], 3);
    assert_eq!(ui["hidden_question_ids"], json!(["q2", "q3", "q4"]));

    let questions = ui["questions"].as_array().expect("questions array");
    assert_eq!(questions.len(), 6);
    let order = questions
        .iter()
        .map(|question| question["id"].as_str().expect("id"))
        .collect::<Vec<_>>();
    assert_eq!(order, vec!["q1", "q5", "q6", "q2", "q3", "q4"]);
    assert_eq!(questions[0]["current_value"], "no");
    assert_eq!(questions[1]["visible"], true);
    assert_eq!(questions[3]["visible"], false);
    assert!(questions[3].get("current_value").is_none());
}

#[test]
fn early_end_renders_terminated_status() {
    let spec = fixture();
    let answers = parse_answers(&json!({
        "q1": "yes",
        "q2": "Kettle",
        "q3": 8,
        "q5": "no"
    }));
    let payload = build_render_payload(&spec, &answers);

    assert_eq!(payload.status, RenderStatus::Terminated);
    assert_eq!(payload.termination_question_id.as_deref(), Some("q5"));
    assert!(payload.next_question_id.is_none());
    assert!(payload.progress.is_complete());

    let text = render_text(&payload);
    assert!(text.contains("Survey ended at q5."));
    assert!(text.contains("Hidden questions: q4, q6"));
    assert!(text.contains(" - q3 (How satisfied are you (1-10)?) [required] = 8"));
}

#[test]
fn complete_survey_reports_all_answered() {
    let spec = fixture();
    let answers = parse_answers(&json!({
        "q1": "no",
        "q5": "yes",
        "q6": "me@example.com"
    }));
    let payload = build_render_payload(&spec, &answers);

    assert_eq!(payload.status, RenderStatus::Complete);
    assert_eq!(render_json_ui(&payload)["status"], "complete");
    assert!(render_text(&payload).contains("All active questions are answered."));
}

#[test]
fn active_questions_follow_trace_and_render_once() {
    let spec = SurveyLogicSpec {
        id: "dup".into(),
        title: "Duplicates".into(),
        version: "1".into(),
        logic_version: None,
        description: None,
        questions: vec![
            Question::new("Q1", 0).with_title("Start"),
            Question::new("Q2", 1).with_title("Kept"),
            Question::new("Q3", 2).with_title("Last"),
            Question::new("Q2", 5).with_title("Shadowed"),
        ],
        rules: vec![
            LogicRule::new("r1", "Q1", LogicOperator::Equals, "skip", LogicAction::SkipTo)
                .targeting("Q3"),
        ],
    };
    let payload = build_render_payload(&spec, &parse_answers(&json!({ "Q1": "skip" })));

    let order = payload
        .questions
        .iter()
        .map(|question| (question.id.as_str(), question.visible))
        .collect::<Vec<_>>();
    assert_eq!(order, vec![("Q1", true), ("Q3", true), ("Q2", false)]);
    assert_eq!(payload.question("Q2").map(|question| question.title.as_str()), Some("Kept"));

    let text = render_text(&payload);
    assert!(text.contains(" - Q3 (Last)"));
    assert!(!text.contains("Shadowed"));
    assert_eq!(text.matches(" - Q1 (Start)").count(), 1);
    assert!(text.contains("Hidden questions: Q2"));
}
