use pretty_assertions::assert_eq;

use logic_spec::{
    AnswerMap, AnswerValue, LogicAction, LogicOperator, LogicRule, Question, SurveyLogicSpec,
    Visibility, evaluate_all,
};

fn questions(count: u32) -> Vec<Question> {
    (0..count)
        .map(|order| Question::new(format!("Q{}", order + 1), order))
        .collect()
}

fn answers(pairs: &[(&str, &str)]) -> AnswerMap {
    pairs
        .iter()
        .map(|(id, value)| (id.to_string(), AnswerValue::from(*value)))
        .collect()
}

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[test]
fn simple_hide_removes_target_from_active_order() {
    let mut questions = questions(2);
    questions[1].required = true;
    let rules = vec![
        LogicRule::new("r1", "Q1", LogicOperator::Equals, "no", LogicAction::Hide).targeting("Q2"),
    ];

    let evaluation = evaluate_all(&questions, &rules, &answers(&[("Q1", "no")]));
    assert_eq!(evaluation.active_order, ids(&["Q1"]));
    assert_eq!(evaluation.visibility["Q2"], Visibility::Hidden);
    assert!(!evaluation.terminated);

    let evaluation = evaluate_all(&questions, &rules, &answers(&[("Q1", "yes")]));
    assert_eq!(evaluation.active_order, ids(&["Q1", "Q2"]));
}

#[test]
fn skip_range_hides_questions_between_source_and_target() {
    let questions = questions(4);
    let rules = vec![
        LogicRule::new("r1", "Q1", LogicOperator::Equals, "skip", LogicAction::SkipTo)
            .targeting("Q4"),
        // Q2's own rule must never run once Q2 is skipped.
        LogicRule::new("r2", "Q2", LogicOperator::IsNotAnswered, "", LogicAction::End),
        LogicRule::new("r3", "Q3", LogicOperator::IsNotAnswered, "", LogicAction::Show)
            .targeting("Q2"),
    ];

    let evaluation = evaluate_all(&questions, &rules, &answers(&[("Q1", "skip")]));
    assert_eq!(evaluation.active_order, ids(&["Q1", "Q4"]));
    assert_eq!(evaluation.visibility["Q2"], Visibility::Hidden);
    assert_eq!(evaluation.visibility["Q3"], Visibility::Hidden);
    assert!(!evaluation.terminated);
}

#[test]
fn end_rule_terminates_at_source() {
    let questions = questions(4);
    let rules = vec![LogicRule::new("r1", "Q2", LogicOperator::IsAnswered, "", LogicAction::End)];

    let evaluation = evaluate_all(&questions, &rules, &answers(&[("Q2", "anything")]));
    assert!(evaluation.terminated);
    assert_eq!(evaluation.termination_question_id.as_deref(), Some("Q2"));
    assert_eq!(evaluation.active_order, ids(&["Q1", "Q2"]));

    let evaluation = evaluate_all(&questions, &rules, &answers(&[("Q2", "  ")]));
    assert!(!evaluation.terminated);
    assert_eq!(evaluation.active_order.len(), 4);
}

#[test]
fn skip_cycle_terminates_instead_of_looping() {
    let questions = questions(2);
    let rules = vec![
        LogicRule::new("ab", "Q1", LogicOperator::IsAnswered, "", LogicAction::SkipTo)
            .targeting("Q2"),
        LogicRule::new("ba", "Q2", LogicOperator::IsAnswered, "", LogicAction::SkipTo)
            .targeting("Q1"),
    ];

    let evaluation = evaluate_all(&questions, &rules, &answers(&[("Q1", "a"), ("Q2", "b")]));
    assert!(evaluation.terminated);
    assert_eq!(evaluation.termination_question_id.as_deref(), Some("Q2"));
    assert_eq!(evaluation.active_order, ids(&["Q1", "Q2"]));
}

#[test]
fn backward_skip_ends_when_source_is_reached_again() {
    let questions = questions(4);
    let rules = vec![
        LogicRule::new("back", "Q3", LogicOperator::Equals, "again", LogicAction::SkipTo)
            .targeting("Q1"),
    ];

    let evaluation = evaluate_all(&questions, &rules, &answers(&[("Q3", "again")]));
    assert!(evaluation.terminated);
    assert_eq!(evaluation.termination_question_id.as_deref(), Some("Q3"));
    // Questions already walked keep their place in the trace.
    assert_eq!(evaluation.active_order, ids(&["Q1", "Q2", "Q3"]));
    assert_eq!(evaluation.visibility["Q2"], Visibility::Visible);
    assert_eq!(evaluation.visibility["Q4"], Visibility::Hidden);
}

#[test]
fn hide_aimed_at_walked_question_is_ignored() {
    let mut questions = questions(4);
    questions[0].required = true;
    let rules = vec![
        LogicRule::new("skip", "Q1", LogicOperator::Equals, "go", LogicAction::SkipTo)
            .targeting("Q3"),
        LogicRule::new("hide", "Q3", LogicOperator::IsAnswered, "", LogicAction::Hide)
            .targeting("Q1"),
    ];

    let evaluation = evaluate_all(
        &questions,
        &rules,
        &answers(&[("Q1", "go"), ("Q3", "x"), ("Q4", "y")]),
    );
    assert_eq!(evaluation.active_order, ids(&["Q1", "Q3", "Q4"]));
    assert_eq!(evaluation.visibility["Q1"], Visibility::Visible);
    assert_eq!(evaluation.visibility["Q2"], Visibility::Hidden);
}

#[test]
fn equal_priority_skips_fire_lower_rule_id() {
    let questions = questions(5);
    let rules = vec![
        LogicRule::new("b", "Q1", LogicOperator::IsAnswered, "", LogicAction::SkipTo)
            .targeting("Q5"),
        LogicRule::new("a", "Q1", LogicOperator::IsAnswered, "", LogicAction::SkipTo)
            .targeting("Q3"),
    ];

    let evaluation = evaluate_all(&questions, &rules, &answers(&[("Q1", "x")]));
    assert_eq!(evaluation.active_order, ids(&["Q1", "Q3", "Q4", "Q5"]));
    assert_eq!(evaluation.visibility["Q2"], Visibility::Hidden);
}

#[test]
fn equal_priority_hide_applies_before_skip() {
    let questions = questions(5);
    let rules = vec![
        LogicRule::new("a", "Q1", LogicOperator::IsAnswered, "", LogicAction::Hide)
            .targeting("Q5")
            .with_priority(1),
        LogicRule::new("b", "Q1", LogicOperator::IsAnswered, "", LogicAction::SkipTo)
            .targeting("Q3")
            .with_priority(1),
    ];

    let evaluation = evaluate_all(&questions, &rules, &answers(&[("Q1", "x")]));
    assert_eq!(evaluation.active_order, ids(&["Q1", "Q3", "Q4"]));
}

#[test]
fn equal_priority_resolves_to_higher_rule_id() {
    let questions = questions(2);
    let show = LogicRule::new("rule-a", "Q1", LogicOperator::IsAnswered, "", LogicAction::Show)
        .targeting("Q2")
        .with_priority(3);
    let hide = LogicRule::new("rule-b", "Q1", LogicOperator::IsAnswered, "", LogicAction::Hide)
        .targeting("Q2")
        .with_priority(3);
    let answers = answers(&[("Q1", "x")]);

    let forward = evaluate_all(&questions, &[show.clone(), hide.clone()], &answers);
    let reversed = evaluate_all(&questions, &[hide, show], &answers);
    assert_eq!(forward, reversed);
    assert_eq!(forward.active_order, ids(&["Q1"]));
}

#[test]
fn lower_priority_number_wins_for_same_target() {
    let questions = questions(3);
    let rules = vec![
        LogicRule::new("z-hide", "Q1", LogicOperator::IsAnswered, "", LogicAction::Hide)
            .targeting("Q3")
            .with_priority(9),
        LogicRule::new("a-show", "Q1", LogicOperator::IsAnswered, "", LogicAction::Show)
            .targeting("Q3")
            .with_priority(1),
    ];

    let evaluation = evaluate_all(&questions, &rules, &answers(&[("Q1", "x")]));
    assert_eq!(evaluation.active_order, ids(&["Q1", "Q2", "Q3"]));
}

#[test]
fn later_source_can_show_a_question_hidden_earlier() {
    let questions = questions(3);
    let rules = vec![
        LogicRule::new("hide", "Q1", LogicOperator::Equals, "no", LogicAction::Hide)
            .targeting("Q3"),
        LogicRule::new("show", "Q2", LogicOperator::Equals, "yes", LogicAction::Show)
            .targeting("Q3"),
    ];

    let hidden = evaluate_all(&questions, &rules, &answers(&[("Q1", "no")]));
    assert_eq!(hidden.active_order, ids(&["Q1", "Q2"]));

    let shown = evaluate_all(&questions, &rules, &answers(&[("Q1", "no"), ("Q2", "yes")]));
    assert_eq!(shown.active_order, ids(&["Q1", "Q2", "Q3"]));
}

#[test]
fn malformed_rules_are_skipped_not_fatal() {
    let questions = questions(3);
    let rules = vec![
        LogicRule::new("dangling", "Q1", LogicOperator::IsAnswered, "", LogicAction::Hide)
            .targeting("elsewhere"),
        LogicRule::new("no-target", "Q1", LogicOperator::IsAnswered, "", LogicAction::SkipTo),
        LogicRule::new("good", "Q1", LogicOperator::IsAnswered, "", LogicAction::Hide)
            .targeting("Q2"),
    ];

    let evaluation = evaluate_all(&questions, &rules, &answers(&[("Q1", "x")]));
    assert_eq!(evaluation.active_order, ids(&["Q1", "Q3"]));
    assert_eq!(evaluation.skipped_rules, ids(&["dangling", "no-target"]));
}

#[test]
fn questions_are_walked_by_order_not_input_position() {
    let questions = vec![
        Question::new("last", 2),
        Question::new("first", 0),
        Question::new("middle", 1),
    ];
    let evaluation = evaluate_all(&questions, &[], &AnswerMap::new());
    assert_eq!(evaluation.active_order, ids(&["first", "middle", "last"]));
}

#[test]
fn fixture_survey_skips_to_contact_question() {
    let spec = SurveyLogicSpec::from_json(include_str!("fixtures/customer_feedback.json"))
        .expect("fixture parses");
    let evaluation = spec.evaluate(&answers(&[("q1", "no")]));
    assert_eq!(evaluation.active_order, ids(&["q1", "q5", "q6"]));

    let evaluation = spec.evaluate(&answers(&[("q1", "yes"), ("q3", "9"), ("q5", "no")]));
    assert_eq!(evaluation.active_order, ids(&["q1", "q2", "q3", "q5"]));
    assert!(evaluation.terminated);
}

#[test]
fn repeated_evaluation_is_identical() {
    let spec = SurveyLogicSpec::from_json(include_str!("fixtures/customer_feedback.json"))
        .expect("fixture parses");
    let answers = answers(&[("q1", "yes"), ("q3", "3")]);
    let first = spec.evaluate(&answers);
    for _ in 0..10 {
        assert_eq!(spec.evaluate(&answers), first);
    }
}
