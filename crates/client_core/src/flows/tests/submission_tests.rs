use super::*;
use crate::{
    gateway::Endpoint,
    notice::NoticeLevel,
    test_support::RecordingGateway,
};
use serde_json::json;
use shared::domain::Questions;

fn identity() -> ClientIdentity {
    ClientIdentity::parse("user_k3j9x2m1q_lx2abc").expect("identity")
}

fn filled_form() -> CaseForm {
    CaseForm {
        knowledge_points: "digital transformation".into(),
        learning_objectives: "plan a rollout".into(),
        case_scenario: "manufacturing".into(),
        ..CaseForm::default()
    }
}

fn flow() -> SubmissionFlow {
    SubmissionFlow::new(FlowId(1), identity())
}

#[tokio::test]
async fn blank_required_fields_never_reach_the_gateway() {
    let gateway = RecordingGateway::new();
    let mut flow = flow();

    for blank in 0..3 {
        let mut form = filled_form();
        match blank {
            0 => form.knowledge_points.clear(),
            1 => form.learning_objectives = "   ".into(),
            _ => form.case_scenario.clear(),
        }
        let err = flow.submit(&gateway, &form).await.expect_err("must be rejected");
        assert!(matches!(err, FlowError::Client(ClientError::Validation(_))));
    }

    assert_eq!(gateway.call_count(), 0);
    assert_eq!(flow.state(), &SubmissionState::Idle);
}

#[test]
fn validation_reports_every_missing_field_in_form_order() {
    let form = CaseForm {
        question_type: " ".into(),
        ..CaseForm::default()
    };
    let err = validate(&form).expect_err("invalid");
    let fields: Vec<CaseField> = err.fields.iter().map(|e| e.field).collect();
    assert_eq!(
        fields,
        vec![
            CaseField::KnowledgePoints,
            CaseField::LearningObjectives,
            CaseField::CaseScenario,
            CaseField::QuestionType,
        ]
    );
}

#[test]
fn question_type_is_optional_when_questions_are_not_requested() {
    let form = CaseForm {
        generate_questions: false,
        question_type: String::new(),
        case_materials: "  ".into(),
        ..filled_form()
    };
    let request = validate(&form).expect("valid");
    assert_eq!(request.case_materials, None);
    assert!(!request.generate_questions);
}

#[tokio::test]
async fn successful_submission_stores_artifact_and_reports_tokens() {
    let gateway = RecordingGateway::new().respond(Ok(json!({
        "success": true,
        "case_content": "X",
        "questions": "1. Why?",
        "session_id": "sess-1",
        "case_id": 12,
        "tokens_used": 321
    })));
    let mut flow = flow();

    let notices = flow.submit(&gateway, &filled_form()).await.expect("submit");

    assert_eq!(flow.state(), &SubmissionState::Success);
    let artifact = flow.artifact().expect("artifact");
    assert_eq!(artifact.case_content, "X");
    assert_eq!(artifact.questions, Some(Questions::Text("1. Why?".into())));
    assert_eq!(artifact.case_id, Some(shared::domain::CaseId(12)));
    assert_eq!(notices.len(), 2);
    assert_eq!(notices[1].level, NoticeLevel::Info);
    assert!(notices[1].text.contains("321"));

    let call = gateway.last_call();
    assert_eq!(call.endpoint, Endpoint::ExecuteWorkflow);
    let body = call.body.expect("body");
    assert_eq!(body["user_uuid"], "user_k3j9x2m1q_lx2abc");
    assert_eq!(body["yes_or_no"], "是");
    assert_eq!(body["difficultyLevel"], "中级");
    assert_eq!(body["caseMaterials"], "");
}

#[tokio::test]
async fn minimal_success_payload_is_enough() {
    let gateway = RecordingGateway::new().respond(Ok(json!({ "success": true, "case_content": "X" })));
    let mut flow = flow();

    let notices = flow.submit(&gateway, &filled_form()).await.expect("submit");

    assert_eq!(flow.state(), &SubmissionState::Success);
    assert_eq!(flow.artifact().map(|a| a.case_content.as_str()), Some("X"));
    assert_eq!(notices.len(), 1);
}

#[tokio::test]
async fn rejected_submission_fails_with_server_message_and_keeps_prior_artifact() {
    let gateway = RecordingGateway::new()
        .respond(Ok(json!({ "success": true, "case_content": "first" })))
        .respond(Ok(json!({ "success": false, "error": "bad input" })));
    let mut flow = flow();
    flow.submit(&gateway, &filled_form()).await.expect("first");

    let err = flow.submit(&gateway, &filled_form()).await.expect_err("second fails");

    assert_eq!(err.to_string(), "bad input");
    assert_eq!(
        flow.state(),
        &SubmissionState::Failed {
            message: "bad input".into()
        }
    );
    assert_eq!(
        flow.artifact().map(|a| a.case_content.as_str()),
        Some("first")
    );
}

#[tokio::test]
async fn success_flag_without_content_is_a_failure() {
    let gateway = RecordingGateway::new().respond(Ok(json!({ "success": true, "case_content": "" })));
    let mut flow = flow();

    flow.submit(&gateway, &filled_form()).await.expect_err("no content");

    assert!(matches!(flow.state(), SubmissionState::Failed { .. }));
    assert!(flow.artifact().is_none());
}

#[tokio::test]
async fn network_failure_surfaces_server_hint() {
    let gateway = RecordingGateway::new()
        .respond(Err(ApiError::Network("connection refused".into())));
    let mut flow = flow();

    flow.submit(&gateway, &filled_form()).await.expect_err("network");

    match flow.state() {
        SubmissionState::Failed { message } => assert!(message.contains("backend server")),
        other => panic!("unexpected state {other:?}"),
    }
}

#[test]
fn second_submission_is_blocked_while_submitting() {
    let mut flow = flow();
    let pending = flow.begin(&filled_form()).expect("begin");

    assert!(!flow.can_submit());
    assert_eq!(flow.begin(&filled_form()).expect_err("busy"), FlowError::Busy);

    flow.complete(
        pending,
        Ok(CaseArtifact {
            case_content: "done".into(),
            questions: None,
            session_id: None,
            case_id: None,
            tokens_used: 0,
        }),
    )
    .expect("complete");
    assert!(flow.can_submit());
}

#[test]
fn artifact_is_hidden_while_a_new_submission_runs() {
    let mut flow = flow();
    let first = flow.begin(&filled_form()).expect("begin");
    flow.complete(
        first,
        Ok(CaseArtifact {
            case_content: "shown".into(),
            questions: None,
            session_id: None,
            case_id: None,
            tokens_used: 0,
        }),
    )
    .expect("complete");

    let _second = flow.begin(&filled_form()).expect("begin again");

    assert_eq!(flow.state(), &SubmissionState::Submitting);
    assert!(flow.artifact().is_none());
}

#[test]
fn results_for_another_flow_are_ignored() {
    let mut old_flow = flow();
    let stale = old_flow.begin(&filled_form()).expect("begin");

    let mut fresh = SubmissionFlow::new(FlowId(2), identity());
    let _pending = fresh.begin(&filled_form()).expect("begin");
    let notices = fresh
        .complete(stale, Err(ApiError::server(Some(500), "boom")))
        .expect("ignored");

    assert!(notices.is_empty());
    assert_eq!(fresh.state(), &SubmissionState::Submitting);
}

#[test]
fn invalid_retry_after_failure_returns_to_idle_with_field_errors() {
    let mut flow = flow();
    let pending = flow.begin(&filled_form()).expect("begin");
    let _ = flow.complete(pending, Err(ApiError::server(None, "bad input")));

    let _ = flow.begin(&CaseForm::default());

    assert_eq!(flow.state(), &SubmissionState::Idle);
    assert_eq!(flow.field_errors().len(), 3);
}
