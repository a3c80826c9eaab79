use esign_cli::api::ContactStore;
use esign_cli::workflow::{
    prepare_workflow, PreparedWorkflow, Submission, SubmissionError, SubmissionPhase, SubmissionState,
};
use serde_json::json;

use crate::fakes::{contact, receiver, sender, session, template, FakeBackend};

fn backend() -> FakeBackend {
    FakeBackend::new()
        .with_workflow(
            "wf-a",
            json!({"_id": "wf-a", "templates": [{"template_id": "t1"}], "enforce_signature_order": true}),
        )
        .with_template("t1", template("t1", "Purchase", json!([sender(), receiver("Buyer")])))
        .with_contact(contact("c1", "Ada", "ada@example.com"))
}

async fn prepared(backend: &FakeBackend, bind_buyer: bool) -> PreparedWorkflow {
    let mut prepared = prepare_workflow(backend, backend, &session(), "wf-a").await.unwrap();
    if bind_buyer {
        let contacts = backend.list_contacts("company-1", None).await.unwrap();
        prepared.bindings.bind("Buyer", "c1", &contacts[0]).unwrap();
    }
    prepared
}

#[tokio::test]
async fn test_incomplete_binding_blocks_without_calls() {
    let backend = backend();
    let prepared = prepared(&backend, false).await;

    let mut submission = Submission::new(&backend, "wf-a");
    let err = submission
        .submit(&prepared.bindings, &prepared.payload())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        SubmissionError::IncompleteBinding {
            roles: vec!["Buyer".to_string()]
        }
    );
    assert_eq!(submission.state(), &SubmissionState::Idle);
    assert_eq!(backend.create_count(), 0);
    assert!(backend.sent().is_empty());
}

#[tokio::test]
async fn test_create_then_send() {
    let backend = backend();
    let prepared = prepared(&backend, true).await;

    let mut submission = Submission::new(&backend, "wf-a");
    let response_id = submission
        .submit(&prepared.bindings, &prepared.payload())
        .await
        .unwrap();

    assert_eq!(response_id, "r1");
    assert_eq!(
        submission.state(),
        &SubmissionState::Sent {
            response_id: "r1".into()
        }
    );
    assert_eq!(backend.sent(), vec![("wf-a".to_string(), "r1".to_string())]);

    let created = backend.created.lock().unwrap().clone();
    assert_eq!(created.len(), 1);
    let (workflow_id, payload) = &created[0];
    assert_eq!(workflow_id, "wf-a");
    assert!(payload.enforce_signature_order);
    assert_eq!(payload.workflow_users.len(), 1);
    assert_eq!(payload.workflow_users[0].contact_id.as_deref(), Some("c1"));

    let again = submission
        .submit(&prepared.bindings, &prepared.payload())
        .await
        .unwrap_err();
    assert_eq!(again, SubmissionError::AlreadySent { response_id: "r1".into() });
    assert_eq!(backend.create_count(), 1);
}

#[tokio::test]
async fn test_flat_response_id_shape() {
    let backend = backend().with_create_reply(json!({"_id": "r2"}));
    let prepared = prepared(&backend, true).await;

    let mut submission = Submission::new(&backend, "wf-a");
    let response_id = submission
        .submit(&prepared.bindings, &prepared.payload())
        .await
        .unwrap();

    assert_eq!(response_id, "r2");
    assert_eq!(backend.sent(), vec![("wf-a".to_string(), "r2".to_string())]);
}

#[tokio::test]
async fn test_missing_response_id_fails_before_send() {
    let backend = backend().with_create_reply(json!({"success": true, "data": {}}));
    let prepared = prepared(&backend, true).await;

    let mut submission = Submission::new(&backend, "wf-a");
    let err = submission
        .submit(&prepared.bindings, &prepared.payload())
        .await
        .unwrap_err();

    assert_eq!(err, SubmissionError::ResponseIdMissing);
    assert_eq!(err.phase(), Some(SubmissionPhase::Create));
    assert!(matches!(
        submission.state(),
        SubmissionState::Failed {
            phase: SubmissionPhase::Create,
            response_id: None,
            ..
        }
    ));
    assert!(backend.sent().is_empty());
}

#[tokio::test]
async fn test_create_failure_is_tagged_with_phase() {
    let backend = backend().failing_create();
    let prepared = prepared(&backend, true).await;

    let mut submission = Submission::new(&backend, "wf-a");
    let err = submission
        .submit(&prepared.bindings, &prepared.payload())
        .await
        .unwrap_err();

    match &err {
        SubmissionError::Transport { phase, message } => {
            assert_eq!(*phase, SubmissionPhase::Create);
            assert!(message.contains("HTTP 502"));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(err.to_string().starts_with("failed to create workflow response"));
    assert!(backend.sent().is_empty());
    assert_eq!(submission.retry_send().await.unwrap_err(), SubmissionError::NothingToResend);
}

#[tokio::test]
async fn test_send_failure_keeps_response_id_for_retry() {
    let backend = backend().failing_sends(1);
    let prepared = prepared(&backend, true).await;

    let mut submission = Submission::new(&backend, "wf-a");
    let err = submission
        .submit(&prepared.bindings, &prepared.payload())
        .await
        .unwrap_err();

    assert_eq!(err.phase(), Some(SubmissionPhase::Send));
    assert!(matches!(
        submission.state(),
        SubmissionState::Failed {
            phase: SubmissionPhase::Send,
            response_id: Some(id),
            ..
        } if id == "r1"
    ));

    let response_id = submission.retry_send().await.unwrap();
    assert_eq!(response_id, "r1");
    assert_eq!(backend.create_count(), 1);
    assert_eq!(backend.sent().len(), 2);
    assert_eq!(submission.state().name(), "sent");
}

#[tokio::test]
async fn test_resume_sends_existing_response() {
    let backend = backend();

    let mut submission = Submission::resume(&backend, "wf-a", "r-earlier");
    assert_eq!(submission.state().name(), "created");

    submission.retry_send().await.unwrap();
    assert_eq!(backend.sent(), vec![("wf-a".to_string(), "r-earlier".to_string())]);
    assert_eq!(backend.create_count(), 0);
    assert_eq!(
        submission.retry_send().await.unwrap_err(),
        SubmissionError::AlreadySent {
            response_id: "r-earlier".into()
        }
    );
}

#[tokio::test]
async fn test_retry_send_on_idle_submission() {
    let backend = backend();
    let mut submission = Submission::new(&backend, "wf-a");
    assert_eq!(submission.retry_send().await.unwrap_err(), SubmissionError::NothingToResend);
}
