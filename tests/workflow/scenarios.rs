use esign_cli::workflow::{
    candidate_contacts, prepare_workflow, Contact, FilterStage, PreparedWorkflow, ResolutionError,
};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::fakes::{contact, receiver, sender, session, template, FakeBackend};

/// Purchase (Buyer + sender) and Disclosure (Buyer + Witness).
fn two_template_backend(templates: Value) -> FakeBackend {
    FakeBackend::new()
        .with_workflow(
            "wf-a",
            json!({"_id": "wf-a", "name": "Home purchase", "templates": templates}),
        )
        .with_template("t1", template("t1", "Purchase", json!([receiver("Buyer"), sender()])))
        .with_template(
            "t2",
            template("t2", "Disclosure", json!([receiver("buyer "), receiver("Witness")])),
        )
        .with_contact(contact("c1", "Ada", "ada@example.com"))
        .with_contact(contact("c2", "Grace", "grace@example.com"))
}

fn scenario_a() -> FakeBackend {
    two_template_backend(json!([
        {"template_id": "t1", "document_order": 1},
        {"template_id": {"_id": "t2", "title": "Disclosure", "status": "ACTIVE"}, "document_order": 2}
    ]))
}

async fn prepare(backend: &FakeBackend, workflow_id: &str) -> PreparedWorkflow {
    prepare_workflow(backend, backend, &session(), workflow_id)
        .await
        .expect("workflow should load")
}

async fn contact_by_id(backend: &FakeBackend, id: &str) -> Contact {
    let prepared_session = session();
    let contacts = esign_cli::api::ContactStore::list_contacts(backend, &prepared_session.company_id, None)
        .await
        .unwrap();
    contacts.into_iter().find(|c| c.id() == Some(id)).unwrap()
}

/// role key -> sorted template ids
fn membership(prepared: &PreparedWorkflow) -> BTreeMap<String, Vec<String>> {
    prepared
        .bindings
        .recipients()
        .iter()
        .map(|r| {
            let mut ids: Vec<String> = r.templates.iter().filter_map(|t| t.template_id.clone()).collect();
            ids.sort();
            (r.role_key.clone(), ids)
        })
        .collect()
}

#[tokio::test]
async fn test_shared_role_collapses_across_templates() {
    let backend = scenario_a();
    let prepared = prepare(&backend, "wf-a").await;

    let keys: Vec<&str> = prepared
        .bindings
        .recipients()
        .iter()
        .map(|r| r.role_key.as_str())
        .collect();
    assert_eq!(keys, vec!["buyer", "sender", "witness"]);

    let buyer = prepared.bindings.get("buyer").unwrap();
    assert_eq!(buyer.role, "Buyer");
    assert_eq!(buyer.templates.len(), 2);
    assert_eq!(buyer.involved_templates(), "Purchase, Disclosure");
    assert_eq!(prepared.bindings.get("sender").unwrap().templates.len(), 1);
    assert_eq!(prepared.bindings.get("witness").unwrap().templates.len(), 1);
    assert!(prepared.skipped.is_empty());
}

#[tokio::test]
async fn test_readiness_requires_every_receiver() {
    let backend = scenario_a();
    let mut prepared = prepare(&backend, "wf-a").await;

    assert!(!prepared.bindings.is_ready());
    assert_eq!(prepared.bindings.incomplete_roles(), vec!["Buyer", "Witness"]);

    prepared
        .bindings
        .bind("buyer", "c1", &contact_by_id(&backend, "c1").await)
        .unwrap();
    assert!(!prepared.bindings.is_ready());

    prepared
        .bindings
        .bind("witness", "c2", &contact_by_id(&backend, "c2").await)
        .unwrap();
    assert!(prepared.bindings.is_ready());

    let payload = prepared.payload();
    assert_eq!(payload.company_id, "company-1");
    assert_eq!(payload.workflow_users.len(), 2);
    assert!(payload.workflow_users.iter().all(|u| u.role != "sender"));

    let buyer = &payload.workflow_users[0];
    assert_eq!(buyer.value, "RECEIVER_1");
    assert_eq!(buyer.contact.email.as_deref(), Some("ada@example.com"));
    assert_eq!(buyer.contact_id.as_deref(), Some("c1"));
    assert_eq!(buyer.full_name, "Ada Tester");
    assert_eq!(buyer.templates.len(), 2);
    assert_eq!(payload.primary_user.as_ref(), Some(buyer));

    let orders: Vec<(String, i64)> = payload
        .document_templates
        .iter()
        .map(|d| (d.template_id.clone(), d.document_order))
        .collect();
    assert_eq!(orders, vec![("t1".to_string(), 1), ("t2".to_string(), 2)]);
    assert!(payload
        .document_templates
        .iter()
        .all(|d| d.template_completion_status == "TO-START" && !d.is_settings_updated));
}

#[tokio::test]
async fn test_inactive_reference_wins_over_active_nested_template() {
    let backend = FakeBackend::new()
        .with_workflow(
            "wf-b",
            json!({"_id": "wf-b", "templates": [
                {"template_id": {"_id": "t1", "status": "ACTIVE"}, "is_active": false}
            ]}),
        )
        .with_template("t1", template("t1", "Purchase", json!([receiver("Buyer")])));

    let prepared = prepare(&backend, "wf-b").await;

    assert!(prepared.bindings.recipients().is_empty());
    assert!(prepared.bindings.is_ready());
    assert!(backend.fetched().is_empty());
    assert!(matches!(
        prepared.skipped.as_slice(),
        [ResolutionError::Inactive { stage: FilterStage::Reference, .. }]
    ));

    let json = serde_json::to_value(prepared.payload()).unwrap();
    assert_eq!(json["document_templates"], json!([]));
    assert_eq!(json["workflow_users"], json!([]));
}

#[tokio::test]
async fn test_inactive_nested_and_fetched_templates_are_dropped() {
    let mut archived = template("t3", "Archived", json!([receiver("Lender")]));
    archived["data"]["is_active"] = json!(false);

    let backend = FakeBackend::new()
        .with_workflow(
            "wf-c",
            json!({"_id": "wf-c", "templates": [
                {"template_id": {"_id": "t2", "status": "DRAFT"}},
                {"template_id": "t3"},
                {"template_id": "t1"}
            ]}),
        )
        .with_template("t1", template("t1", "Purchase", json!([receiver("Buyer")])))
        .with_template("t3", archived);

    let prepared = prepare(&backend, "wf-c").await;

    assert_eq!(prepared.templates.len(), 1);
    assert_eq!(prepared.templates[0].id(), "t1");
    assert_eq!(prepared.bindings.recipients().len(), 1);

    let stages: Vec<(usize, FilterStage)> = prepared
        .skipped
        .iter()
        .map(|e| match e {
            ResolutionError::Inactive { position, stage, .. } => (*position, *stage),
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    assert_eq!(stages, vec![(0, FilterStage::NestedTemplate), (1, FilterStage::Fetched)]);

    // The fetched-inactive reference still passed the reference filter
    let ids: Vec<&str> = prepared.references.iter().map(|r| r.template_id.as_str()).collect();
    assert_eq!(ids, vec!["t3", "t1"]);
}

#[tokio::test]
async fn test_one_failed_fetch_does_not_sink_the_batch() {
    let backend = FakeBackend::new()
        .with_workflow(
            "wf-d",
            json!({"_id": "wf-d", "templates": [{"template_id": "t-broken"}, {"template_id": "t1"}]}),
        )
        .with_template("t1", template("t1", "Purchase", json!([receiver("Buyer")])))
        .with_failing_template("t-broken");

    let prepared = prepare(&backend, "wf-d").await;

    assert_eq!(prepared.templates.len(), 1);
    assert_eq!(prepared.templates[0].id(), "t1");
    assert_eq!(prepared.skipped.len(), 1);
    match &prepared.skipped[0] {
        ResolutionError::Fetch { position, template_id, message } => {
            assert_eq!(*position, 0);
            assert_eq!(template_id, "t-broken");
            assert!(message.contains("HTTP 500"));
        }
        other => panic!("unexpected {other:?}"),
    }

    let mut fetched = backend.fetched();
    fetched.sort();
    assert_eq!(fetched, vec!["t-broken", "t1"]);
}

#[tokio::test]
async fn test_malformed_and_missing_ids_are_reported() {
    let backend = FakeBackend::new()
        .with_workflow(
            "wf-e",
            json!({"_id": "wf-e", "templates": [
                {"template_id": {"title": "No id here"}},
                {"template_id": "t-bad"},
                {"template_id": "t1"}
            ]}),
        )
        .with_template("t1", template("t1", "Purchase", json!([receiver("Buyer")])))
        .with_template("t-bad", json!({"data": {"_id": "t-bad", "document_users": "not-a-list"}}));

    let prepared = prepare(&backend, "wf-e").await;

    assert_eq!(prepared.templates.len(), 1);
    assert!(matches!(prepared.skipped[0], ResolutionError::MissingTemplateId { position: 0 }));
    assert!(matches!(
        &prepared.skipped[1],
        ResolutionError::MalformedEnvelope { position: 1, template_id, .. } if template_id == "t-bad"
    ));
}

#[tokio::test]
async fn test_document_templates_fallback() {
    let backend = FakeBackend::new()
        .with_workflow(
            "wf-f",
            json!({"_id": "wf-f", "document_templates": [{"template_id": "t1", "document_order": 4}]}),
        )
        .with_template("t1", template("t1", "Purchase", json!([receiver("Buyer")])));

    let prepared = prepare(&backend, "wf-f").await;
    assert_eq!(prepared.templates.len(), 1);
    assert_eq!(prepared.payload().document_templates[0].document_order, 4);
}

#[tokio::test]
async fn test_null_fields_read_as_empty() {
    let backend = FakeBackend::new()
        .with_workflow(
            "wf-n",
            json!({
                "_id": "wf-n",
                "templates": null,
                "document_templates": [
                    {"template_id": "t1", "document_order": "1"},
                    {"template_id": "t2", "document_order": 2}
                ],
                "enforce_signature_order": null
            }),
        )
        .with_template("t1", template("t1", "Cover letter", Value::Null))
        .with_template(
            "t2",
            template(
                "t2",
                "Purchase",
                json!([{"role": "Buyer", "type": "RECEIVER", "e_signature_required": null, "e_signature_order": null}]),
            ),
        );

    let prepared = prepare(&backend, "wf-n").await;

    assert!(prepared.skipped.is_empty());
    let ids: Vec<&str> = prepared.templates.iter().map(|t| t.id()).collect();
    assert_eq!(ids, vec!["t1", "t2"]);
    assert_eq!(membership(&prepared).keys().collect::<Vec<_>>(), vec!["buyer"]);

    let payload = prepared.payload();
    assert!(!payload.enforce_signature_order);
    let orders: Vec<i64> = payload.document_templates.iter().map(|d| d.document_order).collect();
    assert_eq!(orders, vec![1, 2]);
}

#[tokio::test]
async fn test_missing_workflow_is_an_error() {
    let backend = FakeBackend::new();
    let err = prepare_workflow(&backend, &backend, &session(), "nope")
        .await
        .unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to load workflow nope"));
}

#[tokio::test]
async fn test_grouping_ignores_template_order() {
    let forward = prepare(&scenario_a(), "wf-a").await;
    let reversed = prepare(
        &two_template_backend(json!([
            {"template_id": {"_id": "t2", "title": "Disclosure", "status": "ACTIVE"}, "document_order": 2},
            {"template_id": "t1", "document_order": 1}
        ])),
        "wf-a",
    )
    .await;

    assert_eq!(membership(&forward), membership(&reversed));
}

#[tokio::test]
async fn test_payload_assembly_is_deterministic() {
    let backend = scenario_a();
    let mut prepared = prepare(&backend, "wf-a").await;
    prepared
        .bindings
        .bind("buyer", "c1", &contact_by_id(&backend, "c1").await)
        .unwrap();

    let first = serde_json::to_string(&prepared.payload()).unwrap();
    let second = serde_json::to_string(&prepared.payload()).unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_reload_discards_bindings() {
    let backend = scenario_a();
    let mut prepared = prepare(&backend, "wf-a").await;
    prepared
        .bindings
        .bind("buyer", "c1", &contact_by_id(&backend, "c1").await)
        .unwrap();
    assert!(prepared.bindings.get("buyer").unwrap().is_bound());

    prepared.reload_templates(&backend).await;

    assert_eq!(prepared.bindings.recipients().len(), 3);
    assert!(!prepared.bindings.get("buyer").unwrap().is_bound());
}

#[tokio::test]
async fn test_candidate_contacts_use_role_contact_type() {
    let backend = FakeBackend::new()
        .with_workflow("wf-g", json!({"_id": "wf-g", "templates": [{"template_id": "t1"}]}))
        .with_template(
            "t1",
            template(
                "t1",
                "Loan",
                json!([{"role": "Lender", "contact_type": {"_id": "ct-lender"}}, receiver("Buyer")]),
            ),
        )
        .with_contact(json!({"_id": "c1", "first_name": "Ada", "email": "ada@example.com", "contact_type": "ct-lender"}))
        .with_contact(contact("c2", "Grace", "grace@example.com"));

    let prepared = prepare(&backend, "wf-g").await;

    let lender = prepared.bindings.get("lender").unwrap();
    let lenders = candidate_contacts(&backend, &session(), lender).await.unwrap();
    assert_eq!(lenders.len(), 1);
    assert_eq!(lenders[0].id(), Some("c1"));

    let buyer = prepared.bindings.get("buyer").unwrap();
    let anyone = candidate_contacts(&backend, &session(), buyer).await.unwrap();
    assert_eq!(anyone.len(), 2);

    let queries = backend.contact_queries.lock().unwrap().clone();
    assert_eq!(queries, vec![Some("ct-lender".to_string()), None]);
}

#[tokio::test]
async fn test_slow_first_fetch_keeps_reference_order() {
    let backend = FakeBackend::new()
        .with_workflow(
            "wf-slow",
            json!({"_id": "wf-slow", "templates": [
                {"template_id": "t1"},
                {"template_id": "t2"},
                {"template_id": "t3"}
            ]}),
        )
        .with_template("t1", template("t1", "Purchase", json!([receiver("Buyer")])))
        .with_template("t2", template("t2", "Disclosure", json!([receiver("Witness")])))
        .with_template("t3", template("t3", "Notarial", json!([receiver("Notary"), receiver("Buyer")])))
        .with_template_delay("t1", 300)
        .with_template_delay("t2", 30)
        .with_template_delay("t3", 150);

    let started = Instant::now();
    let prepared = prepare(&backend, "wf-slow").await;
    let elapsed = started.elapsed();

    // Fetches finish out of order; t1 is last
    assert_eq!(backend.completed(), vec!["t2", "t3", "t1"]);
    let ids: Vec<&str> = prepared.templates.iter().map(|t| t.id()).collect();
    assert_eq!(ids, vec!["t1", "t2", "t3"]);

    let keys: Vec<&str> = prepared
        .bindings
        .recipients()
        .iter()
        .map(|r| r.role_key.as_str())
        .collect();
    assert_eq!(keys, vec!["buyer", "witness", "notary"]);
    assert_eq!(prepared.bindings.get("buyer").unwrap().involved_templates(), "Purchase, Notarial");

    // Sequential fetching would take at least 480ms
    assert!(elapsed < Duration::from_millis(450), "fetches took {:?}", elapsed);
}
