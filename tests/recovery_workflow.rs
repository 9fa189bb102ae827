use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use physio_srs::config::IntakeMode;
use physio_srs::workflows::recovery::{
    recovery_router, AlertError, AlertPublisher, CareTeamAlert, InMemoryRecoveryRepository,
    RecoveryService,
};

#[derive(Default)]
struct CapturingAlerts {
    events: Mutex<Vec<CareTeamAlert>>,
}

impl CapturingAlerts {
    fn events(&self) -> Vec<CareTeamAlert> {
        self.events.lock().expect("alert mutex poisoned").clone()
    }
}

impl AlertPublisher for CapturingAlerts {
    fn publish(&self, alert: CareTeamAlert) -> Result<(), AlertError> {
        self.events.lock().expect("alert mutex poisoned").push(alert);
        Ok(())
    }
}

fn build_app() -> (axum::Router, Arc<CapturingAlerts>) {
    let repository = Arc::new(InMemoryRecoveryRepository::default());
    let alerts = Arc::new(CapturingAlerts::default());
    let service = RecoveryService::new(repository, alerts.clone(), IntakeMode::Strict)
        .expect("standard rule tables are consistent");
    (recovery_router(Arc::new(service)), alerts)
}

fn json_request(method: &str, uri: &str, payload: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(payload).unwrap()))
        .unwrap()
}

async fn read_json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

fn baseline_payload() -> Value {
    json!({
        "patient_id": "pt-0042",
        "form_kind": "baseline",
        "pain": 8,
        "disability_percentage": 40.0,
        "functional_scores": [
            { "activity": "carry groceries", "score": 3 },
            { "activity": "walk the dog", "score": 3 }
        ],
        "confidence": 4,
        "negative_beliefs": [
            "I worry exercise will damage my back",
            "Rest is the only thing that helps"
        ]
    })
}

fn follow_up_payload(prior_assessment_id: &str) -> Value {
    json!({
        "patient_id": "pt-0042",
        "form_kind": "follow_up",
        "pain": 5,
        "disability_percentage": 25.0,
        "functional_scores": [
            { "activity": "carry groceries", "score": 8 },
            { "activity": "walk the dog", "score": 8 }
        ],
        "confidence": 8,
        "negative_beliefs": ["None of these apply"],
        "global_rating_of_change": 6,
        "prior_assessment_id": prior_assessment_id
    })
}

async fn submit(app: &axum::Router, payload: &Value) -> String {
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/v1/recovery/assessments", payload))
        .await
        .expect("submit executes");
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    read_json_body(response)
        .await
        .get("assessment_id")
        .and_then(Value::as_str)
        .expect("assessment id in receipt")
        .to_string()
}

#[tokio::test]
async fn baseline_to_follow_up_scoring_journey() {
    let (app, _) = build_app();

    let baseline_id = submit(&app, &baseline_payload()).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/api/v1/recovery/assessments/{baseline_id}/score"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("score executes");
    assert_eq!(response.status(), StatusCode::OK);
    let baseline_score = read_json_body(response).await;
    // Pain 8, disability 40%, function mean 3, confidence 4, two negative
    // beliefs and no sign-offs: nothing scores.
    assert_eq!(baseline_score.get("total").and_then(Value::as_u64), Some(0));
    assert_eq!(baseline_score.get("max").and_then(Value::as_u64), Some(9));
    assert_eq!(baseline_score.get("phase"), Some(&Value::from("reset")));

    let follow_up_id = submit(&app, &follow_up_payload(&baseline_id)).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/api/v1/recovery/assessments/{follow_up_id}/score"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("score executes");
    assert_eq!(response.status(), StatusCode::OK);
    let follow_up_score = read_json_body(response).await;
    assert_eq!(follow_up_score.get("total").and_then(Value::as_u64), Some(8));
    assert_eq!(follow_up_score.get("max").and_then(Value::as_u64), Some(11));
    assert_eq!(follow_up_score.get("phase"), Some(&Value::from("rebuild")));
    assert_eq!(
        follow_up_score
            .get("breakdown")
            .and_then(Value::as_array)
            .map(Vec::len),
        Some(8)
    );
}

#[tokio::test]
async fn follow_up_submission_with_unknown_prior_is_not_found() {
    let (app, _) = build_app();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/recovery/assessments",
            &follow_up_payload("asmt-does-not-exist"),
        ))
        .await
        .expect("submit executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn strict_intake_rejects_partial_forms_over_http() {
    let (app, _) = build_app();
    let mut payload = baseline_payload();
    payload
        .as_object_mut()
        .expect("payload is an object")
        .remove("pain");

    let response = app
        .oneshot(json_request("POST", "/api/v1/recovery/assessments", &payload))
        .await
        .expect("submit executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert!(body
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .contains("pain"));
}

#[tokio::test]
async fn escalating_checkin_notifies_the_care_team() {
    let (app, alerts) = build_app();
    let payload = json!({
        "patient_id": "pt-0042",
        "pain": 9,
        "stress": 9,
        "mood": "distressed",
    });

    let response = app
        .oneshot(json_request("POST", "/api/v1/recovery/checkins", &payload))
        .await
        .expect("check-in executes");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body.get("tier").and_then(Value::as_u64), Some(4));
    assert_eq!(body.get("escalate"), Some(&Value::from(true)));

    let events = alerts.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].template, "checkin_escalation");
    assert_eq!(events[0].patient_id.0, "pt-0042");
}
