use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::checkin::{CheckinSubmission, RiskTier, TierOutcome};
use super::domain::{AssessmentId, AssessmentSubmission, ClinicianOverride, FormKind, PatientId};
use super::repository::{AlertPublisher, RecoveryRepository, RepositoryError};
use super::service::{RecoveryService, ServiceError};
use crate::workflows::recovery::scoring::ScoringError;

/// Router builder exposing HTTP endpoints for intake, scoring, and check-ins.
pub fn recovery_router<R, A>(service: Arc<RecoveryService<R, A>>) -> Router
where
    R: RecoveryRepository + 'static,
    A: AlertPublisher + 'static,
{
    Router::new()
        .route(
            "/api/v1/recovery/assessments",
            post(submit_handler::<R, A>),
        )
        .route(
            "/api/v1/recovery/assessments/:assessment_id/score",
            get(score_handler::<R, A>),
        )
        .route(
            "/api/v1/recovery/assessments/:assessment_id/override",
            put(override_handler::<R, A>),
        )
        .route("/api/v1/recovery/checkins", post(checkin_handler::<R, A>))
        .route("/api/v1/recovery/rulesets", get(rule_sets_handler::<R, A>))
        .with_state(service)
}

pub(crate) async fn submit_handler<R, A>(
    State(service): State<Arc<RecoveryService<R, A>>>,
    axum::Json(submission): axum::Json<AssessmentSubmission>,
) -> Response
where
    R: RecoveryRepository + 'static,
    A: AlertPublisher + 'static,
{
    match service.submit(submission) {
        Ok(record) => (StatusCode::ACCEPTED, axum::Json(record.receipt())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn score_handler<R, A>(
    State(service): State<Arc<RecoveryService<R, A>>>,
    Path(assessment_id): Path<String>,
) -> Response
where
    R: RecoveryRepository + 'static,
    A: AlertPublisher + 'static,
{
    match service.score(&AssessmentId(assessment_id)) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn override_handler<R, A>(
    State(service): State<Arc<RecoveryService<R, A>>>,
    Path(assessment_id): Path<String>,
    axum::Json(overrides): axum::Json<ClinicianOverride>,
) -> Response
where
    R: RecoveryRepository + 'static,
    A: AlertPublisher + 'static,
{
    match service.record_override(&AssessmentId(assessment_id), overrides) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

/// Daily check-in request from the patient app.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckinRequest {
    pub patient_id: String,
    pub pain: u8,
    pub stress: u8,
    pub mood: String,
}

pub(crate) async fn checkin_handler<R, A>(
    State(service): State<Arc<RecoveryService<R, A>>>,
    axum::Json(request): axum::Json<CheckinRequest>,
) -> Response
where
    R: RecoveryRepository + 'static,
    A: AlertPublisher + 'static,
{
    let patient_id = PatientId(request.patient_id);
    let submission = CheckinSubmission {
        pain: request.pain,
        stress: request.stress,
        mood: request.mood,
    };

    match service.check_in(patient_id, submission) {
        Ok(outcome) => {
            let response = CheckinResponse::from_outcome(&outcome);
            (StatusCode::OK, axum::Json(response)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn rule_sets_handler<R, A>(
    State(service): State<Arc<RecoveryService<R, A>>>,
) -> Response
where
    R: RecoveryRepository + 'static,
    A: AlertPublisher + 'static,
{
    let payload = json!({
        "baseline": service.rule_set(FormKind::Baseline),
        "follow_up": service.rule_set(FormKind::FollowUp),
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

/// Patient-facing call-to-action content, keyed by tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Cta {
    pub label: &'static str,
    pub route: &'static str,
}

/// Check-in response: tier result plus the content the app should surface.
#[derive(Debug, Clone, Serialize)]
pub struct CheckinResponse {
    pub tier: u8,
    pub escalate: bool,
    pub mood: &'static str,
    pub cta: Cta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_cta: Option<Cta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coping_cta: Option<Cta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<&'static str>,
}

impl CheckinResponse {
    fn from_outcome(outcome: &TierOutcome) -> Self {
        let (cta, secondary_cta, coping_cta) = cta_content(outcome.tier);
        Self {
            tier: outcome.tier.as_u8(),
            escalate: outcome.escalate,
            mood: outcome.mood.label(),
            cta,
            secondary_cta,
            coping_cta,
            warning: (!outcome.mood_recognized)
                .then_some("mood answer was not recognized and was treated as neutral"),
        }
    }
}

/// Static content table; the engine itself only hands back the tier.
fn cta_content(tier: RiskTier) -> (Cta, Option<Cta>, Option<Cta>) {
    let breathing = Cta {
        label: "Try a guided breathing session",
        route: "/app/tools/breathing",
    };
    match tier {
        RiskTier::Tier1 => (
            Cta {
                label: "Keep the momentum going",
                route: "/app/progress",
            },
            None,
            None,
        ),
        RiskTier::Tier2 => (
            Cta {
                label: "Read today's recovery tip",
                route: "/app/library/recovery-tips",
            },
            None,
            None,
        ),
        RiskTier::Tier3 => (breathing, None, None),
        RiskTier::Tier4 => (
            Cta {
                label: "Book a check-in with your clinician",
                route: "/app/appointments/new",
            },
            Some(Cta {
                label: "Message your care team",
                route: "/app/messages/new",
            }),
            Some(breathing),
        ),
    }
}

fn error_response(err: ServiceError) -> Response {
    let status = match &err {
        ServiceError::Validation(_) | ServiceError::Checkin(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ServiceError::Scoring(ScoringError::MissingPriorSnapshot)
        | ServiceError::Scoring(ScoringError::InvalidSnapshot(_)) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        ServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        ServiceError::Repository(RepositoryError::Unavailable(_)) | ServiceError::Alert(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = json!({ "error": err.to_string() });
    (status, axum::Json(payload)).into_response()
}
