use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::config::IntakeMode;
use crate::workflows::recovery::checkin::CheckinEngine;
use crate::workflows::recovery::domain::{
    AssessmentId, AssessmentSnapshot, AssessmentSubmission, ClinicianOverride, FormKind,
    FunctionalScore, PatientId, NO_NEGATIVE_BELIEFS_SENTINEL,
};
use crate::workflows::recovery::repository::{
    AlertError, AlertPublisher, AssessmentRecord, CareTeamAlert, CheckinRecord,
    InMemoryRecoveryRepository, RecoveryRepository, RepositoryError,
};
use crate::workflows::recovery::scoring::ScoreEngine;
use crate::workflows::recovery::service::RecoveryService;

pub(super) fn patient() -> PatientId {
    PatientId("pt-0042".to_string())
}

pub(super) fn functional(scores: &[u8]) -> Vec<FunctionalScore> {
    scores
        .iter()
        .enumerate()
        .map(|(index, score)| FunctionalScore {
            activity: format!("activity-{index}"),
            score: *score,
        })
        .collect()
}

/// Strong first visit: pain 2, disability 15%, function mean 7.5,
/// confidence 9, no negative beliefs.
pub(super) fn strong_baseline_snapshot() -> AssessmentSnapshot {
    AssessmentSnapshot {
        pain: 2,
        disability_percentage: 15.0,
        functional_scores: functional(&[7, 8]),
        confidence: 9,
        negative_beliefs: Vec::new(),
        global_rating_of_change: None,
        form_kind: FormKind::Baseline,
    }
}

/// Struggling first visit used as the prior for follow-up delta checks.
pub(super) fn struggling_baseline_snapshot() -> AssessmentSnapshot {
    AssessmentSnapshot {
        pain: 8,
        disability_percentage: 40.0,
        functional_scores: functional(&[3, 3]),
        confidence: 4,
        negative_beliefs: vec![
            "I worry exercise will damage my back".to_string(),
            "Rest is the only thing that helps".to_string(),
        ],
        global_rating_of_change: None,
        form_kind: FormKind::Baseline,
    }
}

/// Recovered follow-up paired with `struggling_baseline_snapshot`.
pub(super) fn recovered_follow_up_snapshot() -> AssessmentSnapshot {
    AssessmentSnapshot {
        pain: 5,
        disability_percentage: 25.0,
        functional_scores: functional(&[8, 8]),
        confidence: 8,
        negative_beliefs: vec![NO_NEGATIVE_BELIEFS_SENTINEL.to_string()],
        global_rating_of_change: Some(6),
        form_kind: FormKind::FollowUp,
    }
}

pub(super) fn baseline_submission() -> AssessmentSubmission {
    let snapshot = strong_baseline_snapshot();
    AssessmentSubmission {
        patient_id: patient(),
        form_kind: FormKind::Baseline,
        pain: Some(snapshot.pain),
        disability_percentage: Some(snapshot.disability_percentage),
        functional_scores: snapshot.functional_scores,
        confidence: Some(snapshot.confidence),
        negative_beliefs: snapshot.negative_beliefs,
        global_rating_of_change: None,
        prior_assessment_id: None,
    }
}

pub(super) fn struggling_baseline_submission() -> AssessmentSubmission {
    let snapshot = struggling_baseline_snapshot();
    AssessmentSubmission {
        patient_id: patient(),
        form_kind: FormKind::Baseline,
        pain: Some(snapshot.pain),
        disability_percentage: Some(snapshot.disability_percentage),
        functional_scores: snapshot.functional_scores,
        confidence: Some(snapshot.confidence),
        negative_beliefs: snapshot.negative_beliefs,
        global_rating_of_change: None,
        prior_assessment_id: None,
    }
}

pub(super) fn follow_up_submission(prior: AssessmentId) -> AssessmentSubmission {
    let snapshot = recovered_follow_up_snapshot();
    AssessmentSubmission {
        patient_id: patient(),
        form_kind: FormKind::FollowUp,
        pain: Some(snapshot.pain),
        disability_percentage: Some(snapshot.disability_percentage),
        functional_scores: snapshot.functional_scores,
        confidence: Some(snapshot.confidence),
        negative_beliefs: snapshot.negative_beliefs,
        global_rating_of_change: snapshot.global_rating_of_change,
        prior_assessment_id: Some(prior),
    }
}

pub(super) fn score_engine() -> ScoreEngine {
    ScoreEngine::new().expect("standard rule tables are consistent")
}

pub(super) fn checkin_engine() -> CheckinEngine {
    CheckinEngine::default()
}

pub(super) fn no_overrides() -> ClinicianOverride {
    ClinicianOverride::default()
}

pub(super) fn full_overrides() -> ClinicianOverride {
    ClinicianOverride {
        milestone_met: true,
        objective_progress_verified: true,
    }
}

/// Alert hook capturing everything it is asked to publish.
#[derive(Default)]
pub(super) struct MemoryAlerts {
    events: Mutex<Vec<CareTeamAlert>>,
}

impl MemoryAlerts {
    pub(super) fn events(&self) -> Vec<CareTeamAlert> {
        self.events.lock().expect("alert mutex poisoned").clone()
    }
}

impl AlertPublisher for MemoryAlerts {
    fn publish(&self, alert: CareTeamAlert) -> Result<(), AlertError> {
        self.events.lock().expect("alert mutex poisoned").push(alert);
        Ok(())
    }
}

/// Alert hook whose transport is always down.
pub(super) struct FailingAlerts;

impl AlertPublisher for FailingAlerts {
    fn publish(&self, _alert: CareTeamAlert) -> Result<(), AlertError> {
        Err(AlertError::Transport("message bus offline".to_string()))
    }
}

/// Repository stub that always reports the backing store as unavailable.
pub(super) struct UnavailableRepository;

impl RecoveryRepository for UnavailableRepository {
    fn insert_assessment(
        &self,
        _record: AssessmentRecord,
    ) -> Result<AssessmentRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_assessment(
        &self,
        _id: &AssessmentId,
    ) -> Result<Option<AssessmentRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn record_override(
        &self,
        _id: &AssessmentId,
        _overrides: ClinicianOverride,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn append_checkin(&self, _record: CheckinRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn checkin_history(
        &self,
        _patient_id: &PatientId,
        _limit: usize,
    ) -> Result<Vec<CheckinRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) type MemoryService = RecoveryService<InMemoryRecoveryRepository, MemoryAlerts>;

pub(super) fn build_service() -> (
    MemoryService,
    Arc<InMemoryRecoveryRepository>,
    Arc<MemoryAlerts>,
) {
    build_service_with_mode(IntakeMode::Strict)
}

pub(super) fn build_service_with_mode(
    mode: IntakeMode,
) -> (
    MemoryService,
    Arc<InMemoryRecoveryRepository>,
    Arc<MemoryAlerts>,
) {
    let repository = Arc::new(InMemoryRecoveryRepository::default());
    let alerts = Arc::new(MemoryAlerts::default());
    let service = RecoveryService::new(repository.clone(), alerts.clone(), mode)
        .expect("standard rule tables are consistent");
    (service, repository, alerts)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
