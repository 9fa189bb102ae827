use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::IntakeMode;

use super::checkin::{CheckinEngine, CheckinSubmission, TierOutcome, TierThresholds};
use super::domain::{
    AssessmentId, AssessmentSubmission, ClinicianOverride, FormKind, PatientId,
    SnapshotValidationError,
};
use super::repository::{
    AlertError, AlertPublisher, AssessmentRecord, CareTeamAlert, CheckinRecord,
    RecoveryRepository, RepositoryError,
};
use super::scoring::{
    RuleSetIntegrityError, ScoreBreakdownItem, ScoreEngine, ScoringError, ScoringRuleSet,
};

/// Service composing the score engine, tier classifier, repository, and
/// care-team alert hook.
pub struct RecoveryService<R, A> {
    repository: Arc<R>,
    alerts: Arc<A>,
    engine: Arc<ScoreEngine>,
    checkin: CheckinEngine,
    intake_mode: IntakeMode,
}

static ASSESSMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_assessment_id() -> AssessmentId {
    let id = ASSESSMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    AssessmentId(format!("asmt-{id:06}"))
}

impl<R, A> RecoveryService<R, A>
where
    R: RecoveryRepository + 'static,
    A: AlertPublisher + 'static,
{
    /// Build the service with the standard rule tables and tier thresholds.
    ///
    /// Rule-set integrity is checked here so a bad table aborts startup
    /// instead of failing at request time.
    pub fn new(
        repository: Arc<R>,
        alerts: Arc<A>,
        intake_mode: IntakeMode,
    ) -> Result<Self, RuleSetIntegrityError> {
        Ok(Self {
            repository,
            alerts,
            engine: Arc::new(ScoreEngine::new()?),
            checkin: CheckinEngine::new(TierThresholds::default()),
            intake_mode,
        })
    }

    /// Rule table exposure for the audit endpoint.
    pub fn rule_set(&self, form_kind: FormKind) -> &ScoringRuleSet {
        self.engine.rule_set(form_kind)
    }

    /// Sanitize and store an assessment submission.
    pub fn submit(
        &self,
        submission: AssessmentSubmission,
    ) -> Result<AssessmentRecord, ServiceError> {
        let sanitized = submission.sanitize(self.intake_mode)?;

        if let Some(prior_id) = &submission.prior_assessment_id {
            self.repository
                .fetch_assessment(prior_id)?
                .ok_or(RepositoryError::NotFound)?;
        }

        let record = AssessmentRecord {
            assessment_id: next_assessment_id(),
            patient_id: submission.patient_id.clone(),
            snapshot: sanitized.snapshot,
            prior_assessment_id: submission.prior_assessment_id.clone(),
            overrides: None,
            incomplete_fields: sanitized
                .incomplete_fields
                .iter()
                .map(|field| field.to_string())
                .collect(),
        };

        let stored = self.repository.insert_assessment(record)?;
        info!(
            assessment_id = %stored.assessment_id.0,
            form_kind = stored.snapshot.form_kind.label(),
            "assessment recorded"
        );
        Ok(stored)
    }

    /// Record clinician sign-offs for an assessment cycle.
    pub fn record_override(
        &self,
        assessment_id: &AssessmentId,
        overrides: ClinicianOverride,
    ) -> Result<(), ServiceError> {
        self.repository.record_override(assessment_id, overrides)?;
        info!(assessment_id = %assessment_id.0, "clinician sign-offs recorded");
        Ok(())
    }

    /// Recompute the Signature Recovery Score for a stored assessment.
    ///
    /// Follow-up assessments are scored against their referenced baseline;
    /// a follow-up with no prior reference is an error, never silently
    /// scored with the baseline rules.
    pub fn score(&self, assessment_id: &AssessmentId) -> Result<ScoreView, ServiceError> {
        let record = self
            .repository
            .fetch_assessment(assessment_id)?
            .ok_or(RepositoryError::NotFound)?;

        let prior = match record.snapshot.form_kind {
            FormKind::Baseline => None,
            FormKind::FollowUp => {
                let prior_id = record
                    .prior_assessment_id
                    .as_ref()
                    .ok_or(ScoringError::MissingPriorSnapshot)?;
                let prior = self
                    .repository
                    .fetch_assessment(prior_id)?
                    .ok_or(RepositoryError::NotFound)?;
                Some(prior)
            }
        };

        let overrides = record.overrides.unwrap_or_default();
        let result = self.engine.evaluate(
            &record.snapshot,
            prior.as_ref().map(|record| &record.snapshot),
            &overrides,
        )?;
        let phase = self.engine.classify_phase(result.total);

        info!(
            assessment_id = %record.assessment_id.0,
            total = result.total,
            max = result.max,
            phase = phase.label(),
            "signature recovery score computed"
        );

        Ok(ScoreView {
            assessment_id: record.assessment_id,
            patient_id: record.patient_id,
            form_kind: record.snapshot.form_kind.label(),
            total: result.total,
            max: result.max,
            phase: phase.label(),
            breakdown: result.breakdown,
            incomplete_fields: record.incomplete_fields,
        })
    }

    /// Classify a daily check-in, append it to the history, and raise a
    /// care-team alert on escalation.
    pub fn check_in(
        &self,
        patient_id: PatientId,
        submission: CheckinSubmission,
    ) -> Result<TierOutcome, ServiceError> {
        let outcome = self.checkin.classify(&submission)?;

        if !outcome.mood_recognized {
            warn!(
                patient_id = %patient_id.0,
                mood = %submission.mood,
                "unrecognized mood token treated as neutral"
            );
        }

        self.repository.append_checkin(CheckinRecord {
            patient_id: patient_id.clone(),
            recorded_at: Utc::now(),
            pain: submission.pain,
            stress: submission.stress,
            mood: outcome.mood.label().to_string(),
            tier: outcome.tier.as_u8(),
            escalate: outcome.escalate,
        })?;

        if outcome.escalate {
            let mut details = BTreeMap::new();
            details.insert("tier".to_string(), outcome.tier.as_u8().to_string());
            details.insert("pain".to_string(), submission.pain.to_string());
            details.insert("stress".to_string(), submission.stress.to_string());
            details.insert("mood".to_string(), outcome.mood.label().to_string());
            self.alerts.publish(CareTeamAlert {
                template: "checkin_escalation".to_string(),
                patient_id: patient_id.clone(),
                details,
            })?;
            warn!(patient_id = %patient_id.0, "high-risk check-in escalated to care team");
        }

        Ok(outcome)
    }

    /// Recent check-in history for the patient, newest first.
    pub fn checkin_history(
        &self,
        patient_id: &PatientId,
        limit: usize,
    ) -> Result<Vec<CheckinRecord>, ServiceError> {
        Ok(self.repository.checkin_history(patient_id, limit)?)
    }
}

/// Score result view: the audit trail shown to clinicians and patients.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreView {
    pub assessment_id: AssessmentId,
    pub patient_id: PatientId,
    pub form_kind: &'static str,
    pub total: u8,
    pub max: u8,
    pub phase: &'static str,
    pub breakdown: Vec<ScoreBreakdownItem>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub incomplete_fields: Vec<String>,
}

/// Error raised by the recovery service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] SnapshotValidationError),
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    #[error(transparent)]
    Checkin(#[from] super::checkin::CheckinError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Alert(#[from] AlertError),
}
