use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    AssessmentId, AssessmentSnapshot, ClinicianOverride, PatientId,
};

/// Stored assessment: the sanitized snapshot plus intake metadata.
///
/// Scores and phases are never persisted; they are recomputed from the
/// snapshot on every read so historical displays stay consistent with the
/// rule tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRecord {
    pub assessment_id: AssessmentId,
    pub patient_id: PatientId,
    pub snapshot: AssessmentSnapshot,
    pub prior_assessment_id: Option<AssessmentId>,
    /// Absent until a clinician explicitly records sign-offs.
    pub overrides: Option<ClinicianOverride>,
    /// Answers the lenient intake path defaulted to zero.
    pub incomplete_fields: Vec<String>,
}

impl AssessmentRecord {
    pub fn receipt(&self) -> AssessmentReceipt {
        AssessmentReceipt {
            assessment_id: self.assessment_id.clone(),
            patient_id: self.patient_id.clone(),
            form_kind: self.snapshot.form_kind.label(),
            incomplete_fields: self.incomplete_fields.clone(),
        }
    }
}

/// Acknowledgement returned to the form layer on submission.
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentReceipt {
    pub assessment_id: AssessmentId,
    pub patient_id: PatientId,
    pub form_kind: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub incomplete_fields: Vec<String>,
}

/// One classified check-in appended to the patient's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckinRecord {
    pub patient_id: PatientId,
    pub recorded_at: DateTime<Utc>,
    pub pain: u8,
    pub stress: u8,
    pub mood: String,
    pub tier: u8,
    pub escalate: bool,
}

/// Storage abstraction so the service module can be exercised in isolation.
pub trait RecoveryRepository: Send + Sync {
    fn insert_assessment(
        &self,
        record: AssessmentRecord,
    ) -> Result<AssessmentRecord, RepositoryError>;
    fn fetch_assessment(
        &self,
        id: &AssessmentId,
    ) -> Result<Option<AssessmentRecord>, RepositoryError>;
    fn record_override(
        &self,
        id: &AssessmentId,
        overrides: ClinicianOverride,
    ) -> Result<(), RepositoryError>;
    fn append_checkin(&self, record: CheckinRecord) -> Result<(), RepositoryError>;
    fn checkin_history(
        &self,
        patient_id: &PatientId,
        limit: usize,
    ) -> Result<Vec<CheckinRecord>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Trait describing outbound care-team notification hooks.
pub trait AlertPublisher: Send + Sync {
    fn publish(&self, alert: CareTeamAlert) -> Result<(), AlertError>;
}

/// Payload handed to the messaging layer when a check-in escalates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareTeamAlert {
    pub template: String,
    pub patient_id: PatientId,
    pub details: BTreeMap<String, String>,
}

/// Alert dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("alert transport unavailable: {0}")]
    Transport(String),
}

/// Mutex-guarded map store, the default wiring for development and tests.
#[derive(Default)]
pub struct InMemoryRecoveryRepository {
    assessments: Mutex<HashMap<AssessmentId, AssessmentRecord>>,
    checkins: Mutex<Vec<CheckinRecord>>,
}

impl RecoveryRepository for InMemoryRecoveryRepository {
    fn insert_assessment(
        &self,
        record: AssessmentRecord,
    ) -> Result<AssessmentRecord, RepositoryError> {
        let mut assessments = self
            .assessments
            .lock()
            .map_err(|_| RepositoryError::Unavailable("assessment store poisoned".to_string()))?;
        if assessments.contains_key(&record.assessment_id) {
            return Err(RepositoryError::Conflict);
        }
        assessments.insert(record.assessment_id.clone(), record.clone());
        Ok(record)
    }

    fn fetch_assessment(
        &self,
        id: &AssessmentId,
    ) -> Result<Option<AssessmentRecord>, RepositoryError> {
        let assessments = self
            .assessments
            .lock()
            .map_err(|_| RepositoryError::Unavailable("assessment store poisoned".to_string()))?;
        Ok(assessments.get(id).cloned())
    }

    fn record_override(
        &self,
        id: &AssessmentId,
        overrides: ClinicianOverride,
    ) -> Result<(), RepositoryError> {
        let mut assessments = self
            .assessments
            .lock()
            .map_err(|_| RepositoryError::Unavailable("assessment store poisoned".to_string()))?;
        let record = assessments.get_mut(id).ok_or(RepositoryError::NotFound)?;
        record.overrides = Some(overrides);
        Ok(())
    }

    fn append_checkin(&self, record: CheckinRecord) -> Result<(), RepositoryError> {
        let mut checkins = self
            .checkins
            .lock()
            .map_err(|_| RepositoryError::Unavailable("check-in store poisoned".to_string()))?;
        checkins.push(record);
        Ok(())
    }

    fn checkin_history(
        &self,
        patient_id: &PatientId,
        limit: usize,
    ) -> Result<Vec<CheckinRecord>, RepositoryError> {
        let checkins = self
            .checkins
            .lock()
            .map_err(|_| RepositoryError::Unavailable("check-in store poisoned".to_string()))?;
        Ok(checkins
            .iter()
            .rev()
            .filter(|record| &record.patient_id == patient_id)
            .take(limit)
            .cloned()
            .collect())
    }
}

/// Alert hook that only logs; the real messaging adapter lives outside this
/// service.
#[derive(Default)]
pub struct TracingAlertPublisher;

impl AlertPublisher for TracingAlertPublisher {
    fn publish(&self, alert: CareTeamAlert) -> Result<(), AlertError> {
        tracing::warn!(
            template = %alert.template,
            patient_id = %alert.patient_id.0,
            "care team alert raised"
        );
        Ok(())
    }
}
