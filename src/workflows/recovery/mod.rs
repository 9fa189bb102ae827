//! Recovery scoring and daily risk triage.
//!
//! Three pure components sit at the core: the score engine evaluates the
//! data-driven rule tables against assessment snapshots, the phase classifier
//! maps totals onto recovery phases, and the check-in classifier turns daily
//! pain/stress/mood answers into a risk tier with an escalation flag. The
//! service and router wrap them with storage and alert seams for the rest of
//! the platform.

pub mod checkin;
pub mod domain;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use checkin::{
    CheckinEngine, CheckinError, CheckinSubmission, MoodCategory, RiskTier, TierOutcome,
    TierThresholds,
};
pub use domain::{
    AssessmentId, AssessmentSnapshot, AssessmentSubmission, ClinicianOverride, FormKind,
    FunctionalScore, PatientId, SnapshotValidationError, NO_NEGATIVE_BELIEFS_SENTINEL,
};
pub use repository::{
    AlertError, AlertPublisher, AssessmentRecord, CareTeamAlert, CheckinRecord,
    InMemoryRecoveryRepository, RecoveryRepository, RepositoryError, TracingAlertPublisher,
};
pub use router::recovery_router;
pub use scoring::{
    EvaluationResult, PhaseCutoffs, RecoveryPhase, RuleSetIntegrityError, ScoreBreakdownItem,
    ScoreEngine, ScoringError, ScoringRuleSet,
};
pub use service::{RecoveryService, ScoreView, ServiceError};
