use std::sync::Arc;

use super::common::*;
use crate::config::IntakeMode;
use crate::workflows::recovery::checkin::CheckinSubmission;
use crate::workflows::recovery::domain::AssessmentId;
use crate::workflows::recovery::repository::{InMemoryRecoveryRepository, RepositoryError};
use crate::workflows::recovery::scoring::ScoringError;
use crate::workflows::recovery::service::{RecoveryService, ServiceError};

fn checkin(pain: u8, stress: u8, mood: &str) -> CheckinSubmission {
    CheckinSubmission {
        pain,
        stress,
        mood: mood.to_string(),
    }
}

#[test]
fn submitted_baseline_scores_on_demand() {
    let (service, _, _) = build_service();

    let record = service
        .submit(baseline_submission())
        .expect("submission accepted");
    let view = service.score(&record.assessment_id).expect("score computes");

    assert_eq!(view.total, 7);
    assert_eq!(view.max, 9);
    assert_eq!(view.phase, "educate");
    assert_eq!(view.form_kind, "baseline");
    assert_eq!(view.breakdown.len(), 7);
    assert!(view.incomplete_fields.is_empty());
}

#[test]
fn recorded_sign_offs_change_the_recomputed_score() {
    let (service, _, _) = build_service();

    let record = service
        .submit(baseline_submission())
        .expect("submission accepted");
    let before = service.score(&record.assessment_id).expect("score computes");
    assert_eq!(before.total, 7);

    service
        .record_override(&record.assessment_id, full_overrides())
        .expect("override recorded");
    let after = service.score(&record.assessment_id).expect("score computes");

    assert_eq!(after.total, 9);
    assert_eq!(after.phase, "rebuild");
}

#[test]
fn follow_up_scores_against_its_referenced_baseline() {
    let (service, _, _) = build_service();

    let baseline = service
        .submit(struggling_baseline_submission())
        .expect("baseline accepted");
    let follow_up = service
        .submit(follow_up_submission(baseline.assessment_id.clone()))
        .expect("follow-up accepted");

    let view = service
        .score(&follow_up.assessment_id)
        .expect("score computes");
    assert_eq!(view.total, 8);
    assert_eq!(view.max, 11);
    assert_eq!(view.phase, "rebuild");
    assert_eq!(view.form_kind, "follow_up");
}

#[test]
fn follow_up_without_prior_reference_fails_at_scoring() {
    let (service, _, _) = build_service();

    let mut submission = follow_up_submission(AssessmentId("unused".to_string()));
    submission.prior_assessment_id = None;
    let record = service.submit(submission).expect("submission accepted");

    let err = service
        .score(&record.assessment_id)
        .expect_err("prior snapshot required");
    assert!(matches!(
        err,
        ServiceError::Scoring(ScoringError::MissingPriorSnapshot)
    ));
}

#[test]
fn submission_with_dangling_prior_reference_is_rejected() {
    let (service, _, _) = build_service();

    let err = service
        .submit(follow_up_submission(AssessmentId(
            "asmt-does-not-exist".to_string(),
        )))
        .expect_err("unknown prior rejected");
    assert!(matches!(
        err,
        ServiceError::Repository(RepositoryError::NotFound)
    ));
}

#[test]
fn scoring_an_unknown_assessment_is_not_found() {
    let (service, _, _) = build_service();

    let err = service
        .score(&AssessmentId("asmt-missing".to_string()))
        .expect_err("unknown assessment");
    assert!(matches!(
        err,
        ServiceError::Repository(RepositoryError::NotFound)
    ));
}

#[test]
fn escalating_checkin_alerts_the_care_team_and_lands_in_history() {
    let (service, _, alerts) = build_service();

    let outcome = service
        .check_in(patient(), checkin(10, 10, "distressed"))
        .expect("check-in accepted");
    assert!(outcome.escalate);

    let events = alerts.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].template, "checkin_escalation");
    assert_eq!(events[0].patient_id, patient());
    assert_eq!(events[0].details.get("tier"), Some(&"4".to_string()));

    let history = service
        .checkin_history(&patient(), 10)
        .expect("history reads");
    assert_eq!(history.len(), 1);
    assert!(history[0].escalate);
    assert_eq!(history[0].tier, 4);
}

#[test]
fn routine_checkin_raises_no_alert() {
    let (service, _, alerts) = build_service();

    let outcome = service
        .check_in(patient(), checkin(1, 1, "positive"))
        .expect("check-in accepted");
    assert!(!outcome.escalate);
    assert!(alerts.events().is_empty());

    let history = service
        .checkin_history(&patient(), 10)
        .expect("history reads");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].tier, 1);
}

#[test]
fn alert_transport_failure_is_reported_to_the_caller() {
    let repository = Arc::new(InMemoryRecoveryRepository::default());
    let service = RecoveryService::new(repository, Arc::new(FailingAlerts), IntakeMode::Strict)
        .expect("standard rule tables are consistent");

    let err = service
        .check_in(patient(), checkin(10, 10, "distressed"))
        .expect_err("alert failure surfaces");
    assert!(matches!(err, ServiceError::Alert(_)));
}

#[test]
fn repository_outage_surfaces_as_service_error() {
    let service = RecoveryService::new(
        Arc::new(UnavailableRepository),
        Arc::new(MemoryAlerts::default()),
        IntakeMode::Strict,
    )
    .expect("standard rule tables are consistent");

    let err = service
        .submit(baseline_submission())
        .expect_err("repository offline");
    assert!(matches!(
        err,
        ServiceError::Repository(RepositoryError::Unavailable(_))
    ));
}

#[test]
fn lenient_service_flags_incomplete_snapshots_through_to_the_score_view() {
    let (service, _, _) = build_service_with_mode(IntakeMode::Lenient);

    let mut submission = baseline_submission();
    submission.pain = None;
    let record = service.submit(submission).expect("lenient intake accepts");
    assert_eq!(record.incomplete_fields, vec!["pain".to_string()]);

    let view = service.score(&record.assessment_id).expect("score computes");
    assert_eq!(view.incomplete_fields, vec!["pain".to_string()]);
    // Defaulted pain 0 satisfies the pain rule; the flag is the caller's cue
    // that the answer was never given.
    let pain_item = view
        .breakdown
        .iter()
        .find(|item| item.rule_id == "baseline.pain")
        .expect("pain rule listed");
    assert!(pain_item.achieved);
}
