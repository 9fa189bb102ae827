mod config;
mod phase;
mod rules;

pub use config::{RuleSetIntegrityError, ScoringRuleSet};
pub use phase::{PhaseCutoffs, RecoveryPhase};
pub use rules::{PointBand, RulePredicate, ScoreBreakdownItem, ScoreRule};

use rules::RuleContext;
use serde::Serialize;

use crate::workflows::recovery::domain::{
    AssessmentSnapshot, ClinicianOverride, FormKind, SnapshotValidationError,
};

/// Stateless evaluator holding the verified, immutable rule tables.
#[derive(Debug)]
pub struct ScoreEngine {
    baseline: ScoringRuleSet,
    follow_up: ScoringRuleSet,
    cutoffs: PhaseCutoffs,
}

impl ScoreEngine {
    /// Build the engine with the standard rule tables, failing fast when a
    /// declared maximum disagrees with its rules.
    pub fn new() -> Result<Self, RuleSetIntegrityError> {
        Self::with_rule_sets(
            ScoringRuleSet::baseline(),
            ScoringRuleSet::follow_up(),
            PhaseCutoffs::default(),
        )
    }

    pub fn with_rule_sets(
        baseline: ScoringRuleSet,
        follow_up: ScoringRuleSet,
        cutoffs: PhaseCutoffs,
    ) -> Result<Self, RuleSetIntegrityError> {
        baseline.verify_integrity()?;
        follow_up.verify_integrity()?;
        Ok(Self {
            baseline,
            follow_up,
            cutoffs,
        })
    }

    pub fn rule_set(&self, form_kind: FormKind) -> &ScoringRuleSet {
        match form_kind {
            FormKind::Baseline => &self.baseline,
            FormKind::FollowUp => &self.follow_up,
        }
    }

    /// Evaluate one snapshot against the rule set for its form kind.
    ///
    /// Follow-up evaluation requires the prior snapshot; the two rule sets
    /// have different maxima and are never substituted for each other.
    pub fn evaluate(
        &self,
        current: &AssessmentSnapshot,
        prior: Option<&AssessmentSnapshot>,
        overrides: &ClinicianOverride,
    ) -> Result<EvaluationResult, ScoringError> {
        current.validate()?;
        if let Some(prior) = prior {
            prior.validate()?;
        }

        let rule_set = self.rule_set(current.form_kind);
        if rule_set.requires_prior() && prior.is_none() {
            return Err(ScoringError::MissingPriorSnapshot);
        }

        let ctx = RuleContext {
            current,
            prior,
            overrides,
        };

        let mut breakdown = Vec::with_capacity(rule_set.rules.len());
        let mut total: u8 = 0;
        for rule in &rule_set.rules {
            let item = rules::apply_rule(rule, &ctx)?;
            total += item.points_awarded;
            breakdown.push(item);
        }

        Ok(EvaluationResult {
            total,
            max: rule_set.declared_max,
            breakdown,
        })
    }

    /// Map a total to its recovery phase; independent of form kind.
    pub fn classify_phase(&self, total: u8) -> RecoveryPhase {
        self.cutoffs.classify(total)
    }
}

/// Point total plus the per-rule audit trail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    pub total: u8,
    pub max: u8,
    pub breakdown: Vec<ScoreBreakdownItem>,
}

/// Failure raised while computing a score.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringError {
    #[error("follow-up rules require the prior baseline snapshot")]
    MissingPriorSnapshot,
    #[error(transparent)]
    InvalidSnapshot(#[from] SnapshotValidationError),
}
