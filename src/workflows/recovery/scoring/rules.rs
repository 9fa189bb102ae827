use serde::Serialize;

use super::ScoringError;
use crate::workflows::recovery::domain::{AssessmentSnapshot, ClinicianOverride};

/// One scoring band: meeting `at_least` awards `points`.
///
/// Bands are listed highest threshold first and are exclusive; only the
/// first satisfied band awards points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointBand<T> {
    pub at_least: T,
    pub points: u8,
}

/// Declarative rule condition. Thresholds and point values live here as
/// inspectable data so clinical staff can audit them without reading the
/// evaluator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RulePredicate {
    PainAtMost { threshold: u8, points: u8 },
    DisabilityAtMost { threshold: f32, points: u8 },
    FunctionMeanBands { bands: Vec<PointBand<f32>> },
    ConfidenceBands { bands: Vec<PointBand<u8>> },
    NoNegativeBeliefs { points: u8 },
    MilestoneMet { points: u8 },
    ObjectiveProgressVerified { points: u8 },
    PainReducedBy { delta: u8, points: u8 },
    FunctionMeanImprovedBy { delta: f32, points: u8 },
    DisabilityReducedBy { delta: f32, points: u8 },
    ConfidenceImprovedBy { delta: u8, points: u8 },
    NegativeBeliefsResolved { points: u8 },
    GlobalRatingAtLeast { threshold: i8, points: u8 },
}

impl RulePredicate {
    /// Largest number of points this predicate can award.
    pub fn max_points(&self) -> u8 {
        match self {
            RulePredicate::PainAtMost { points, .. }
            | RulePredicate::DisabilityAtMost { points, .. }
            | RulePredicate::NoNegativeBeliefs { points }
            | RulePredicate::MilestoneMet { points }
            | RulePredicate::ObjectiveProgressVerified { points }
            | RulePredicate::PainReducedBy { points, .. }
            | RulePredicate::FunctionMeanImprovedBy { points, .. }
            | RulePredicate::DisabilityReducedBy { points, .. }
            | RulePredicate::ConfidenceImprovedBy { points, .. }
            | RulePredicate::NegativeBeliefsResolved { points }
            | RulePredicate::GlobalRatingAtLeast { points, .. } => *points,
            RulePredicate::FunctionMeanBands { bands } => {
                bands.iter().map(|band| band.points).max().unwrap_or(0)
            }
            RulePredicate::ConfidenceBands { bands } => {
                bands.iter().map(|band| band.points).max().unwrap_or(0)
            }
        }
    }

    /// Whether evaluating this predicate needs the prior (baseline) snapshot.
    pub fn requires_prior(&self) -> bool {
        matches!(
            self,
            RulePredicate::PainReducedBy { .. }
                | RulePredicate::FunctionMeanImprovedBy { .. }
                | RulePredicate::DisabilityReducedBy { .. }
                | RulePredicate::ConfidenceImprovedBy { .. }
                | RulePredicate::NegativeBeliefsResolved { .. }
        )
    }
}

/// Named rule entry in a scoring rule set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRule {
    pub id: &'static str,
    pub description: &'static str,
    pub predicate: RulePredicate,
}

impl ScoreRule {
    pub fn max_points(&self) -> u8 {
        self.predicate.max_points()
    }
}

/// Per-rule entry in the audit trail shown to clinicians and patients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdownItem {
    pub rule_id: &'static str,
    pub description: &'static str,
    pub achieved: bool,
    pub points_awarded: u8,
    pub observed_value: String,
}

/// Inputs a single rule evaluation may draw on.
pub(super) struct RuleContext<'a> {
    pub current: &'a AssessmentSnapshot,
    pub prior: Option<&'a AssessmentSnapshot>,
    pub overrides: &'a ClinicianOverride,
}

impl<'a> RuleContext<'a> {
    fn prior(&self) -> Result<&'a AssessmentSnapshot, ScoringError> {
        self.prior.ok_or(ScoringError::MissingPriorSnapshot)
    }
}

pub(super) fn apply_rule(
    rule: &ScoreRule,
    ctx: &RuleContext<'_>,
) -> Result<ScoreBreakdownItem, ScoringError> {
    let (achieved, points_awarded, observed_value) = match &rule.predicate {
        RulePredicate::PainAtMost { threshold, points } => {
            let pain = ctx.current.pain;
            let hit = pain <= *threshold;
            (hit, award(hit, *points), format!("pain {pain} (threshold {threshold})"))
        }
        RulePredicate::DisabilityAtMost { threshold, points } => {
            let disability = ctx.current.disability_percentage;
            let hit = disability <= *threshold;
            (
                hit,
                award(hit, *points),
                format!("disability {disability:.0}% (threshold {threshold:.0}%)"),
            )
        }
        RulePredicate::FunctionMeanBands { bands } => {
            let mean = ctx.current.mean_functional_score();
            let band = bands.iter().find(|band| mean >= band.at_least);
            (
                band.is_some(),
                band.map(|band| band.points).unwrap_or(0),
                format!("mean functional score {mean:.1}"),
            )
        }
        RulePredicate::ConfidenceBands { bands } => {
            let confidence = ctx.current.confidence;
            let band = bands.iter().find(|band| confidence >= band.at_least);
            (
                band.is_some(),
                band.map(|band| band.points).unwrap_or(0),
                format!("confidence {confidence}"),
            )
        }
        RulePredicate::NoNegativeBeliefs { points } => {
            let count = ctx.current.real_negative_belief_count();
            let hit = count == 0;
            (hit, award(hit, *points), format!("{count} negative belief(s) endorsed"))
        }
        RulePredicate::MilestoneMet { points } => {
            let hit = ctx.overrides.milestone_met;
            let observed = if hit {
                "clinician milestone sign-off recorded"
            } else {
                "no clinician milestone sign-off"
            };
            (hit, award(hit, *points), observed.to_string())
        }
        RulePredicate::ObjectiveProgressVerified { points } => {
            let hit = ctx.overrides.objective_progress_verified;
            let observed = if hit {
                "objective progress verified by clinician"
            } else {
                "objective progress not verified"
            };
            (hit, award(hit, *points), observed.to_string())
        }
        RulePredicate::PainReducedBy { delta, points } => {
            let prior = ctx.prior()?;
            let change = i16::from(prior.pain) - i16::from(ctx.current.pain);
            let hit = change >= i16::from(*delta);
            (
                hit,
                award(hit, *points),
                format!("pain {} -> {} (change {change})", prior.pain, ctx.current.pain),
            )
        }
        RulePredicate::FunctionMeanImprovedBy { delta, points } => {
            let prior = ctx.prior()?;
            let before = prior.mean_functional_score();
            let after = ctx.current.mean_functional_score();
            let hit = after - before >= *delta;
            (
                hit,
                award(hit, *points),
                format!("mean function {before:.1} -> {after:.1}"),
            )
        }
        RulePredicate::DisabilityReducedBy { delta, points } => {
            let prior = ctx.prior()?;
            let before = prior.disability_percentage;
            let after = ctx.current.disability_percentage;
            let hit = before - after >= *delta;
            (
                hit,
                award(hit, *points),
                format!("disability {before:.0}% -> {after:.0}%"),
            )
        }
        RulePredicate::ConfidenceImprovedBy { delta, points } => {
            let prior = ctx.prior()?;
            let change = i16::from(ctx.current.confidence) - i16::from(prior.confidence);
            let hit = change >= i16::from(*delta);
            (
                hit,
                award(hit, *points),
                format!(
                    "confidence {} -> {} (change {change})",
                    prior.confidence, ctx.current.confidence
                ),
            )
        }
        RulePredicate::NegativeBeliefsResolved { points } => {
            let prior = ctx.prior()?;
            let before = prior.real_negative_belief_count();
            let after = ctx.current.real_negative_belief_count();
            // All-or-nothing: partial improvement scores zero.
            let hit = before >= 1 && after == 0;
            (
                hit,
                award(hit, *points),
                format!("negative beliefs {before} -> {after}"),
            )
        }
        RulePredicate::GlobalRatingAtLeast { threshold, points } => {
            match ctx.current.global_rating_of_change {
                Some(groc) => {
                    let hit = groc >= *threshold;
                    (hit, award(hit, *points), format!("GROC {groc} (threshold {threshold})"))
                }
                None => (false, 0, "GROC not recorded".to_string()),
            }
        }
    };

    Ok(ScoreBreakdownItem {
        rule_id: rule.id,
        description: rule.description,
        achieved,
        points_awarded,
        observed_value,
    })
}

fn award(hit: bool, points: u8) -> u8 {
    if hit {
        points
    } else {
        0
    }
}
