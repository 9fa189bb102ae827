use serde::Serialize;

use super::rules::{PointBand, RulePredicate, ScoreRule};
use crate::workflows::recovery::domain::FormKind;

/// Named, ordered rule table with a declared maximum.
///
/// Immutable once constructed; hot reloads must swap the whole value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoringRuleSet {
    pub name: &'static str,
    pub form_kind: FormKind,
    pub declared_max: u8,
    pub rules: Vec<ScoreRule>,
}

impl ScoringRuleSet {
    /// First-visit rules: absolute thresholds against one snapshot, 9 points.
    pub fn baseline() -> Self {
        let mut rules = vec![
            ScoreRule {
                id: "baseline.pain",
                description: "Pain at or below 2/10",
                predicate: RulePredicate::PainAtMost {
                    threshold: 2,
                    points: 1,
                },
            },
            ScoreRule {
                id: "baseline.disability",
                description: "Disability index at or below 20%",
                predicate: RulePredicate::DisabilityAtMost {
                    threshold: 20.0,
                    points: 1,
                },
            },
            ScoreRule {
                id: "baseline.function",
                description: "Mean functional score 7+ (2 pts) or 4+ (1 pt)",
                predicate: RulePredicate::FunctionMeanBands {
                    bands: vec![
                        PointBand {
                            at_least: 7.0,
                            points: 2,
                        },
                        PointBand {
                            at_least: 4.0,
                            points: 1,
                        },
                    ],
                },
            },
            ScoreRule {
                id: "baseline.confidence",
                description: "Confidence 8+ (2 pts) or 5+ (1 pt)",
                predicate: RulePredicate::ConfidenceBands {
                    bands: vec![
                        PointBand {
                            at_least: 8,
                            points: 2,
                        },
                        PointBand {
                            at_least: 5,
                            points: 1,
                        },
                    ],
                },
            },
            ScoreRule {
                id: "baseline.beliefs",
                description: "No negative recovery beliefs endorsed",
                predicate: RulePredicate::NoNegativeBeliefs { points: 1 },
            },
        ];
        rules.extend(clinician_rules());

        Self {
            name: "baseline",
            form_kind: FormKind::Baseline,
            declared_max: 9,
            rules,
        }
    }

    /// Re-assessment rules: deltas against the prior snapshot, 11 points.
    pub fn follow_up() -> Self {
        let mut rules = vec![
            ScoreRule {
                id: "follow_up.pain_change",
                description: "Pain reduced by 2+ points since baseline",
                predicate: RulePredicate::PainReducedBy {
                    delta: 2,
                    points: 1,
                },
            },
            ScoreRule {
                id: "follow_up.function_change",
                description: "Mean functional score improved by 4+ points",
                predicate: RulePredicate::FunctionMeanImprovedBy {
                    delta: 4.0,
                    points: 2,
                },
            },
            ScoreRule {
                id: "follow_up.disability_change",
                description: "Disability index reduced by 10+ percentage points",
                predicate: RulePredicate::DisabilityReducedBy {
                    delta: 10.0,
                    points: 1,
                },
            },
            ScoreRule {
                id: "follow_up.confidence_change",
                description: "Confidence improved by 3+ points",
                predicate: RulePredicate::ConfidenceImprovedBy {
                    delta: 3,
                    points: 2,
                },
            },
            ScoreRule {
                id: "follow_up.beliefs_resolved",
                description: "All negative beliefs from baseline resolved",
                predicate: RulePredicate::NegativeBeliefsResolved { points: 1 },
            },
            ScoreRule {
                id: "follow_up.global_rating",
                description: "Global rating of change 5 or higher",
                predicate: RulePredicate::GlobalRatingAtLeast {
                    threshold: 5,
                    points: 1,
                },
            },
        ];
        rules.extend(clinician_rules());

        Self {
            name: "follow_up",
            form_kind: FormKind::FollowUp,
            declared_max: 11,
            rules,
        }
    }

    /// Sum of the rules' maxima, which must equal `declared_max`.
    pub fn rule_max_total(&self) -> u16 {
        self.rules
            .iter()
            .map(|rule| u16::from(rule.max_points()))
            .sum()
    }

    /// Startup check: the declared maximum must match the rule table.
    pub fn verify_integrity(&self) -> Result<(), RuleSetIntegrityError> {
        let actual = self.rule_max_total();
        if actual != u16::from(self.declared_max) {
            return Err(RuleSetIntegrityError {
                rule_set: self.name,
                declared_max: self.declared_max,
                actual,
            });
        }
        Ok(())
    }

    pub fn requires_prior(&self) -> bool {
        self.rules.iter().any(|rule| rule.predicate.requires_prior())
    }
}

/// Clinician sign-off rules shared by both rule sets.
fn clinician_rules() -> [ScoreRule; 2] {
    [
        ScoreRule {
            id: "clinician.milestone",
            description: "Clinician confirms phase milestone met",
            predicate: RulePredicate::MilestoneMet { points: 1 },
        },
        ScoreRule {
            id: "clinician.progress",
            description: "Clinician verifies objective progress",
            predicate: RulePredicate::ObjectiveProgressVerified { points: 1 },
        },
    ]
}

/// A rule table whose declared maximum disagrees with its rules.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("rule set '{rule_set}' declares max {declared_max} but its rules total {actual}")]
pub struct RuleSetIntegrityError {
    pub rule_set: &'static str,
    pub declared_max: u8,
    pub actual: u16,
}
