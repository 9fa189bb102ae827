use serde::{Deserialize, Serialize};

use crate::config::IntakeMode;

/// Sentinel answer on the beliefs question meaning "no negative beliefs".
pub const NO_NEGATIVE_BELIEFS_SENTINEL: &str = "None of these apply";

/// Identifier wrapper for patients known to the care platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatientId(pub String);

/// Identifier wrapper for recorded assessments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssessmentId(pub String);

/// Which questionnaire produced a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormKind {
    Baseline,
    FollowUp,
}

impl FormKind {
    pub const fn label(self) -> &'static str {
        match self {
            FormKind::Baseline => "baseline",
            FormKind::FollowUp => "follow_up",
        }
    }
}

/// One self-chosen activity rated by the patient (PSFS style, 0-10).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionalScore {
    pub activity: String,
    pub score: u8,
}

/// A patient's answers at one point in time, sanitized and range-checked.
///
/// All bounded fields are guaranteed in range once a snapshot exists; rule
/// evaluation never re-clamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentSnapshot {
    /// VAS pain rating, 0-10.
    pub pain: u8,
    /// Region-specific disability index normalized to 0-100 percent.
    pub disability_percentage: f32,
    pub functional_scores: Vec<FunctionalScore>,
    /// Confidence in recovery, 0-10.
    pub confidence: u8,
    pub negative_beliefs: Vec<String>,
    /// GROC, follow-up only, -7..=7.
    pub global_rating_of_change: Option<i8>,
    pub form_kind: FormKind,
}

impl AssessmentSnapshot {
    /// Mean of the PSFS activity scores; an empty list counts as 0.
    pub fn mean_functional_score(&self) -> f32 {
        if self.functional_scores.is_empty() {
            return 0.0;
        }
        let sum: u32 = self
            .functional_scores
            .iter()
            .map(|entry| u32::from(entry.score))
            .sum();
        sum as f32 / self.functional_scores.len() as f32
    }

    /// Number of beliefs excluding the "none of these apply" sentinel.
    pub fn real_negative_belief_count(&self) -> usize {
        self.negative_beliefs
            .iter()
            .filter(|belief| !belief.trim().eq_ignore_ascii_case(NO_NEGATIVE_BELIEFS_SENTINEL))
            .count()
    }

    pub fn has_negative_beliefs(&self) -> bool {
        self.real_negative_belief_count() > 0
    }

    /// Verify every bounded field sits inside its declared range.
    pub fn validate(&self) -> Result<(), SnapshotValidationError> {
        range_check("pain", f64::from(self.pain), 0.0, 10.0)?;
        range_check(
            "disability_percentage",
            f64::from(self.disability_percentage),
            0.0,
            100.0,
        )?;
        range_check("confidence", f64::from(self.confidence), 0.0, 10.0)?;
        for entry in &self.functional_scores {
            range_check("functional_scores.score", f64::from(entry.score), 0.0, 10.0)?;
        }
        if let Some(groc) = self.global_rating_of_change {
            range_check("global_rating_of_change", f64::from(groc), -7.0, 7.0)?;
        }
        Ok(())
    }
}

fn range_check(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), SnapshotValidationError> {
    if value < min || value > max {
        return Err(SnapshotValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

/// Clinician sign-offs recorded independently of the patient's answers.
///
/// Absent until a clinician explicitly records them for the assessment cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClinicianOverride {
    pub milestone_met: bool,
    pub objective_progress_verified: bool,
}

/// Raw intake payload from the form layer, before sanitization.
///
/// Numeric answers are optional so that lenient intake can preserve the
/// legacy behavior of defaulting unanswered questions to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentSubmission {
    pub patient_id: PatientId,
    pub form_kind: FormKind,
    #[serde(default)]
    pub pain: Option<u8>,
    #[serde(default)]
    pub disability_percentage: Option<f32>,
    #[serde(default)]
    pub functional_scores: Vec<FunctionalScore>,
    #[serde(default)]
    pub confidence: Option<u8>,
    #[serde(default)]
    pub negative_beliefs: Vec<String>,
    #[serde(default)]
    pub global_rating_of_change: Option<i8>,
    #[serde(default)]
    pub prior_assessment_id: Option<AssessmentId>,
}

/// Result of sanitizing a submission: the snapshot plus any answers the
/// lenient path defaulted to zero.
#[derive(Debug, Clone, PartialEq)]
pub struct SanitizedAssessment {
    pub snapshot: AssessmentSnapshot,
    pub incomplete_fields: Vec<&'static str>,
}

impl AssessmentSubmission {
    /// Turn the raw form payload into a validated snapshot.
    ///
    /// Out-of-range answers are rejected in both modes; only *missing*
    /// answers differ (strict rejects, lenient zeroes and records the field).
    pub fn sanitize(&self, mode: IntakeMode) -> Result<SanitizedAssessment, SnapshotValidationError> {
        let mut incomplete_fields = Vec::new();

        let pain = required_numeric("pain", self.pain, mode, &mut incomplete_fields)?;
        let disability_percentage = required_numeric(
            "disability_percentage",
            self.disability_percentage,
            mode,
            &mut incomplete_fields,
        )?;
        let confidence =
            required_numeric("confidence", self.confidence, mode, &mut incomplete_fields)?;

        if self.functional_scores.is_empty() {
            match mode {
                IntakeMode::Strict => {
                    return Err(SnapshotValidationError::MissingField {
                        field: "functional_scores",
                    })
                }
                IntakeMode::Lenient => incomplete_fields.push("functional_scores"),
            }
        }

        let global_rating_of_change = match (self.form_kind, self.global_rating_of_change) {
            (FormKind::FollowUp, None) => match mode {
                IntakeMode::Strict => {
                    return Err(SnapshotValidationError::MissingField {
                        field: "global_rating_of_change",
                    })
                }
                IntakeMode::Lenient => {
                    incomplete_fields.push("global_rating_of_change");
                    Some(0)
                }
            },
            (_, value) => value,
        };

        let snapshot = AssessmentSnapshot {
            pain,
            disability_percentage,
            functional_scores: self.functional_scores.clone(),
            confidence,
            negative_beliefs: self.negative_beliefs.clone(),
            global_rating_of_change,
            form_kind: self.form_kind,
        };
        snapshot.validate()?;

        Ok(SanitizedAssessment {
            snapshot,
            incomplete_fields,
        })
    }
}

fn required_numeric<T: Default>(
    field: &'static str,
    value: Option<T>,
    mode: IntakeMode,
    incomplete_fields: &mut Vec<&'static str>,
) -> Result<T, SnapshotValidationError> {
    match value {
        Some(value) => Ok(value),
        None => match mode {
            IntakeMode::Strict => Err(SnapshotValidationError::MissingField { field }),
            IntakeMode::Lenient => {
                incomplete_fields.push(field);
                Ok(T::default())
            }
        },
    }
}

/// Intake rejection detail, precise enough to fix the input at the source.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SnapshotValidationError {
    #[error("missing required field '{field}'")]
    MissingField { field: &'static str },
    #[error("{field} value {value} outside declared range {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}
