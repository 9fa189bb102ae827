mod mood;
mod thresholds;

pub use mood::{MoodCategory, MoodParse};
pub use thresholds::{
    pain_bucket, stress_bucket, Severity, TierThresholds, PAIN_BUCKET_MAX, SLIDER_MAX,
    STRESS_BUCKET_MAX,
};

use serde::{Deserialize, Serialize, Serializer};

/// Daily risk classification, tier 4 meaning high pain and high stress with
/// a non-positive mood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RiskTier {
    Tier1,
    Tier2,
    Tier3,
    Tier4,
}

impl RiskTier {
    pub const fn as_u8(self) -> u8 {
        match self {
            RiskTier::Tier1 => 1,
            RiskTier::Tier2 => 2,
            RiskTier::Tier3 => 3,
            RiskTier::Tier4 => 4,
        }
    }

    fn raised_one(self) -> Self {
        match self {
            RiskTier::Tier1 => RiskTier::Tier2,
            RiskTier::Tier2 => RiskTier::Tier3,
            // Tier 4 is never reached by the mood bump alone.
            RiskTier::Tier3 | RiskTier::Tier4 => RiskTier::Tier3,
        }
    }
}

impl Serialize for RiskTier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

/// Daily check-in payload from the patient app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckinSubmission {
    /// 0-10 pain slider.
    pub pain: u8,
    /// 0-10 stress slider.
    pub stress: u8,
    /// Emoji or word from the mood picker.
    pub mood: String,
}

/// Classification of one check-in, produced fresh every time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierOutcome {
    pub tier: RiskTier,
    pub escalate: bool,
    pub pain_bucket: u8,
    pub stress_bucket: u8,
    pub mood: MoodCategory,
    pub mood_recognized: bool,
}

/// Check-in rejection detail.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CheckinError {
    #[error("{field} value {value} outside slider range 0..={max}")]
    SliderOutOfRange {
        field: &'static str,
        value: u8,
        max: u8,
    },
}

/// Stateless tier classifier over immutable thresholds.
#[derive(Debug, Clone, Default)]
pub struct CheckinEngine {
    thresholds: TierThresholds,
}

impl CheckinEngine {
    pub fn new(thresholds: TierThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &TierThresholds {
        &self.thresholds
    }

    /// Classify one check-in, rejecting out-of-range sliders.
    pub fn classify(&self, submission: &CheckinSubmission) -> Result<TierOutcome, CheckinError> {
        if submission.pain > SLIDER_MAX {
            return Err(CheckinError::SliderOutOfRange {
                field: "pain",
                value: submission.pain,
                max: SLIDER_MAX,
            });
        }
        if submission.stress > SLIDER_MAX {
            return Err(CheckinError::SliderOutOfRange {
                field: "stress",
                value: submission.stress,
                max: SLIDER_MAX,
            });
        }

        let parsed = MoodCategory::from_token(&submission.mood);
        Ok(self.classify_normalized(
            pain_bucket(submission.pain),
            stress_bucket(submission.stress),
            parsed,
        ))
    }

    /// Tier decision over already-normalized inputs.
    ///
    /// The tier is monotonic in both buckets, mood only ever raises it, and
    /// escalation holds exactly on tier 4.
    pub fn classify_normalized(
        &self,
        pain_bucket: u8,
        stress_bucket: u8,
        mood: MoodParse,
    ) -> TierOutcome {
        let pain = self.thresholds.pain_severity(pain_bucket);
        let stress = self.thresholds.stress_severity(stress_bucket);

        let mut tier = match pain.max(stress) {
            Severity::Low => RiskTier::Tier1,
            Severity::Mild => RiskTier::Tier2,
            Severity::Moderate | Severity::High => RiskTier::Tier3,
        };

        tier = match mood.category {
            MoodCategory::Positive | MoodCategory::Neutral => tier,
            MoodCategory::Negative => tier.max(RiskTier::Tier2),
            MoodCategory::Distressed => tier.max(tier.raised_one()),
        };

        if pain == Severity::High
            && stress == Severity::High
            && mood.category != MoodCategory::Positive
        {
            tier = RiskTier::Tier4;
        }

        TierOutcome {
            tier,
            escalate: tier == RiskTier::Tier4,
            pain_bucket,
            stress_bucket,
            mood: mood.category,
            mood_recognized: mood.recognized,
        }
    }
}
