use serde::Serialize;

/// Upper bound of the raw check-in sliders.
pub const SLIDER_MAX: u8 = 10;
/// Upper bound of the pain ordinal scale.
pub const PAIN_BUCKET_MAX: u8 = 6;
/// Upper bound of the stress ordinal scale.
pub const STRESS_BUCKET_MAX: u8 = 3;

/// Bucket a 0-10 pain slider onto the 0-6 ordinal scale.
///
/// Linear proportional bucketing with floor semantics: the 11 slider values
/// split into 7 equal-width buckets, never rounded to nearest.
pub fn pain_bucket(raw: u8) -> u8 {
    let clamped = u16::from(raw.min(SLIDER_MAX));
    (clamped * u16::from(PAIN_BUCKET_MAX + 1) / u16::from(SLIDER_MAX + 1)) as u8
}

/// Bucket a 0-10 stress slider onto the 0-3 ordinal scale, floor semantics.
pub fn stress_bucket(raw: u8) -> u8 {
    let clamped = u16::from(raw.min(SLIDER_MAX));
    (clamped * u16::from(STRESS_BUCKET_MAX + 1) / u16::from(SLIDER_MAX + 1)) as u8
}

/// Per-dimension severity read off the ordinal buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Mild,
    Moderate,
    High,
}

/// Bucket boundaries for the tier decision.
///
/// Configuration data, not hard business fact; any replacement must keep the
/// tier monotonic in pain and stress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TierThresholds {
    /// On the 0-6 pain ordinal scale.
    pub pain_mild: u8,
    pub pain_moderate: u8,
    pub pain_high: u8,
    /// On the 0-3 stress ordinal scale.
    pub stress_mild: u8,
    pub stress_moderate: u8,
    pub stress_high: u8,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            pain_mild: 2,
            pain_moderate: 3,
            pain_high: 5,
            stress_mild: 1,
            stress_moderate: 2,
            stress_high: 3,
        }
    }
}

impl TierThresholds {
    pub fn pain_severity(&self, bucket: u8) -> Severity {
        severity(bucket, self.pain_mild, self.pain_moderate, self.pain_high)
    }

    pub fn stress_severity(&self, bucket: u8) -> Severity {
        severity(
            bucket,
            self.stress_mild,
            self.stress_moderate,
            self.stress_high,
        )
    }
}

fn severity(bucket: u8, mild: u8, moderate: u8, high: u8) -> Severity {
    if bucket >= high {
        Severity::High
    } else if bucket >= moderate {
        Severity::Moderate
    } else if bucket >= mild {
        Severity::Mild
    } else {
        Severity::Low
    }
}
