use serde::{Deserialize, Serialize};

/// Mood category behind the emoji-labeled check-in picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoodCategory {
    Positive,
    Neutral,
    Negative,
    Distressed,
}

impl MoodCategory {
    pub const fn label(self) -> &'static str {
        match self {
            MoodCategory::Positive => "positive",
            MoodCategory::Neutral => "neutral",
            MoodCategory::Negative => "negative",
            MoodCategory::Distressed => "distressed",
        }
    }

    /// Map a raw mood token (emoji or word) to a category.
    ///
    /// Unknown tokens fall back to neutral with `recognized = false`, the
    /// conservative default that neither suppresses nor falsely triggers
    /// escalation; the caller surfaces the warning.
    pub fn from_token(token: &str) -> MoodParse {
        let normalized = token.trim().to_lowercase();
        let category = match normalized.as_str() {
            "\u{1F604}" | "\u{1F642}" | "positive" | "great" | "good" | "happy" => {
                Some(MoodCategory::Positive)
            }
            "\u{1F610}" | "neutral" | "okay" | "ok" | "fine" | "meh" => Some(MoodCategory::Neutral),
            "\u{1F641}" | "\u{1F61E}" | "negative" | "low" | "down" | "sad" | "bad" => {
                Some(MoodCategory::Negative)
            }
            "\u{1F62B}" | "\u{1F629}" | "distressed" | "overwhelmed" | "awful" | "terrible" => {
                Some(MoodCategory::Distressed)
            }
            _ => None,
        };

        match category {
            Some(category) => MoodParse {
                category,
                recognized: true,
            },
            None => MoodParse {
                category: MoodCategory::Neutral,
                recognized: false,
            },
        }
    }
}

/// Outcome of tolerant mood parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoodParse {
    pub category: MoodCategory,
    pub recognized: bool,
}
