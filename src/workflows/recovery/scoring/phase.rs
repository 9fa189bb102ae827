use serde::{Deserialize, Serialize};

/// Coarse recovery stage derived from the total score, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryPhase {
    Reset,
    Educate,
    Rebuild,
}

impl RecoveryPhase {
    pub const fn label(self) -> &'static str {
        match self {
            RecoveryPhase::Reset => "reset",
            RecoveryPhase::Educate => "educate",
            RecoveryPhase::Rebuild => "rebuild",
        }
    }
}

/// Non-overlapping score cutoffs mapping a total to a phase.
///
/// The same cutoffs apply to baseline and follow-up totals; the classifier
/// never looks at the form kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhaseCutoffs {
    pub reset_max: u8,
    pub educate_max: u8,
}

impl Default for PhaseCutoffs {
    fn default() -> Self {
        Self {
            reset_max: 3,
            educate_max: 7,
        }
    }
}

impl PhaseCutoffs {
    pub fn classify(&self, total: u8) -> RecoveryPhase {
        if total <= self.reset_max {
            RecoveryPhase::Reset
        } else if total <= self.educate_max {
            RecoveryPhase::Educate
        } else {
            RecoveryPhase::Rebuild
        }
    }
}
