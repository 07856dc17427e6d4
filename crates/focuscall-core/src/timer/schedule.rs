use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepType {
    Focus,
    Break,
}

/// User-chosen shape of one run: `total_rounds` focus stages, each followed
/// by a break stage.
///
/// Immutable for the duration of a run. Construct through [`SessionConfig::new`]
/// so zero values are rejected before the engine ever sees them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    total_rounds: u32,
    focus_seconds: u32,
    break_seconds: u32,
}

impl SessionConfig {
    /// Validate settings-form input.
    ///
    /// # Errors
    /// Returns [`ValidationError::MustBePositive`] for the first zero field.
    pub fn new(
        total_rounds: u32,
        focus_seconds: u32,
        break_seconds: u32,
    ) -> Result<Self, ValidationError> {
        if total_rounds == 0 {
            return Err(ValidationError::MustBePositive {
                field: "total_rounds",
            });
        }
        if focus_seconds == 0 {
            return Err(ValidationError::MustBePositive {
                field: "focus_seconds",
            });
        }
        if break_seconds == 0 {
            return Err(ValidationError::MustBePositive {
                field: "break_seconds",
            });
        }
        Ok(Self {
            total_rounds,
            focus_seconds,
            break_seconds,
        })
    }

    pub fn total_rounds(&self) -> u32 {
        self.total_rounds
    }

    pub fn focus_seconds(&self) -> u32 {
        self.focus_seconds
    }

    pub fn break_seconds(&self) -> u32 {
        self.break_seconds
    }

    /// Length of a stage of the given type.
    pub fn stage_seconds(&self, step_type: StepType) -> u32 {
        match step_type {
            StepType::Focus => self.focus_seconds,
            StepType::Break => self.break_seconds,
        }
    }

    /// Ticks needed to run the whole cycle without pauses or skips.
    pub fn total_seconds(&self) -> u64 {
        u64::from(self.total_rounds)
            * (u64::from(self.focus_seconds) + u64::from(self.break_seconds))
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            total_rounds: 4,
            focus_seconds: 25 * 60,
            break_seconds: 5 * 60,
        }
    }
}
