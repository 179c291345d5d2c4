//! Execution state models

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Why a step did not run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// On-disk artifacts show the step's work already happened
    AlreadyCompleted,
    /// Numbered below the requested start step
    StartFromStep(usize),
    /// Declined at the confirmation prompt
    UserChoice,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AlreadyCompleted => write!(f, "already completed"),
            SkipReason::StartFromStep(n) => write!(f, "starting from step {}", n),
            SkipReason::UserChoice => write!(f, "skipped by user"),
        }
    }
}

/// State of a single step within one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StepState {
    /// Not reached yet (or never reached because the run stopped)
    Pending,
    Skipped(SkipReason),
    Running {
        started_at: DateTime<Utc>,
    },
    Succeeded {
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    },
    Failed {
        error: String,
        failed_at: DateTime<Utc>,
    },
}

impl StepState {
    pub fn is_pending(&self) -> bool {
        matches!(self, StepState::Pending)
    }
}
