//! End-of-run report

use serde::Serialize;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StepOutcome {
    Success,
    Failure(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub name: String,
    pub outcome: StepOutcome,
    pub duration: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OverallStatus {
    Success,
    PartialSuccess,
    NoStepsExecuted,
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverallStatus::Success => write!(f, "SUCCESS"),
            OverallStatus::PartialSuccess => write!(f, "PARTIAL SUCCESS (some steps failed)"),
            OverallStatus::NoStepsExecuted => write!(f, "NO STEPS EXECUTED"),
        }
    }
}

/// Outcomes of the steps executed during one run, in execution order
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    records: Vec<StepRecord>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_success(&mut self, name: impl Into<String>, duration: Duration) {
        self.records.push(StepRecord {
            name: name.into(),
            outcome: StepOutcome::Success,
            duration,
        });
    }

    pub fn add_failure(
        &mut self,
        name: impl Into<String>,
        detail: impl Into<String>,
        duration: Duration,
    ) {
        self.records.push(StepRecord {
            name: name.into(),
            outcome: StepOutcome::Failure(detail.into()),
            duration,
        });
    }

    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    pub fn successes(&self) -> impl Iterator<Item = &StepRecord> {
        self.records
            .iter()
            .filter(|r| r.outcome == StepOutcome::Success)
    }

    pub fn failures(&self) -> impl Iterator<Item = (&StepRecord, &str)> {
        self.records.iter().filter_map(|r| match &r.outcome {
            StepOutcome::Failure(detail) => Some((r, detail.as_str())),
            StepOutcome::Success => None,
        })
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    pub fn status(&self) -> OverallStatus {
        if self.has_failures() {
            OverallStatus::PartialSuccess
        } else if self.successes().next().is_some() {
            OverallStatus::Success
        } else {
            OverallStatus::NoStepsExecuted
        }
    }

    pub fn total_duration(&self) -> Duration {
        self.records.iter().map(|r| r.duration).sum()
    }

    /// Human-readable report
    pub fn render(&self) -> String {
        let mut out = String::from("\n=== Installation Summary ===\n\n");

        let successes: Vec<_> = self.successes().collect();
        if !successes.is_empty() {
            out.push_str("✓ Successful steps:\n");
            for record in successes {
                out.push_str(&format!("  - {}\n", record.name));
            }
            out.push('\n');
        }

        let failures: Vec<_> = self.failures().collect();
        if !failures.is_empty() {
            out.push_str("✗ Failed steps:\n");
            for (record, detail) in failures {
                out.push_str(&format!("  - {}: {}\n", record.name, detail));
            }
            out.push('\n');
        }

        out.push_str(&format!("Overall status: {}\n", self.status()));
        out
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// `850ms`, `12s`, `3m 07s`, `1h 02m`
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs == 0 {
        format!("{}ms", duration.as_millis())
    } else if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {:02}s", secs / 60, secs % 60)
    } else {
        format!("{}h {:02}m", secs / 3600, (secs % 3600) / 60)
    }
}
