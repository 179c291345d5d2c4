//! CLI output formatting

use crate::core::state::StepState;
use crate::core::step::StepKind;
use crate::core::summary::{format_duration, OverallStatus};
use crate::execution::ExecutionEvent;
use console::Emoji;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static SKIP: Emoji<'_, '_> = Emoji("⏭  ", "- ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "! ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

fn step_label(step: StepKind) -> String {
    format!("[{}/{}] {}", step.number(), StepKind::ALL.len(), step.name())
}

/// Format a step state for display
pub fn format_step_state(state: &StepState) -> String {
    match state {
        StepState::Pending => style("PENDING").dim().to_string(),
        StepState::Running { .. } => style("RUNNING").yellow().to_string(),
        StepState::Succeeded { .. } => style("SUCCEEDED").green().to_string(),
        StepState::Failed { .. } => style("FAILED").red().to_string(),
        StepState::Skipped(reason) => style(format!("SKIPPED ({})", reason)).dim().to_string(),
    }
}

/// Format an overall status for display
pub fn format_status(status: OverallStatus) -> String {
    match status {
        OverallStatus::Success => style(status).green().bold().to_string(),
        OverallStatus::PartialSuccess => style(status).yellow().bold().to_string(),
        OverallStatus::NoStepsExecuted => style(status).dim().to_string(),
    }
}

/// Whether an event should still be shown in quiet mode
pub fn is_quiet_event(event: &ExecutionEvent) -> bool {
    matches!(
        event,
        ExecutionEvent::StepFailed { .. } | ExecutionEvent::RunAborted { .. }
    )
}

/// Format an execution event for display
pub fn format_execution_event(event: &ExecutionEvent) -> String {
    match event {
        ExecutionEvent::RunStarted {
            release_image,
            total_steps,
        } => format!(
            "{} Installing {} ({} steps)",
            ROCKET,
            style(release_image).bold(),
            total_steps
        ),
        ExecutionEvent::StepSkipped { step, reason } => format!(
            "{}{} {}",
            SKIP,
            style(step_label(*step)).dim(),
            style(format!("({})", reason)).dim()
        ),
        ExecutionEvent::StepStarted { step } => {
            format!("{} {}", SPINNER, style(step_label(*step)).cyan())
        }
        ExecutionEvent::StepCompleted { step, duration } => format!(
            "{} {} {}",
            CHECK,
            style(step_label(*step)).green(),
            style(format!("({})", format_duration(*duration))).dim()
        ),
        ExecutionEvent::StepFailed { step, error } => {
            format!("{} {}: {}", CROSS, style(step_label(*step)).red(), style(error).dim())
        }
        ExecutionEvent::ClusterIdentityResolved {
            cluster_name,
            region,
        } => format!(
            "{} Cluster {} in {}",
            INFO,
            style(cluster_name.as_deref().unwrap_or("<unset>")).bold(),
            style(region.as_deref().unwrap_or("<unset>")).bold()
        ),
        ExecutionEvent::RunAborted { step } => format!(
            "{} Stopped after step {}. Fix the problem and rerun; completed steps will be skipped.",
            WARN,
            step.number()
        ),
        ExecutionEvent::RunCompleted { status } => {
            format!("{} Run finished: {}", INFO, format_status(*status))
        }
    }
}

/// Per-step state table, one line per step
pub fn format_step_states<'a>(states: impl Iterator<Item = (StepKind, &'a StepState)>) -> String {
    states
        .map(|(step, state)| format!("  {:<40} {}", step_label(step), format_step_state(state)))
        .collect::<Vec<_>>()
        .join("\n")
}
