//! CLI output formatting

use crate::{
    core::{ExecutionStatus, StepState},
    execution::{ExecutionEvent, RunSummary},
    steps::IdentityOutcome,
};
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "! ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");
pub static BROOM: Emoji<'_, '_> = Emoji("🧹 ", "- ");

/// Create a spinner shown while a step runs
pub fn create_spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Format a step state for display
pub fn format_step_state(state: &StepState) -> String {
    match state {
        StepState::Pending => style("PENDING").dim().to_string(),
        StepState::Running { .. } => style("RUNNING").yellow().to_string(),
        StepState::Completed { .. } => style("COMPLETED").green().to_string(),
        StepState::Halted { .. } => style("HALTED").red().to_string(),
    }
}

/// Format an execution status for display
pub fn format_status(status: ExecutionStatus) -> String {
    match status {
        ExecutionStatus::Pending => style("PENDING").dim().to_string(),
        ExecutionStatus::Running => style("RUNNING").yellow().to_string(),
        ExecutionStatus::Completed => style("COMPLETED").green().to_string(),
        ExecutionStatus::Halted => style("HALTED").red().to_string(),
    }
}

/// Format an identity outcome for display
pub fn format_outcome(outcome: IdentityOutcome) -> String {
    let text = outcome.to_string();
    match outcome {
        IdentityOutcome::Created => style(text).green().to_string(),
        IdentityOutcome::AlreadyExists => style(text).cyan().to_string(),
        IdentityOutcome::Skipped => style(text).dim().to_string(),
        IdentityOutcome::NotCreated => style(text).red().to_string(),
    }
}

/// Format an execution event for display
pub fn format_execution_event(event: &ExecutionEvent) -> String {
    match event {
        ExecutionEvent::PipelineStarted {
            execution_id,
            pipeline_name,
        } => format!(
            "{} Starting pipeline {} ({})",
            ROCKET,
            style(pipeline_name).bold(),
            style(&execution_id.to_string()[..8]).dim()
        ),
        ExecutionEvent::StepStarted {
            step_id,
            index,
            total,
        } => format!(
            "{} [{}/{}] {}",
            SPINNER,
            index + 1,
            total,
            style(step_id).cyan()
        ),
        ExecutionEvent::StepCompleted { step_id } => {
            format!("{} {}", CHECK, style(step_id).green())
        }
        ExecutionEvent::StepHalted { step_id, error } => match error {
            Some(error) => format!("{} {}: {}", CROSS, style(step_id).red(), style(error).dim()),
            None => format!("{} {}", CROSS, style(step_id).red()),
        },
        ExecutionEvent::PipelineCancelled { step_id } => format!(
            "{} Cancelled before {}",
            WARN,
            style(step_id).yellow()
        ),
        ExecutionEvent::StepCleanedUp { step_id } => {
            format!("{} Cleaned up {}", BROOM, style(step_id).dim())
        }
        ExecutionEvent::PipelineCompleted {
            execution_id,
            status,
        } => format!(
            "{} Pipeline ({}) {}",
            INFO,
            style(&execution_id.to_string()[..8]).dim(),
            format_status(*status)
        ),
    }
}

/// Format the end-of-run report
pub fn format_summary(summary: &RunSummary) -> String {
    let mut lines = vec![format!(
        "{} {} - {}",
        INFO,
        style(&summary.pipeline_name).bold(),
        format_status(summary.status)
    )];

    for step in &summary.steps {
        let cleaned = if step.cleaned_up { " (cleaned up)" } else { "" };
        lines.push(format!(
            "  {} {}{}",
            format_step_state(&step.state),
            step.name,
            style(cleaned).dim()
        ));
    }

    if let Some(outcome) = summary.identity_outcome {
        lines.push(format!("  Managed identity: {}", format_outcome(outcome)));
        if !outcome.is_available() {
            lines.push(format!(
                "  {}{}",
                WARN,
                style("No managed identity is available to later steps").yellow()
            ));
        }
    }
    if let Some(id) = &summary.identity_resource_id {
        lines.push(format!("  Resource id: {}", style(id).dim()));
    }
    if let Some(error) = &summary.error {
        lines.push(format!("  Error: {}", style(error).red()));
    }

    lines.join("\n")
}
