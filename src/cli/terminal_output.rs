//! Terminal reporter for pipeline events
//!
//! Prints one line per event and keeps a spinner running while a step is in
//! flight, since a create-or-update against the control plane can take a
//! while.

use crate::cli::output::{create_spinner, format_execution_event};
use crate::execution::ExecutionEvent;
use indicatif::ProgressBar;
use std::sync::Mutex;

/// Event handler that renders execution events to the terminal
#[derive(Default)]
pub struct TerminalReporter {
    spinner: Mutex<Option<ProgressBar>>,
}

impl TerminalReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle one event from the engine
    pub fn handle(&self, event: &ExecutionEvent) {
        let Ok(mut spinner) = self.spinner.lock() else {
            println!("{}", format_execution_event(event));
            return;
        };

        if let Some(active) = spinner.take() {
            active.finish_and_clear();
        }

        println!("{}", format_execution_event(event));

        if let ExecutionEvent::StepStarted { step_id, .. } = event {
            *spinner = Some(create_spinner(format!("running {}", step_id)));
        }
    }

    /// Whether a spinner is currently shown
    pub fn is_spinning(&self) -> bool {
        self.spinner
            .lock()
            .map(|spinner| spinner.is_some())
            .unwrap_or(false)
    }
}
