pub mod runner;

use std::fmt::Display;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::planner::{Plan, Strategy};

pub use runner::{CommandRunner, ProcessRunner};

/// Result of running a single plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    NonZeroExit {
        code: Option<i32>,
        error_line: Option<String>,
    },
    Timeout,
    LaunchFailure(String),
}
impl AttemptOutcome {
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// The line worth showing the user for a failed attempt.
    pub fn error_summary(&self) -> Option<String> {
        match self {
            Self::Success => None,
            Self::NonZeroExit {
                error_line: Some(line),
                ..
            } => Some(line.clone()),
            other => Some(other.to_string()),
        }
    }
}
impl Display for AttemptOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::NonZeroExit { code: Some(c), .. } => write!(f, "exited with code {c}"),
            Self::NonZeroExit { code: None, .. } => f.write_str("terminated by signal"),
            Self::Timeout => f.write_str("timed out"),
            Self::LaunchFailure(e) => write!(f, "could not be started: {e}"),
        }
    }
}

/// Result of running all plans for one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionResult {
    Succeeded { strategy: Strategy, attempts: usize },
    Failed { attempts: usize, error: Option<String> },
    /// Stopped by the user while fallbacks remained; not counted as a failure.
    Interrupted { attempts: usize },
}

/// Runs plans in order until one exits with code zero.
#[derive(Debug)]
pub struct ExecutionEngine<'a> {
    runner: &'a dyn ProcessRunner,
    cancel: CancellationToken,
}
impl<'a> ExecutionEngine<'a> {
    pub fn new(runner: &'a dyn ProcessRunner, cancel: CancellationToken) -> Self {
        Self { runner, cancel }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    #[tracing::instrument(skip_all, fields(url = plans.first().and_then(Plan::target)))]
    pub async fn execute(&self, plans: &[Plan]) -> ExecutionResult {
        let mut last_error = None;

        for (i, plan) in plans.iter().enumerate() {
            let attempt = i + 1;
            debug!(attempt, total = plans.len(), strategy = %plan.strategy, "Trying plan");

            let outcome = self.runner.run(plan).await;

            if outcome.is_success() {
                info!(strategy = %plan.strategy, "✓ Successfully downloaded");
                return ExecutionResult::Succeeded {
                    strategy: plan.strategy,
                    attempts: attempt,
                };
            }

            warn!(strategy = %plan.strategy, %outcome, "Attempt {}/{} failed", attempt, plans.len());
            last_error = outcome.error_summary();

            if self.is_cancelled() && attempt < plans.len() {
                return ExecutionResult::Interrupted { attempts: attempt };
            }
        }

        ExecutionResult::Failed {
            attempts: plans.len(),
            error: last_error,
        }
    }
}
