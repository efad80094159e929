use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, trace};

use super::AttemptOutcome;
use crate::planner::Plan;

const ERROR_MARKER: &str = "ERROR";

/// Executes one plan. The seam lets the engine run against a scripted fake.
#[async_trait::async_trait]
pub trait ProcessRunner: std::fmt::Debug + Send + Sync {
    async fn run(&self, plan: &Plan) -> AttemptOutcome;
}

/// Spawns the plan's program and waits for it, bounded by the plan timeout.
#[derive(Debug, Default)]
pub struct CommandRunner;

#[async_trait::async_trait]
impl ProcessRunner for CommandRunner {
    #[tracing::instrument(skip_all, fields(program = %plan.program, strategy = %plan.strategy))]
    async fn run(&self, plan: &Plan) -> AttemptOutcome {
        let mut cmd = Command::new(&plan.program);
        cmd.args(&plan.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &plan.working_dir {
            cmd.current_dir(dir);
        }

        trace!(args = ?plan.args, "Spawning downloader");

        let child = match cmd.spawn() {
            Ok(c) => c,
            Err(e) => return AttemptOutcome::LaunchFailure(e.to_string()),
        };

        // Dropping the future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(plan.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return AttemptOutcome::LaunchFailure(e.to_string()),
            Err(_) => {
                debug!(timeout = ?plan.timeout, "Downloader timed out");
                return AttemptOutcome::Timeout;
            }
        };

        trace!(status = ?output.status, "Downloader finished");

        if output.status.success() {
            return AttemptOutcome::Success;
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);

        AttemptOutcome::NonZeroExit {
            code: output.status.code(),
            error_line: first_error_line(&stderr).or_else(|| first_error_line(&stdout)),
        }
    }
}

/// The first line carrying the downloader's error marker.
pub fn first_error_line(output: &str) -> Option<String> {
    output
        .lines()
        .find(|line| line.contains(ERROR_MARKER))
        .map(|line| line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::planner::Strategy;

    fn plan(program: &str, args: &[&str], timeout: Duration) -> Plan {
        Plan {
            strategy: Strategy::Standard,
            program: program.to_string(),
            args: args.iter().map(|a| (*a).to_string()).collect(),
            working_dir: None,
            timeout,
        }
    }

    #[test]
    fn picks_first_marked_line() {
        let output = "[youtube] abc: Downloading webpage\n\
                      WARNING: slow\n\
                      ERROR: [youtube] abc: Video unavailable\n\
                      ERROR: second\n";

        assert_eq!(
            first_error_line(output).as_deref(),
            Some("ERROR: [youtube] abc: Video unavailable")
        );
        assert_eq!(first_error_line("all good"), None);
    }

    #[tokio::test]
    async fn missing_program_is_a_launch_failure() {
        let outcome = CommandRunner
            .run(&plan(
                "audiograb-definitely-not-installed",
                &[],
                Duration::from_secs(5),
            ))
            .await;

        assert!(matches!(outcome, AttemptOutcome::LaunchFailure(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn exit_codes_and_error_lines() {
        let ok = CommandRunner
            .run(&plan("sh", &["-c", "exit 0"], Duration::from_secs(5)))
            .await;
        assert_eq!(ok, AttemptOutcome::Success);

        let failed = CommandRunner
            .run(&plan(
                "sh",
                &["-c", "echo 'ERROR: nope' >&2; exit 3"],
                Duration::from_secs(5),
            ))
            .await;
        assert_eq!(
            failed,
            AttemptOutcome::NonZeroExit {
                code: Some(3),
                error_line: Some("ERROR: nope".to_string()),
            }
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_process_times_out() {
        let outcome = CommandRunner
            .run(&plan("sleep", &["5"], Duration::from_millis(100)))
            .await;

        assert_eq!(outcome, AttemptOutcome::Timeout);
    }
}
