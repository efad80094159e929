use std::{process::Stdio, time::Duration};

use tokio::process::Command;
use tracing::{debug, info};

use crate::error::SetupError;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

const DOWNLOADER_ENV: &str = "AUDIOGRAB_DOWNLOADER";
const FFMPEG_ENV: &str = "AUDIOGRAB_FFMPEG";

/// An external binary the downloads depend on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tool {
    pub name: &'static str,
    pub program: String,
    pub version_arg: &'static str,
}
impl Tool {
    pub fn downloader() -> Self {
        Self {
            name: "yt-dlp",
            program: std::env::var(DOWNLOADER_ENV).unwrap_or_else(|_| "yt-dlp".to_string()),
            version_arg: "--version",
        }
    }

    pub fn ffmpeg() -> Self {
        Self {
            name: "ffmpeg",
            program: std::env::var(FFMPEG_ENV).unwrap_or_else(|_| "ffmpeg".to_string()),
            version_arg: "-version",
        }
    }

    /// First line of the version output, or `None` if the tool is unusable.
    #[tracing::instrument(skip(self), fields(program = %self.program))]
    pub async fn version(&self) -> Option<String> {
        let output = Command::new(&self.program)
            .arg(self.version_arg)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .output();

        match tokio::time::timeout(PROBE_TIMEOUT, output).await {
            Ok(Ok(out)) if out.status.success() => {
                let version = String::from_utf8_lossy(&out.stdout)
                    .lines()
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string();
                Some(version)
            }
            Ok(Ok(out)) => {
                debug!(status = ?out.status, "Version probe failed");
                None
            }
            Ok(Err(e)) => {
                debug!(?e, "Could not start tool");
                None
            }
            Err(_) => {
                debug!("Version probe timed out");
                None
            }
        }
    }
}

/// Verify every tool answers its version probe.
pub async fn check(tools: &[Tool]) -> Result<(), SetupError> {
    let mut missing = Vec::new();

    for tool in tools {
        match tool.version().await {
            Some(version) => info!(tool = tool.name, %version, "Found dependency"),
            None => missing.push(tool.name.to_string()),
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(SetupError::MissingDependencies(missing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool(name: &'static str, program: &str, version_arg: &'static str) -> Tool {
        Tool {
            name,
            program: program.to_string(),
            version_arg,
        }
    }

    #[tokio::test]
    async fn absent_tool_is_reported() {
        let result = check(&[tool("yt-dlp", "audiograb-no-such-binary", "--version")]).await;

        match result {
            Err(SetupError::MissingDependencies(missing)) => assert_eq!(missing, vec!["yt-dlp"]),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn working_tool_reports_version() {
        let echo = tool("echo", "echo", "1.2.3");

        assert_eq!(echo.version().await.as_deref(), Some("1.2.3"));
        assert!(check(&[echo]).await.is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_tool_is_missing() {
        assert_eq!(tool("false", "false", "--version").version().await, None);
    }
}
