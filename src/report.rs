use std::{fmt::Display, path::PathBuf};

use chrono::{DateTime, Local};

use crate::{classifier::UrlKind, planner::Strategy};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlStatus {
    Succeeded { strategy: Strategy },
    Failed { error: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlOutcome {
    pub url: String,
    pub kind: UrlKind,
    pub status: UrlStatus,
}

/// Aggregated result of one download session.
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub outcomes: Vec<UrlOutcome>,
    /// URLs left out because the ledger already had them.
    pub skipped: usize,
    /// URLs that were due for processing after filtering.
    pub planned: usize,
    pub interrupted: bool,
    pub output_dir: PathBuf,
    pub started: DateTime<Local>,
    pub finished: Option<DateTime<Local>>,
}
impl SessionReport {
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            outcomes: Vec::new(),
            skipped: 0,
            planned: 0,
            interrupted: false,
            output_dir,
            started: Local::now(),
            finished: None,
        }
    }

    pub fn push(&mut self, url: &str, kind: UrlKind, status: UrlStatus) {
        self.outcomes.push(UrlOutcome {
            url: url.to_string(),
            kind,
            status,
        });
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, UrlStatus::Succeeded { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, UrlStatus::Failed { .. }))
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &UrlOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, UrlStatus::Failed { .. }))
    }

    pub fn finish(&mut self) {
        self.finished = Some(Local::now());
    }
}

impl Display for SessionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rule = "=".repeat(70);
        let finished = self.finished.unwrap_or_else(Local::now);

        writeln!(f, "{rule}")?;
        writeln!(
            f,
            "DOWNLOAD SESSION COMPLETE: {}",
            finished.format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(f, "{rule}")?;
        writeln!(f, "  Started: {}", self.started.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(f, "  Successful: {}/{}", self.succeeded(), self.planned)?;
        writeln!(f, "  Failed: {}/{}", self.failed(), self.planned)?;
        if self.skipped > 0 {
            writeln!(f, "  Skipped (already archived): {}", self.skipped)?;
        }
        if self.interrupted {
            let unattempted = self.planned.saturating_sub(self.outcomes.len());
            writeln!(f, "  Interrupted: {unattempted} URL(s) not processed")?;
        }
        for failure in self.failures() {
            if let UrlStatus::Failed { error: Some(error) } = &failure.status {
                writeln!(f, "    ✗ [{}] {}: {}", failure.kind, failure.url, error)?;
            }
        }
        writeln!(f, "  Output location: {}", self.output_dir.display())?;
        writeln!(
            f,
            "  Duration: {}s",
            (finished - self.started).num_seconds().max(0)
        )?;
        write!(f, "{rule}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_and_summary() {
        let mut report = SessionReport::new(PathBuf::from("out"));
        report.planned = 3;
        report.skipped = 1;
        report.push(
            "https://a.test/1",
            UrlKind::Generic,
            UrlStatus::Succeeded {
                strategy: Strategy::Standard,
            },
        );
        report.push(
            "https://a.test/2",
            UrlKind::Generic,
            UrlStatus::Failed {
                error: Some("ERROR: gone".to_string()),
            },
        );
        report.interrupted = true;
        report.finish();

        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);

        let summary = report.to_string();
        assert!(summary.contains("Successful: 1/3"));
        assert!(summary.contains("Failed: 1/3"));
        assert!(summary.contains("Skipped (already archived): 1"));
        assert!(summary.contains("Interrupted: 1 URL(s) not processed"));
        assert!(summary.contains("[generic] https://a.test/2: ERROR: gone"));
        assert!(summary.contains("Duration: "));
        assert!(summary.contains("Output location: out"));
    }
}
