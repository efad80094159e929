use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    archive::ArchiveLedger,
    classifier::UrlClassifier,
    config::Config,
    engine::{ExecutionEngine, ExecutionResult, ProcessRunner},
    planner::DownloadPlanner,
    report::{SessionReport, UrlStatus},
};

const DISPLAY_URL_LEN: usize = 80;

/// Drives a batch of URLs through classification, planning and execution,
/// one URL at a time.
#[derive(Debug)]
pub struct DownloadSession<'a> {
    config: &'a Config,
    planner: DownloadPlanner<'a>,
    engine: ExecutionEngine<'a>,
    ledger: &'a mut ArchiveLedger,
}
impl<'a> DownloadSession<'a> {
    pub fn new(
        config: &'a Config,
        program: &str,
        runner: &'a dyn ProcessRunner,
        ledger: &'a mut ArchiveLedger,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            planner: DownloadPlanner::new(config, program),
            engine: ExecutionEngine::new(runner, cancel),
            ledger,
        }
    }

    /// URLs still to download. Ledger filtering is bypassed with skip-archive.
    pub fn pending<'u>(&self, urls: &'u [String]) -> Vec<&'u str> {
        urls.iter()
            .map(String::as_str)
            .filter(|url| self.config.session.skip_archive || !self.ledger.contains(url))
            .collect()
    }

    pub async fn run(&mut self, urls: &[String]) -> SessionReport {
        let mut report = SessionReport::new(self.config.output_dir.clone());

        let pending = self.pending(urls);
        report.skipped = urls.len() - pending.len();
        report.planned = pending.len();

        if report.skipped > 0 {
            info!("Skipping {} already downloaded URL(s)", report.skipped);
        }
        if pending.is_empty() {
            info!("No new URLs to download!");
            report.finish();
            return report;
        }

        self.log_banner(pending.len(), &report);

        let total = pending.len();
        let batch_size = self.config.session.batch_size.unwrap_or(total).max(1);
        let batches = total.div_ceil(batch_size);
        let mut index = 0;

        'batches: for (batch, chunk) in pending.chunks(batch_size).enumerate() {
            if batches > 1 {
                info!("Batch {}/{} ({} URL(s))", batch + 1, batches, chunk.len());
            }

            for url in chunk {
                if self.engine.is_cancelled() {
                    warn!("Download interrupted by user");
                    report.interrupted = true;
                    break 'batches;
                }

                index += 1;
                let kind = UrlClassifier::classify(url);
                info!("[{}/{}] Processing ({}): {}", index, total, kind, shorten(url));

                let plans = self.planner.plan(url, kind);

                match self.engine.execute(&plans).await {
                    ExecutionResult::Succeeded { strategy, attempts } => {
                        debug!(%strategy, attempts, "Download finished");
                        self.ledger.record(url).await;
                        report.push(url, kind, UrlStatus::Succeeded { strategy });
                    }
                    ExecutionResult::Failed { attempts, error } => {
                        match &error {
                            Some(e) => warn!(attempts, "✗ Failed to download: {}", e),
                            None => warn!(attempts, "✗ Failed to download"),
                        }
                        report.push(url, kind, UrlStatus::Failed { error });
                    }
                    ExecutionResult::Interrupted { attempts } => {
                        warn!(attempts, "Download interrupted by user");
                        report.interrupted = true;
                        break 'batches;
                    }
                }
            }
        }

        report.finish();
        report
    }

    fn log_banner(&self, count: usize, report: &SessionReport) {
        let config = self.config;
        let format = if config.session.video {
            "VIDEO (MP4)".to_string()
        } else {
            config.format.to_string().to_uppercase()
        };

        info!(
            "DOWNLOAD SESSION STARTED: {}",
            report.started.format("%Y-%m-%d %H:%M:%S")
        );
        info!("URLs to process: {}", count);
        info!("Format: {}", format);
        info!("Quality: {}", config.quality);
        info!("Output directory: {}", config.output_dir.display());
        info!("Naming scheme: {}", config.naming_scheme);
        info!(
            "Metadata embedding: {}",
            if config.embed_metadata {
                "Enabled"
            } else {
                "Disabled"
            }
        );
        if let Some(rate_limit) = &config.rate_limit {
            info!("Rate limit: {}", rate_limit);
        }
    }
}

fn shorten(url: &str) -> String {
    if url.chars().count() > DISPLAY_URL_LEN {
        let head: String = url.chars().take(DISPLAY_URL_LEN).collect();
        format!("{head}...")
    } else {
        url.to_string()
    }
}
