use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use tokio::io::AsyncWriteExt;
use tracing::{debug, trace, warn};

/// Append-only record of URLs that were downloaded successfully.
///
/// Without a backing file the ledger still deduplicates within the session.
#[derive(Debug, Default)]
pub struct ArchiveLedger {
    path: Option<PathBuf>,
    urls: HashSet<String>,
}
impl ArchiveLedger {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the ledger. A missing or unreadable file is an empty ledger.
    #[tracing::instrument]
    pub async fn load(path: &Path) -> Self {
        let urls = match tokio::fs::read_to_string(path).await {
            Ok(content) => content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No archive yet");
                HashSet::new()
            }
            Err(e) => {
                warn!(?e, "Could not read archive, starting empty");
                HashSet::new()
            }
        };

        debug!(entries = urls.len(), "Archive loaded");

        Self {
            path: Some(path.to_path_buf()),
            urls,
        }
    }

    pub async fn open(path: Option<&Path>) -> Self {
        match path {
            Some(p) => Self::load(p).await,
            None => Self::in_memory(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Remember a successful download. Write failures are logged and the
    /// in-memory entry is kept for the rest of the session.
    #[tracing::instrument(skip(self))]
    pub async fn record(&mut self, url: &str) {
        if !self.urls.insert(url.to_string()) {
            trace!("Already archived");
            return;
        }

        let Some(path) = &self.path else {
            return;
        };

        if let Err(e) = Self::append_line(path, url).await {
            warn!(?e, path = ?path, "Failed to write to archive");
        }
    }

    async fn append_line(path: &Path, url: &str) -> std::io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        file.write_all(format!("{url}\n").as_bytes()).await?;
        file.flush().await
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[tokio::test]
    async fn missing_file_is_empty() {
        let dir = tempfile::tempdir().expect("temp dir");
        let ledger = ArchiveLedger::load(&dir.path().join("archive.txt")).await;

        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn loads_one_url_per_line() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("archive.txt");
        std::fs::write(&path, "https://a.test/1\n\n  https://a.test/2  \n").expect("write");

        let ledger = ArchiveLedger::load(&path).await;

        assert_eq!(ledger.len(), 2);
        assert!(ledger.contains("https://a.test/1"));
        assert!(ledger.contains("https://a.test/2"));
        assert!(!ledger.contains("https://a.test/3"));
    }

    #[tokio::test]
    async fn record_appends_once_and_creates_parents() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("archive.txt");
        let mut ledger = ArchiveLedger::load(&path).await;

        ledger.record("https://a.test/1").await;
        ledger.record("https://a.test/1").await;
        ledger.record("https://a.test/2").await;

        let content = std::fs::read_to_string(&path).expect("archive written");
        assert_eq!(content, "https://a.test/1\nhttps://a.test/2\n");

        let reloaded = ArchiveLedger::load(&path).await;
        assert!(reloaded.contains("https://a.test/2"));
    }

    #[tokio::test]
    async fn unwritable_archive_keeps_memory_entry() {
        let dir = tempfile::tempdir().expect("temp dir");
        // A directory cannot be opened for appending.
        let mut ledger = ArchiveLedger::load(dir.path()).await;

        ledger.record("https://a.test/1").await;

        assert!(ledger.contains("https://a.test/1"));
    }
}
