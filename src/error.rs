use std::path::PathBuf;

use thiserror::Error;

/// Problems that stop a run before any download starts.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Missing dependencies: {}", .0.join(", "))]
    MissingDependencies(Vec<String>),

    #[error("No valid URLs found in input")]
    NoUrls,

    #[error("Could not create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
impl SetupError {
    /// What the user can do about it.
    pub fn remediation(&self) -> String {
        match self {
            Self::MissingDependencies(missing) => {
                let mut hint = String::from("Install with:\n");
                if missing.iter().any(|m| m.contains("yt-dlp")) {
                    hint.push_str("  pip install -U yt-dlp\n");
                }
                if missing.iter().any(|m| m.contains("ffmpeg")) {
                    hint.push_str(
                        "  # Install ffmpeg:\n\
                         \x20 # - Ubuntu/Debian: sudo apt install ffmpeg\n\
                         \x20 # - macOS: brew install ffmpeg\n\
                         \x20 # - Windows: download from https://ffmpeg.org/\n",
                    );
                }
                hint.push_str(
                    "Set AUDIOGRAB_DOWNLOADER / AUDIOGRAB_FFMPEG if the tools live elsewhere.",
                );
                hint
            }
            Self::NoUrls => "Supported inputs:\n\
                             \x20 - Direct URLs (with or without https://)\n\
                             \x20 - Text files (.txt) with one URL per line\n\
                             \x20 - JSON files (.json) with URL arrays or objects\n\
                             \x20 - CSV files (.csv) with URLs in any column\n\
                             \x20 - M3U playlist files (.m3u, .m3u8)"
                .to_string(),
            Self::OutputDir { .. } => {
                "Choose a writable location with --output-dir.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dependency_hint_names_each_tool() {
        let err = SetupError::MissingDependencies(vec!["yt-dlp".to_string(), "ffmpeg".to_string()]);

        assert_eq!(err.to_string(), "Missing dependencies: yt-dlp, ffmpeg");
        let hint = err.remediation();
        assert!(hint.contains("pip install -U yt-dlp"));
        assert!(hint.contains("brew install ffmpeg"));
    }

    #[test]
    fn no_urls_lists_inputs() {
        assert!(SetupError::NoUrls.remediation().contains(".m3u8"));
    }
}
