use std::path::PathBuf;

use clap::Parser;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    config::{AudioFormat, Quality},
    planner::naming::NamingScheme,
};

static DATE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:\d{8}|(?:now|today|yesterday)(?:[+-]\d+(?:day|week|month|year)s?)?)$")
        .expect("Invalid regex")
});

/// Download audio (or video) from YouTube, SoundCloud and anything else the
/// downloader supports, with fallbacks, archiving and embedded metadata.
#[derive(Debug, Parser)]
#[command(name = "audiograb", version)]
#[command(after_help = "Sources may be URLs, bare domains, text/CSV/JSON/M3U files or free text \
                        containing links.")]
pub struct Cli {
    /// URLs, files or text to pull URLs from
    pub sources: Vec<String>,

    /// Audio format to extract
    #[arg(short, long, value_enum)]
    pub format: Option<AudioFormat>,

    /// Keep the video stream (mp4) instead of extracting audio
    #[arg(long)]
    pub video: bool,

    /// Directory downloads are written to
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Raw output template, overrides the naming scheme for this run
    #[arg(short, long)]
    pub template: Option<String>,

    /// Naming scheme for output files
    #[arg(long, value_enum)]
    pub naming: Option<NamingScheme>,

    /// Put files into per-site subdirectories
    #[arg(long)]
    pub organize: bool,

    /// Digits used for playlist track numbers
    #[arg(long)]
    pub padding: Option<u8>,

    /// Audio quality tier
    #[arg(short, long, value_enum)]
    pub quality: Option<Quality>,

    /// Do not embed metadata
    #[arg(long)]
    pub no_metadata: bool,

    /// Do not embed thumbnails
    #[arg(long)]
    pub no_thumbnail: bool,

    /// Do not store the source URL in the file metadata
    #[arg(long)]
    pub no_source_url: bool,

    /// Do not store the playlist URL in the file metadata
    #[arg(long)]
    pub no_playlist_url: bool,

    /// Archive file recording completed URLs
    #[arg(long)]
    pub archive: Option<PathBuf>,

    /// Download URLs even if the archive already lists them
    #[arg(long)]
    pub skip_archive: bool,

    /// Download rate limit, e.g. 1M or 500K
    #[arg(long)]
    pub rate_limit: Option<String>,

    /// Retries the downloader makes per request
    #[arg(long)]
    pub retries: Option<u32>,

    /// Only download items uploaded on or after this date
    #[arg(long, value_parser = parse_date)]
    pub date_after: Option<String>,

    /// Only download items uploaded on or before this date
    #[arg(long, value_parser = parse_date)]
    pub date_before: Option<String>,

    /// Process URLs in batches of this size
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Disable geo-restriction bypass
    #[arg(long)]
    pub no_geo_bypass: bool,

    /// Prefer free formats when the quality is equal
    #[arg(long)]
    pub prefer_free_formats: bool,

    /// Proxy URL
    #[arg(long)]
    pub proxy: Option<String>,

    /// Treat every URL as a playlist
    #[arg(long)]
    pub playlist: bool,

    /// Overwrite files that already exist
    #[arg(long)]
    pub allow_overwrites: bool,

    /// Target audio bitrate, e.g. 320k
    #[arg(long)]
    pub bitrate: Option<String>,

    /// Target sample rate in Hz
    #[arg(long)]
    pub sample_rate: Option<u32>,

    /// Keep a 32-bit sample format when converting
    #[arg(long)]
    pub high_res: bool,

    /// Print the stored configuration and exit
    #[arg(long)]
    pub show_config: bool,

    /// Reset the stored configuration to defaults and exit
    #[arg(long)]
    pub reset: bool,
}

/// Accepts `YYYYMMDD` or a relative date such as `today-2weeks`.
fn parse_date(value: &str) -> Result<String, String> {
    if DATE_REGEX.is_match(value) {
        Ok(value.to_string())
    } else {
        Err(format!(
            "'{value}' is not a date (use YYYYMMDD or e.g. today-1week)"
        ))
    }
}
