pub mod naming;

use std::{fmt::Display, path::PathBuf, time::Duration};

use crate::{
    classifier::UrlKind,
    config::{AudioFormat, Config},
};

/// Upper bound for a single downloader invocation.
pub const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(120);

const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                                  (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";
const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_5 like Mac OS X) \
                                 AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 \
                                 Mobile/15E148 Safari/604.1";
const BROWSER_HEADERS: &[&str] = &[
    "Accept-Language:en-US,en;q=0.9",
    "Referer:https://www.youtube.com/",
];

/// Which variant of the invocation a plan represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// The only plan for non-YouTube URLs.
    Standard,
    /// Web player extraction with browser headers and request jitter.
    WebClient,
    /// Same as `WebClient`, emulating the mobile app client.
    MobileClient,
    /// Single best combined stream, audio extracted afterwards.
    CombinedStream,
}
impl Strategy {
    const fn player_client(self) -> Option<&'static str> {
        match self {
            Self::WebClient => Some("web"),
            Self::MobileClient => Some("android"),
            Self::Standard | Self::CombinedStream => None,
        }
    }

    const fn user_agent(self) -> Option<&'static str> {
        match self {
            Self::WebClient | Self::MobileClient => Some(DESKTOP_USER_AGENT),
            Self::CombinedStream => Some(MOBILE_USER_AGENT),
            Self::Standard => None,
        }
    }

    const fn browser_like(self) -> bool {
        matches!(self, Self::WebClient | Self::MobileClient)
    }
}
impl Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Standard => f.write_str("standard"),
            Self::WebClient => f.write_str("web client"),
            Self::MobileClient => f.write_str("mobile client"),
            Self::CombinedStream => f.write_str("combined stream"),
        }
    }
}

/// One fully parameterised downloader invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub strategy: Strategy,
    pub program: String,
    pub args: Vec<String>,
    /// `None` runs in the current working directory.
    pub working_dir: Option<PathBuf>,
    pub timeout: Duration,
}
impl Plan {
    /// The positional URL, always the last argument.
    pub fn target(&self) -> Option<&str> {
        self.args.last().map(String::as_str)
    }
}

/// Turns settings, a URL and its kind into ordered plans. Performs no I/O.
#[derive(Debug)]
pub struct DownloadPlanner<'a> {
    config: &'a Config,
    program: String,
}
impl<'a> DownloadPlanner<'a> {
    pub fn new<S: Into<String>>(config: &'a Config, program: S) -> Self {
        Self {
            config,
            program: program.into(),
        }
    }

    pub fn plan(&self, url: &str, kind: UrlKind) -> Vec<Plan> {
        if kind.is_youtube() {
            [
                Strategy::WebClient,
                Strategy::MobileClient,
                Strategy::CombinedStream,
            ]
            .into_iter()
            .map(|strategy| self.build(url, kind, strategy))
            .collect()
        } else {
            vec![self.build(url, kind, Strategy::Standard)]
        }
    }

    pub fn is_playlist(&self, url: &str, kind: UrlKind) -> bool {
        kind.is_playlist() || url.contains("&list=") || self.config.session.force_playlist
    }

    fn build(&self, url: &str, kind: UrlKind, strategy: Strategy) -> Plan {
        let config = self.config;
        let video = config.session.video;
        let playlist = self.is_playlist(url, kind);
        let mut args: Vec<String> = Vec::new();

        if playlist {
            args.extend(["--yes-playlist".to_string(), "--ignore-errors".to_string()]);
        } else {
            args.push("--no-playlist".to_string());
        }

        args.extend(self.format_args(strategy));

        args.push("-o".to_string());
        args.push(self.output_path());

        if config.embed_metadata {
            args.push("--embed-metadata".to_string());
        }
        if config.embed_source_url {
            args.extend([
                "--parse-metadata".to_string(),
                "webpage_url:%(meta_url)s".to_string(),
            ]);
        }
        if playlist && config.embed_playlist_url {
            args.extend([
                "--parse-metadata".to_string(),
                "playlist_webpage_url:%(meta_playlist_url)s".to_string(),
            ]);
        }
        if config.embed_thumbnail {
            args.extend([
                "--embed-thumbnail".to_string(),
                "--convert-thumbnails".to_string(),
                "jpg".to_string(),
            ]);
        }

        if config.no_overwrites {
            args.push("--no-overwrites".to_string());
        }
        args.extend(["--retries".to_string(), config.retries.to_string()]);

        if let Some(rate_limit) = &config.rate_limit {
            args.extend(["--limit-rate".to_string(), rate_limit.clone()]);
        }
        if config.geo_bypass {
            args.push("--geo-bypass".to_string());
        }
        if config.prefer_free_formats {
            args.push("--prefer-free-formats".to_string());
        }
        if let Some(proxy) = &config.proxy {
            args.extend(["--proxy".to_string(), proxy.clone()]);
        }
        if let Some(after) = &config.session.date_after {
            args.extend(["--dateafter".to_string(), after.clone()]);
        }
        if let Some(before) = &config.session.date_before {
            args.extend(["--datebefore".to_string(), before.clone()]);
        }

        if let Some(client) = strategy.player_client() {
            args.extend([
                "--extractor-args".to_string(),
                format!("youtube:player_client={client}"),
            ]);
        }
        if let Some(user_agent) = strategy.user_agent() {
            args.extend(["--user-agent".to_string(), user_agent.to_string()]);
        }
        if strategy.browser_like() {
            for header in BROWSER_HEADERS {
                args.extend(["--add-header".to_string(), (*header).to_string()]);
            }
            args.extend([
                "--sleep-requests".to_string(),
                "1".to_string(),
                "--sleep-interval".to_string(),
                "2".to_string(),
                "--max-sleep-interval".to_string(),
                "6".to_string(),
            ]);
        }

        if video {
            args.extend(["--merge-output-format".to_string(), "mp4".to_string()]);
        }

        args.push(url.to_string());

        Plan {
            strategy,
            program: self.program.clone(),
            args,
            working_dir: None,
            timeout: ATTEMPT_TIMEOUT,
        }
    }

    fn format_args(&self, strategy: Strategy) -> Vec<String> {
        let config = self.config;

        let selector = match (strategy, config.session.video) {
            (Strategy::CombinedStream, _) => "best",
            (_, true) => "bestvideo+bestaudio/best",
            (_, false) => "bestaudio/best",
        };
        let mut args = vec!["-f".to_string(), selector.to_string()];

        if !config.session.video {
            args.extend([
                "--extract-audio".to_string(),
                "--audio-format".to_string(),
                config.format.to_string(),
                "--audio-quality".to_string(),
                config.quality.encoder_quality().to_string(),
                "--postprocessor-args".to_string(),
                self.postprocessor_args(),
            ]);
        }

        args
    }

    /// Transcoder arguments. An explicit override replaces the per-format
    /// defaults; sample rate and bitrate are appended to either.
    pub fn postprocessor_args(&self) -> String {
        let config = self.config;

        let mut pp = config.postprocessor_args.clone().unwrap_or_else(|| {
            match config.format {
                AudioFormat::Flac => "ffmpeg:-sample_fmt s32 -compression_level 0".to_string(),
                AudioFormat::Wav => "ffmpeg:-c:a pcm_s24le".to_string(),
                _ => format!(
                    "ffmpeg:-q:a {} -af aresample=internal_sample_fmt=dbl",
                    config.quality.encoder_quality()
                ),
            }
        });

        if let Some(rate) = config.sample_rate {
            pp.push_str(&format!(" -ar {rate}"));
        }
        if let Some(bitrate) = &config.bitrate {
            pp.push_str(&format!(" -b:a {bitrate}"));
        }

        pp
    }

    /// Output directory, optional per-site folder, then the filename template.
    pub fn output_path(&self) -> String {
        let config = self.config;
        let template = config.session.template.clone().unwrap_or_else(|| {
            config
                .naming_scheme
                .template(config.number_padding)
        });

        let mut path = config.output_dir.clone();
        if config.organize_by_source {
            path.push("%(extractor)s");
        }
        path.push(template);

        path.to_string_lossy().into_owned()
    }
}
