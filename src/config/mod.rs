mod store;

use std::{collections::BTreeMap, fmt::Display, path::PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{cli::Cli, planner::naming::NamingScheme};

pub use store::ConfigStore;

const MAX_PADDING: u8 = 10;
const MAX_RETRIES: u32 = 100;

/// Sample format requested by the high-resolution toggle.
pub const HIGH_RES_POSTPROCESSOR_ARGS: &str = "ffmpeg:-sample_fmt s32";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Flac,
    Mp3,
    Wav,
    Aac,
    Opus,
    M4a,
    Vorbis,
}
impl Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Flac => f.write_str("flac"),
            Self::Mp3 => f.write_str("mp3"),
            Self::Wav => f.write_str("wav"),
            Self::Aac => f.write_str("aac"),
            Self::Opus => f.write_str("opus"),
            Self::M4a => f.write_str("m4a"),
            Self::Vorbis => f.write_str("vorbis"),
        }
    }
}

/// Quality tier. Anything unrecognised in a stored config reads as `Best`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Quality {
    Best,
    High,
    Medium,
    Low,
}
impl Quality {
    /// Encoder quality passed to the downloader's audio extraction (0 = finest).
    pub const fn encoder_quality(self) -> u8 {
        match self {
            Self::Best | Self::High => 0,
            Self::Medium => 5,
            Self::Low => 9,
        }
    }
}
impl From<String> for Quality {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "high" => Self::High,
            "medium" => Self::Medium,
            "low" => Self::Low,
            _ => Self::Best,
        }
    }
}
impl Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Best => f.write_str("best"),
            Self::High => f.write_str("high"),
            Self::Medium => f.write_str("medium"),
            Self::Low => f.write_str("low"),
        }
    }
}

/// Options that only live for one run and are never written to disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionOptions {
    pub video: bool,
    pub force_playlist: bool,
    pub skip_archive: bool,
    pub template: Option<String>,
    pub date_after: Option<String>,
    pub date_before: Option<String>,
    pub batch_size: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub format: AudioFormat,
    pub quality: Quality,
    pub output_dir: PathBuf,
    pub organize_by_source: bool,
    pub naming_scheme: NamingScheme,
    pub number_padding: u8,
    pub embed_metadata: bool,
    pub embed_thumbnail: bool,
    pub embed_source_url: bool,
    pub embed_playlist_url: bool,
    pub archive_file: Option<PathBuf>,
    pub rate_limit: Option<String>,
    pub retries: u32,
    pub geo_bypass: bool,
    pub prefer_free_formats: bool,
    pub no_overwrites: bool,
    pub proxy: Option<String>,
    pub bitrate: Option<String>,
    pub sample_rate: Option<u32>,
    pub postprocessor_args: Option<String>,

    /// Keys this version does not know about; written back untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,

    #[serde(skip)]
    pub session: SessionOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            format: AudioFormat::Flac,
            quality: Quality::Best,
            output_dir: PathBuf::from("./downloads"),
            organize_by_source: false,
            naming_scheme: NamingScheme::Title,
            number_padding: 3,
            embed_metadata: true,
            embed_thumbnail: true,
            embed_source_url: true,
            embed_playlist_url: true,
            archive_file: None,
            rate_limit: None,
            retries: 3,
            geo_bypass: true,
            prefer_free_formats: false,
            no_overwrites: true,
            proxy: None,
            bitrate: None,
            sample_rate: None,
            postprocessor_args: None,
            extra: BTreeMap::new(),
            session: SessionOptions::default(),
        }
    }
}

impl Config {
    /// Build a config from a stored JSON object one key at a time.
    ///
    /// Numeric settings are clamped before deserializing, so a too large
    /// padding still loads. A value that is still unusable is dropped and its
    /// default used; every other key, known or not, is kept.
    pub fn from_stored(stored: Map<String, Value>) -> Self {
        let mut accepted = Map::new();

        for (key, value) in stored {
            let value = clamp_stored(&key, value);

            let mut candidate = accepted.clone();
            candidate.insert(key.clone(), value.clone());
            match serde_json::from_value::<Self>(Value::Object(candidate)) {
                Ok(_) => {
                    accepted.insert(key, value);
                }
                Err(e) => warn!(%key, %e, "Ignoring invalid config value"),
            }
        }

        serde_json::from_value::<Self>(Value::Object(accepted))
            .unwrap_or_default()
            .validated()
    }

    /// Normalise values that deserialized fine but are out of range.
    pub fn validated(mut self) -> Self {
        self.number_padding = self.number_padding.clamp(1, MAX_PADDING);
        self.retries = self.retries.min(MAX_RETRIES);

        for field in [
            &mut self.rate_limit,
            &mut self.proxy,
            &mut self.bitrate,
            &mut self.postprocessor_args,
        ] {
            if field.as_deref().is_some_and(|s| s.trim().is_empty()) {
                *field = None;
            }
        }
        if self
            .archive_file
            .as_ref()
            .is_some_and(|p| p.as_os_str().is_empty())
        {
            self.archive_file = None;
        }
        if self.sample_rate == Some(0) {
            self.sample_rate = None;
        }

        self
    }

    /// Apply command line overrides.
    ///
    /// Persistable settings change the record itself; per-run options go to
    /// [`SessionOptions`]. A format requested together with `--video` is
    /// dropped so the stored audio default survives video runs.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(format) = cli.format {
            if cli.video {
                debug!(%format, "Ignoring audio format for video run");
            } else {
                self.format = format;
            }
        }
        if let Some(quality) = cli.quality {
            self.quality = quality;
        }
        if let Some(dir) = &cli.output_dir {
            self.output_dir.clone_from(dir);
        }
        if let Some(naming) = cli.naming {
            self.naming_scheme = naming;
        }
        if cli.organize {
            self.organize_by_source = true;
        }
        if let Some(padding) = cli.padding {
            self.number_padding = padding;
        }
        if cli.no_metadata {
            self.embed_metadata = false;
        }
        if cli.no_thumbnail {
            self.embed_thumbnail = false;
        }
        if cli.no_source_url {
            self.embed_source_url = false;
        }
        if cli.no_playlist_url {
            self.embed_playlist_url = false;
        }
        if let Some(archive) = &cli.archive {
            self.archive_file = Some(archive.clone());
        }
        if let Some(rate_limit) = &cli.rate_limit {
            self.rate_limit = Some(rate_limit.clone());
        }
        if let Some(retries) = cli.retries {
            self.retries = retries;
        }
        if cli.no_geo_bypass {
            self.geo_bypass = false;
        }
        if cli.prefer_free_formats {
            self.prefer_free_formats = true;
        }
        if cli.allow_overwrites {
            self.no_overwrites = false;
        }
        if let Some(proxy) = &cli.proxy {
            self.proxy = Some(proxy.clone());
        }
        if let Some(bitrate) = &cli.bitrate {
            self.bitrate = Some(bitrate.clone());
        }
        if let Some(sample_rate) = cli.sample_rate {
            self.sample_rate = Some(sample_rate);
        }
        if cli.high_res {
            self.postprocessor_args = Some(HIGH_RES_POSTPROCESSOR_ARGS.to_string());
        }

        self.session = SessionOptions {
            video: cli.video,
            force_playlist: cli.playlist,
            skip_archive: cli.skip_archive,
            template: cli.template.clone(),
            date_after: cli.date_after.clone(),
            date_before: cli.date_before.clone(),
            batch_size: cli.batch_size.filter(|n| *n > 0),
        };

        let validated = std::mem::take(self).validated();
        *self = validated;
    }

    /// Sorted `key: value` table of the persisted settings.
    pub fn display(&self) -> String {
        let value = serde_json::to_value(self).unwrap_or_default();
        let mut out = String::new();
        let rule = "=".repeat(60);

        out.push_str(&rule);
        out.push_str("\nCURRENT CONFIGURATION\n");
        out.push_str(&rule);
        out.push('\n');

        if let Value::Object(map) = value {
            let mut entries: Vec<_> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));

            for (key, value) in entries {
                let value = match value {
                    Value::String(s) => s,
                    Value::Null => "none".to_string(),
                    other => other.to_string(),
                };
                out.push_str(&format!("  {key:25}: {value}\n"));
            }
        }

        out.push_str(&rule);
        out
    }
}

fn clamp_stored(key: &str, value: Value) -> Value {
    let (min, max) = match key {
        "number_padding" => (1, i64::from(MAX_PADDING)),
        "retries" => (0, i64::from(MAX_RETRIES)),
        _ => return value,
    };

    match value.as_i64() {
        Some(n) => Value::from(n.clamp(min, max)),
        None => value,
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use pretty_assertions::assert_eq;

    use super::*;

    fn cli(args: &[&str]) -> Cli {
        let mut full = vec!["audiograb"];
        full.extend_from_slice(args);
        Cli::parse_from(full)
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"format": "mp3", "retries": 7}"#).expect("valid config");

        assert_eq!(config.format, AudioFormat::Mp3);
        assert_eq!(config.retries, 7);
        assert_eq!(config.output_dir, PathBuf::from("./downloads"));
        assert!(config.embed_metadata);
        assert_eq!(config.naming_scheme, NamingScheme::Title);
    }

    #[test]
    fn unknown_keys_survive_a_round_trip() {
        let config: Config =
            serde_json::from_str(r#"{"theme": "dark", "format": "wav"}"#).expect("valid config");
        assert_eq!(config.extra.get("theme"), Some(&serde_json::json!("dark")));

        let written = serde_json::to_value(&config).expect("serializable");
        assert_eq!(written["theme"], "dark");
        assert_eq!(written["format"], "wav");
    }

    #[test]
    fn unknown_quality_reads_as_best() {
        let config: Config =
            serde_json::from_str(r#"{"quality": "ultra"}"#).expect("valid config");
        assert_eq!(config.quality, Quality::Best);
        assert_eq!(config.quality.encoder_quality(), 0);
    }

    #[test]
    fn validation_clamps_and_clears() {
        let config = Config {
            number_padding: 0,
            retries: 5000,
            proxy: Some("  ".to_string()),
            sample_rate: Some(0),
            ..Config::default()
        }
        .validated();

        assert_eq!(config.number_padding, 1);
        assert_eq!(config.retries, MAX_RETRIES);
        assert_eq!(config.proxy, None);
        assert_eq!(config.sample_rate, None);
    }

    #[test]
    fn video_runs_keep_the_audio_format() {
        let mut config = Config::default();
        config.apply_cli(&cli(&["--video", "-f", "mp3", "https://a.test/1"]));

        assert_eq!(config.format, AudioFormat::Flac);
        assert!(config.session.video);

        let stored = serde_json::to_value(&config).expect("serializable");
        assert!(stored.get("video").is_none());
        assert!(stored.get("session").is_none());
    }

    #[test]
    fn cli_overrides_persistable_settings() {
        let mut config = Config::default();
        config.apply_cli(&cli(&[
            "-f",
            "wav",
            "--naming",
            "numbered",
            "--padding",
            "4",
            "--no-thumbnail",
            "--high-res",
            "--sample-rate",
            "96000",
            "--skip-archive",
            "https://a.test/1",
        ]));

        assert_eq!(config.format, AudioFormat::Wav);
        assert_eq!(config.naming_scheme, NamingScheme::Numbered);
        assert_eq!(config.number_padding, 4);
        assert!(!config.embed_thumbnail);
        assert_eq!(
            config.postprocessor_args.as_deref(),
            Some(HIGH_RES_POSTPROCESSOR_ARGS)
        );
        assert_eq!(config.sample_rate, Some(96000));
        assert!(config.session.skip_archive);
    }

    #[test]
    fn display_lists_sorted_keys() {
        let table = Config::default().display();
        let embed = table.find("embed_metadata").expect("key listed");
        let format = table.find("format").expect("key listed");

        assert!(embed < format);
        assert!(table.contains("archive_file"));
        assert!(table.contains("none"));
    }

    #[test]
    fn out_of_range_numbers_are_clamped_not_discarded() {
        let stored = serde_json::json!({
            "format": "mp3",
            "number_padding": 300,
            "retries": -4,
            "theme": "dark"
        });
        let Value::Object(stored) = stored else {
            unreachable!()
        };

        let config = Config::from_stored(stored);

        assert_eq!(config.format, AudioFormat::Mp3);
        assert_eq!(config.number_padding, MAX_PADDING);
        assert_eq!(config.retries, 0);
        assert_eq!(config.extra.get("theme"), Some(&serde_json::json!("dark")));
    }

    #[test]
    fn unusable_values_fall_back_one_key_at_a_time() {
        let stored = serde_json::json!({
            "format": "mp3",
            "sample_rate": -1,
            "embed_thumbnail": "sometimes",
            "output_dir": "/music"
        });
        let Value::Object(stored) = stored else {
            unreachable!()
        };

        let config = Config::from_stored(stored);

        assert_eq!(config.format, AudioFormat::Mp3);
        assert_eq!(config.output_dir, PathBuf::from("/music"));
        assert_eq!(config.sample_rate, None);
        assert!(config.embed_thumbnail);
    }

    #[test]
    fn display_sorts_unknown_keys_with_the_rest() {
        let config: Config =
            serde_json::from_str(r#"{"zz_theme": "dark", "aa_note": "hi"}"#).expect("valid config");
        let table = config.display();

        let note = table.find("aa_note").expect("key listed");
        let archive = table.find("archive_file").expect("key listed");
        let theme = table.find("zz_theme").expect("key listed");
        assert!(note < archive);
        assert!(archive < theme);
    }
}
