use std::fmt::Display;

use url::Url;

use crate::helpers::domain::DomainParser;

const YOUTUBE_ROOTS: &[&str] = &["youtube.com", "youtu.be", "youtube-nocookie.com"];
const AUDIO_EXTENSIONS: &[&str] = &[".mp3", ".flac", ".wav", ".m4a", ".ogg", ".opus", ".aac"];
const VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".mkv", ".webm", ".avi", ".mov"];

/// Coarse category of a URL. Only decides playlist handling and which
/// fallback plans the planner emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlKind {
    YoutubePlaylist,
    YoutubeVideo,
    Soundcloud,
    Spotify,
    DirectAudio,
    DirectVideo,
    Generic,
}
impl UrlKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::YoutubePlaylist => "youtube_playlist",
            Self::YoutubeVideo => "youtube_video",
            Self::Soundcloud => "soundcloud",
            Self::Spotify => "spotify",
            Self::DirectAudio => "direct_audio",
            Self::DirectVideo => "direct_video",
            Self::Generic => "generic",
        }
    }

    pub const fn is_youtube(self) -> bool {
        matches!(self, Self::YoutubePlaylist | Self::YoutubeVideo)
    }

    pub const fn is_playlist(self) -> bool {
        matches!(self, Self::YoutubePlaylist)
    }
}
impl Display for UrlKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct UrlClassifier;
impl UrlClassifier {
    /// Classify a URL by its shape alone. First matching rule wins.
    pub fn classify(url: &str) -> UrlKind {
        let lower = url.to_lowercase();

        match Url::parse(&lower) {
            Ok(parsed) => Self::classify_parsed(&parsed),
            Err(_) => Self::classify_raw(&lower),
        }
    }

    fn classify_parsed(url: &Url) -> UrlKind {
        if DomainParser::host_matches(url, YOUTUBE_ROOTS) {
            let playlist_segment = url
                .path_segments()
                .is_some_and(|mut segments| segments.any(|s| s == "playlist"));
            let list_param = url.query_pairs().any(|(k, _)| k == "list");

            if playlist_segment || list_param {
                return UrlKind::YoutubePlaylist;
            }
            return UrlKind::YoutubeVideo;
        }

        if DomainParser::host_matches(url, &["soundcloud.com"]) {
            return UrlKind::Soundcloud;
        }

        if DomainParser::host_matches(url, &["spotify.com"]) {
            return UrlKind::Spotify;
        }

        Self::classify_extension(url.path())
    }

    /// Substring rules for strings `url` cannot parse.
    fn classify_raw(lower: &str) -> UrlKind {
        let youtube = lower.contains("youtube.com") || lower.contains("youtu.be");

        if youtube && (lower.contains("/playlist") || lower.contains("&list=")) {
            return UrlKind::YoutubePlaylist;
        }
        if youtube {
            return UrlKind::YoutubeVideo;
        }
        if lower.contains("soundcloud.com") {
            return UrlKind::Soundcloud;
        }
        if lower.contains("spotify.com") {
            return UrlKind::Spotify;
        }

        let path = lower.split(['?', '#']).next().unwrap_or(lower);
        Self::classify_extension(path)
    }

    fn classify_extension(path: &str) -> UrlKind {
        if AUDIO_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
            UrlKind::DirectAudio
        } else if VIDEO_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
            UrlKind::DirectVideo
        } else {
            UrlKind::Generic
        }
    }
}
