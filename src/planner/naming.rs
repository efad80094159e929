use std::fmt::Display;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Output filename patterns, written in the downloader's template syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum NamingScheme {
    /// `Title.ext`
    Title,
    /// `001 - Title.ext`
    Numbered,
    /// `Artist - Title.ext`
    ArtistTitle,
    /// `Album/01 - Title.ext`
    AlbumTrack,
    /// `20231225 - Title.ext`
    DateTitle,
    /// `VideoID - Title.ext`
    IdTitle,
    /// `Uploader - Title.ext`
    UploaderTitle,
}
impl NamingScheme {
    pub fn template(self, padding: u8) -> String {
        match self {
            Self::Title => "%(title)s.%(ext)s".to_string(),
            Self::Numbered => format!("%(playlist_index)0{padding}d - %(title)s.%(ext)s"),
            Self::ArtistTitle => "%(artist)s - %(title)s.%(ext)s".to_string(),
            Self::AlbumTrack => "%(album)s/%(track_number)s - %(title)s.%(ext)s".to_string(),
            Self::DateTitle => "%(upload_date)s - %(title)s.%(ext)s".to_string(),
            Self::IdTitle => "%(id)s - %(title)s.%(ext)s".to_string(),
            Self::UploaderTitle => "%(uploader)s - %(title)s.%(ext)s".to_string(),
        }
    }
}
impl Display for NamingScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Title => f.write_str("title"),
            Self::Numbered => f.write_str("numbered"),
            Self::ArtistTitle => f.write_str("artist-title"),
            Self::AlbumTrack => f.write_str("album-track"),
            Self::DateTitle => f.write_str("date-title"),
            Self::IdTitle => f.write_str("id-title"),
            Self::UploaderTitle => f.write_str("uploader-title"),
        }
    }
}
