use std::path::Path;

use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::trace;

static TEXT_FILE_URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)https?://[^\s<>"]+|www\.[^\s<>"]+"#).expect("Invalid regex")
});
static CSV_URL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)https?://[^\s,;"]+"#).expect("Invalid regex"));
static FREE_TEXT_URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)https?://[^\s,;"]+|www\.[^\s,;"]+"#).expect("Invalid regex")
});
static SCHEME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^https?://").expect("Invalid regex"));

/// Fields tried, in order, on objects inside a JSON list.
const JSON_URL_FIELDS: &[&str] = &["url", "link", "href", "source", "video_url"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Json,
    Csv,
    M3u,
    Text,
}
impl FileKind {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "json" => Self::Json,
            "csv" => Self::Csv,
            "m3u" | "m3u8" => Self::M3u,
            _ => Self::Text,
        }
    }
}

pub fn has_scheme(s: &str) -> bool {
    SCHEME_REGEX.is_match(s)
}

/// Read a file and extract URLs according to its extension.
#[tracing::instrument]
pub fn parse_file(path: &Path) -> anyhow::Result<Vec<String>> {
    let kind = FileKind::from_path(path);
    trace!(?kind, "Parsing input file");

    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    match kind {
        FileKind::Json => {
            let data: Value = serde_json::from_slice(&bytes)
                .with_context(|| format!("Invalid JSON in {}", path.display()))?;
            Ok(parse_json(&data))
        }
        FileKind::Csv => Ok(parse_csv(&decode(&bytes, path)?)),
        FileKind::M3u => Ok(parse_m3u(&decode(&bytes, path)?)),
        FileKind::Text => Ok(parse_text_file(&String::from_utf8_lossy(&bytes))),
    }
}

fn decode(bytes: &[u8], path: &Path) -> anyhow::Result<String> {
    String::from_utf8(bytes.to_vec())
        .with_context(|| format!("{} is not valid UTF-8", path.display()))
}

pub fn parse_json(data: &Value) -> Vec<String> {
    let mut urls = Vec::new();

    match data {
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::String(s) => urls.push(s.clone()),
                    Value::Object(obj) => {
                        if let Some(url) = JSON_URL_FIELDS
                            .iter()
                            .find_map(|field| obj.get(*field).and_then(Value::as_str))
                        {
                            urls.push(url.to_string());
                        }
                    }
                    _ => {}
                }
            }
        }
        Value::Object(obj) => {
            for value in obj.values() {
                match value {
                    Value::Array(items) => urls.extend(
                        items
                            .iter()
                            .filter_map(Value::as_str)
                            .filter(|s| has_scheme(s))
                            .map(str::to_string),
                    ),
                    Value::String(s) if has_scheme(s) => urls.push(s.clone()),
                    _ => {}
                }
            }
        }
        _ => {}
    }

    urls
}

/// Every URL-looking token on every row; columns are ignored.
pub fn parse_csv(content: &str) -> Vec<String> {
    content
        .lines()
        .flat_map(|line| CSV_URL_REGEX.find_iter(line))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Non-empty, non-comment lines, taken as they are.
pub fn parse_m3u(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Line oriented text with `#` and `//` comment lines. Trailing text after a
/// URL on the same line is ignored.
pub fn parse_text_file(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with("//"))
        .flat_map(|line| TEXT_FILE_URL_REGEX.find_iter(line))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// URLs embedded anywhere in free text.
pub fn parse_free_text(text: &str) -> Vec<String> {
    FREE_TEXT_URL_REGEX
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn file_kind_by_extension() {
        assert_eq!(FileKind::from_path(Path::new("a.JSON")), FileKind::Json);
        assert_eq!(FileKind::from_path(Path::new("a.csv")), FileKind::Csv);
        assert_eq!(FileKind::from_path(Path::new("a.m3u8")), FileKind::M3u);
        assert_eq!(FileKind::from_path(Path::new("a.txt")), FileKind::Text);
        assert_eq!(FileKind::from_path(Path::new("urls")), FileKind::Text);
    }

    #[test]
    fn json_list_uses_field_priority() {
        let data = json!([
            {"url": "https://a.test/1"},
            "https://a.test/2",
            {"title": "x", "link": "https://a.test/3", "href": "https://a.test/ignored"},
            {"url": 5, "source": "https://a.test/4"},
            {"title": "no url"},
            42
        ]);

        assert_eq!(
            parse_json(&data),
            vec![
                "https://a.test/1",
                "https://a.test/2",
                "https://a.test/3",
                "https://a.test/4"
            ]
        );
    }

    #[test]
    fn json_object_collects_url_values() {
        let data = json!({
            "playlist": ["https://a.test/1", "not a url", 3],
            "main": "http://a.test/2",
            "name": "mixtape"
        });

        assert_eq!(parse_json(&data), vec!["https://a.test/1", "http://a.test/2"]);
    }

    #[test]
    fn json_object_keeps_file_order() {
        let data: Value = serde_json::from_str(
            r#"{"zeta": "https://a.test/first", "alpha": ["https://a.test/second"]}"#,
        )
        .expect("valid json");

        assert_eq!(
            parse_json(&data),
            vec!["https://a.test/first", "https://a.test/second"]
        );
    }

    #[test]
    fn csv_ignores_columns() {
        let content = "title,url\nsong,https://a.test/1;extra\n\"x\",\"https://a.test/2\",https://a.test/3\n";

        assert_eq!(
            parse_csv(content),
            vec!["https://a.test/1", "https://a.test/2", "https://a.test/3"]
        );
    }

    #[test]
    fn m3u_skips_comments_and_blanks() {
        let content = "#EXTM3U\nhttps://a.test/x\n\n#EXTINF:-1,Song\nhttps://a.test/y\n";

        assert_eq!(parse_m3u(content), vec!["https://a.test/x", "https://a.test/y"]);
    }

    #[test]
    fn text_file_tolerates_comments() {
        let content = "# my list\n// also a comment https://skip.test/1\nhttps://a.test/1  # keyboard cat\n\nwww.a.test/2\n";

        assert_eq!(
            parse_text_file(content),
            vec!["https://a.test/1", "www.a.test/2"]
        );
    }

    #[test]
    fn free_text_finds_embedded_links() {
        let text = "check https://a.test/1, and www.b.test/2;then \"http://c.test/3\"";

        assert_eq!(
            parse_free_text(text),
            vec!["https://a.test/1", "www.b.test/2", "http://c.test/3"]
        );
    }

    #[test]
    fn unreadable_and_invalid_files_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        assert!(parse_file(&dir.path().join("missing.txt")).is_err());

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "[1, 2").expect("write");
        assert!(parse_file(&bad).is_err());
    }
}
