pub mod parsers;

use std::{collections::HashSet, path::Path};

use tracing::{debug, warn};

use parsers::{has_scheme, parse_file, parse_free_text};

/// A source that could not be read. The rest of the batch is unaffected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestWarning {
    pub source: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedBatch {
    pub urls: Vec<String>,
    pub warnings: Vec<IngestWarning>,
}
impl NormalizedBatch {
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// Flattens raw sources (URLs, files, text) into unique absolute URLs.
pub struct UrlNormalizer;
impl UrlNormalizer {
    pub fn normalize<S: AsRef<str>>(sources: &[S]) -> NormalizedBatch {
        let mut batch = NormalizedBatch::default();
        let mut seen = HashSet::new();

        for source in sources {
            let source = source.as_ref();

            for url in Self::resolve(source, &mut batch.warnings) {
                let url = ensure_scheme(&url);
                if seen.insert(url.clone()) {
                    batch.urls.push(url);
                }
            }
        }

        debug!(
            urls = batch.urls.len(),
            warnings = batch.warnings.len(),
            "Sources normalized"
        );

        batch
    }

    fn resolve(source: &str, warnings: &mut Vec<IngestWarning>) -> Vec<String> {
        let path = Path::new(source);

        if path.is_file() {
            return match parse_file(path) {
                Ok(urls) => urls,
                Err(e) => {
                    warn!(%source, "Error parsing {}: {:#}", source, e);
                    warnings.push(IngestWarning {
                        source: source.to_string(),
                        message: format!("{e:#}"),
                    });
                    Vec::new()
                }
            };
        }

        let trimmed = source.trim();

        if has_scheme(trimmed) {
            return vec![trimmed.to_string()];
        }

        if looks_like_bare_domain(trimmed) {
            return vec![trimmed.to_string()];
        }

        parse_free_text(source)
    }
}

fn looks_like_bare_domain(s: &str) -> bool {
    !s.chars().any(char::is_whitespace)
        && (s.to_ascii_lowercase().starts_with("www.") || (s.contains('.') && s.contains('/')))
}

/// Inject `https://` into anything that does not carry a scheme.
pub fn ensure_scheme(url: &str) -> String {
    if url.contains("://") {
        url.to_string()
    } else {
        format!("https://{}", url.trim_start_matches('/'))
    }
}
