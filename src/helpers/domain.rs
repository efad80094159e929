use url::Url;

pub struct DomainParser;
impl DomainParser {
    pub fn get_domain(url: &Url) -> Option<addr::domain::Name<'_>> {
        url.domain().and_then(|x| addr::parse_domain_name(x).ok())
    }

    /// Get the root domain (the registrable part)
    pub fn get_domain_root(url: &Url) -> Option<&str> {
        Self::get_domain(url).and_then(|x| x.root())
    }

    /// Whether the URL's registrable domain is one of `roots`.
    ///
    /// Falls back to a plain host comparison for hosts the public suffix
    /// list cannot split (IP literals, single-label hosts).
    pub fn host_matches(url: &Url, roots: &[&str]) -> bool {
        if let Some(root) = Self::get_domain_root(url) {
            return roots.iter().any(|r| root.eq_ignore_ascii_case(r));
        }

        url.host_str()
            .is_some_and(|host| roots.iter().any(|r| host.eq_ignore_ascii_case(r)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_subdomains_by_root() {
        let url = Url::parse("https://music.youtube.com/watch?v=abc").expect("valid url");
        assert!(DomainParser::host_matches(&url, &["youtube.com"]));

        let url = Url::parse("https://open.spotify.com/track/1").expect("valid url");
        assert!(DomainParser::host_matches(&url, &["spotify.com"]));
        assert!(!DomainParser::host_matches(&url, &["soundcloud.com"]));
    }

    #[test]
    fn lookalike_hosts_do_not_match() {
        let url = Url::parse("https://notyoutube.com.evil.test/watch").expect("valid url");
        assert!(!DomainParser::host_matches(&url, &["youtube.com"]));
    }
}
