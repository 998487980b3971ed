//! Effective top-level domain extraction for tab URLs.

use url::{Host, Url};

use crate::Error;

/// Compute the domain a tab URL is grouped under.
///
/// - registrable hosts use the public suffix list (`www.example.co.uk` -> `example.co.uk`)
/// - IP addresses and hosts without a registrable part use the host itself
/// - hostless URLs (`about:blank`, `data:`) use the scheme
pub fn effective_domain(raw: &str) -> Result<String, Error> {
    let url = Url::parse(raw.trim()).map_err(|e| Error::InvalidUrl(format!("{raw}: {e}")))?;

    let name = match url.host() {
        Some(Host::Domain(host)) => {
            let host = host.trim_end_matches('.').to_ascii_lowercase();
            match psl::domain_str(&host) {
                Some(domain) => domain.to_string(),
                None => host,
            }
        }
        Some(Host::Ipv4(addr)) => addr.to_string(),
        Some(Host::Ipv6(addr)) => format!("[{addr}]"),
        None => url.scheme().to_string(),
    };

    if name.is_empty() {
        return Err(Error::InvalidUrl(format!("{raw}: no host")));
    }

    Ok(name)
}

/// Host of a URL string, or an empty string when it has none.
pub fn host_of(raw: &str) -> String {
    Url::parse(raw.trim())
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_domain_basic() {
        assert_eq!(effective_domain("https://example.com/page").unwrap(), "example.com");
        assert_eq!(effective_domain("https://www.example.com").unwrap(), "example.com");
    }

    #[test]
    fn test_effective_domain_subdomains() {
        assert_eq!(effective_domain("https://mail.mozilla.org/zimbra").unwrap(), "mozilla.org");
        assert_eq!(effective_domain("https://news.ycombinator.com/").unwrap(), "ycombinator.com");
    }

    #[test]
    fn test_effective_domain_multi_label_suffix() {
        assert_eq!(effective_domain("https://www.bbc.co.uk/news").unwrap(), "bbc.co.uk");
    }

    #[test]
    fn test_effective_domain_uppercase_host() {
        assert_eq!(effective_domain("https://WWW.Example.COM").unwrap(), "example.com");
    }

    #[test]
    fn test_effective_domain_ip() {
        assert_eq!(effective_domain("http://127.0.0.1:8080/").unwrap(), "127.0.0.1");
        assert_eq!(effective_domain("http://[::1]/").unwrap(), "[::1]");
    }

    #[test]
    fn test_effective_domain_hostless() {
        assert_eq!(effective_domain("about:blank").unwrap(), "about");
    }

    #[test]
    fn test_effective_domain_invalid() {
        assert!(matches!(effective_domain("not a url"), Err(Error::InvalidUrl(_))));
        assert!(matches!(effective_domain(""), Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_host_of() {
        assert_eq!(host_of("https://sub.example.com/x"), "sub.example.com");
        assert_eq!(host_of("about:blank"), "");
        assert_eq!(host_of("::"), "");
    }
}
