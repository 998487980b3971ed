//! HTTP favicon lookup.
//!
//! Fetches `/favicon.ico` from the page's origin and returns it inline as a
//! `data:` URI so the archive view does not depend on the site staying up.
//!
//! ### Outcomes
//! - `image/*` (or untyped) non-empty body within `max_bytes`: `Ok(Some(data_uri))`
//! - Non-success status, non-image content, empty or oversized body: `Ok(None)`
//! - Network failure: `Err(Error::Favicon)`

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64;
use reqwest::{Client, header};
use url::Url;

use squirrel_core::{AppConfig, Error, FaviconLookup};

/// Content type assumed when the server sends none.
const DEFAULT_ICON_TYPE: &str = "image/x-icon";

/// Configuration for [`HttpFaviconLookup`].
#[derive(Debug, Clone)]
pub struct FaviconConfig {
    /// User agent string (default: "squirrel/0.1")
    pub user_agent: String,

    /// Request timeout (default: 3s)
    pub timeout: Duration,

    /// Maximum icon size in bytes (default: 256KB)
    pub max_bytes: usize,
}

impl Default for FaviconConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for FaviconConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            timeout: config.favicon_timeout(),
            max_bytes: config.favicon_max_bytes,
        }
    }
}

/// Favicon lookup over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFaviconLookup {
    http: Client,
    config: FaviconConfig,
}

impl HttpFaviconLookup {
    pub fn new(config: FaviconConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(3))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Favicon(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &FaviconConfig {
        &self.config
    }

    /// Where the icon for `page` is expected, or `None` for hostless URLs.
    pub fn icon_url(page: &Url) -> Option<Url> {
        page.host_str()?;
        page.join("/favicon.ico").ok()
    }
}

#[async_trait]
impl FaviconLookup for HttpFaviconLookup {
    async fn lookup(&self, page: &Url) -> Result<Option<String>, Error> {
        let Some(icon_url) = Self::icon_url(page) else {
            return Ok(None);
        };

        let response = self
            .http
            .get(icon_url.as_str())
            .header(header::ACCEPT, "image/*")
            .send()
            .await
            .map_err(|e| Error::Favicon(format!("network error: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(url = %icon_url, status = status.as_u16(), "no favicon");
            return Ok(None);
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_ascii_lowercase())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_ICON_TYPE.to_string());

        if !content_type.starts_with("image/") {
            tracing::debug!(url = %icon_url, %content_type, "favicon is not an image");
            return Ok(None);
        }

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            tracing::debug!(url = %icon_url, bytes = len, "favicon too large");
            return Ok(None);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Favicon(format!("failed to read favicon: {e}")))?;

        if bytes.is_empty() || bytes.len() > self.config.max_bytes {
            tracing::debug!(url = %icon_url, bytes = bytes.len(), "favicon empty or too large");
            return Ok(None);
        }

        Ok(Some(format!("data:{content_type};base64,{}", Base64.encode(&bytes))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn lookup() -> HttpFaviconLookup {
        HttpFaviconLookup::new(FaviconConfig {
            user_agent: "squirrel-test".into(),
            timeout: Duration::from_secs(2),
            max_bytes: 16,
        })
        .unwrap()
    }

    fn page(server: &MockServer, rest: &str) -> Url {
        Url::parse(&format!("{}{rest}", server.uri())).unwrap()
    }

    #[test]
    fn test_favicon_config_default() {
        let config = FaviconConfig::default();
        assert_eq!(config.user_agent, "squirrel/0.1");
        assert_eq!(config.timeout, Duration::from_millis(3000));
        assert_eq!(config.max_bytes, 256 * 1024);
    }

    #[test]
    fn test_icon_url() {
        let page = Url::parse("https://www.example.com:8443/a/b?q=1#frag").unwrap();
        let icon = HttpFaviconLookup::icon_url(&page).unwrap();
        assert_eq!(icon.as_str(), "https://www.example.com:8443/favicon.ico");

        assert!(HttpFaviconLookup::icon_url(&Url::parse("about:blank").unwrap()).is_none());
    }

    #[tokio::test]
    async fn test_lookup_returns_data_uri() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/favicon.ico"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/png")
                    .set_body_bytes(vec![1u8, 2, 3]),
            )
            .mount(&server)
            .await;

        let icon = lookup().lookup(&page(&server, "/some/page")).await.unwrap();
        assert_eq!(icon.as_deref(), Some("data:image/png;base64,AQID"));
    }

    #[tokio::test]
    async fn test_lookup_defaults_missing_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/favicon.ico"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8, 0, 1, 0]))
            .mount(&server)
            .await;

        let icon = lookup().lookup(&page(&server, "/")).await.unwrap().unwrap();
        assert!(icon.starts_with("data:image/x-icon;base64,"), "{icon}");
    }

    #[tokio::test]
    async fn test_lookup_not_found_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/favicon.ico"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        assert_eq!(lookup().lookup(&page(&server, "/")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_lookup_rejects_non_image_and_oversized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/favicon.ico"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html; charset=utf-8")
                    .set_body_string("<html></html>"),
            )
            .mount(&server)
            .await;
        assert_eq!(lookup().lookup(&page(&server, "/")).await.unwrap(), None);

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/favicon.ico"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/png")
                    .set_body_bytes(vec![7u8; 64]),
            )
            .mount(&server)
            .await;
        assert_eq!(lookup().lookup(&page(&server, "/")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_lookup_empty_body_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/favicon.ico"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-type", "image/png"))
            .mount(&server)
            .await;

        assert_eq!(lookup().lookup(&page(&server, "/")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_lookup_network_error() {
        // Nothing listens on the discard port.
        let page = Url::parse("http://127.0.0.1:9/").unwrap();
        let result = lookup().lookup(&page).await;
        assert!(matches!(result, Err(Error::Favicon(_))));
    }

    #[tokio::test]
    async fn test_hostless_page_is_none() {
        let page = Url::parse("about:blank").unwrap();
        assert_eq!(lookup().lookup(&page).await.unwrap(), None);
    }
}
