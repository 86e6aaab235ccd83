use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, REFERER};
use reqwest::{Client, Response, StatusCode, Url};
use tracing::{debug, instrument};

use crate::common::error::{Result, ScanError};
use crate::config::HttpConfig;

/// Longest response excerpt carried in a provider error
const ERROR_BODY_LIMIT: usize = 200;

/// Cookie-bearing HTTP session owned by a single provider adapter
pub struct ProviderSession {
    provider: &'static str,
    client: Client,
    jar: Arc<Jar>,
    base_url: String,
}

impl ProviderSession {
    pub fn new(provider: &'static str, base_url: &str, http: &HttpConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, header_value(&http.accept_language)?);
        headers.insert(REFERER, header_value(&http.referer)?);

        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .user_agent(http.user_agent.as_str())
            .default_headers(headers)
            .cookie_provider(jar.clone())
            .timeout(Duration::from_secs(http.timeout_seconds))
            .build()?;

        Ok(Self {
            provider,
            client,
            jar,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Base URL without trailing slash; also what the providers expect as referer
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> Result<Url> {
        let raw = format!("{}{}", self.base_url, path);
        Url::parse(&raw).map_err(|e| ScanError::Config(format!("Invalid URL '{raw}': {e}")))
    }

    /// GET that must succeed; used for the bootstrap exchanges
    #[instrument(skip(self), fields(provider = self.provider))]
    pub async fn get_ok(&self, url: Url, referer: Option<&str>) -> Result<Response> {
        let mut request = self.client.get(url);
        if let Some(referer) = referer {
            request = request.header(REFERER, referer);
        }
        let response = request.send().await?;
        debug!("Response status: {}", response.status());
        self.ensure_success(response).await
    }

    /// Turn any non-2xx response into a provider error carrying a body excerpt
    pub async fn ensure_success(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(self.provider_error(status, &body))
    }

    pub fn provider_error(&self, status: StatusCode, body: &str) -> ScanError {
        let excerpt: String = body.chars().take(ERROR_BODY_LIMIT).collect();
        ScanError::Provider {
            provider: self.provider,
            status: status.as_u16(),
            message: if excerpt.trim().is_empty() {
                status.canonical_reason().unwrap_or("unexpected status").to_string()
            } else {
                excerpt
            },
        }
    }

    /// Value of a cookie set by one of `responses` (latest wins), whatever its
    /// Path; falls back to what the jar would send to `url`.
    pub fn issued_cookie(
        &self,
        responses: &[&Response],
        url: &Url,
        name: &'static str,
    ) -> Result<String> {
        let issued = responses.iter().rev().find_map(|response| {
            response
                .cookies()
                .find(|cookie| cookie.name() == name)
                .map(|cookie| cookie.value().to_string())
        });
        match issued {
            Some(value) => Ok(value),
            None => self.cookie(url, name),
        }
    }

    /// Value of a session cookie that would be sent to `url`
    pub fn cookie(&self, url: &Url, name: &'static str) -> Result<String> {
        let missing = || ScanError::Session {
            provider: self.provider,
            cookie: name,
        };
        let header = self.jar.cookies(url).ok_or_else(missing)?;
        let cookies = header.to_str().map_err(|_| missing())?;

        cookies
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.to_string())
            .ok_or_else(missing)
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| ScanError::Config(format!("Invalid header value '{value}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> ProviderSession {
        ProviderSession::new("Test", "https://example.com/", &HttpConfig::default()).unwrap()
    }

    #[test]
    fn test_url_joins_base_and_path() {
        let session = session();
        assert_eq!(session.base_url(), "https://example.com");
        assert_eq!(
            session.url("/api/x?y=1").unwrap().as_str(),
            "https://example.com/api/x?y=1"
        );
    }

    #[test]
    fn test_cookie_lookup_reads_jar() {
        let session = session();
        let url = session.url("/travel/").unwrap();
        session.jar.add_cookie_str("viI=abc123; Path=/", &url);
        session.jar.add_cookie_str("OF1JSESSIONID=s3ss10n; Path=/", &url);

        assert_eq!(session.cookie(&url, "viI").unwrap(), "abc123");
        assert_eq!(session.cookie(&url, "OF1JSESSIONID").unwrap(), "s3ss10n");
        assert!(matches!(
            session.cookie(&url, "missing"),
            Err(ScanError::Session { cookie: "missing", .. })
        ));
    }

    #[test]
    fn test_provider_error_truncates_body() {
        let session = session();
        let body = "x".repeat(500);

        match session.provider_error(StatusCode::INTERNAL_SERVER_ERROR, &body) {
            ScanError::Provider { status, message, .. } => {
                assert_eq!(status, 500);
                assert_eq!(message.len(), ERROR_BODY_LIMIT);
            }
            other => panic!("unexpected error {other:?}"),
        }

        match session.provider_error(StatusCode::BAD_GATEWAY, "") {
            ScanError::Provider { message, .. } => assert_eq!(message, "Bad Gateway"),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
