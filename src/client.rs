use std::time::Duration;

use bytes::Bytes;
use log::{debug, trace, warn};
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SnoozeError};

/// Drives all requests against the story service.
///
/// Every model operation borrows an `ApiClient`, there is no ambient client.
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// The [`reqwest::Client`] that drives requests.
    client: Client,
    /// Root all endpoints are resolved against.
    base_url: Url,
    config: Config,
}

impl ApiClient {
    /// Create a new client for the configured service.
    pub fn new(config: Config) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(SnoozeError::InvalidBaseUrl {
                url: config.base_url,
            });
        }
        let client = Self::build_http_client(&config)?;
        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    /// Convenience method for a client against the service at `base_url`
    /// with otherwise default settings.
    pub fn with_base_url<T: ToString>(base_url: T) -> Result<Self> {
        Self::new(Config::builder().base_url(base_url).build())
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn build_http_client(config: &Config) -> Result<Client> {
        Ok(Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.as_str())
            .build()?)
    }

    /// The browser owns timeouts and the user agent.
    #[cfg(target_arch = "wasm32")]
    fn build_http_client(_config: &Config) -> Result<Client> {
        Ok(Client::builder().build()?)
    }

    #[inline]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolve the path `segments` against the base url.
    ///
    /// Every segment is percent encoded, so usernames and story ids can't
    /// escape their position in the path.
    pub(crate) fn endpoint<I>(&self, segments: I) -> Result<Url>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SnoozeError::InvalidBaseUrl {
                url: self.base_url.to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `GET` the `url` with the `query` attached and decode the response.
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let req = self.client.get(url.clone()).query(query);
        let body = self.execute(req, Method::GET, &url).await?;
        decode(body)
    }

    /// Send `payload` as json body and decode the response.
    pub(crate) async fn send<P, T>(&self, method: Method, url: Url, payload: &P) -> Result<T>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let req = self.client.request(method.clone(), url.clone()).json(payload);
        let body = self.execute(req, method, &url).await?;
        decode(body)
    }

    /// Send `payload` as json body, only the status of the response matters.
    pub(crate) async fn send_discard<P>(&self, method: Method, url: Url, payload: &P) -> Result<()>
    where
        P: Serialize + ?Sized,
    {
        let req = self.client.request(method.clone(), url.clone()).json(payload);
        self.execute(req, method, &url).await?;
        Ok(())
    }

    async fn execute(&self, req: RequestBuilder, method: Method, url: &Url) -> Result<Bytes> {
        // the query may carry the token, only log the path
        debug!("{} {}", method, url.path());

        let resp = req.send().await?;
        let status = resp.status();
        let body = resp.bytes().await?;

        if !status.is_success() {
            warn!("{} {} failed with {}", method, url.path(), status);
            return Err(SnoozeError::from_status(status, error_message(&body)));
        }

        trace!("{} {} returned {} bytes", method, url.path(), body.len());
        Ok(body)
    }
}

fn decode<T: DeserializeOwned>(body: Bytes) -> Result<T> {
    serde_json::from_slice(&body).map_err(|error| SnoozeError::Decode { error, body })
}

/// Error payload the service sends along with non success responses.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

fn error_message(body: &[u8]) -> Option<String> {
    let resp: ErrorResponse = serde_json::from_slice(body).ok()?;
    resp.error.message.or(resp.error.title)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Root url of the story service.
    base_url: String,
    /// Timeout for requests.
    request_timeout: Duration,
    /// The user-agent used for requests.
    user_agent: String,
}

impl Config {
    /// The public hack-or-snooze service.
    pub const DEFAULT_BASE_URL: &'static str = "https://hack-or-snooze-v3.herokuapp.com";

    /// Default timeout for requests made by this crate.
    pub const DEFAULT_REQ_TIMEOUT_SEC: u64 = 10;

    #[inline]
    pub(crate) fn default_user_agent() -> String {
        format!("hack-or-snooze/{}", env!("CARGO_PKG_VERSION"))
    }

    /// Convenience method to create a [`ConfigBuilder`]
    #[inline]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    #[inline]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Upper bound for every request.
    ///
    /// Not applied on `wasm32`, there the browser's fetch decides when a
    /// request is given up.
    #[inline]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    #[inline]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::builder().build()
    }
}

#[derive(Debug, Default)]
pub struct ConfigBuilder {
    /// Root url of the story service.
    base_url: Option<String>,
    /// Timeout for requests.
    request_timeout: Option<Duration>,
    /// The user-agent used for requests.
    user_agent: Option<String>,
}

impl ConfigBuilder {
    pub fn base_url<T: ToString>(mut self, base_url: T) -> Self {
        self.base_url = Some(base_url.to_string());
        self
    }

    /// See [`Config::request_timeout`].
    pub fn request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = Some(request_timeout);
        self
    }

    pub fn user_agent<T: ToString>(mut self, user_agent: T) -> Self {
        self.user_agent = Some(user_agent.to_string());
        self
    }

    pub fn build(self) -> Config {
        Config {
            base_url: self
                .base_url
                .unwrap_or_else(|| Config::DEFAULT_BASE_URL.to_string()),
            request_timeout: self
                .request_timeout
                .unwrap_or_else(|| Duration::from_secs(Config::DEFAULT_REQ_TIMEOUT_SEC)),
            user_agent: self.user_agent.unwrap_or_else(Config::default_user_agent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = Config::default();
        assert_eq!(config.base_url(), Config::DEFAULT_BASE_URL);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert!(config.user_agent().starts_with("hack-or-snooze/"));
    }

    #[test]
    fn client_keeps_configured_timeout() {
        let config = Config::builder()
            .base_url("http://localhost:3000")
            .request_timeout(Duration::from_secs(3))
            .build();
        let client = ApiClient::new(config).unwrap();
        assert_eq!(client.config().request_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn endpoint_segments_are_encoded() {
        let client = ApiClient::with_base_url("http://localhost:3000/api/").unwrap();
        let url = client.endpoint(&["users", "jane doe", "favorites", "a/b"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:3000/api/users/jane%20doe/favorites/a%2Fb"
        );

        let client = ApiClient::with_base_url("http://localhost:3000").unwrap();
        let url = client.endpoint(&["stories"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/stories");
    }

    #[test]
    fn rejects_invalid_base_url() {
        assert!(matches!(
            ApiClient::with_base_url("mailto:someone@example.com"),
            Err(SnoozeError::InvalidBaseUrl { .. })
        ));
        assert!(matches!(
            ApiClient::with_base_url("not a url"),
            Err(SnoozeError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn extracts_service_error_message() {
        let body = br#"{"error":{"status":401,"title":"Unauthorized","message":"Invalid Credentials"}}"#;
        assert_eq!(error_message(body), Some("Invalid Credentials".to_string()));

        let body = br#"{"error":{"status":404,"title":"Not Found"}}"#;
        assert_eq!(error_message(body), Some("Not Found".to_string()));

        assert_eq!(error_message(b"<html></html>"), None);
    }
}
