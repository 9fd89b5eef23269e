//! GoodData API client.
//!
//! Low-level HTTP client that handles authentication and raw requests.
//! Higher-level operations are implemented on model types and return
//! [`DeferredResult`](crate::DeferredResult)s where the platform answers
//! asynchronously.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use url::Url;

use crate::error::{GoodDataError, Result};
use crate::poll::{PollResponse, PollSettings};

const DEFAULT_HOST: &str = "https://secure.gooddata.com";
const USER_AGENT: &str = concat!("gooddata-rs/", env!("CARGO_PKG_VERSION"));
const REQUEST_ID_HEADER: &str = "x-gdc-request";

/// Low-level GoodData API client.
///
/// Handles authentication and HTTP requests. It is the transport shared by
/// every [`DeferredResult`](crate::DeferredResult) and is safe to use from
/// many tasks at once.
///
/// This struct is cheaply cloneable; clones reference the same underlying
/// connection pool.
///
/// # Example
///
/// ```no_run
/// use gooddata::GoodDataClient;
///
/// # fn example() -> gooddata::Result<()> {
/// // Create from environment variables
/// let client = GoodDataClient::from_env()?;
///
/// // Or configure manually
/// let client = GoodDataClient::new("your-api-token", "https://secure.gooddata.com")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct GoodDataClient {
    http: Client,
    base_url: Arc<Url>,
    token: String,
    poll_settings: Arc<PollSettings>,
}

impl std::fmt::Debug for GoodDataClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoodDataClient")
            .field("base_url", &self.base_url.as_str())
            .field("poll_settings", &self.poll_settings)
            .finish_non_exhaustive()
    }
}

impl GoodDataClient {
    /// Create a client from environment variables.
    ///
    /// Uses `GOODDATA_TOKEN` for authentication, optionally `GOODDATA_HOST`
    /// for the base URL (defaults to `https://secure.gooddata.com`) and
    /// `GOODDATA_POLL_TIMEOUT_SECS` to bound how long asynchronous
    /// operations are polled.
    ///
    /// # Errors
    ///
    /// Returns an error if `GOODDATA_TOKEN` is not set or a value is invalid.
    pub fn from_env() -> Result<Self> {
        let token = env::var("GOODDATA_TOKEN").map_err(|_| {
            GoodDataError::ConfigMissing("GOODDATA_TOKEN environment variable not set".to_string())
        })?;

        let host = env::var("GOODDATA_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());

        let mut client = Self::new(&token, &host)?;

        if let Ok(raw) = env::var("GOODDATA_POLL_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                GoodDataError::ConfigMissing(format!(
                    "GOODDATA_POLL_TIMEOUT_SECS must be a number of seconds, got '{raw}'"
                ))
            })?;
            let settings = client
                .poll_settings()
                .clone()
                .with_timeout(Some(Duration::from_secs(secs)));
            client = client.with_poll_settings(settings);
        }

        Ok(client)
    }

    /// Create a new client with the provided token and host.
    ///
    /// # Arguments
    ///
    /// * `token` - GoodData API token
    /// * `host` - Base URL of the platform (e.g., `https://secure.gooddata.com`)
    ///
    /// # Errors
    ///
    /// Returns an error if the host is not a valid URL.
    pub fn new(token: &str, host: &str) -> Result<Self> {
        // Ensure base URL ends with /
        let base_url_str = if host.ends_with('/') {
            host.to_string()
        } else {
            format!("{host}/")
        };

        let base_url = Url::parse(&base_url_str)?;

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .brotli(true)
            .gzip(true)
            .deflate(true)
            .timeout(Duration::from_secs(300))
            .build()?;

        Ok(Self {
            http,
            base_url: Arc::new(base_url),
            token: token.to_string(),
            poll_settings: Arc::new(PollSettings::default()),
        })
    }

    /// Use `settings` for deferred results created from this client.
    #[must_use]
    pub fn with_poll_settings(mut self, settings: PollSettings) -> Self {
        self.poll_settings = Arc::new(settings);
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Default settings for polling asynchronous operations.
    pub fn poll_settings(&self) -> &PollSettings {
        &self.poll_settings
    }

    /// Resolve a platform URI (`/gdc/...`) or an absolute URL.
    ///
    /// The token is sent with every request, so absolute URLs must share the
    /// base URL's origin.
    ///
    /// # Errors
    ///
    /// Returns [`GoodDataError::InvalidArgument`] for a URL on another origin.
    pub fn resolve(&self, uri: &str) -> Result<Url> {
        let url = self.base_url.join(uri)?;
        if url.origin() != self.base_url.origin() {
            return Err(GoodDataError::InvalidArgument(format!(
                "refusing to send credentials to {}, expected origin {}",
                url.origin().ascii_serialization(),
                self.base_url.origin().ascii_serialization()
            )));
        }
        Ok(url)
    }

    /// Make a GET request.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, uri: &str) -> Result<Response> {
        let url = self.resolve(uri)?;

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        Self::check_response(response).await
    }

    /// Make a PUT request with JSON body.
    #[tracing::instrument(skip(self, body))]
    pub async fn put<B: Serialize + ?Sized>(&self, uri: &str, body: &B) -> Result<Response> {
        let url = self.resolve(uri)?;

        let response = self
            .http
            .put(url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;

        Self::check_response(response).await
    }

    /// Make a POST request with JSON body.
    #[tracing::instrument(skip(self, body))]
    pub async fn post<B: Serialize + ?Sized>(&self, uri: &str, body: &B) -> Result<Response> {
        let url = self.resolve(uri)?;

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;

        Self::check_response(response).await
    }

    /// Make a DELETE request.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, uri: &str) -> Result<Response> {
        let url = self.resolve(uri)?;

        let response = self
            .http
            .delete(url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        Self::check_response(response).await
    }

    /// Issue one poll GET and read the full body.
    ///
    /// Error statuses and transport failures are returned as errors; every
    /// 2xx status is handed back for the poll handler to classify.
    pub async fn poll(&self, uri: &str) -> Result<PollResponse> {
        let response = self.get(uri).await?;
        let status = response.status();
        let body = response.bytes().await?;
        Ok(PollResponse::new(status, body.to_vec()))
    }

    /// Check response status and convert errors.
    async fn check_response(response: Response) -> Result<Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        // Handle rate limiting
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(GoodDataError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        let header_request_id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let (message, body_request_id) = Self::extract_error(response, status).await;
        Err(GoodDataError::ApiError {
            message,
            status_code: Some(status.as_u16()),
            request_id: body_request_id.or(header_request_id),
        })
    }

    /// Extract message and request id from a failed response.
    ///
    /// GoodData wraps errors as `{"error": {"message": ..., "requestId": ...}}`;
    /// `message` may hold `%s` placeholders filled from `parameters`.
    async fn extract_error(response: Response, status: StatusCode) -> (String, Option<String>) {
        let body = match response.text().await {
            Ok(b) if !b.trim().is_empty() => b,
            _ => return (format!("HTTP {status}"), None),
        };

        let Ok(json) = serde_json::from_str::<serde_json::Value>(&body) else {
            return (body, None);
        };

        let error = json.get("error").unwrap_or(&json);
        if let Some(err) = error.as_str() {
            return (err.to_string(), None);
        }

        let request_id = error
            .get("requestId")
            .and_then(|r| r.as_str())
            .map(str::to_string);

        let Some(template) = error.get("message").and_then(|m| m.as_str()) else {
            return (body, request_id);
        };

        let mut message = template.to_string();
        if let Some(params) = error.get("parameters").and_then(|p| p.as_array()) {
            for param in params {
                let value = match param {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                message = message.replacen("%s", &value, 1);
            }
        }

        (message, request_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_debug() {
        let client = GoodDataClient::new("test-token", "https://secure.gooddata.com").unwrap();
        let debug = format!("{:?}", client);
        assert!(debug.contains("GoodDataClient"));
        assert!(debug.contains("base_url"));
        // Token should not be in debug output
        assert!(!debug.contains("test-token"));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client1 = GoodDataClient::new("token", "https://secure.gooddata.com").unwrap();
        let client2 = GoodDataClient::new("token", "https://secure.gooddata.com/").unwrap();
        assert_eq!(client1.base_url().as_str(), client2.base_url().as_str());
    }

    #[test]
    fn test_resolve_platform_and_absolute_uris() {
        let client = GoodDataClient::new("token", "https://secure.gooddata.com").unwrap();
        assert_eq!(
            client.resolve("/gdc/projects/abc").unwrap().as_str(),
            "https://secure.gooddata.com/gdc/projects/abc"
        );
        assert_eq!(
            client
                .resolve("https://secure.gooddata.com/gdc/exporter/result/1")
                .unwrap()
                .as_str(),
            "https://secure.gooddata.com/gdc/exporter/result/1"
        );
    }

    #[test]
    fn test_resolve_rejects_foreign_origin() {
        let client = GoodDataClient::new("token", "https://secure.gooddata.com").unwrap();

        for uri in [
            "https://other.example.com/gdc/exporter/result/1",
            "http://secure.gooddata.com/gdc/projects/abc",
            "https://secure.gooddata.com:8443/gdc/projects/abc",
            "//other.example.com/gdc/projects/abc",
        ] {
            let err = client.resolve(uri).unwrap_err();
            assert!(matches!(err, GoodDataError::InvalidArgument(_)), "{uri}: {err:?}");
        }
    }

    #[test]
    fn test_with_poll_settings() {
        let settings = PollSettings::fixed(Duration::from_millis(5));
        let client = GoodDataClient::new("token", "https://secure.gooddata.com")
            .unwrap()
            .with_poll_settings(settings.clone());
        assert_eq!(client.poll_settings(), &settings);
    }
}
