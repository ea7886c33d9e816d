//! JSON-over-HTTP client used to talk to hosted completion providers.
//!
//! One operation matters here: POST a JSON body with an optional bearer
//! token and decode the JSON answer. The token never reaches the logs.
//! Setting `FACTSTREAM_HTTP_RAW=1` additionally logs request and response
//! bodies under the `http.raw` target.
//!
//! ```no_run
//! # async fn demo() -> Result<(), factstream_http::HttpError> {
//! let client = factstream_http::HttpClient::new("https://api.example.com/")?;
//! let got: serde_json::Value = client
//!     .post_json("v1/items", Some("token"), &serde_json::json!({"q": 1}))
//!     .await?;
//! # Ok(()) }
//! ```
//!
//! A fresh client has no request timeout and makes no retries; a long
//! completion is bounded only by the upstream unless the caller opts in.

use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::sleep;

const RAW_ENV: &str = "FACTSTREAM_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024;
const SNIPPET_MAX: usize = 500;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

fn raw_enabled() -> bool {
    matches!(
        std::env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
    #[error("server returned error {status}: {message}, request_id={request_id}")]
    Api {
        status: StatusCode,
        message: String,
        request_id: String,
    },
}

impl HttpError {
    /// Throttling, server faults and transport failures may succeed later.
    pub fn is_transient(&self) -> bool {
        match self {
            HttpError::Network(_) => true,
            HttpError::Api { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            _ => false,
        }
    }
}

/// A failed attempt plus how long the server asked us to wait.
struct Failure {
    error: HttpError,
    retry_after: Option<Duration>,
}

impl From<HttpError> for Failure {
    fn from(error: HttpError) -> Self {
        Self {
            error,
            retry_after: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    timeout: Option<Duration>,
    retries: usize,
}

impl HttpClient {
    /// Anchor a client to `base`.
    ///
    /// A trailing slash is appended when missing so that relative paths
    /// extend the base instead of replacing its last segment.
    ///
    /// ```
    /// use factstream_http::{HttpClient, HttpError};
    ///
    /// let client = HttpClient::new("https://api.example.com/v1")?;
    /// assert_eq!(client.base_url().as_str(), "https://api.example.com/v1/");
    /// assert!(client.timeout().is_none());
    /// assert_eq!(client.retries(), 0);
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let base = if base.ends_with('/') {
            Url::parse(base)
        } else {
            Url::parse(&format!("{base}/"))
        }
        .map_err(|e| HttpError::Url(e.to_string()))?;

        let inner = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;

        Ok(Self {
            base,
            inner,
            timeout: None,
            retries: 0,
        })
    }

    /// Bound every request, connection and body included, by `dur`.
    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.timeout = Some(dur);
        self
    }

    /// Retry transient failures up to `n` extra times.
    pub fn with_retries(mut self, n: usize) -> Self {
        self.retries = n;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn retries(&self) -> usize {
        self.retries
    }

    /// POST `body` as JSON to `path` (relative to the base) and decode the reply.
    pub async fn post_json<B, T>(
        &self,
        path: &str,
        bearer: Option<&str>,
        body: &B,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self
            .base
            .join(path.trim_start_matches('/'))
            .map_err(|e| HttpError::Url(e.to_string()))?;
        let payload = serde_json::to_vec(body).map_err(|e| HttpError::Build(e.to_string()))?;
        let token = bearer.map(sanitize_api_key).transpose()?;
        let req_id = uuid::Uuid::new_v4().simple().to_string();

        let mut attempt = 0usize;
        let bytes = loop {
            attempt += 1;
            match self.send_once(&url, &payload, token.as_deref(), &req_id, attempt).await {
                Ok(bytes) => break bytes,
                Err(failure) if failure.error.is_transient() && attempt <= self.retries => {
                    let delay = failure.retry_after.unwrap_or_else(|| backoff(attempt));
                    tracing::warn!(
                        req_id = %req_id,
                        attempt,
                        retries = self.retries,
                        backoff_ms = delay.as_millis() as u64,
                        error = %failure.error,
                        "http.retrying"
                    );
                    sleep(delay).await;
                }
                Err(failure) => return Err(failure.error),
            }
        };

        serde_json::from_slice::<T>(&bytes).map_err(|e| {
            let snippet = snip_body(&bytes);
            tracing::warn!(
                req_id = %req_id,
                serde_err = %e,
                body_snippet = %snippet,
                "http.response.decode_error"
            );
            HttpError::Decode(e.to_string(), snippet)
        })
    }

    async fn send_once(
        &self,
        url: &Url,
        payload: &[u8],
        token: Option<&str>,
        req_id: &str,
        attempt: usize,
    ) -> Result<Vec<u8>, Failure> {
        let mut rb = self
            .inner
            .post(url.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload.to_vec());
        if let Some(t) = self.timeout {
            rb = rb.timeout(t);
        }
        if let Some(tok) = token {
            rb = rb.bearer_auth(tok);
        }

        tracing::debug!(
            req_id = %req_id,
            attempt,
            path = %url.path(),
            timeout_ms = ?self.timeout.map(|t| t.as_millis() as u64),
            auth = if token.is_some() { "bearer <redacted>" } else { "none" },
            "http.request.start"
        );
        if raw_enabled() {
            tracing::debug!(target: "http.raw", %req_id, body = %raw_snip(payload), "request");
        }

        let started = Instant::now();
        let resp = rb.send().await.map_err(|e| {
            tracing::warn!(req_id = %req_id, attempt, error = %e, "http.network_error");
            HttpError::Network(e.to_string())
        })?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| HttpError::Network(e.to_string()))?;
        let upstream_id = upstream_request_id(&headers);

        tracing::debug!(
            req_id = %req_id,
            %status,
            duration_ms = started.elapsed().as_millis() as u64,
            body_len = bytes.len(),
            x_request_id = %upstream_id,
            "http.response"
        );
        if raw_enabled() {
            tracing::info!(
                target: "http.raw",
                %req_id,
                %status,
                headers = ?redact_headers(&headers),
                body = %raw_snip(&bytes),
                "response"
            );
        }

        if status.is_success() {
            return Ok(bytes.to_vec());
        }

        let message = extract_error_message(&bytes);
        tracing::warn!(
            req_id = %req_id,
            %status,
            message = %message,
            x_request_id = %upstream_id,
            "http.error"
        );
        let retry_after = retry_after_secs(&headers).map(Duration::from_secs).or_else(|| {
            (status == StatusCode::TOO_MANY_REQUESTS)
                .then(|| backoff(attempt).max(Duration::from_millis(1100)))
        });
        Err(Failure {
            error: HttpError::Api {
                status,
                message,
                request_id: upstream_id,
            },
            retry_after,
        })
    }
}

fn backoff(attempt: usize) -> Duration {
    let exp = attempt.saturating_sub(1).min(10) as u32;
    Duration::from_millis(200u64.saturating_mul(2u64.pow(exp)))
}

fn upstream_request_id(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .or_else(|| headers.get("x-correlation-id"))
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string()
}

fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let val = if k.as_str().eq_ignore_ascii_case("authorization") {
                "<redacted>".to_string()
            } else {
                v.to_str().unwrap_or("").to_string()
            };
            (k.as_str().to_string(), val)
        })
        .collect()
}

/// Pull a human message out of the usual provider error envelopes.
fn extract_error_message(body: &[u8]) -> String {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Envelope {
        Nested { error: Detail },
        Flat {
            #[serde(default)]
            message: Option<String>,
            #[serde(default)]
            detail: Option<String>,
            #[serde(default)]
            error: Option<String>,
        },
    }
    #[derive(Deserialize)]
    struct Detail {
        message: String,
    }

    let found = match serde_json::from_slice::<Envelope>(body) {
        Ok(Envelope::Nested { error }) => Some(error.message),
        Ok(Envelope::Flat {
            message,
            detail,
            error,
        }) => [message, detail, error]
            .into_iter()
            .flatten()
            .find(|m| !m.is_empty()),
        Err(_) => None,
    };
    found.unwrap_or_else(|| snip_body(body))
}

fn retry_after_secs(h: &HeaderMap) -> Option<u64> {
    h.get(RETRY_AFTER)?.to_str().ok()?.trim().parse().ok()
}

fn snip_body(body: &[u8]) -> String {
    truncated_text(body, SNIPPET_MAX)
}

fn raw_snip(body: &[u8]) -> String {
    truncated_text(body, RAW_MAX_BODY)
}

fn truncated_text(body: &[u8], max: usize) -> String {
    let mut text = String::from_utf8_lossy(body).into_owned();
    if text.len() > max {
        let mut cut = max;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
        text.push_str("...");
    }
    text
}

/// Trim quotes and whitespace that commonly sneak into keys pasted into env
/// files, then check the result is a legal header value.
fn sanitize_api_key(raw: &str) -> Result<String, HttpError> {
    let key: String = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .chars()
        .filter(|ch| !ch.is_ascii_whitespace())
        .collect();

    if key.is_empty() {
        return Err(HttpError::Build("API key is empty".into()));
    }
    if !key.is_ascii() || key.bytes().any(|b| b < 0x20 || b == 0x7F) {
        return Err(HttpError::Build(
            "API key contains non-printable or non-ASCII characters".into(),
        ));
    }
    HeaderValue::from_str(&format!("Bearer {key}"))
        .map_err(|e| HttpError::Build(format!("invalid Authorization header: {e}")))?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_quotes_and_whitespace() {
        assert_eq!(sanitize_api_key("  \"pplx-abc\n\" ").unwrap(), "pplx-abc");
        assert!(sanitize_api_key("   ").is_err());
        assert!(sanitize_api_key("clé").is_err());
    }

    #[test]
    fn error_message_prefers_nested_envelope() {
        let body = br#"{"error":{"message":"invalid api key","type":"auth"}}"#;
        assert_eq!(extract_error_message(body), "invalid api key");

        let body = br#"{"detail":"model not found"}"#;
        assert_eq!(extract_error_message(body), "model not found");

        assert_eq!(extract_error_message(b"upstream exploded"), "upstream exploded");
    }

    #[test]
    fn snippets_respect_char_boundaries() {
        let body = "é".repeat(400);
        let snip = snip_body(body.as_bytes());
        assert!(snip.ends_with("..."));
        assert!(snip.len() <= SNIPPET_MAX + 3);
    }

    #[test]
    fn authorization_header_is_redacted() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer sk-live"));
        headers.insert("x-request-id", HeaderValue::from_static("abc"));
        let shown = redact_headers(&headers);
        assert!(shown.iter().all(|(_, v)| !v.contains("sk-live")));
        assert_eq!(upstream_request_id(&headers), "abc");
    }

    #[test]
    fn backoff_doubles() {
        assert_eq!(backoff(1), Duration::from_millis(200));
        assert_eq!(backoff(3), Duration::from_millis(800));
    }

    #[test]
    fn transient_classification() {
        let throttled = HttpError::Api {
            status: StatusCode::TOO_MANY_REQUESTS,
            message: String::new(),
            request_id: "-".into(),
        };
        let denied = HttpError::Api {
            status: StatusCode::UNAUTHORIZED,
            message: String::new(),
            request_id: "-".into(),
        };
        assert!(throttled.is_transient());
        assert!(!denied.is_transient());
        assert!(HttpError::Network("reset".into()).is_transient());
    }
}
