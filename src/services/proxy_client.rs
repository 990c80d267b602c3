//! Proxy Fetch Client for Hideout.
//!
//! Sends destination urls to the fetch-and-rewrite collaborator and normalizes
//! its answer. The collaborator strips framing protections and injects a
//! `<base>` tag; this client only checks that a usable `html` payload came back.
//!
//! Wire contract: `POST {endpoint}` with `{"url": "..."}`, answered by HTTP 200
//! and `{"success": bool, "html"?: string, "error"?: string}`.

use std::sync::OnceLock;
use std::time::Duration;

use futures_util::future::BoxFuture;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::services::url_resolver::is_http_url;
use crate::types::errors::ProxyError;
use crate::types::page::SanitizedPage;

/// Anything that can turn an http(s) url into a sanitized page.
///
/// The browser holds one behind an `Arc<dyn PageFetcher>` and calls it from
/// spawned tasks, so implementations must be thread-safe.
pub trait PageFetcher: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<SanitizedPage, ProxyError>>;
}

#[derive(Serialize)]
struct ProxyRequest<'a> {
    url: &'a str,
}

#[derive(Deserialize)]
struct ProxyResponse {
    success: bool,
    #[serde(default)]
    html: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP client for the fetch-and-rewrite collaborator.
pub struct ProxyClient {
    http: reqwest::Client,
    endpoint: String,
}

impl ProxyClient {
    /// Creates a client posting to `endpoint`, giving up after `timeout`.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ProxyError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProxyError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetches `url` through the collaborator.
    pub async fn fetch_page(&self, url: &str) -> Result<SanitizedPage, ProxyError> {
        if !is_http_url(url) {
            return Err(ProxyError::Rejected(format!(
                "only http(s) urls can be proxied: {}",
                url
            )));
        }

        debug!(url = %url, endpoint = %self.endpoint, "Fetching through proxy");

        let response = self
            .http
            .post(&self.endpoint)
            .json(&ProxyRequest { url })
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "Proxy request failed");
                ProxyError::Transport(e.to_string())
            })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            warn!(url = %url, status = status.as_u16(), "Proxy answered with non-200 status");
            return Err(ProxyError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProxyError::Transport(e.to_string()))?;

        let payload: ProxyResponse =
            serde_json::from_str(&body).map_err(|e| ProxyError::Malformed(e.to_string()))?;

        if !payload.success {
            let message = payload
                .error
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| "unknown error".to_string());
            debug!(url = %url, error = %message, "Proxy rejected page");
            return Err(ProxyError::Rejected(message));
        }

        let html = payload
            .html
            .ok_or_else(|| ProxyError::Malformed("missing html field".to_string()))?;

        Ok(SanitizedPage {
            title: extract_title(&html),
            html,
        })
    }
}

impl PageFetcher for ProxyClient {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<SanitizedPage, ProxyError>> {
        Box::pin(self.fetch_page(url))
    }
}

/// Pulls the text of the first `<title>` element, whitespace-collapsed.
pub fn extract_title(html: &str) -> Option<String> {
    static TITLE_RE: OnceLock<Option<Regex>> = OnceLock::new();
    let re = TITLE_RE
        .get_or_init(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").ok())
        .as_ref()?;

    let raw = re.captures(html)?.get(1)?.as_str();
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let decoded = collapsed
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    (!decoded.is_empty()).then_some(decoded)
}
