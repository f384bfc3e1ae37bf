//! The upstream client seam.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, instrument, warn};

use super::{Method, UpstreamRequest, UpstreamResponse};
use crate::domains::tools::error::UpstreamError;

/// Longest error body echoed back to the caller.
const MAX_ERROR_BODY: usize = 300;

/// Performs exactly one outbound request per call.
///
/// The trait exists so tests can substitute a stub and observe whether the
/// network was touched at all.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError>;
}

/// reqwest-backed client used in production.
#[derive(Debug, Clone)]
pub struct HttpUpstreamClient {
    http: reqwest::Client,
}

impl HttpUpstreamClient {
    /// Create a client whose requests abort after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| UpstreamError::Request(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl UpstreamClient for HttpUpstreamClient {
    #[instrument(skip_all, fields(method = request.method.as_str(), url = %request.url))]
    async fn send(&self, mut request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError> {
        if let Some(signer) = request.signer.clone() {
            signer.sign(&mut request)?;
        }

        let mut builder = match request.method {
            Method::Get => self.http.get(&request.url),
            Method::Post => self.http.post(&request.url),
        };

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?.to_vec();

        debug!(status = status.as_u16(), bytes = body.len(), "Upstream responded");

        if !status.is_success() {
            let snippet: String = String::from_utf8_lossy(&body)
                .chars()
                .take(MAX_ERROR_BODY)
                .collect();
            warn!("Upstream returned HTTP {}", status.as_u16());
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body: snippet.trim().to_string(),
            });
        }

        Ok(UpstreamResponse::new(status.as_u16(), content_type, body))
    }
}
