//! Authentication strategies for upstream requests.
//!
//! Each integration picks one signer when it builds its request; the client
//! applies it just before the request goes on the wire.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rand::{Rng, distributions::Alphanumeric};
use reqwest::Url;
use sha1::Sha1;

use super::UpstreamRequest;
use crate::domains::tools::error::UpstreamError;

type HmacSha1 = Hmac<Sha1>;

/// RFC 3986 unreserved characters are the only ones left unescaped.
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const NONCE_LENGTH: usize = 32;

/// Adds authentication material to a request.
pub trait RequestSigner: Send + Sync {
    /// Short name of the scheme, safe to log.
    fn scheme(&self) -> &'static str;

    fn sign(&self, request: &mut UpstreamRequest) -> Result<(), UpstreamError>;
}

/// API key passed as a query-string parameter.
#[derive(Clone)]
pub struct ApiKeyQuery {
    param: String,
    key: String,
}

impl ApiKeyQuery {
    pub fn new(param: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            param: param.into(),
            key: key.into(),
        }
    }
}

impl RequestSigner for ApiKeyQuery {
    fn scheme(&self) -> &'static str {
        "api-key-query"
    }

    fn sign(&self, request: &mut UpstreamRequest) -> Result<(), UpstreamError> {
        request.query.push((self.param.clone(), self.key.clone()));
        Ok(())
    }
}

/// `Authorization: Bearer <token>`.
#[derive(Clone)]
pub struct BearerToken {
    token: String,
}

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl RequestSigner for BearerToken {
    fn scheme(&self) -> &'static str {
        "bearer"
    }

    fn sign(&self, request: &mut UpstreamRequest) -> Result<(), UpstreamError> {
        request
            .headers
            .push(("Authorization".to_string(), format!("Bearer {}", self.token)));
        Ok(())
    }
}

/// Two-legged OAuth 1.0a with HMAC-SHA1 (consumer key and secret, no token).
#[derive(Clone)]
pub struct OAuth1Signer {
    consumer_key: String,
    consumer_secret: String,
}

impl OAuth1Signer {
    pub fn new(consumer_key: impl Into<String>, consumer_secret: impl Into<String>) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
        }
    }

    /// Build the `Authorization` header value for a request with a fixed
    /// nonce and timestamp.
    pub fn authorization_header(
        &self,
        request: &UpstreamRequest,
        nonce: &str,
        timestamp: i64,
    ) -> Result<String, UpstreamError> {
        let timestamp = timestamp.to_string();
        let oauth_params = [
            ("oauth_consumer_key", self.consumer_key.as_str()),
            ("oauth_nonce", nonce),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", timestamp.as_str()),
            ("oauth_version", "1.0"),
        ];

        let mut params: Vec<(String, String)> = request.query.clone();
        params.extend(
            oauth_params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string())),
        );

        let base = signature_base_string(request.method.as_str(), &request.url, &params)?;
        // Two-legged: the token secret is empty but the separator stays.
        let key = format!("{}&", encode(&self.consumer_secret));
        let signature = hmac_sha1_base64(&key, &base)?;

        let mut header_params: Vec<(&str, &str)> = oauth_params.to_vec();
        header_params.push(("oauth_signature", signature.as_str()));
        header_params.sort();

        let fields = header_params
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", k, encode(v)))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(format!("OAuth {fields}"))
    }
}

impl RequestSigner for OAuth1Signer {
    fn scheme(&self) -> &'static str {
        "oauth1-hmac-sha1"
    }

    fn sign(&self, request: &mut UpstreamRequest) -> Result<(), UpstreamError> {
        let nonce: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(NONCE_LENGTH)
            .map(char::from)
            .collect();
        let timestamp = chrono::Utc::now().timestamp();

        let header = self.authorization_header(request, &nonce, timestamp)?;
        request.headers.push(("Authorization".to_string(), header));
        Ok(())
    }
}

fn encode(value: &str) -> String {
    utf8_percent_encode(value, OAUTH_ENCODE_SET).to_string()
}

/// RFC 5849 §3.4.1 signature base string.
///
/// Query parameters embedded in `url` are merged with `params`.
pub fn signature_base_string(
    method: &str,
    url: &str,
    params: &[(String, String)],
) -> Result<String, UpstreamError> {
    let parsed = Url::parse(url).map_err(|e| UpstreamError::Request(format!("{url}: {e}")))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| UpstreamError::Request(format!("{url}: missing host")))?;

    let mut base_uri = format!("{}://{}", parsed.scheme(), host.to_ascii_lowercase());
    if let Some(port) = parsed.port() {
        base_uri.push_str(&format!(":{port}"));
    }
    base_uri.push_str(parsed.path());

    let mut encoded: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| (encode(&k), encode(&v)))
        .chain(params.iter().map(|(k, v)| (encode(k), encode(v))))
        .collect();
    encoded.sort();

    let normalized = encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    Ok(format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        encode(&base_uri),
        encode(&normalized)
    ))
}

fn hmac_sha1_base64(key: &str, data: &str) -> Result<String, UpstreamError> {
    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|e| UpstreamError::Request(format!("invalid signing key: {e}")))?;
    mac.update(data.as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}
