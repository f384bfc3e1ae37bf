//! Recording stub for the upstream seam, shared by the unit tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use super::error::UpstreamError;
use super::upstream::{UpstreamClient, UpstreamRequest, UpstreamResponse};

type FailureFn = Box<dyn Fn() -> UpstreamError + Send + Sync>;

enum Reply {
    Respond(UpstreamResponse),
    Fail(FailureFn),
}

/// Answers every request with the same canned reply and records what it saw.
///
/// Signers are applied before recording, so tests can inspect the final
/// query string and headers.
pub struct StubClient {
    reply: Reply,
    calls: AtomicUsize,
    requests: Mutex<Vec<UpstreamRequest>>,
}

impl StubClient {
    pub fn respond(response: UpstreamResponse) -> Self {
        Self::with_reply(Reply::Respond(response))
    }

    pub fn json(value: Value) -> Self {
        Self::respond(UpstreamResponse::json(&value))
    }

    pub fn bytes(content_type: &str, body: Vec<u8>) -> Self {
        Self::respond(UpstreamResponse::new(200, Some(content_type.to_string()), body))
    }

    pub fn failing(make: impl Fn() -> UpstreamError + Send + Sync + 'static) -> Self {
        Self::with_reply(Reply::Fail(Box::new(make)))
    }

    fn with_reply(reply: Reply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<UpstreamRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl UpstreamClient for StubClient {
    async fn send(&self, mut request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(signer) = request.signer.clone() {
            signer.sign(&mut request)?;
        }
        self.requests.lock().unwrap().push(request);

        match &self.reply {
            Reply::Respond(response) => Ok(response.clone()),
            Reply::Fail(make) => Err(make()),
        }
    }
}
