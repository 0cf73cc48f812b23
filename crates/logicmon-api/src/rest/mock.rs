// Scripted in-memory `Transport` for unit tests.
//
// Responses are served in the order they were queued; every request is
// recorded with the token and version it was sent with.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::Value;

use crate::error::Error;
use crate::transport::{ApiRequest, RawResponse, Transport};

#[derive(Debug, Clone)]
pub(crate) struct SentRequest {
    pub request: ApiRequest,
    pub api_version: String,
    pub csrf_token: String,
}

#[derive(Default)]
pub(crate) struct ScriptedTransport {
    responses: Mutex<VecDeque<RawResponse>>,
    sent: Mutex<Vec<SentRequest>>,
    tokens_issued: AtomicUsize,
    fail_csrf: bool,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a JSON response.
    pub fn respond(self, status: u16, body: Value) -> Self {
        self.respond_raw(RawResponse::new(status, body.to_string()))
    }

    pub fn respond_raw(self, response: RawResponse) -> Self {
        self.responses
            .lock()
            .expect("responses lock poisoned")
            .push_back(response);
        self
    }

    /// Make every CSRF pre-flight fail.
    pub fn failing_csrf(mut self) -> Self {
        self.fail_csrf = true;
        self
    }

    pub fn sent(&self) -> Vec<SentRequest> {
        self.sent.lock().expect("sent lock poisoned").clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .map(|s| s.request.resource_path)
            .collect()
    }
}

impl Transport for ScriptedTransport {
    async fn fetch_csrf_token(&self) -> Result<String, Error> {
        if self.fail_csrf {
            return Err(Error::CsrfToken {
                message: "Failed to fetch CSRF token: 401 Unauthorized".into(),
            });
        }
        let n = self.tokens_issued.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("token-{n}"))
    }

    async fn send(
        &self,
        request: &ApiRequest,
        api_version: &str,
        csrf_token: &str,
    ) -> Result<RawResponse, Error> {
        self.sent
            .lock()
            .expect("sent lock poisoned")
            .push(SentRequest {
                request: request.clone(),
                api_version: api_version.to_owned(),
                csrf_token: csrf_token.to_owned(),
            });
        let next = self
            .responses
            .lock()
            .expect("responses lock poisoned")
            .pop_front();
        Ok(next.unwrap_or_else(|| {
            panic!(
                "unexpected request: {} {}",
                request.verb, request.resource_path
            )
        }))
    }
}
