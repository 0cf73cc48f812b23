// REST request execution
//
// Every call runs the same sequence: fetch a CSRF token, send the request
// with token and version headers, then map the status. 204 is an empty
// object, other 2xx bodies must be JSON, anything else is an API error
// carrying the raw body. Nothing is retried.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::auth::Credentials;
use crate::error::Error;
use crate::models::Page;
use crate::transport::{
    ApiRequest, DEFAULT_API_VERSION, HttpTransport, RawResponse, Transport, TransportConfig,
};

const EMPTY_ERROR_BODY: &str = "No additional error details provided.";
const UNREADABLE_ERROR_BODY: &str = "Could not read error response body.";

/// A decoded success: the JSON value plus the status line and raw body it
/// came with, kept so typed decoding failures can still report them.
struct Decoded {
    status: u16,
    status_text: String,
    body: String,
    value: Value,
}

/// Async client for the LogicMonitor REST API.
///
/// Holds no per-call state, so one client can serve any number of
/// concurrent call chains.
#[derive(Debug)]
pub struct LmClient<T = HttpTransport> {
    transport: T,
    api_version: String,
}

impl LmClient<HttpTransport> {
    /// Build a client over HTTP for `portal` (a company name or base URL).
    pub fn new(
        portal: &str,
        credentials: &Credentials,
        config: &TransportConfig,
    ) -> Result<Self, Error> {
        let transport = HttpTransport::new(portal, credentials, config)?;
        Ok(Self::with_transport(transport))
    }
}

impl<T: Transport> LmClient<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            api_version: DEFAULT_API_VERSION.to_owned(),
        }
    }

    /// Change the API version sent when a request does not name one.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    // ── Execution ────────────────────────────────────────────────────

    /// Send `request` and return the response body as JSON.
    ///
    /// A 204 yields an empty object.
    pub async fn execute(&self, request: &ApiRequest) -> Result<Value, Error> {
        Ok(self.exchange(request).await?.value)
    }

    /// Send `request` and decode the response body into `R`.
    pub async fn request<R: DeserializeOwned>(&self, request: &ApiRequest) -> Result<R, Error> {
        let decoded = self.exchange(request).await?;
        <R as Deserialize>::deserialize(&decoded.value).map_err(|e| {
            warn!(
                status = decoded.status,
                "response for {} did not match the expected shape: {e}", request.resource_path
            );
            Error::MalformedBody {
                status: decoded.status,
                status_text: decoded.status_text,
                message: e.to_string(),
                body: decoded.body,
            }
        })
    }

    /// Fetch a single page of a list endpoint.
    pub(crate) async fn get_page<R: DeserializeOwned>(
        &self,
        request: &ApiRequest,
    ) -> Result<Page<R>, Error> {
        self.request(request).await
    }

    async fn exchange(&self, request: &ApiRequest) -> Result<Decoded, Error> {
        debug!(
            "LogicMonitor API call: {} {}",
            request.verb, request.resource_path
        );

        let csrf_token = self.transport.fetch_csrf_token().await?;
        let version = request.api_version.as_deref().unwrap_or(&self.api_version);
        let raw = self.transport.send(request, version, &csrf_token).await?;

        interpret(raw)
    }
}

fn interpret(raw: RawResponse) -> Result<Decoded, Error> {
    let RawResponse {
        status,
        status_text,
        body,
    } = raw;

    if status == 204 {
        debug!("received 204 No Content");
        return Ok(Decoded {
            status,
            status_text,
            body: body.unwrap_or_default(),
            value: Value::Object(Map::new()),
        });
    }

    if (200..300).contains(&status) {
        let body = body.unwrap_or_default();
        return match serde_json::from_str(&body) {
            Ok(value) => Ok(Decoded {
                status,
                status_text,
                body,
                value,
            }),
            Err(e) => {
                warn!(status, "failed to parse JSON response: {e}");
                Err(Error::MalformedBody {
                    status,
                    status_text,
                    message: e.to_string(),
                    body,
                })
            }
        };
    }

    let body = match body {
        Some(text) if !text.is_empty() => text,
        Some(_) => EMPTY_ERROR_BODY.to_owned(),
        None => UNREADABLE_ERROR_BODY.to_owned(),
    };
    warn!(status, %status_text, %body, "LogicMonitor API error");
    Err(Error::Api {
        status,
        status_text,
        body,
    })
}
