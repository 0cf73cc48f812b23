// HTTP transport for the LogicMonitor REST API.
//
// `Transport` is the seam between request semantics and the network: one
// method fetches a CSRF token, the other performs a single exchange and
// hands back the raw status and body. `HttpTransport` is the reqwest
// implementation; tests substitute scripted ones.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Serialize;
use tracing::{debug, trace};
use url::Url;

use crate::auth::Credentials;
use crate::error::Error;

/// Header carrying the anti-forgery token in both directions.
pub const CSRF_HEADER: &str = "X-Csrf-Token";
/// Header selecting the REST API version.
pub const VERSION_HEADER: &str = "X-Version";
/// API version used when neither the request nor the client names one.
pub const DEFAULT_API_VERSION: &str = "3";

/// Sentinel value asking the portal to issue a fresh token.
const CSRF_FETCH: &str = "Fetch";
/// Cheap endpoint whose only purpose is to hand out a CSRF token.
const CSRF_PATH: &str = "/functions/dummy";
const REST_PATH: &str = "/santaba/rest";
const JSON: &str = "application/json";

// ── Requests ─────────────────────────────────────────────────────────

/// The HTTP verbs the REST API accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpVerb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpVerb {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Only POST, PUT and PATCH send a request body; a body supplied with
    /// any other verb is dropped.
    pub fn carries_body(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }

    fn as_method(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Patch => reqwest::Method::PATCH,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One call against the REST API, relative to the portal's base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub verb: HttpVerb,
    /// Resource path such as `/device/devices`.
    pub resource_path: String,
    /// Query parameters, URL-encoded on the wire in this order.
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    /// Overrides the client's default API version for this call.
    pub api_version: Option<String>,
}

impl ApiRequest {
    pub fn new(verb: HttpVerb, resource_path: impl Into<String>) -> Self {
        Self {
            verb,
            resource_path: resource_path.into(),
            query: Vec::new(),
            body: None,
            api_version: None,
        }
    }

    pub fn get(resource_path: impl Into<String>) -> Self {
        Self::new(HttpVerb::Get, resource_path)
    }

    pub fn post(resource_path: impl Into<String>) -> Self {
        Self::new(HttpVerb::Post, resource_path)
    }

    pub fn put(resource_path: impl Into<String>) -> Self {
        Self::new(HttpVerb::Put, resource_path)
    }

    pub fn patch(resource_path: impl Into<String>) -> Self {
        Self::new(HttpVerb::Patch, resource_path)
    }

    pub fn delete(resource_path: impl Into<String>) -> Self {
        Self::new(HttpVerb::Delete, resource_path)
    }

    /// Append a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Append a query parameter when the value is present and non-empty.
    pub fn query_opt(self, key: impl Into<String>, value: Option<&str>) -> Self {
        match value.filter(|v| !v.is_empty()) {
            Some(v) => self.query(key, v),
            None => self,
        }
    }

    /// Attach a JSON body.
    pub fn body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Encode `body` as the JSON payload.
    pub fn json<B: Serialize + ?Sized>(self, body: &B) -> Result<Self, Error> {
        let value = serde_json::to_value(body).map_err(|e| Error::Serialization {
            message: e.to_string(),
        })?;
        Ok(self.body(value))
    }

    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    /// Look up the first value of a query parameter.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Status line and body of a response, before any interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub status_text: String,
    /// `None` when the body could not be read.
    pub body: Option<String>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        let status_text = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or_default()
            .to_owned();
        Self {
            status,
            status_text,
            body: Some(body.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// ── Transport seam ───────────────────────────────────────────────────

/// A single authenticated exchange with the portal.
///
/// Implementations are stateless between calls as far as the client is
/// concerned: a fresh token is requested for every call.
pub trait Transport: Send + Sync {
    /// Ask the portal for a fresh anti-forgery token.
    fn fetch_csrf_token(&self) -> impl Future<Output = Result<String, Error>> + Send;

    /// Send `request` with the given version and token headers. Non-2xx
    /// statuses are not errors at this layer.
    fn send(
        &self,
        request: &ApiRequest,
        api_version: &str,
        csrf_token: &str,
    ) -> impl Future<Output = Result<RawResponse, Error>> + Send;
}

// ── Transport configuration ──────────────────────────────────────────

/// TLS verification mode.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the bundled webpki root certificates.
    #[default]
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (collector proxies with self-signed certs).
    DangerAcceptInvalid,
}

/// Settings for building the underlying `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    /// Per-request timeout. This is the only timeout in the stack.
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` wired for `credentials`: a cookie jar for
    /// sessions, or a sensitive default `Authorization` header for tokens.
    pub fn build_client(&self, credentials: &Credentials) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("logicmon-api/", env!("CARGO_PKG_VERSION")));

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        match credentials {
            Credentials::Session { cookie_jar } => {
                builder = builder.cookie_provider(Arc::clone(cookie_jar));
            }
            Credentials::Bearer { token } => {
                let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                    .map_err(|e| Error::Authentication {
                        message: format!("invalid bearer token header value: {e}"),
                    })?;
                value.set_sensitive(true);
                let mut headers = HeaderMap::new();
                headers.insert(AUTHORIZATION, value);
                builder = builder.default_headers(headers);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

/// Turn a portal identifier into the REST base URL.
///
/// A bare company name (`"acme"`) becomes
/// `https://acme.logicmonitor.com/santaba/rest`. A full URL keeps its
/// scheme and host and gains the `/santaba/rest` path unless it already
/// ends with it.
pub fn normalize_base_url(raw: &str) -> Result<Url, Error> {
    let raw = raw.trim();
    let is_company_name = !raw.is_empty()
        && raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    let mut url = if is_company_name {
        Url::parse(&format!("https://{raw}.logicmonitor.com"))?
    } else {
        Url::parse(raw)?
    };

    let path = url.path().trim_end_matches('/').to_owned();
    if path.ends_with(REST_PATH) {
        url.set_path(&path);
    } else {
        url.set_path(&format!("{path}{REST_PATH}"));
    }
    Ok(url)
}

// ── reqwest implementation ───────────────────────────────────────────

/// `Transport` over a `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    /// Build from a portal identifier, credentials and transport settings.
    pub fn new(
        portal: &str,
        credentials: &Credentials,
        config: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = config.build_client(credentials)?;
        let base_url = normalize_base_url(portal)?;
        Ok(Self { http, base_url })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth).
    pub fn from_reqwest(portal: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = normalize_base_url(portal)?;
        Ok(Self { http, base_url })
    }

    /// The REST base URL, ending in `/santaba/rest`.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `<base><resource_path>`. Query strings are added by the request
    /// builder, never spliced into the path.
    fn url(&self, resource_path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = resource_path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }
}

impl Transport for HttpTransport {
    async fn fetch_csrf_token(&self) -> Result<String, Error> {
        let url = self.url(CSRF_PATH)?;
        debug!("fetching CSRF token from {url}");

        let resp = self
            .http
            .get(url)
            .header(CSRF_HEADER, CSRF_FETCH)
            .header(ACCEPT, JSON)
            .header(VERSION_HEADER, DEFAULT_API_VERSION)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::CsrfToken {
                message: format!(
                    "Failed to fetch CSRF token: {} {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or_default()
                ),
            });
        }

        let token = resp
            .headers()
            .get(CSRF_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::CsrfToken {
                message: "CSRF token not found in response headers.".into(),
            })?;

        trace!("CSRF token fetched");
        Ok(token.to_owned())
    }

    async fn send(
        &self,
        request: &ApiRequest,
        api_version: &str,
        csrf_token: &str,
    ) -> Result<RawResponse, Error> {
        let url = self.url(&request.resource_path)?;
        debug!("{} {url} params={:?}", request.verb, request.query);

        let mut builder = self
            .http
            .request(request.verb.as_method(), url)
            .header(CONTENT_TYPE, JSON)
            .header(ACCEPT, JSON)
            .header(CSRF_HEADER, csrf_token)
            .header(VERSION_HEADER, api_version);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = request.body.as_ref().filter(|_| request.verb.carries_body()) {
            builder = builder.json(body);
        }

        let resp = builder.send().await?;
        let status = resp.status();
        let status_text = status.canonical_reason().unwrap_or_default().to_owned();
        debug!("received {status}");

        // Error bodies are best-effort; a success body that cannot be read
        // is a transport failure.
        let body = if status.is_success() {
            Some(resp.text().await?)
        } else {
            resp.text().await.ok()
        };

        Ok(RawResponse {
            status: status.as_u16(),
            status_text,
            body,
        })
    }
}
