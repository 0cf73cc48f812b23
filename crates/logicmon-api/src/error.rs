use thiserror::Error;

/// Top-level error type for the `logicmon-api` crate.
///
/// Four classes of failure, each distinguishable by variant:
/// validation (`MissingParameter`), unresolved dependencies in a lookup
/// chain (`Unresolved`), API responses that carry an HTTP status (`Api`,
/// `MalformedBody`), and transport failures that do not.
#[derive(Debug, Error)]
pub enum Error {
    // ── Validation ──────────────────────────────────────────────────
    /// A required identifying parameter was not supplied.
    #[error("{message}")]
    MissingParameter { message: String },

    /// A name lookup came back empty while a later step still needed its ID.
    #[error("{message}")]
    Unresolved { message: String },

    // ── API responses ───────────────────────────────────────────────
    /// Non-2xx response. `body` is the raw response text.
    #[error("API Error: {status} {status_text}")]
    Api {
        status: u16,
        status_text: String,
        body: String,
    },

    /// 2xx response whose body could not be decoded.
    #[error(
        "Successfully received response ({status}), but failed to parse JSON body. Original error: {message}"
    )]
    MalformedBody {
        status: u16,
        status_text: String,
        message: String,
        body: String,
    },

    // ── Transport ───────────────────────────────────────────────────
    /// Credential material could not be turned into request headers.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The CSRF pre-flight failed or returned no token.
    #[error("{message}")]
    CsrfToken { message: String },

    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// A request body could not be encoded as JSON.
    #[error("Invalid request body. Could not encode to JSON: {message}")]
    Serialization { message: String },
}

impl Error {
    pub(crate) fn missing(message: impl Into<String>) -> Self {
        Self::MissingParameter {
            message: message.into(),
        }
    }

    pub(crate) fn unresolved(message: impl Into<String>) -> Self {
        Self::Unresolved {
            message: message.into(),
        }
    }

    /// The HTTP status of the response that caused this error, if one was
    /// received. Transport-class errors never carry a status.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } | Self::MalformedBody { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The HTTP status text alongside [`status`](Self::status).
    pub fn status_text(&self) -> Option<&str> {
        match self {
            Self::Api { status_text, .. } | Self::MalformedBody { status_text, .. } => {
                Some(status_text)
            }
            _ => None,
        }
    }

    /// The raw response body, for API and malformed-body errors.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Api { body, .. } | Self::MalformedBody { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Returns `true` if the API answered 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }

    /// Returns `true` for network, pre-flight and client-setup failures.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::CsrfToken { .. } | Self::Transport(_) | Self::InvalidUrl(_) | Self::Tls(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_exposes_status_context() {
        let err = Error::Api {
            status: 403,
            status_text: "Forbidden".into(),
            body: "{\"errorMessage\":\"denied\"}".into(),
        };
        assert_eq!(err.status(), Some(403));
        assert_eq!(err.status_text(), Some("Forbidden"));
        assert_eq!(err.body(), Some("{\"errorMessage\":\"denied\"}"));
        assert_eq!(err.to_string(), "API Error: 403 Forbidden");
        assert!(!err.is_not_found());
        assert!(!err.is_transport());
    }

    #[test]
    fn transport_class_has_no_status() {
        let err = Error::CsrfToken {
            message: "CSRF token not found in response headers.".into(),
        };
        assert_eq!(err.status(), None);
        assert!(err.is_transport());

        let err = Error::missing("deviceId is required");
        assert_eq!(err.status(), None);
        assert!(!err.is_transport());
    }

    #[test]
    fn not_found_only_for_404() {
        let err = Error::Api {
            status: 404,
            status_text: "Not Found".into(),
            body: String::new(),
        };
        assert!(err.is_not_found());
    }
}
