use std::sync::Arc;

use reqwest::cookie::Jar;
use secrecy::SecretString;
use url::Url;

/// Credentials for authenticating with a LogicMonitor portal.
///
/// Each variant carries the secret material needed for its auth flow.
/// The CSRF pre-flight runs for both; only the way the caller proves its
/// identity differs.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Cookie-based portal session. The jar is shared with the
    /// `reqwest::Client`, so cookies set by the portal (including on the
    /// CSRF pre-flight) are sent back on every later request.
    Session { cookie_jar: Arc<Jar> },

    /// API bearer token, sent as `Authorization: Bearer <token>`.
    /// Generated at: Settings > Users and Roles > API Tokens.
    Bearer { token: SecretString },
}

impl Credentials {
    /// An empty cookie session.
    pub fn session() -> Self {
        Self::Session {
            cookie_jar: Arc::new(Jar::default()),
        }
    }

    /// A cookie session seeded with a `Set-Cookie`-style string
    /// (e.g. `"JSESSIONID=abc123"`) scoped to `portal`.
    pub fn session_cookie(cookie: &str, portal: &Url) -> Self {
        let jar = Jar::default();
        jar.add_cookie_str(cookie, portal);
        Self::Session {
            cookie_jar: Arc::new(jar),
        }
    }

    pub fn bearer(token: impl Into<SecretString>) -> Self {
        Self::Bearer {
            token: token.into(),
        }
    }
}
