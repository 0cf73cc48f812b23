//! Profile configuration for LogicMonitor API clients.
//!
//! TOML profiles layered with `LOGICMON_` environment variables, credential
//! resolution (env + plaintext + session cookie), and translation into a
//! ready `LmClient`. Configuration is read-only: nothing is written back.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use logicmon_api::{Credentials, HttpTransport, LmClient, TlsMode, TransportConfig};

/// Environment variable consulted for a bearer token when the profile
/// names none of its own.
pub const BEARER_TOKEN_ENV: &str = "LOGICMON_BEARER_TOKEN";

const ENV_PREFIX: &str = "LOGICMON_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("client setup failed: {0}")]
    Api(#[from] logicmon_api::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when the caller names none.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named portal profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_api_version")]
    pub api_version: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            insecure: false,
            api_version: default_api_version(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}
fn default_api_version() -> String {
    "3".into()
}

/// A named portal profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Company name (`"acme"`) or full portal URL.
    pub portal: String,

    /// API bearer token (plaintext, prefer `bearer_token_env`).
    pub bearer_token: Option<String>,

    /// Environment variable name containing the bearer token.
    pub bearer_token_env: Option<String>,

    /// Session cookie, e.g. `"JSESSIONID=..."`.
    pub session_cookie: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout.
    pub timeout: Option<u64>,

    /// Override API version.
    pub api_version: Option<String>,
}

impl Config {
    /// Look up a profile by name, falling back to `default_profile`.
    pub fn profile(&self, name: Option<&str>) -> Result<(&str, &Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");

        self.profiles
            .get_key_value(name)
            .map(|(k, p)| (k.as_str(), p))
            .ok_or_else(|| ConfigError::Validation {
                field: "profile".into(),
                reason: format!("no profile named '{name}'"),
            })
    }
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the config from defaults, an optional TOML file, then environment.
///
/// Environment keys nest with `__`, e.g.
/// `LOGICMON_PROFILES__PROD__PORTAL=acme`. A file that was named but does
/// not exist is an error.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

    if let Some(path) = path {
        if !path.is_file() {
            return Err(ConfigError::Validation {
                field: "config".into(),
                reason: format!("file not found: {}", path.display()),
            });
        }
        debug!("loading config from {}", path.display());
        figment = figment.merge(Toml::file(path));
    }

    let config: Config = figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()?;
    Ok(config)
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve credentials for a profile.
///
/// Order: the profile's `bearer_token_env` variable, then
/// `LOGICMON_BEARER_TOKEN`, then plaintext `bearer_token`, then
/// `session_cookie`.
pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<Credentials, ConfigError> {
    // 1. Profile's bearer_token_env → env var lookup
    if let Some(token) = profile.bearer_token_env.as_deref().and_then(read_env) {
        debug!(profile = profile_name, "using bearer token from profile env var");
        return Ok(Credentials::bearer(token));
    }

    // 2. Well-known env var
    if let Some(token) = read_env(BEARER_TOKEN_ENV) {
        debug!(profile = profile_name, "using bearer token from {BEARER_TOKEN_ENV}");
        return Ok(Credentials::bearer(token));
    }

    // 3. Plaintext in config
    if let Some(token) = profile.bearer_token.as_deref().filter(|t| !t.is_empty()) {
        return Ok(Credentials::bearer(SecretString::from(token.to_owned())));
    }

    // 4. Session cookie
    if let Some(cookie) = profile.session_cookie.as_deref().filter(|c| !c.is_empty()) {
        let portal = logicmon_api::normalize_base_url(&profile.portal)?;
        return Ok(Credentials::session_cookie(cookie, &portal));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

fn read_env(name: &str) -> Option<SecretString> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .map(SecretString::from)
}

// ── Client construction ─────────────────────────────────────────────

/// Transport settings for a profile, with profile overrides over defaults.
pub fn transport_config(profile: &Profile, defaults: &Defaults) -> TransportConfig {
    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    };

    TransportConfig {
        tls,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
    }
}

/// Build a client for the named profile (or the default one).
pub fn build_client(
    config: &Config,
    profile: Option<&str>,
) -> Result<LmClient<HttpTransport>, ConfigError> {
    let (name, profile) = config.profile(profile)?;

    if profile.portal.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "portal".into(),
            reason: format!("profile '{name}' has no portal"),
        });
    }

    let credentials = resolve_credentials(profile, name)?;
    let transport = transport_config(profile, &config.defaults);
    let version = profile
        .api_version
        .clone()
        .unwrap_or_else(|| config.defaults.api_version.clone());

    debug!(profile = name, portal = %profile.portal, "building client");
    let client = LmClient::new(&profile.portal, &credentials, &transport)?;
    Ok(client.with_api_version(version))
}
