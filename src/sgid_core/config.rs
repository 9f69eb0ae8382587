//! Client registration settings.

use serde::Deserialize;

use super::constants::DEFAULT_HOSTNAME;
use super::error::SgidError;

pub const ENV_CLIENT_ID: &str = "SGID_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "SGID_CLIENT_SECRET";
pub const ENV_PRIVATE_KEY: &str = "SGID_PRIVATE_KEY";
/// Comma separated; the first entry becomes the default redirect URI.
pub const ENV_REDIRECT_URI: &str = "SGID_REDIRECT_URI";
pub const ENV_HOSTNAME: &str = "SGID_HOSTNAME";

fn default_hostname() -> String {
    DEFAULT_HOSTNAME.to_string()
}

/// Immutable relying-party registration, fixed at client construction.
#[derive(Clone, Deserialize)]
pub struct ClientConfig {
    /// Client ID issued at registration.
    pub client_id: String,
    /// Client secret issued at registration.
    pub client_secret: String,
    /// PKCS1 or PKCS8 PEM; literal `\n` sequences are accepted.
    pub private_key: String,
    /// Registered redirect URIs. The first one is the default.
    #[serde(default)]
    pub redirect_uris: Vec<String>,
    /// Provider base URL. Only its origin is used.
    #[serde(default = "default_hostname")]
    pub hostname: String,
}

impl ClientConfig {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        private_key: impl Into<String>,
    ) -> Self {
        ClientConfig {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            private_key: private_key.into(),
            redirect_uris: Vec::new(),
            hostname: default_hostname(),
        }
    }

    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uris.push(redirect_uri.into());
        self
    }

    pub fn with_redirect_uris(mut self, redirect_uris: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.redirect_uris.extend(redirect_uris.into_iter().map(Into::into));
        self
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    pub fn default_redirect_uri(&self) -> Option<&str> {
        self.redirect_uris.first().map(String::as_str)
    }

    /// Read the configuration from `SGID_*` environment variables.
    pub fn from_env() -> Result<Self, SgidError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SgidError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(SgidError::MissingConfig(name))
        };
        let mut config = ClientConfig::new(
            required(ENV_CLIENT_ID)?,
            required(ENV_CLIENT_SECRET)?,
            required(ENV_PRIVATE_KEY)?,
        );
        if let Some(uris) = lookup(ENV_REDIRECT_URI) {
            config = config.with_redirect_uris(
                uris.split(',').map(str::trim).filter(|u| !u.is_empty()),
            );
        }
        if let Some(hostname) = lookup(ENV_HOSTNAME).filter(|h| !h.trim().is_empty()) {
            config.hostname = hostname.trim().to_string();
        }
        Ok(config)
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("private_key", &"<redacted>")
            .field("redirect_uris", &self.redirect_uris)
            .field("hostname", &self.hostname)
            .finish()
    }
}
