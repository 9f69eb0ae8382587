//! sgID request/response primitives: PKCE pair, scopes, call parameters and results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::constants::{DEFAULT_SCOPE, MAX_CODE_VERIFIER_LENGTH, MIN_CODE_VERIFIER_LENGTH};
use super::data::parse_data_value;
use super::error::SgidError;

/// A PKCE code verifier and its S256 challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PkcePair {
    /// Secret kept by the caller until the callback.
    pub code_verifier: String,
    /// Sent in the authorization request.
    pub code_challenge: String,
}

pub(crate) fn check_verifier_length(length: usize) -> Result<(), SgidError> {
    if !(MIN_CODE_VERIFIER_LENGTH..=MAX_CODE_VERIFIER_LENGTH).contains(&length) {
        return Err(SgidError::InvalidPkceLength { length });
    }
    Ok(())
}

/// Requested scopes, kept as an ordered list of names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scopes(Vec<String>);

impl Scopes {
    pub fn new(scopes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Scopes(scopes.into_iter().map(Into::into).collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn contains(&self, scope: &str) -> bool {
        self.0.iter().any(|s| s == scope)
    }

    /// Space-joined form used on the wire.
    pub fn to_query_value(&self) -> String {
        self.0.join(" ")
    }
}

impl Default for Scopes {
    fn default() -> Self {
        Scopes::from(DEFAULT_SCOPE)
    }
}

impl From<&str> for Scopes {
    fn from(scope: &str) -> Self {
        Scopes(scope.split_whitespace().map(str::to_string).collect())
    }
}

impl From<String> for Scopes {
    fn from(scope: String) -> Self {
        Scopes::from(scope.as_str())
    }
}

impl From<Vec<String>> for Scopes {
    fn from(scopes: Vec<String>) -> Self {
        Scopes(scopes)
    }
}

impl From<Vec<&str>> for Scopes {
    fn from(scopes: Vec<&str>) -> Self {
        Scopes::new(scopes)
    }
}

/// What to do about the `nonce` parameter of an authorization request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NonceParam {
    /// Generate a fresh nonce.
    #[default]
    Generate,
    /// Send this nonce.
    Use(String),
    /// Send no nonce at all.
    Omit,
}

/// Per-call inputs to [`SgidClient::authorization_url`](super::sgid_client::SgidClient::authorization_url).
#[derive(Debug, Clone, Default)]
pub struct AuthorizationUrlParams {
    /// Opaque CSRF binding value.
    pub state: String,
    /// Defaults to `myinfo.name openid`.
    pub scope: Option<Scopes>,
    pub nonce: NonceParam,
    /// Defaults to the first registered redirect URI.
    pub redirect_uri: Option<String>,
    /// S256 challenge of the caller's code verifier.
    pub code_challenge: Option<String>,
}

impl AuthorizationUrlParams {
    pub fn new(state: impl Into<String>, code_challenge: impl Into<String>) -> Self {
        AuthorizationUrlParams {
            state: state.into(),
            code_challenge: Some(code_challenge.into()),
            ..Default::default()
        }
    }

    pub fn scope(mut self, scope: impl Into<Scopes>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn nonce(mut self, nonce: NonceParam) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(redirect_uri.into());
        self
    }
}

/// A built authorization request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationUrl {
    pub url: String,
    /// Present exactly when the URL carries a nonce.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

/// Per-call inputs to [`SgidClient::callback`](super::sgid_client::SgidClient::callback).
#[derive(Debug, Clone, Default)]
pub struct CallbackParams {
    /// Authorization code from the redirect.
    pub code: String,
    /// Nonce used in the matching authorization request, if any.
    pub nonce: Option<String>,
    /// Must equal the one used in the authorization request.
    pub redirect_uri: Option<String>,
    pub code_verifier: Option<String>,
}

impl CallbackParams {
    pub fn new(code: impl Into<String>, code_verifier: impl Into<String>) -> Self {
        CallbackParams {
            code: code.into(),
            code_verifier: Some(code_verifier.into()),
            ..Default::default()
        }
    }

    pub fn nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    pub fn redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(redirect_uri.into());
        self
    }
}

/// Result of a successful code exchange.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    pub sub: String,
    pub access_token: String,
    /// The raw, verified ID token.
    pub id_token: String,
}

impl std::fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSet")
            .field("sub", &self.sub)
            .field("access_token", &"<redacted>")
            .field("id_token", &"<redacted>")
            .finish()
    }
}

/// Per-call inputs to [`SgidClient::userinfo`](super::sgid_client::SgidClient::userinfo).
#[derive(Clone)]
pub struct UserInfoParams {
    /// Subject obtained from the code exchange.
    pub sub: String,
    pub access_token: String,
}

impl UserInfoParams {
    pub fn new(sub: impl Into<String>, access_token: impl Into<String>) -> Self {
        UserInfoParams { sub: sub.into(), access_token: access_token.into() }
    }
}

impl From<&TokenSet> for UserInfoParams {
    fn from(tokens: &TokenSet) -> Self {
        UserInfoParams::new(tokens.sub.clone(), tokens.access_token.clone())
    }
}

/// Decrypted user attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub sub: String,
    /// Claim name to plaintext value.
    pub data: BTreeMap<String, String>,
}

impl UserInfo {
    /// `data` with bracket/brace-wrapped JSON values parsed into structure.
    pub fn parsed_data(&self) -> BTreeMap<String, serde_json::Value> {
        self.data
            .iter()
            .map(|(k, v)| (k.clone(), parse_data_value(v)))
            .collect()
    }
}

/// Token endpoint response body.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
}

/// OAuth error body returned with non-2xx statuses.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ProviderErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Userinfo endpoint response body.
#[derive(Debug, Deserialize)]
pub(crate) struct UserInfoResponse {
    #[serde(default)]
    pub sub: Option<String>,
    /// RSA-OAEP-256 JWE carrying the payload key as an `oct` JWK.
    #[serde(default)]
    pub key: Option<String>,
    /// Claim name to JWE under the payload key.
    #[serde(default)]
    pub data: Option<BTreeMap<String, String>>,
}
