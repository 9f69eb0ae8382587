//! Error kinds surfaced by the sgID client.

use thiserror::Error;

use super::constants::{MAX_CODE_VERIFIER_LENGTH, MIN_CODE_VERIFIER_LENGTH};
use super::http_client::HttpClientError;

/// Every way an sgID operation can fail.
///
/// Configuration and usage mistakes, provider misbehaviour and cryptographic
/// failures each get their own variant so callers can tell "our key is wrong"
/// from "the payload is corrupted".
#[derive(Debug, Error)]
pub enum SgidError {
    #[error(
        "Code verifier should have a minimum length of {min} and a maximum length of {max}. Length of {length} was provided",
        min = MIN_CODE_VERIFIER_LENGTH,
        max = MAX_CODE_VERIFIER_LENGTH
    )]
    InvalidPkceLength { length: usize },

    #[error(
        "No redirect URI registered with this client. You must either specify a valid redirect URI in the client config, or pass it to the authorization_url and callback functions."
    )]
    MissingRedirectUri,

    #[error("A code challenge is required to build the authorization URL")]
    MissingCodeChallenge,

    #[error("A code verifier is required to exchange the authorization code")]
    MissingCodeVerifier,

    #[error("Invalid provider hostname '{0}'")]
    InvalidHostname(String),

    #[error("Secure random source unavailable")]
    Rng,

    #[error("Missing required configuration value {0}")]
    MissingConfig(&'static str),

    #[error("Authorization server did not return an ID token")]
    NoIdToken,

    #[error("Authorization server did not return the sub claim")]
    NoSubClaim,

    #[error("Authorization server did not return an access token")]
    NoAccessToken,

    #[error("ID token validation failed: {0}")]
    IdTokenValidation(String),

    #[error("Unable to load provider signing keys: {0}")]
    Jwks(String),

    #[error("HTTP request to sgID failed: {0}")]
    Http(#[source] HttpClientError),

    #[error("sgID responded with status {status}: {}", .error.as_deref().unwrap_or("unknown_error"))]
    Provider {
        status: u16,
        error: Option<String>,
        description: Option<String>,
    },

    #[error("Unexpected response from sgID: {0}")]
    InvalidResponse(String),

    #[error(
        "Sub returned by sgID did not match the sub passed to the userinfo method. Check that you passed the correct sub to the userinfo method."
    )]
    SubMismatch,

    #[error("Failed to import private key. Check that privateKey is a valid PKCS1 or PKCS8 key.")]
    PrivateKeyImport,

    #[error("Unable to decrypt or import payload key. Check that you used the correct private key.")]
    DecryptBlockKey,

    #[error("Unable to decrypt payload")]
    DecryptPayload,

    #[error("Userinfo data must be an object whose values are all strings")]
    InvalidUserinfoData,
}

#[cfg(not(target_arch = "wasm32"))]
impl From<jsonwebtoken::errors::Error> for SgidError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match e.kind() {
            ErrorKind::ExpiredSignature => SgidError::IdTokenValidation("token expired".into()),
            ErrorKind::InvalidSignature => SgidError::IdTokenValidation("invalid signature".into()),
            ErrorKind::InvalidIssuer => SgidError::IdTokenValidation("unexpected issuer".into()),
            ErrorKind::InvalidAudience => SgidError::IdTokenValidation("unexpected audience".into()),
            ErrorKind::MissingRequiredClaim(claim) => {
                SgidError::IdTokenValidation(format!("missing required claim '{}'", claim))
            }
            _ => SgidError::IdTokenValidation(e.to_string()),
        }
    }
}
