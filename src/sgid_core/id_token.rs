//! RS256 ID token verification against the provider's published keys.

use jsonwebtoken::{Algorithm, Validation, decode, decode_header};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::error::SgidError;
use super::http_client::SgidHttpClient;
use super::jwks::JwksCache;

/// Clock skew tolerance for `exp`, in seconds.
pub const ID_TOKEN_LEEWAY_SECS: u64 = 60;

/// The ID token claims the client reads after verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdTokenClaims {
    pub iss: String,
    #[serde(default)]
    pub sub: Option<String>,
    pub exp: u64,
    #[serde(default)]
    pub iat: Option<u64>,
    #[serde(default)]
    pub nonce: Option<String>,
}

/// Checks signature, `alg`, `iss`, `aud`, `exp` and `nonce`.
#[derive(Clone)]
pub struct IdTokenVerifier<C: SgidHttpClient> {
    issuer: String,
    client_id: String,
    jwks: JwksCache<C>,
}

impl<C: SgidHttpClient> IdTokenVerifier<C> {
    pub fn new(issuer: impl Into<String>, client_id: impl Into<String>, jwks: JwksCache<C>) -> Self {
        IdTokenVerifier {
            issuer: issuer.into(),
            client_id: client_id.into(),
            jwks,
        }
    }

    /// Verify `token`. `expected_nonce` must equal the token's `nonce`
    /// claim; both being absent is accepted.
    #[instrument(skip(self, token, expected_nonce), level = "debug")]
    pub async fn verify(&self, token: &str, expected_nonce: Option<&str>) -> Result<IdTokenClaims, SgidError> {
        let header = decode_header(token)?;
        if header.alg != Algorithm::RS256 {
            return Err(SgidError::IdTokenValidation(format!(
                "unexpected algorithm {:?}",
                header.alg
            )));
        }
        let key = self.jwks.get(header.kid.as_deref()).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_audience(&[self.client_id.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation.leeway = ID_TOKEN_LEEWAY_SECS;

        let claims = decode::<IdTokenClaims>(token, &key, &validation)?.claims;
        if claims.nonce.as_deref() != expected_nonce {
            return Err(SgidError::IdTokenValidation("nonce mismatch".to_string()));
        }
        Ok(claims)
    }
}
