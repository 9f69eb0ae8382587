//! sgID provider endpoints, derived from the configured hostname.

use serde::{Deserialize, Serialize};
use url::Url;

use super::constants::API_VERSION;
use super::error::SgidError;

/// The discovery document fields the client needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMetadata {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub userinfo_endpoint: String,
    pub jwks_uri: String,
}

impl ProviderMetadata {
    /// Issuer is `{origin}/v2`; endpoints hang off the issuer.
    pub fn from_hostname(hostname: &str) -> Result<Self, SgidError> {
        let url = Url::parse(hostname.trim()).map_err(|_| SgidError::InvalidHostname(hostname.to_string()))?;
        let origin = url.origin();
        if !origin.is_tuple() {
            return Err(SgidError::InvalidHostname(hostname.to_string()));
        }
        let issuer = format!("{}/v{}", origin.ascii_serialization(), API_VERSION);
        Ok(ProviderMetadata {
            authorization_endpoint: format!("{}/oauth/authorize", issuer),
            token_endpoint: format!("{}/oauth/token", issuer),
            userinfo_endpoint: format!("{}/oauth/userinfo", issuer),
            jwks_uri: format!("{}/.well-known/jwks.json", issuer),
            issuer,
        })
    }
}
