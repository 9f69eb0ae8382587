use std::collections::BTreeMap;
use std::time::Duration;

use sgid_lib::encode_form;
use tracing::{debug, instrument};
use zeroize::Zeroizing;

use super::config::ClientConfig;
use super::constants::{CODE_CHALLENGE_METHOD, JWKS_TTL_SECS, RESPONSE_TYPE};
use super::error::SgidError;
use super::http_client::{HttpRequest, HttpResponse, SgidHttpClient};
use super::id_token::IdTokenVerifier;
use super::jwe::{self, DecryptionKey, SymmetricKey};
use super::jwks::JwksCache;
use super::key::ClientPrivateKey;
use super::metadata::ProviderMetadata;
use super::pkce::generate_nonce;
use super::types::{
    AuthorizationUrl, AuthorizationUrlParams, CallbackParams, NonceParam, ProviderErrorBody, TokenResponse,
    TokenSet, UserInfo, UserInfoParams, UserInfoResponse,
};

#[cfg(feature = "reqwest")]
use super::http_client::ReqwestHttpClient;

/// sgID relying-party client.
///
/// Holds the immutable registration and talks to the provider through `C`.
/// Cloning is cheap and clones share the signing key cache.
#[derive(Clone)]
pub struct SgidClient<C: SgidHttpClient> {
    client_id: String,
    client_secret: Zeroizing<String>,
    private_key: ClientPrivateKey,
    redirect_uris: Vec<String>,
    metadata: ProviderMetadata,
    http: C,
    verifier: IdTokenVerifier<C>,
}

#[cfg(feature = "reqwest")]
impl SgidClient<ReqwestHttpClient> {
    /// Creates a client using the default `reqwest` transport.
    pub fn new(config: ClientConfig) -> Result<Self, SgidError> {
        Self::with_http_client(config, ReqwestHttpClient::new())
    }
}

impl<C: SgidHttpClient> SgidClient<C> {
    /// Creates a client on top of a caller-supplied transport.
    ///
    /// Fails only on an unusable hostname; key material is checked on first decrypt.
    pub fn with_http_client(config: ClientConfig, http: C) -> Result<Self, SgidError> {
        let metadata = ProviderMetadata::from_hostname(&config.hostname)?;
        let jwks = JwksCache::new(
            http.clone(),
            metadata.jwks_uri.clone(),
            Duration::from_secs(JWKS_TTL_SECS),
        );
        let verifier = IdTokenVerifier::new(metadata.issuer.clone(), config.client_id.clone(), jwks);
        Ok(SgidClient {
            private_key: ClientPrivateKey::new(&config.private_key),
            client_secret: Zeroizing::new(config.client_secret),
            client_id: config.client_id,
            redirect_uris: config.redirect_uris,
            metadata,
            http,
            verifier,
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn metadata(&self) -> &ProviderMetadata {
        &self.metadata
    }

    fn resolve_redirect_uri(&self, redirect_uri: Option<String>) -> Result<String, SgidError> {
        redirect_uri
            .or_else(|| self.redirect_uris.first().cloned())
            .ok_or(SgidError::MissingRedirectUri)
    }

    /// Builds the URL to send the user to for login.
    pub fn authorization_url(&self, params: AuthorizationUrlParams) -> Result<AuthorizationUrl, SgidError> {
        let redirect_uri = self.resolve_redirect_uri(params.redirect_uri)?;
        let code_challenge = params
            .code_challenge
            .filter(|c| !c.is_empty())
            .ok_or(SgidError::MissingCodeChallenge)?;
        let scope = params.scope.unwrap_or_default().to_query_value();
        let nonce = match params.nonce {
            NonceParam::Generate => Some(generate_nonce()?),
            NonceParam::Use(nonce) => Some(nonce),
            NonceParam::Omit => None,
        };

        let mut query = vec![
            ("client_id", self.client_id.as_str()),
            ("scope", scope.as_str()),
            ("response_type", RESPONSE_TYPE),
            ("redirect_uri", redirect_uri.as_str()),
            ("state", params.state.as_str()),
        ];
        if let Some(nonce) = &nonce {
            query.push(("nonce", nonce.as_str()));
        }
        query.push(("code_challenge", code_challenge.as_str()));
        query.push(("code_challenge_method", CODE_CHALLENGE_METHOD));

        let url = format!("{}?{}", self.metadata.authorization_endpoint, encode_form(&query));
        Ok(AuthorizationUrl { url, nonce })
    }

    /// Exchanges an authorization code for the user's `sub` and access token.
    ///
    /// Not retried: authorization codes are single use.
    #[instrument(skip(self, params), level = "debug")]
    pub async fn callback(&self, params: CallbackParams) -> Result<TokenSet, SgidError> {
        let code_verifier = params
            .code_verifier
            .filter(|v| !v.is_empty())
            .ok_or(SgidError::MissingCodeVerifier)?;
        let redirect_uri = self.resolve_redirect_uri(params.redirect_uri)?;

        let body = encode_form(&[
            ("grant_type", "authorization_code"),
            ("code", params.code.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code_verifier", code_verifier.as_str()),
        ]);
        debug!(endpoint = %self.metadata.token_endpoint, "exchanging authorization code");
        let response = self
            .http
            .execute(HttpRequest::post_form(self.metadata.token_endpoint.clone(), body))
            .await
            .map_err(SgidError::Http)?;
        if !response.is_success() {
            return Err(provider_error(&response));
        }
        let tokens: TokenResponse =
            serde_json::from_slice(&response.body).map_err(|e| SgidError::InvalidResponse(e.to_string()))?;

        let id_token = tokens.id_token.filter(|t| !t.is_empty()).ok_or(SgidError::NoIdToken)?;
        let claims = self.verifier.verify(&id_token, params.nonce.as_deref()).await?;
        let sub = claims.sub.filter(|s| !s.is_empty()).ok_or(SgidError::NoSubClaim)?;
        let access_token = tokens
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(SgidError::NoAccessToken)?;

        debug!("authorization code exchanged");
        Ok(TokenSet { sub, access_token, id_token })
    }

    /// Fetches and decrypts the user's data.
    ///
    /// The returned `sub` must match `params.sub` before anything is decrypted.
    /// Decryption is all-or-nothing.
    #[instrument(skip(self, params), level = "debug")]
    pub async fn userinfo(&self, params: UserInfoParams) -> Result<UserInfo, SgidError> {
        debug!(endpoint = %self.metadata.userinfo_endpoint, "fetching userinfo");
        let request = HttpRequest::get(self.metadata.userinfo_endpoint.clone())
            .with_header("Authorization", format!("Bearer {}", params.access_token));
        let response = self.http.execute(request).await.map_err(SgidError::Http)?;
        if !response.is_success() {
            return Err(provider_error(&response));
        }
        let body: UserInfoResponse =
            serde_json::from_slice(&response.body).map_err(|e| SgidError::InvalidResponse(e.to_string()))?;

        if body.sub.as_deref() != Some(params.sub.as_str()) {
            return Err(SgidError::SubMismatch);
        }
        let (encrypted_key, encrypted_data) = match (body.key, body.data) {
            (Some(key), Some(data)) => (key, data),
            _ => {
                return Ok(UserInfo { sub: params.sub, data: BTreeMap::new() });
            }
        };

        let private_key = self.private_key.import()?;
        let block_key = decrypt_block_key(&private_key, &encrypted_key)?;
        let data = decrypt_data(&block_key, encrypted_data)?;

        debug!(claims = data.len(), "userinfo decrypted");
        Ok(UserInfo { sub: params.sub, data })
    }
}

impl<C: SgidHttpClient> std::fmt::Debug for SgidClient<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SgidClient")
            .field("client_id", &self.client_id)
            .field("redirect_uris", &self.redirect_uris)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

fn provider_error(response: &HttpResponse) -> SgidError {
    let body: ProviderErrorBody = serde_json::from_slice(&response.body).unwrap_or_default();
    SgidError::Provider {
        status: response.status,
        error: body.error,
        description: body.error_description,
    }
}

/// Unwrap the payload key. Decrypt, parse and import failures are not told apart.
fn decrypt_block_key(private_key: &rsa::RsaPrivateKey, encrypted_key: &str) -> Result<SymmetricKey, SgidError> {
    let jwk = Zeroizing::new(
        jwe::decrypt(encrypted_key, DecryptionKey::Rsa(private_key)).map_err(|_| SgidError::DecryptBlockKey)?,
    );
    SymmetricKey::from_jwk_json(&jwk).map_err(|_| SgidError::DecryptBlockKey)
}

fn decrypt_data(
    block_key: &SymmetricKey,
    encrypted_data: BTreeMap<String, String>,
) -> Result<BTreeMap<String, String>, SgidError> {
    encrypted_data
        .into_iter()
        .map(|(name, ciphertext)| {
            let plaintext = jwe::decrypt(&ciphertext, DecryptionKey::Symmetric(block_key))
                .map_err(|_| SgidError::DecryptPayload)?;
            let value = String::from_utf8(plaintext).map_err(|_| SgidError::DecryptPayload)?;
            Ok((name, value))
        })
        .collect()
}
