//! Relying-party client for sgID, Singapore's government OIDC identity provider.
//!
//! On `wasm32` the client and ID token verification are left out, and the PKCE
//! and nonce helpers come from [`sgid_core::browser`].
//!
//! ```no_run
//! # async fn login() -> Result<(), sgid_client::SgidError> {
//! use sgid_client::{AuthorizationUrlParams, CallbackParams, ClientConfig, SgidClient, UserInfoParams};
//!
//! let client = SgidClient::new(ClientConfig::from_env()?)?;
//!
//! let pkce = sgid_client::generate_default_pkce_pair()?;
//! let auth = client.authorization_url(AuthorizationUrlParams::new("state", &pkce.code_challenge))?;
//! // redirect the user to auth.url, keep pkce.code_verifier and auth.nonce in the session
//!
//! let mut callback = CallbackParams::new("code-from-redirect", pkce.code_verifier);
//! callback.nonce = auth.nonce;
//! let tokens = client.callback(callback).await?;
//! let info = client.userinfo(UserInfoParams::from(&tokens)).await?;
//! println!("{:?}", info.parsed_data());
//! # Ok(())
//! # }
//! ```

pub mod sgid_core;

pub use sgid_core::config::ClientConfig;
pub use sgid_core::data::{parse_data, parse_data_value};
pub use sgid_core::error::SgidError;
pub use sgid_core::http_client::{HttpClientError, HttpMethod, HttpRequest, HttpResponse, InMemoryHttpClient, SgidHttpClient};
#[cfg(all(feature = "reqwest", not(target_arch = "wasm32")))]
pub use sgid_core::http_client::ReqwestHttpClient;
pub use sgid_core::key::convert_to_pkcs8;
pub use sgid_core::metadata::ProviderMetadata;
#[cfg(not(target_arch = "wasm32"))]
pub use sgid_core::pkce::{
    generate_code_challenge, generate_code_verifier, generate_default_pkce_pair, generate_nonce,
    generate_nonce_with_length, generate_pkce_pair,
};
#[cfg(target_arch = "wasm32")]
pub use sgid_core::browser::{
    generate_code_challenge, generate_code_verifier, generate_default_pkce_pair, generate_nonce,
    generate_nonce_with_length, generate_pkce_pair,
};
#[cfg(not(target_arch = "wasm32"))]
pub use sgid_core::sgid_client::SgidClient;
pub use sgid_core::types::{
    AuthorizationUrl, AuthorizationUrlParams, CallbackParams, NonceParam, PkcePair, Scopes, TokenSet, UserInfo,
    UserInfoParams,
};
