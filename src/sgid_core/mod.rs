pub mod constants;
pub mod error;
pub mod types;
pub mod config;
pub mod metadata;
pub mod http_client;
#[cfg(not(target_arch = "wasm32"))]
pub mod jwks;
#[cfg(not(target_arch = "wasm32"))]
pub mod id_token;
#[cfg(not(target_arch = "wasm32"))]
pub mod pkce;
pub mod browser;
pub mod key;
pub mod jwe;
pub mod data;
#[cfg(not(target_arch = "wasm32"))]
pub mod sgid_client;
