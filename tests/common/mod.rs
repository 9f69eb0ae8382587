#![allow(dead_code)]

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use rsa::pkcs8::DecodePrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde_json::{Value, json};
use sgid_client::sgid_core::jwe::{self, ContentEncryption, EncryptionKey, KeyManagement, SymmetricKey};
use sgid_client::{ClientConfig, InMemoryHttpClient, SgidClient};
use sgid_lib::base64url_encode;

pub const HOSTNAME: &str = "https://id.sgid.com";
pub const ISSUER: &str = "https://id.sgid.com/v2";
pub const AUTHORIZATION_ENDPOINT: &str = "https://id.sgid.com/v2/oauth/authorize";
pub const TOKEN_ENDPOINT: &str = "https://id.sgid.com/v2/oauth/token";
pub const USERINFO_ENDPOINT: &str = "https://id.sgid.com/v2/oauth/userinfo";
pub const JWKS_URI: &str = "https://id.sgid.com/v2/.well-known/jwks.json";

pub const CLIENT_ID: &str = "mockClientId";
pub const CLIENT_SECRET: &str = "mockClientSecret";
pub const REDIRECT_URI: &str = "https://sgid.com/callback";
pub const SUB: &str = "mockSub";
pub const ACCESS_TOKEN: &str = "mockAccessToken";
pub const NONCE: &str = "mockNonce";
pub const CODE: &str = "mockAuthCode";
pub const CODE_VERIFIER: &str = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
pub const PROVIDER_KID: &str = "provider-key-1";

pub const CLIENT_KEY_PKCS1: &str = include_str!("../fixtures/client_private_pkcs1.pem");
pub const CLIENT_KEY_PKCS8: &str = include_str!("../fixtures/client_private_pkcs8.pem");
pub const PROVIDER_KEY: &str = include_str!("../fixtures/provider_signing_key.pem");

pub const MOCK_BLOCK_KEY: &str = r#"{"kty":"oct","alg":"A128GCM","k":"kMnXcwOisOQskMlIu5oqVA"}"#;

pub fn config() -> ClientConfig {
    config_with_key(CLIENT_KEY_PKCS8)
}

pub fn config_with_key(private_key: &str) -> ClientConfig {
    ClientConfig::new(CLIENT_ID, CLIENT_SECRET, private_key)
        .with_redirect_uri(REDIRECT_URI)
        .with_hostname(HOSTNAME)
}

/// A client on an in-memory transport that already serves the provider JWKS.
pub fn mock_client(config: ClientConfig) -> (SgidClient<InMemoryHttpClient>, InMemoryHttpClient) {
    let http = InMemoryHttpClient::new();
    http.insert_json(JWKS_URI, 200, jwks());
    let client = SgidClient::with_http_client(config, http.clone()).unwrap();
    (client, http)
}

pub fn jwks() -> Value {
    let key = RsaPrivateKey::from_pkcs8_pem(PROVIDER_KEY).unwrap();
    json!({
        "keys": [{
            "kty": "RSA",
            "use": "sig",
            "alg": "RS256",
            "kid": PROVIDER_KID,
            "n": base64url_encode(&key.n().to_bytes_be()),
            "e": base64url_encode(&key.e().to_bytes_be()),
        }]
    })
}

pub fn id_token_claims(sub: &str) -> Value {
    let now = Utc::now().timestamp();
    json!({
        "iss": ISSUER,
        "sub": sub,
        "aud": CLIENT_ID,
        "iat": now,
        "exp": now + 300,
        "nonce": NONCE,
    })
}

pub fn mint_id_token(claims: &Value) -> String {
    mint_id_token_with_key(claims, PROVIDER_KEY)
}

pub fn mint_id_token_with_key(claims: &Value, pem: &str) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(PROVIDER_KID.to_string());
    encode(&header, claims, &EncodingKey::from_rsa_pem(pem.as_bytes()).unwrap()).unwrap()
}

pub fn token_response(access_token: Option<&str>, id_token: Option<String>) -> Value {
    let mut body = json!({"token_type": "Bearer", "expires_in": 3600, "scope": "openid myinfo.name"});
    if let Some(token) = access_token {
        body["access_token"] = json!(token);
    }
    if let Some(token) = id_token {
        body["id_token"] = json!(token);
    }
    body
}

pub fn client_public_key() -> RsaPublicKey {
    RsaPublicKey::from(&RsaPrivateKey::from_pkcs8_pem(CLIENT_KEY_PKCS8).unwrap())
}

/// The payload key JWE as sgID sends it: RSA-OAEP-256 / A256GCM to the client key.
pub fn encrypted_payload_key() -> String {
    encrypt_for_client(MOCK_BLOCK_KEY.as_bytes())
}

pub fn encrypt_for_client(plaintext: &[u8]) -> String {
    jwe::encrypt(
        plaintext,
        EncryptionKey::Rsa(&client_public_key()),
        KeyManagement::RsaOaep256,
        ContentEncryption::A256Gcm,
    )
    .unwrap()
}

pub fn block_key() -> SymmetricKey {
    SymmetricKey::from_jwk_json(MOCK_BLOCK_KEY.as_bytes()).unwrap()
}

/// A claim value as sgID sends it: A128GCMKW / A128GCM under the payload key.
pub fn encrypt_claim(value: &str) -> String {
    jwe::encrypt(
        value.as_bytes(),
        EncryptionKey::Symmetric(&block_key()),
        KeyManagement::A128GcmKw,
        ContentEncryption::A128Gcm,
    )
    .unwrap()
}

pub fn userinfo_body(sub: &str, claims: &[(&str, &str)]) -> Value {
    let data: serde_json::Map<String, Value> = claims
        .iter()
        .map(|(k, v)| (k.to_string(), json!(encrypt_claim(v))))
        .collect();
    json!({"sub": sub, "key": encrypted_payload_key(), "data": data})
}
