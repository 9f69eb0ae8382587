//! JWKS caching for RS256 ID token validation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use jsonwebtoken::DecodingKey;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use super::constants::JWKS_REFETCH_COOLDOWN_SECS;
use super::error::SgidError;
use super::http_client::{HttpRequest, SgidHttpClient};

/// A JWK as represented in a JWKS endpoint.
#[derive(Debug, Deserialize)]
struct Jwk {
    kty: String,
    kid: Option<String>,
    #[serde(rename = "use")]
    use_: Option<String>,
    #[serde(default)]
    n: String,
    #[serde(default)]
    e: String,
}

/// A JWKS response containing multiple keys.
#[derive(Debug, Deserialize)]
struct JwkSet {
    keys: Vec<Jwk>,
}

/// Provider signing keys, fetched on first use and refreshed when stale
/// or when a token names a `kid` that is not cached.
///
/// Unknown-`kid` refreshes are rate limited by `refetch_cooldown`, so a stream
/// of tokens with made-up `kid`s cannot hammer the JWKS endpoint.
/// Keys published without a `kid` are stored under the empty string.
#[derive(Clone)]
pub struct JwksCache<C: SgidHttpClient> {
    client: C,
    uri: String,
    keys: Arc<DashMap<String, (String, String)>>,
    ttl: Duration,
    refetch_cooldown: Duration,
    last_refresh: Arc<RwLock<Option<Instant>>>,
}

impl<C: SgidHttpClient> JwksCache<C> {
    pub fn new(client: C, uri: impl Into<String>, ttl: Duration) -> Self {
        JwksCache {
            client,
            uri: uri.into(),
            keys: Arc::new(DashMap::new()),
            ttl,
            refetch_cooldown: Duration::from_secs(JWKS_REFETCH_COOLDOWN_SECS),
            last_refresh: Arc::new(RwLock::new(None)),
        }
    }

    pub fn with_refetch_cooldown(mut self, cooldown: Duration) -> Self {
        self.refetch_cooldown = cooldown;
        self
    }

    #[instrument(skip(self), fields(uri = %self.uri), level = "debug")]
    async fn fetch_and_store(&self) -> Result<(), SgidError> {
        let resp = self
            .client
            .execute(HttpRequest::get(self.uri.clone()))
            .await
            .map_err(|e| SgidError::Jwks(e.to_string()))?;
        if !resp.is_success() {
            return Err(SgidError::Jwks(format!("status {}", resp.status)));
        }
        let jwks: JwkSet =
            serde_json::from_slice(&resp.body).map_err(|e| SgidError::Jwks(e.to_string()))?;
        self.keys.clear();
        for jwk in jwks.keys {
            if jwk.kty != "RSA" || jwk.use_.as_deref().is_some_and(|u| u != "sig") {
                continue;
            }
            self.keys.insert(jwk.kid.unwrap_or_default(), (jwk.n, jwk.e));
        }
        *self.last_refresh.write().await = Some(Instant::now());
        debug!(keys = self.keys.len(), "refreshed provider signing keys");
        Ok(())
    }

    async fn refreshed_within(&self, window: Duration) -> bool {
        matches!(*self.last_refresh.read().await, Some(at) if at.elapsed() < window)
    }

    /// Get the DecodingKey for `kid`, refreshing the cache if expired or missing.
    ///
    /// Without a `kid` the key is only resolvable when exactly one key is published.
    #[instrument(skip(self), level = "debug")]
    pub async fn get(&self, kid: Option<&str>) -> Result<DecodingKey, SgidError> {
        if !self.refreshed_within(self.ttl).await {
            self.fetch_and_store().await?;
        } else if kid.is_some_and(|k| !self.keys.contains_key(k)) {
            if self.refreshed_within(self.refetch_cooldown).await {
                debug!("unknown kid within refetch cooldown; not refreshing");
            } else {
                self.fetch_and_store().await?;
            }
        }
        let components = match kid {
            Some(k) => self.keys.get(k).map(|entry| entry.value().clone()),
            None if self.keys.len() == 1 => self.keys.iter().next().map(|entry| entry.value().clone()),
            None => None,
        };
        let (n, e) = components.ok_or_else(|| {
            SgidError::IdTokenValidation(match kid {
                Some(k) => format!("no signing key with kid '{}'", k),
                None => "token has no kid and the key set is ambiguous".to_string(),
            })
        })?;
        DecodingKey::from_rsa_components(&n, &e).map_err(|e| SgidError::Jwks(e.to_string()))
    }
}
