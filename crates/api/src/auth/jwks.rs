//! Cached signing keys from the identity provider's discovery endpoint.
//!
//! [`JwksCache`] is an explicit, injectable object held in `AppState` — not
//! a module-level singleton. Keys live for a bounded TTL and can be
//! invalidated explicitly; an unknown `kid` triggers exactly one
//! invalidate-and-refetch before the request fails.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use jsonwebtoken::DecodingKey;
use promptstash_core::error::CoreError;
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::config::Auth0Config;

/// Timeout for the JWKS discovery fetch.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// One entry of the provider's published key set.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    pub kid: Option<String>,
    pub kty: String,
    /// RSA modulus, base64url.
    pub n: Option<String>,
    /// RSA exponent, base64url.
    pub e: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JwksDocument {
    keys: Vec<Jwk>,
}

/// Index a key set document by `kid`, dropping entries without one.
fn key_map(doc: JwksDocument) -> HashMap<String, Jwk> {
    doc.keys
        .into_iter()
        .filter_map(|k| k.kid.clone().map(|kid| (kid, k)))
        .collect()
}

struct CachedKeys {
    keys: HashMap<String, Jwk>,
    fetched_at: Instant,
}

/// TTL-bounded cache of the identity provider's signing keys.
pub struct JwksCache {
    client: reqwest::Client,
    jwks_url: Option<String>,
    ttl: Duration,
    inner: RwLock<Option<CachedKeys>>,
}

impl JwksCache {
    /// Build a cache for the configured tenant. A missing domain is kept as
    /// `None` and surfaces as a configuration error on first use.
    pub fn from_config(auth0: &Auth0Config) -> JwksCache {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .expect("HTTP client construction cannot fail with static options");

        JwksCache {
            client,
            jwks_url: auth0.jwks_url(),
            ttl: Duration::from_secs(auth0.jwks_cache_ttl_secs),
            inner: RwLock::new(None),
        }
    }

    /// Resolve the decoding key for a token's `kid`.
    ///
    /// An unknown `kid` invalidates the cache and refetches once — a key
    /// rotation at the provider looks exactly like this — before the token
    /// is rejected.
    pub async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, CoreError> {
        if let Some(jwk) = self.lookup(kid).await? {
            return decoding_key_from_jwk(&jwk);
        }

        self.invalidate().await;
        match self.lookup(kid).await? {
            Some(jwk) => decoding_key_from_jwk(&jwk),
            None => Err(CoreError::Unauthorized("Unknown token signing key".into())),
        }
    }

    /// Drop the cached key set; the next lookup refetches.
    pub async fn invalidate(&self) {
        *self.inner.write().await = None;
    }

    /// Look up a `kid`, fetching or refreshing the key set when absent or
    /// past its TTL.
    async fn lookup(&self, kid: &str) -> Result<Option<Jwk>, CoreError> {
        {
            let guard = self.inner.read().await;
            if let Some(cached) = guard.as_ref() {
                if cached.fetched_at.elapsed() < self.ttl {
                    return Ok(cached.keys.get(kid).cloned());
                }
            }
        }

        let mut guard = self.inner.write().await;
        // Another request may have refreshed while we waited for the lock.
        let stale = match guard.as_ref() {
            Some(cached) => cached.fetched_at.elapsed() >= self.ttl,
            None => true,
        };
        if stale {
            *guard = Some(self.fetch().await?);
        }
        Ok(guard.as_ref().and_then(|c| c.keys.get(kid).cloned()))
    }

    async fn fetch(&self) -> Result<CachedKeys, CoreError> {
        let url = self
            .jwks_url
            .as_ref()
            .ok_or_else(|| CoreError::Config("AUTH0_DOMAIN is not configured".into()))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to fetch JWKS");
                CoreError::Unavailable(
                    "Could not fetch signing keys from authentication server".into(),
                )
            })?;

        let doc: JwksDocument = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "Malformed JWKS document");
            CoreError::Unavailable("Invalid key set received from authentication server".into())
        })?;

        let keys = key_map(doc);
        if keys.is_empty() {
            return Err(CoreError::Unavailable(
                "Key set from authentication server contains no usable keys".into(),
            ));
        }

        tracing::debug!(key_count = keys.len(), "JWKS cache refreshed");
        Ok(CachedKeys {
            keys,
            fetched_at: Instant::now(),
        })
    }
}

/// Build an RS256 decoding key from a key set entry.
fn decoding_key_from_jwk(jwk: &Jwk) -> Result<DecodingKey, CoreError> {
    let (n, e) = match (&jwk.n, &jwk.e) {
        (Some(n), Some(e)) => (n, e),
        _ => {
            return Err(CoreError::Unavailable(
                "Key set entry is missing RSA components".into(),
            ))
        }
    };
    DecodingKey::from_rsa_components(n, e)
        .map_err(|_| CoreError::Unavailable("Key set entry has invalid RSA components".into()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_map_indexes_by_kid_and_drops_kidless_entries() {
        let doc: JwksDocument = serde_json::from_str(
            r#"{
                "keys": [
                    {"kid": "key-a", "kty": "RSA", "n": "AQAB", "e": "AQAB"},
                    {"kty": "RSA", "n": "AQAB", "e": "AQAB"},
                    {"kid": "key-b", "kty": "RSA", "n": "AQAB", "e": "AQAB"}
                ]
            }"#,
        )
        .unwrap();

        let map = key_map(doc);
        assert_eq!(map.len(), 2);
        assert!(map.contains_key("key-a"));
        assert!(map.contains_key("key-b"));
    }

    #[test]
    fn decoding_key_requires_rsa_components() {
        let jwk = Jwk {
            kid: Some("key-a".into()),
            kty: "RSA".into(),
            n: None,
            e: Some("AQAB".into()),
        };
        assert!(decoding_key_from_jwk(&jwk).is_err());

        let jwk = Jwk {
            kid: Some("key-a".into()),
            kty: "RSA".into(),
            n: Some("AQAB".into()),
            e: Some("AQAB".into()),
        };
        assert!(decoding_key_from_jwk(&jwk).is_ok());
    }

    #[tokio::test]
    async fn unconfigured_domain_is_a_config_error() {
        let cache = JwksCache::from_config(&Auth0Config {
            domain: None,
            audience: None,
            jwks_cache_ttl_secs: 3600,
        });
        let err = match cache.decoding_key("any-kid").await {
            Ok(_) => panic!("expected an error"),
            Err(e) => e,
        };
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn decoding_key_rejects_invalid_base64() {
        let jwk = Jwk {
            kid: Some("key-a".into()),
            kty: "RSA".into(),
            n: Some("!!not-base64!!".into()),
            e: Some("AQAB".into()),
        };
        assert!(decoding_key_from_jwk(&jwk).is_err());
    }
}
