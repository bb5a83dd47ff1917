use std::sync::Arc;

use promptstash_core::error::CoreError;
use promptstash_core::secrets::SecretCipher;

use crate::auth::jwks::JwksCache;
use crate::clients::llm::LlmClient;
use crate::clients::stripe::StripeClient;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: promptstash_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Identity-provider signing-key cache (injected, never a global).
    pub jwks: Arc<JwksCache>,
    /// Payment processor client.
    pub stripe: Arc<StripeClient>,
    /// Text-generation provider client.
    pub llm: Arc<LlmClient>,
    /// API-key cipher; `None` when the encryption key is not configured.
    pub cipher: Option<SecretCipher>,
}

impl AppState {
    /// Build state from configuration and a connected pool.
    ///
    /// A present-but-invalid encryption key is a deployment error and
    /// panics at startup; an absent key leaves `cipher` unset and fails at
    /// request time instead.
    pub fn new(pool: promptstash_db::DbPool, config: ServerConfig) -> AppState {
        let cipher = config.encryption_key_hex.as_deref().map(|hex| {
            SecretCipher::from_hex(hex).expect("API_KEY_ENCRYPTION_KEY must be 64 hex chars")
        });
        let jwks = Arc::new(JwksCache::from_config(&config.auth0));
        let stripe = Arc::new(StripeClient::new(config.billing.secret_key.clone()));

        AppState {
            pool,
            config: Arc::new(config),
            jwks,
            stripe,
            llm: Arc::new(LlmClient::new()),
            cipher,
        }
    }

    /// The API-key cipher, or a configuration error when unset.
    pub fn cipher(&self) -> Result<&SecretCipher, CoreError> {
        self.cipher
            .as_ref()
            .ok_or_else(|| CoreError::Config("API_KEY_ENCRYPTION_KEY is not configured".into()))
    }
}
