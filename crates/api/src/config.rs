//! Server configuration loaded from environment variables.

/// Top-level configuration for the API server.
///
/// Bind/network values have development defaults and fail fast on parse
/// errors. Integration credentials (Auth0, Stripe, encryption key) load as
/// `Option` and surface errors at request time, so a deployment missing one
/// integration still serves the rest.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Identity provider settings.
    pub auth0: Auth0Config,
    /// Payment processor settings.
    pub billing: BillingConfig,
    /// 64-char hex key for API-key encryption (`API_KEY_ENCRYPTION_KEY`).
    pub encryption_key_hex: Option<String>,
    /// Frontend origin used for billing redirect defaults.
    pub frontend_url: String,
}

/// Identity provider (Auth0) settings.
#[derive(Debug, Clone)]
pub struct Auth0Config {
    /// Tenant domain, e.g. `example.eu.auth0.com`.
    pub domain: Option<String>,
    /// Expected `aud` claim of access tokens.
    pub audience: Option<String>,
    /// Signing-key cache lifetime in seconds (default: `3600`).
    pub jwks_cache_ttl_secs: u64,
}

impl Auth0Config {
    /// The discovery URL for the tenant's signing keys.
    pub fn jwks_url(&self) -> Option<String> {
        self.domain
            .as_ref()
            .map(|d| format!("https://{d}/.well-known/jwks.json"))
    }

    /// The expected token issuer.
    pub fn issuer(&self) -> Option<String> {
        self.domain.as_ref().map(|d| format!("https://{d}/"))
    }
}

/// Payment processor (Stripe) settings.
#[derive(Debug, Clone)]
pub struct BillingConfig {
    /// API secret key (`STRIPE_SECRET_KEY`).
    pub secret_key: Option<String>,
    /// Webhook signing secret (`STRIPE_WEBHOOK_SECRET`).
    pub webhook_secret: Option<String>,
    /// Price identifier for the pro subscription (`STRIPE_PRO_PRICE_ID`).
    pub pro_price_id: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                 |
    /// |---------------------------|-------------------------|
    /// | `HOST`                    | `0.0.0.0`               |
    /// | `PORT`                    | `3000`                  |
    /// | `CORS_ORIGINS`            | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                    |
    /// | `AUTH0_DOMAIN`            | unset                   |
    /// | `AUTH0_API_AUDIENCE`      | unset                   |
    /// | `JWKS_CACHE_TTL_SECS`     | `3600`                  |
    /// | `API_KEY_ENCRYPTION_KEY`  | unset                   |
    /// | `STRIPE_SECRET_KEY`       | unset                   |
    /// | `STRIPE_WEBHOOK_SECRET`   | unset                   |
    /// | `STRIPE_PRO_PRICE_ID`     | unset                   |
    /// | `FRONTEND_URL`            | `http://localhost:5173` |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let jwks_cache_ttl_secs: u64 = std::env::var("JWKS_CACHE_TTL_SECS")
            .unwrap_or_else(|_| "3600".into())
            .parse()
            .expect("JWKS_CACHE_TTL_SECS must be a valid u64");

        let auth0 = Auth0Config {
            domain: non_empty_var("AUTH0_DOMAIN"),
            audience: non_empty_var("AUTH0_API_AUDIENCE"),
            jwks_cache_ttl_secs,
        };
        if auth0.domain.is_none() {
            tracing::warn!("AUTH0_DOMAIN is not set; authenticated routes will fail");
        }
        if auth0.audience.is_none() {
            tracing::warn!("AUTH0_API_AUDIENCE is not set; authenticated routes will fail");
        }

        let billing = BillingConfig {
            secret_key: non_empty_var("STRIPE_SECRET_KEY"),
            webhook_secret: non_empty_var("STRIPE_WEBHOOK_SECRET"),
            pro_price_id: non_empty_var("STRIPE_PRO_PRICE_ID"),
        };

        let encryption_key_hex = non_empty_var("API_KEY_ENCRYPTION_KEY");
        if encryption_key_hex.is_none() {
            tracing::warn!("API_KEY_ENCRYPTION_KEY is not set; API key storage will fail");
        }

        let frontend_url = std::env::var("FRONTEND_URL")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .trim_end_matches('/')
            .to_string();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            auth0,
            billing,
            encryption_key_hex,
            frontend_url,
        }
    }
}

/// Read an env var, treating empty strings as unset.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
