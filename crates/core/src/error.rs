/// Domain-level error type shared across crates.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} '{id}'")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A tier ceiling was hit. Carries the numeric limit so the API layer
    /// can surface it to the caller for display.
    #[error("{what} limit reached ({limit})")]
    LimitExceeded { what: &'static str, limit: i64 },

    /// An upstream dependency (identity provider, payment processor) is
    /// unreachable or returned garbage. Transient; maps to 503.
    #[error("Upstream unavailable: {0}")]
    Unavailable(String),

    /// Deployment misconfiguration (missing env var, bad key material).
    /// Not transient; maps to 500.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for [`CoreError::NotFound`] with any displayable id.
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        CoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}
