//! Bearer-token verification against the identity provider.
//!
//! Tokens are RS256 JWTs signed by the provider; verification resolves the
//! signing key through the [`JwksCache`], then checks signature, issuer,
//! audience, and expiry. The subject claim is mandatory.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use promptstash_core::error::CoreError;
use serde::Deserialize;

use crate::auth::jwks::JwksCache;
use crate::config::Auth0Config;

/// Claims extracted from a verified access token.
///
/// Profile fields are optional: the provider only includes them when the
/// token was requested with the matching scopes.
#[derive(Debug, Clone, Deserialize)]
pub struct Auth0Claims {
    /// Subject — the provider's opaque user identifier.
    pub sub: String,
    pub email: Option<String>,
    pub nickname: Option<String>,
    pub name: Option<String>,
    pub preferred_username: Option<String>,
}

/// Verify a bearer token and return its claims.
pub async fn verify_bearer(
    token: &str,
    jwks: &JwksCache,
    auth0: &Auth0Config,
) -> Result<Auth0Claims, CoreError> {
    let issuer = auth0
        .issuer()
        .ok_or_else(|| CoreError::Config("AUTH0_DOMAIN is not configured".into()))?;
    let audience = auth0
        .audience
        .as_ref()
        .ok_or_else(|| CoreError::Config("AUTH0_API_AUDIENCE is not configured".into()))?;

    let header = decode_header(token)
        .map_err(|_| CoreError::Unauthorized("Could not validate credentials".into()))?;
    let kid = header
        .kid
        .ok_or_else(|| CoreError::Unauthorized("Token header missing key id".into()))?;

    let key = jwks.decoding_key(&kid).await?;

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&[audience]);
    validation.set_issuer(&[&issuer]);

    let data = decode::<Auth0Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => CoreError::Unauthorized("Token has expired".into()),
        ErrorKind::InvalidAudience | ErrorKind::InvalidIssuer => {
            CoreError::Unauthorized(format!("Token claims invalid: {e}"))
        }
        _ => CoreError::Unauthorized("Could not validate credentials".into()),
    })?;

    Ok(data.claims)
}

/// Username for a first-seen subject, from profile claims when present,
/// otherwise derived from the subject itself.
pub fn fallback_username(claims: &Auth0Claims) -> String {
    for candidate in [&claims.nickname, &claims.name, &claims.preferred_username] {
        if let Some(value) = candidate {
            if !value.trim().is_empty() {
                return value.clone();
            }
        }
    }

    // e.g. "auth0|64fa21bc9e7f" -> "user_64fa21bc"
    let tail = claims.sub.rsplit('|').next().unwrap_or(&claims.sub);
    let short: String = tail.chars().take(8).collect();
    format!("user_{short}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(
        sub: &str,
        nickname: Option<&str>,
        name: Option<&str>,
        preferred: Option<&str>,
    ) -> Auth0Claims {
        Auth0Claims {
            sub: sub.to_string(),
            email: None,
            nickname: nickname.map(String::from),
            name: name.map(String::from),
            preferred_username: preferred.map(String::from),
        }
    }

    #[test]
    fn username_prefers_nickname() {
        let c = claims("auth0|abc", Some("nick"), Some("Full Name"), Some("pref"));
        assert_eq!(fallback_username(&c), "nick");
    }

    #[test]
    fn username_falls_through_profile_fields() {
        let c = claims("auth0|abc", None, Some("Full Name"), Some("pref"));
        assert_eq!(fallback_username(&c), "Full Name");

        let c = claims("auth0|abc", None, None, Some("pref"));
        assert_eq!(fallback_username(&c), "pref");
    }

    #[test]
    fn username_derives_from_subject_when_profile_is_empty() {
        let c = claims("auth0|64fa21bc9e7f", Some("  "), None, None);
        assert_eq!(fallback_username(&c), "user_64fa21bc");
    }

    #[test]
    fn username_handles_subject_without_separator() {
        let c = claims("rawsubject", None, None, None);
        assert_eq!(fallback_username(&c), "user_rawsubje");
    }

    #[test]
    fn claims_deserialize_with_minimal_payload() {
        let c: Auth0Claims = serde_json::from_str(r#"{"sub": "auth0|x"}"#).unwrap();
        assert_eq!(c.sub, "auth0|x");
        assert!(c.email.is_none());
    }

    #[test]
    fn claims_require_subject() {
        let result: Result<Auth0Claims, _> = serde_json::from_str(r#"{"email": "a@b.c"}"#);
        assert!(result.is_err());
    }
}
