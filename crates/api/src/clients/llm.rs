//! Text-generation dispatch to third-party LLM providers.
//!
//! Bring-your-own-key model: every call uses the requesting user's own
//! decrypted key. Providers form a closed enum; each adapter is one
//! synchronous (awaited) HTTP call with no retries, streaming, or batching.
//! Expected failure categories map to stable string codes the caller can
//! branch on instead of surfacing as HTTP errors.

use std::time::Duration;

use serde_json::{json, Value};

/// HTTP request timeout for a single generation call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// Providers
// ---------------------------------------------------------------------------

/// The closed set of supported text-generation providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAi,
    Anthropic,
    Gemini,
}

impl LlmProvider {
    /// Canonical lowercase name, as stored on API key rows.
    pub fn as_str(self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "openai",
            LlmProvider::Anthropic => "anthropic",
            LlmProvider::Gemini => "gemini",
        }
    }

    /// Parse a provider name, case-insensitively. Unknown names are a
    /// caller error, not a variant.
    pub fn parse(name: &str) -> Option<LlmProvider> {
        match name.to_ascii_lowercase().as_str() {
            "openai" => Some(LlmProvider::OpenAi),
            "anthropic" => Some(LlmProvider::Anthropic),
            "gemini" => Some(LlmProvider::Gemini),
            _ => None,
        }
    }

    /// All supported providers, for validation messages.
    pub const ALL: [LlmProvider; 3] = [
        LlmProvider::OpenAi,
        LlmProvider::Anthropic,
        LlmProvider::Gemini,
    ];
}

// ---------------------------------------------------------------------------
// Error codes
// ---------------------------------------------------------------------------

/// Stable machine-readable codes for expected generation failures.
pub mod codes {
    pub const MISSING_API_KEY: &str = "missing_api_key";
    pub const UNKNOWN_PROVIDER: &str = "unknown_provider";
    pub const MODEL_NOT_FOUND: &str = "model_not_found";
    pub const CONTENT_BLOCKED: &str = "content_blocked";
    pub const RATE_LIMITED: &str = "rate_limited";
    pub const PROVIDER_ERROR: &str = "provider_error";
}

/// An expected generation failure: a stable code plus a human message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmError {
    pub code: &'static str,
    pub message: String,
}

impl LlmError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        LlmError {
            code,
            message: message.into(),
        }
    }
}

/// Map a provider HTTP status to an error code. `400` is handled per
/// provider since its meaning varies.
fn code_for_status(status: u16) -> &'static str {
    match status {
        404 => codes::MODEL_NOT_FOUND,
        429 => codes::RATE_LIMITED,
        _ => codes::PROVIDER_ERROR,
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Dispatches a prompt to one provider and returns the generated text.
pub struct LlmClient {
    client: reqwest::Client,
}

impl LlmClient {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self { client }
    }

    /// Generate text with the caller's own key. One call, no retries.
    pub async fn generate(
        &self,
        provider: LlmProvider,
        api_key: &str,
        model: &str,
        prompt: &str,
    ) -> Result<String, LlmError> {
        if api_key.is_empty() {
            return Err(LlmError::new(
                codes::MISSING_API_KEY,
                format!("No API key available for provider '{}'", provider.as_str()),
            ));
        }

        match provider {
            LlmProvider::OpenAi => self.generate_openai(api_key, model, prompt).await,
            LlmProvider::Anthropic => self.generate_anthropic(api_key, model, prompt).await,
            LlmProvider::Gemini => self.generate_gemini(api_key, model, prompt).await,
        }
    }

    async fn generate_openai(
        &self,
        api_key: &str,
        model: &str,
        prompt: &str,
    ) -> Result<String, LlmError> {
        let body = json!({
            "model": model,
            "messages": [{"role": "user", "content": prompt}],
        });

        let response = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status().as_u16();
        let value: Value = response.json().await.map_err(transport_error)?;

        if status >= 400 {
            return Err(openai_error(status, &value));
        }
        extract_openai_text(&value).ok_or_else(|| {
            LlmError::new(codes::PROVIDER_ERROR, "No text content in OpenAI response")
        })
    }

    async fn generate_anthropic(
        &self,
        api_key: &str,
        model: &str,
        prompt: &str,
    ) -> Result<String, LlmError> {
        let body = json!({
            "model": model,
            "max_tokens": 1024,
            "messages": [{"role": "user", "content": prompt}],
        });

        let response = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status().as_u16();
        let value: Value = response.json().await.map_err(transport_error)?;

        if status >= 400 {
            return Err(anthropic_error(status, &value));
        }
        extract_anthropic_text(&value).ok_or_else(|| {
            LlmError::new(codes::PROVIDER_ERROR, "No text content in Anthropic response")
        })
    }

    async fn generate_gemini(
        &self,
        api_key: &str,
        model: &str,
        prompt: &str,
    ) -> Result<String, LlmError> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent"
        );
        let body = json!({
            "contents": [{"parts": [{"text": prompt}]}],
        });

        let response = self
            .client
            .post(url)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status().as_u16();
        let value: Value = response.json().await.map_err(transport_error)?;

        if status >= 400 {
            return Err(gemini_error(status, &value));
        }
        extract_gemini_text(&value)
    }
}

impl Default for LlmClient {
    fn default() -> Self {
        Self::new()
    }
}

fn transport_error(e: reqwest::Error) -> LlmError {
    tracing::warn!(error = %e, "LLM provider request failed");
    LlmError::new(codes::PROVIDER_ERROR, format!("Provider request failed: {e}"))
}

// ---------------------------------------------------------------------------
// Response shaping (pure, unit-tested)
// ---------------------------------------------------------------------------

fn provider_message(value: &Value, pointer: &str, status: u16) -> String {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(String::from)
        .unwrap_or_else(|| format!("HTTP {status}"))
}

fn openai_error(status: u16, value: &Value) -> LlmError {
    let message = provider_message(value, "/error/message", status);
    let code = match value.pointer("/error/code").and_then(Value::as_str) {
        Some("model_not_found") => codes::MODEL_NOT_FOUND,
        Some("content_filter") | Some("content_policy_violation") => codes::CONTENT_BLOCKED,
        _ => code_for_status(status),
    };
    LlmError::new(code, message)
}

fn anthropic_error(status: u16, value: &Value) -> LlmError {
    let message = provider_message(value, "/error/message", status);
    let code = match value.pointer("/error/type").and_then(Value::as_str) {
        Some("not_found_error") => codes::MODEL_NOT_FOUND,
        Some("rate_limit_error") => codes::RATE_LIMITED,
        _ => code_for_status(status),
    };
    LlmError::new(code, message)
}

fn gemini_error(status: u16, value: &Value) -> LlmError {
    let message = provider_message(value, "/error/message", status);
    LlmError::new(code_for_status(status), message)
}

fn extract_openai_text(value: &Value) -> Option<String> {
    value
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(String::from)
}

fn extract_anthropic_text(value: &Value) -> Option<String> {
    let parts = value.get("content")?.as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();
    (!text.is_empty()).then_some(text)
}

/// Gemini reports safety blocks in-band on a 200 response; surface them as
/// the `content_blocked` code rather than an empty result.
fn extract_gemini_text(value: &Value) -> Result<String, LlmError> {
    if let Some(reason) = value
        .pointer("/promptFeedback/blockReason")
        .and_then(Value::as_str)
    {
        return Err(LlmError::new(
            codes::CONTENT_BLOCKED,
            format!("Prompt blocked: {reason}"),
        ));
    }

    let text: String = value
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    if text.is_empty() {
        Err(LlmError::new(
            codes::PROVIDER_ERROR,
            "No text content in Gemini response",
        ))
    } else {
        Ok(text)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_parse_is_case_insensitive_and_closed() {
        assert_eq!(LlmProvider::parse("OpenAI"), Some(LlmProvider::OpenAi));
        assert_eq!(LlmProvider::parse("anthropic"), Some(LlmProvider::Anthropic));
        assert_eq!(LlmProvider::parse("GEMINI"), Some(LlmProvider::Gemini));
        assert_eq!(LlmProvider::parse("mistral"), None);
        assert_eq!(LlmProvider::parse(""), None);
    }

    #[test]
    fn provider_round_trips_through_name() {
        for provider in LlmProvider::ALL {
            assert_eq!(LlmProvider::parse(provider.as_str()), Some(provider));
        }
    }

    #[test]
    fn status_codes_map_to_stable_codes() {
        assert_eq!(code_for_status(404), codes::MODEL_NOT_FOUND);
        assert_eq!(code_for_status(429), codes::RATE_LIMITED);
        assert_eq!(code_for_status(500), codes::PROVIDER_ERROR);
        assert_eq!(code_for_status(401), codes::PROVIDER_ERROR);
    }

    #[test]
    fn openai_text_extraction() {
        let value = json!({
            "choices": [{"message": {"role": "assistant", "content": "hello"}}]
        });
        assert_eq!(extract_openai_text(&value).as_deref(), Some("hello"));
        assert_eq!(extract_openai_text(&json!({"choices": []})), None);
    }

    #[test]
    fn openai_error_honors_error_code() {
        let value = json!({"error": {"message": "no such model", "code": "model_not_found"}});
        let err = openai_error(400, &value);
        assert_eq!(err.code, codes::MODEL_NOT_FOUND);
        assert_eq!(err.message, "no such model");
    }

    #[test]
    fn anthropic_text_concatenates_blocks() {
        let value = json!({
            "content": [{"type": "text", "text": "foo"}, {"type": "text", "text": "bar"}]
        });
        assert_eq!(extract_anthropic_text(&value).as_deref(), Some("foobar"));
    }

    #[test]
    fn anthropic_error_maps_rate_limit() {
        let value = json!({"error": {"type": "rate_limit_error", "message": "slow down"}});
        let err = anthropic_error(429, &value);
        assert_eq!(err.code, codes::RATE_LIMITED);
    }

    #[test]
    fn gemini_block_reason_is_content_blocked() {
        let value = json!({"promptFeedback": {"blockReason": "SAFETY"}});
        let err = extract_gemini_text(&value).unwrap_err();
        assert_eq!(err.code, codes::CONTENT_BLOCKED);
        assert!(err.message.contains("SAFETY"));
    }

    #[test]
    fn gemini_text_joins_parts() {
        let value = json!({
            "candidates": [{"content": {"parts": [{"text": "a"}, {"text": "b"}]}}]
        });
        assert_eq!(extract_gemini_text(&value).unwrap(), "ab");
    }

    #[test]
    fn gemini_empty_response_is_provider_error() {
        let err = extract_gemini_text(&json!({})).unwrap_err();
        assert_eq!(err.code, codes::PROVIDER_ERROR);
    }
}
