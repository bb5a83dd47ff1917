//! Outbound HTTP clients for third-party services.

pub mod llm;
pub mod stripe;
