//! Encryption and masking for user-supplied provider API keys.
//!
//! Keys are encrypted with AES-256-GCM before they touch the database; the
//! row stores hex(`nonce || ciphertext`) plus a masked preview. The
//! plaintext exists only in memory between request and provider call and is
//! never logged.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};

use crate::error::CoreError;
use crate::hex;

/// AES-GCM nonce size in bytes.
const NONCE_LEN: usize = 12;

/// Symmetric cipher wrapping the deployment's API-key encryption key.
///
/// Construct once from configuration and share via application state.
#[derive(Clone)]
pub struct SecretCipher {
    key: [u8; 32],
}

impl std::fmt::Debug for SecretCipher {
    // Key material stays out of debug output.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretCipher").finish_non_exhaustive()
    }
}

impl SecretCipher {
    /// Build a cipher from a 64-character hex key (32 bytes, AES-256).
    pub fn from_hex(key_hex: &str) -> Result<SecretCipher, CoreError> {
        let bytes = hex::decode(key_hex).ok_or_else(|| {
            CoreError::Config("API key encryption key is not valid hex".into())
        })?;
        let key: [u8; 32] = bytes.try_into().map_err(|_| {
            CoreError::Config("API key encryption key must be 32 bytes (64 hex chars)".into())
        })?;
        Ok(SecretCipher { key })
    }

    /// Encrypt a plaintext key for storage. Output is hex(`nonce || ct`).
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CoreError> {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key));
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| CoreError::Internal("API key encryption failed".into()))?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(nonce.as_slice());
        out.extend_from_slice(&ciphertext);
        Ok(hex::encode(out))
    }

    /// Decrypt a stored ciphertext back to the plaintext key.
    pub fn decrypt(&self, stored: &str) -> Result<String, CoreError> {
        let bytes = hex::decode(stored)
            .ok_or_else(|| CoreError::Internal("Stored API key is not valid hex".into()))?;
        if bytes.len() <= NONCE_LEN {
            return Err(CoreError::Internal("Stored API key is truncated".into()));
        }

        let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key));
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CoreError::Internal("API key decryption failed".into()))?;

        String::from_utf8(plaintext)
            .map_err(|_| CoreError::Internal("Decrypted API key is not UTF-8".into()))
    }
}

/// Display-safe partial rendering of a secret, never the secret itself.
///
/// Keys longer than 8 characters show the first and last four; short keys
/// degrade to heavier masking.
pub fn mask_key(key: &str) -> String {
    let len = key.chars().count();
    if len <= 2 {
        "******".to_string()
    } else if len <= 8 {
        let first = key.chars().next().map(String::from).unwrap_or_default();
        let last = key.chars().last().map(String::from).unwrap_or_default();
        format!("{first}****{last}")
    } else {
        let first: String = key.chars().take(4).collect();
        let last: String = key.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
        format!("{first}...{last}")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cipher() -> SecretCipher {
        // 32 bytes of 0x42.
        SecretCipher::from_hex(&"42".repeat(32)).unwrap()
    }

    #[test]
    fn encrypt_decrypt_round_trips() {
        let cipher = test_cipher();
        let stored = cipher.encrypt("sk-abc123-secret").unwrap();
        assert_eq!(cipher.decrypt(&stored).unwrap(), "sk-abc123-secret");
    }

    #[test]
    fn ciphertext_never_contains_plaintext() {
        let cipher = test_cipher();
        let stored = cipher.encrypt("sk-abc123-secret").unwrap();
        assert!(!stored.contains("sk-abc123"));
        assert!(stored.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn encryption_is_randomized() {
        let cipher = test_cipher();
        let a = cipher.encrypt("same-key").unwrap();
        let b = cipher.encrypt("same-key").unwrap();
        assert_ne!(a, b, "fresh nonce per encryption");
    }

    #[test]
    fn decrypt_rejects_wrong_key() {
        let stored = test_cipher().encrypt("secret").unwrap();
        let other = SecretCipher::from_hex(&"17".repeat(32)).unwrap();
        assert!(other.decrypt(&stored).is_err());
    }

    #[test]
    fn decrypt_rejects_garbage() {
        let cipher = test_cipher();
        assert!(cipher.decrypt("not-hex").is_err());
        assert!(cipher.decrypt("abcd").is_err());
    }

    #[test]
    fn from_hex_rejects_bad_key_material() {
        assert!(SecretCipher::from_hex("zz").is_err());
        assert!(SecretCipher::from_hex("abcd").is_err());
    }

    #[test]
    fn mask_shows_ends_only() {
        assert_eq!(mask_key("sk-1234567890abcdef"), "sk-1...cdef");
    }

    #[test]
    fn mask_handles_short_keys() {
        assert_eq!(mask_key("ab"), "******");
        assert_eq!(mask_key("abcdef"), "a****f");
    }
}
