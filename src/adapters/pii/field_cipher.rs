//! AES-256-GCM field cipher for PII at rest.
//!
//! Stored form: `enc:v1:<hex nonce>:<hex ciphertext>`. Tolerant by design:
//! with no key configured every call passes values through, and reads of
//! unrecognizable or undecryptable values return the raw stored string, so
//! encrypted and plaintext rows can coexist during migration.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use sha2::{Digest, Sha256};

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::PiiCipher;

const PREFIX: &str = "enc:v1:";

/// Field-level cipher. Holds no key state beyond the AEAD instance.
pub struct FieldCipher {
    cipher: Option<Aes256Gcm>,
}

impl FieldCipher {
    /// Pass-through mode: no key configured.
    pub fn passthrough() -> Self {
        Self { cipher: None }
    }

    /// Encrypting mode from a 32-byte key given as 64 hex characters.
    pub fn from_key_hex(key_hex: &str) -> Result<Self, DomainError> {
        let key_bytes = hex::decode(key_hex).map_err(|e| {
            DomainError::new(
                ErrorCode::InvalidFormat,
                format!("PII key is not valid hex: {}", e),
            )
        })?;
        let cipher = Aes256Gcm::new_from_slice(&key_bytes).map_err(|_| {
            DomainError::new(
                ErrorCode::InvalidFormat,
                format!("PII key must be 32 bytes, got {}", key_bytes.len()),
            )
        })?;
        Ok(Self {
            cipher: Some(cipher),
        })
    }

    /// Build from optional config value.
    pub fn from_optional_key(key_hex: Option<&str>) -> Result<Self, DomainError> {
        match key_hex {
            Some(key) if !key.trim().is_empty() => Self::from_key_hex(key.trim()),
            _ => Ok(Self::passthrough()),
        }
    }

    /// Whether values written through this cipher are encrypted.
    pub fn is_encrypting(&self) -> bool {
        self.cipher.is_some()
    }
}

impl PiiCipher for FieldCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String, DomainError> {
        let Some(cipher) = &self.cipher else {
            return Ok(plaintext.to_string());
        };

        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = cipher.encrypt(&nonce, plaintext.as_bytes()).map_err(|_| {
            DomainError::new(ErrorCode::InternalError, "PII encryption failed")
        })?;

        Ok(format!(
            "{}{}:{}",
            PREFIX,
            hex::encode(nonce),
            hex::encode(ciphertext)
        ))
    }

    fn decrypt(&self, stored: &str) -> String {
        let Some(rest) = stored.strip_prefix(PREFIX) else {
            // Plaintext row (pre-migration or pass-through deployment).
            return stored.to_string();
        };

        let Some(cipher) = &self.cipher else {
            // Ciphertext but no key: surface the stored value untouched.
            return stored.to_string();
        };

        let Some((nonce_hex, ct_hex)) = rest.split_once(':') else {
            return stored.to_string();
        };
        let (Ok(nonce_bytes), Ok(ct_bytes)) = (hex::decode(nonce_hex), hex::decode(ct_hex))
        else {
            return stored.to_string();
        };
        if nonce_bytes.len() != 12 {
            return stored.to_string();
        }

        match cipher.decrypt(Nonce::from_slice(&nonce_bytes), ct_bytes.as_ref()) {
            Ok(plaintext) => String::from_utf8(plaintext).unwrap_or_else(|_| stored.to_string()),
            Err(_) => stored.to_string(),
        }
    }

    fn digest(&self, value: &str) -> String {
        let normalized = value.trim().to_lowercase();
        hex::encode(Sha256::digest(normalized.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

    #[test]
    fn passthrough_leaves_values_untouched() {
        let cipher = FieldCipher::passthrough();
        assert_eq!(cipher.encrypt("ada@example.com").unwrap(), "ada@example.com");
        assert_eq!(cipher.decrypt("ada@example.com"), "ada@example.com");
    }

    #[test]
    fn encrypt_decrypt_round_trips() {
        let cipher = FieldCipher::from_key_hex(TEST_KEY).unwrap();
        let stored = cipher.encrypt("ada@example.com").unwrap();

        assert!(stored.starts_with(PREFIX));
        assert_ne!(stored, "ada@example.com");
        assert_eq!(cipher.decrypt(&stored), "ada@example.com");
    }

    #[test]
    fn encryption_is_randomized() {
        let cipher = FieldCipher::from_key_hex(TEST_KEY).unwrap();
        let a = cipher.encrypt("same value").unwrap();
        let b = cipher.encrypt("same value").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn decrypt_of_plaintext_row_is_tolerant() {
        // Migration case: key configured, old rows still plaintext.
        let cipher = FieldCipher::from_key_hex(TEST_KEY).unwrap();
        assert_eq!(cipher.decrypt("plain@example.com"), "plain@example.com");
    }

    #[test]
    fn decrypt_with_wrong_key_returns_raw() {
        let writer = FieldCipher::from_key_hex(TEST_KEY).unwrap();
        let stored = writer.encrypt("secret").unwrap();

        let other_key = "ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff";
        let reader = FieldCipher::from_key_hex(other_key).unwrap();
        assert_eq!(reader.decrypt(&stored), stored);
    }

    #[test]
    fn garbled_ciphertext_returns_raw() {
        let cipher = FieldCipher::from_key_hex(TEST_KEY).unwrap();
        assert_eq!(cipher.decrypt("enc:v1:zz:zz"), "enc:v1:zz:zz");
        assert_eq!(cipher.decrypt("enc:v1:nocolon"), "enc:v1:nocolon");
    }

    #[test]
    fn digest_is_deterministic_and_normalized() {
        let cipher = FieldCipher::from_key_hex(TEST_KEY).unwrap();
        assert_eq!(
            cipher.digest("Ada@Example.com "),
            cipher.digest("ada@example.com")
        );
    }

    #[test]
    fn bad_key_is_rejected() {
        assert!(FieldCipher::from_key_hex("not-hex").is_err());
        assert!(FieldCipher::from_key_hex("abcd").is_err());
    }

    #[test]
    fn from_optional_key_handles_absence() {
        assert!(!FieldCipher::from_optional_key(None).unwrap().is_encrypting());
        assert!(!FieldCipher::from_optional_key(Some("  "))
            .unwrap()
            .is_encrypting());
        assert!(FieldCipher::from_optional_key(Some(TEST_KEY))
            .unwrap()
            .is_encrypting());
    }
}
