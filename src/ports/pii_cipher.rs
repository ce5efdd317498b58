//! PiiCipher port - field-level encryption for PII at rest.

use crate::domain::foundation::DomainError;

/// Port for encrypting/decrypting PII fields.
///
/// Tolerant by contract: when no key is configured, `encrypt` passes values
/// through unchanged; `decrypt` returns the raw stored value whenever it is
/// not recognizable ciphertext. Mixing encrypted and plaintext rows is
/// therefore supported during migration — new writes always encrypt (when a
/// key exists), old rows keep reading.
pub trait PiiCipher: Send + Sync {
    /// Encrypt one field value for storage.
    fn encrypt(&self, plaintext: &str) -> Result<String, DomainError>;

    /// Decrypt one stored field value; returns the input unchanged when it
    /// is not ciphertext produced by this cipher.
    fn decrypt(&self, stored: &str) -> String;

    /// Deterministic digest for equality lookups over encrypted columns
    /// (unique email).
    fn digest(&self, value: &str) -> String;
}
