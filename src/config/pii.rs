//! PII encryption configuration.

use serde::Deserialize;

use super::error::ValidationError;

/// PII-at-rest settings. With no key configured the field cipher runs in
/// pass-through mode.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PiiConfig {
    /// 32-byte AES-256-GCM key as 64 hex characters.
    #[serde(default)]
    pub key_hex: Option<String>,
}

impl PiiConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(key) = &self.key_hex {
            let trimmed = key.trim();
            if !trimmed.is_empty() && trimmed.len() != 64 {
                return Err(ValidationError::new(
                    "pii.key_hex",
                    "must be 64 hex characters (32 bytes)",
                ));
            }
        }
        Ok(())
    }
}
