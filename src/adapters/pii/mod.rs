//! PII encryption adapter.

mod field_cipher;

pub use field_cipher::FieldCipher;
