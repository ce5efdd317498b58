//! HTTP middleware: JWT authentication.

mod auth;

pub use auth::{Claims, JwtVerifier, RequireAuth};
