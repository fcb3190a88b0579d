//! Shared cryptographic helpers for Aura services.
//!
//! - `jwt`: access token issuing and validation
//! - `hash`: SHA-256 digest and constant-time secret comparison

pub mod hash;
pub mod jwt;

pub use jwt::{Claims, JwtKeys};
