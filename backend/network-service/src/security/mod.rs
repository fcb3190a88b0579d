/// Credential hashing and token issuing
pub use crypto_core::jwt::{Claims, JwtKeys};

pub mod password;

pub use password::{hash_password, verify_against_dummy, verify_password};
