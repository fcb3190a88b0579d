/// Shared JWT module for Aura services
///
/// Access tokens are issued by the network service on register/login and
/// validated by the bearer-token middleware on every mutating route.
///
/// ## Key material
///
/// - **RS256** when an RSA key pair is configured (`JWT_PRIVATE_KEY_PEM` /
///   `JWT_PUBLIC_KEY_PEM`)
/// - **HS256** with a shared secret (`JWT_SECRET`) otherwise; the secret must
///   be at least 32 bytes
///
/// Keys live in an explicit [`JwtKeys`] value that the service builds at
/// startup and injects into handlers and middleware. Validation pins the
/// algorithm the keys were built with, so a token signed with a different
/// algorithm is rejected.
///
/// ```rust
/// use crypto_core::jwt::JwtKeys;
/// use uuid::Uuid;
///
/// let keys = JwtKeys::from_secret("an-example-secret-that-is-long-enough", 24).unwrap();
/// let token = keys.generate_access_token(Uuid::new_v4(), "a@x.com", "Ava").unwrap();
/// assert!(keys.validate_token(&token).is_ok());
/// ```
use anyhow::{anyhow, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Constants
// ============================================================================

/// Default access token lifetime
pub const DEFAULT_ACCESS_TOKEN_EXPIRY_HOURS: i64 = 24;

/// Minimum accepted length for an HS256 secret
pub const MIN_SECRET_LEN: usize = 32;

const ACCESS_TOKEN_TYPE: &str = "access";

// ============================================================================
// Data Structures
// ============================================================================

/// JWT Claims structure - standard claims plus Aura-specific fields
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (account ID as UUID string)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Token type, always "access" for now
    pub token_type: String,
    /// Email address
    pub email: String,
    /// Display name at issue time
    pub name: String,
}

/// Signing and verification keys plus token policy
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    access_ttl: Duration,
}

impl fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtKeys")
            .field("algorithm", &self.algorithm)
            .field("access_ttl_secs", &self.access_ttl.num_seconds())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Initialization
// ============================================================================

impl JwtKeys {
    /// Build HS256 keys from a shared secret
    ///
    /// ## Errors
    ///
    /// Returns error if the secret is shorter than [`MIN_SECRET_LEN`] bytes or
    /// the lifetime is not positive.
    pub fn from_secret(secret: &str, access_ttl_hours: i64) -> Result<Self> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(anyhow!(
                "JWT secret must be at least {MIN_SECRET_LEN} bytes, got {}",
                secret.len()
            ));
        }

        Self::build(
            EncodingKey::from_secret(secret.as_bytes()),
            DecodingKey::from_secret(secret.as_bytes()),
            Algorithm::HS256,
            access_ttl_hours,
        )
    }

    /// Build RS256 keys from PEM-formatted strings
    ///
    /// ## Errors
    ///
    /// Returns error if either PEM block is not a valid RSA key.
    pub fn from_rsa_pem(
        private_key_pem: &str,
        public_key_pem: &str,
        access_ttl_hours: i64,
    ) -> Result<Self> {
        let encoding = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
            .map_err(|e| anyhow!("Failed to parse RSA private key: {e}"))?;
        let decoding = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| anyhow!("Failed to parse RSA public key: {e}"))?;

        Self::build(encoding, decoding, Algorithm::RS256, access_ttl_hours)
    }

    fn build(
        encoding: EncodingKey,
        decoding: DecodingKey,
        algorithm: Algorithm,
        access_ttl_hours: i64,
    ) -> Result<Self> {
        if access_ttl_hours <= 0 {
            return Err(anyhow!(
                "JWT access token lifetime must be positive, got {access_ttl_hours}h"
            ));
        }

        Ok(Self {
            encoding,
            decoding,
            algorithm,
            access_ttl: Duration::hours(access_ttl_hours),
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Access token lifetime in seconds
    pub fn access_ttl_secs(&self) -> i64 {
        self.access_ttl.num_seconds()
    }

    // ========================================================================
    // Token Generation
    // ========================================================================

    /// Generate a new access token for an account
    pub fn generate_access_token(&self, user_id: Uuid, email: &str, name: &str) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
            token_type: ACCESS_TOKEN_TYPE.to_string(),
            email: email.to_string(),
            name: name.to_string(),
        };

        self.encode_claims(&claims)
    }

    fn encode_claims(&self, claims: &Claims) -> Result<String> {
        encode(&Header::new(self.algorithm), claims, &self.encoding)
            .map_err(|e| anyhow!("Failed to generate access token: {e}"))
    }

    // ========================================================================
    // Token Validation
    // ========================================================================

    /// Validate and decode a JWT token
    ///
    /// ## Errors
    ///
    /// Returns error if:
    /// - Token signature is invalid
    /// - Token is expired
    /// - Token format is malformed
    /// - Token type is not "access"
    pub fn validate_token(&self, token: &str) -> Result<TokenData<Claims>> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = true;

        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| anyhow!("Token validation failed: {e}"))?;

        if data.claims.token_type != ACCESS_TOKEN_TYPE {
            return Err(anyhow!(
                "Token validation failed: unexpected token type {}",
                data.claims.token_type
            ));
        }

        Ok(data)
    }

    /// Extract user ID from a validated token
    pub fn get_user_id_from_token(&self, token: &str) -> Result<Uuid> {
        let token_data = self.validate_token(token)?;
        Uuid::parse_str(&token_data.claims.sub)
            .map_err(|e| anyhow!("Invalid user ID format in token: {e}"))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret-0123456789abcdef0123";

    fn keys() -> JwtKeys {
        JwtKeys::from_secret(SECRET, 1).expect("test keys")
    }

    #[test]
    fn test_generate_access_token() {
        let token = keys()
            .generate_access_token(Uuid::new_v4(), "test@example.com", "Test User")
            .expect("Failed to generate token");

        assert_eq!(token.matches('.').count(), 2); // JWT has 3 parts
    }

    #[test]
    fn test_validate_valid_token() {
        let keys = keys();
        let user_id = Uuid::new_v4();
        let token = keys
            .generate_access_token(user_id, "test@example.com", "Test User")
            .expect("Failed to generate token");

        let token_data = keys.validate_token(&token).expect("token should validate");
        assert_eq!(token_data.claims.sub, user_id.to_string());
        assert_eq!(token_data.claims.email, "test@example.com");
        assert_eq!(token_data.claims.name, "Test User");
        assert_eq!(token_data.claims.token_type, "access");
        assert_eq!(token_data.claims.exp - token_data.claims.iat, 3600);
    }

    #[test]
    fn test_validate_invalid_token() {
        assert!(keys().validate_token("invalid.token.here").is_err());
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let other = JwtKeys::from_secret("another-secret-0123456789abcdef0123456", 1).unwrap();
        let token = other
            .generate_access_token(Uuid::new_v4(), "test@example.com", "Test User")
            .unwrap();

        assert!(keys().validate_token(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let keys = keys();
        let past = Utc::now() - Duration::hours(2);
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            iat: past.timestamp(),
            exp: (past + Duration::minutes(5)).timestamp(),
            token_type: ACCESS_TOKEN_TYPE.to_string(),
            email: "old@example.com".to_string(),
            name: "Old".to_string(),
        };
        let token = keys.encode_claims(&claims).unwrap();

        assert!(keys.validate_token(&token).is_err());
    }

    #[test]
    fn test_wrong_token_type_rejected() {
        let keys = keys();
        let now = Utc::now();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
            token_type: "refresh".to_string(),
            email: "r@example.com".to_string(),
            name: "R".to_string(),
        };
        let token = keys.encode_claims(&claims).unwrap();

        assert!(keys.validate_token(&token).is_err());
    }

    #[test]
    fn test_extract_user_id() {
        let keys = keys();
        let user_id = Uuid::new_v4();
        let token = keys
            .generate_access_token(user_id, "test@example.com", "Test User")
            .unwrap();

        assert_eq!(keys.get_user_id_from_token(&token).unwrap(), user_id);
    }

    #[test]
    fn test_short_secret_rejected() {
        assert!(JwtKeys::from_secret("too-short", 1).is_err());
    }

    #[test]
    fn test_non_positive_ttl_rejected() {
        assert!(JwtKeys::from_secret(SECRET, 0).is_err());
    }
}
