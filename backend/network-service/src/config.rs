/// Configuration management for the network service
///
/// Everything is read from environment variables (after `dotenvy` has loaded
/// an optional `.env`). `from_lookup` takes the variable source as a closure
/// so tests can feed a map instead of mutating the process environment.
use crate::db::StorageBackend;
use crypto_core::jwt::{JwtKeys, DEFAULT_ACCESS_TOKEN_EXPIRY_HOURS};
use serde::Serialize;

/// Development-only HS256 secret, rejected in production
const DEV_JWT_SECRET: &str = "aura-development-secret-change-me-0123456789";

/// Main application configuration
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub app: AppConfig,
    pub cors: CorsConfig,
    pub storage: StorageConfig,
    #[serde(skip_serializing)]
    pub auth: AuthConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Required for the postgres backend
    #[serde(skip_serializing)]
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub seed_demo_data: bool,
}

#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: Option<String>,
    pub jwt_private_key_pem: Option<String>,
    pub jwt_public_key_pem: Option<String>,
    pub access_token_hours: i64,
    /// Enables `POST /api/admin/reset` when set
    pub admin_token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "***"))
            .field("rsa_keys", &self.jwt_private_key_pem.is_some())
            .field("access_token_hours", &self.access_token_hours)
            .field("admin_token", &self.admin_token.as_ref().map(|_| "***"))
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let app_env = var("APP_ENV").unwrap_or_else(|| "development".to_string());
        let production = app_env.eq_ignore_ascii_case("production");

        let app = AppConfig {
            env: app_env.clone(),
            host: var("NETWORK_SERVICE_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: match var("NETWORK_SERVICE_PORT") {
                Some(p) => p
                    .parse()
                    .map_err(|_| format!("NETWORK_SERVICE_PORT is not a valid port: {p}"))?,
                None => 5000,
            },
        };

        let cors = {
            let allowed_origins = match var("CORS_ALLOWED_ORIGINS") {
                Some(value) => value,
                None if production => {
                    return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
                }
                None => "http://localhost:3000".to_string(),
            };

            if production && allowed_origins.trim() == "*" {
                return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
            }

            CorsConfig { allowed_origins }
        };

        let backend: StorageBackend = match var("STORAGE_BACKEND") {
            Some(value) => value.parse()?,
            None => StorageBackend::Memory,
        };
        let database_url = var("DATABASE_URL");
        if backend == StorageBackend::Postgres && database_url.is_none() {
            return Err("DATABASE_URL must be set for the postgres backend".to_string());
        }
        let storage = StorageConfig {
            backend,
            database_url,
            max_connections: var("DATABASE_MAX_CONNECTIONS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            seed_demo_data: match var("SEED_DEMO_DATA") {
                Some(v) => parse_bool(&v)
                    .ok_or_else(|| format!("SEED_DEMO_DATA is not a boolean: {v}"))?,
                None => backend == StorageBackend::Memory,
            },
        };

        let jwt_secret = var("JWT_SECRET");
        let jwt_private_key_pem = var("JWT_PRIVATE_KEY_PEM");
        let jwt_public_key_pem = var("JWT_PUBLIC_KEY_PEM");
        if jwt_private_key_pem.is_some() != jwt_public_key_pem.is_some() {
            return Err(
                "JWT_PRIVATE_KEY_PEM and JWT_PUBLIC_KEY_PEM must be set together".to_string(),
            );
        }
        if production && jwt_secret.is_none() && jwt_private_key_pem.is_none() {
            return Err("JWT_SECRET or an RSA key pair must be set in production".to_string());
        }

        let auth = AuthConfig {
            jwt_secret,
            jwt_private_key_pem,
            jwt_public_key_pem,
            access_token_hours: var("JWT_EXPIRY_HOURS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_ACCESS_TOKEN_EXPIRY_HOURS),
            admin_token: var("ADMIN_TOKEN"),
        };

        Ok(Config {
            app,
            cors,
            storage,
            auth,
        })
    }

    pub fn is_production(&self) -> bool {
        self.app.env.eq_ignore_ascii_case("production")
    }

    /// Build the token keys. RSA keys win over the shared secret.
    pub fn jwt_keys(&self) -> Result<JwtKeys, String> {
        let auth = &self.auth;
        let hours = auth.access_token_hours;

        let keys = match (&auth.jwt_private_key_pem, &auth.jwt_public_key_pem) {
            (Some(private), Some(public)) => JwtKeys::from_rsa_pem(private, public, hours),
            _ => match &auth.jwt_secret {
                Some(secret) => JwtKeys::from_secret(secret, hours),
                None => {
                    tracing::warn!("JWT_SECRET not set, using the development secret");
                    JwtKeys::from_secret(DEV_JWT_SECRET, hours)
                }
            },
        };

        keys.map_err(|e| format!("invalid JWT configuration: {e}"))
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.app.host.clone(), self.app.port)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_for_development() {
        let config = load(&[]).unwrap();

        assert_eq!(config.app.port, 5000);
        assert_eq!(config.app.host, "0.0.0.0");
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert!(config.storage.seed_demo_data);
        assert!(config.auth.admin_token.is_none());
        assert!(config.jwt_keys().is_ok());
    }

    #[test]
    fn postgres_requires_database_url() {
        assert!(load(&[("STORAGE_BACKEND", "postgres")]).is_err());

        let config = load(&[
            ("STORAGE_BACKEND", "postgres"),
            ("DATABASE_URL", "postgres://localhost/aura"),
        ])
        .unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Postgres);
        assert!(!config.storage.seed_demo_data);
    }

    #[test]
    fn production_rules() {
        assert!(load(&[("APP_ENV", "production")]).is_err());
        assert!(load(&[
            ("APP_ENV", "production"),
            ("CORS_ALLOWED_ORIGINS", "*"),
            ("JWT_SECRET", "production-secret-0123456789abcdef-xyz"),
        ])
        .is_err());

        let config = load(&[
            ("APP_ENV", "production"),
            ("CORS_ALLOWED_ORIGINS", "https://aura.dev"),
            ("JWT_SECRET", "production-secret-0123456789abcdef-xyz"),
        ])
        .unwrap();
        assert!(config.is_production());
    }

    #[test]
    fn short_secret_is_rejected_at_key_build() {
        let config = load(&[("JWT_SECRET", "short")]).unwrap();
        assert!(config.jwt_keys().is_err());
    }

    #[test]
    fn invalid_values_are_reported() {
        assert!(load(&[("NETWORK_SERVICE_PORT", "eighty")]).is_err());
        assert!(load(&[("STORAGE_BACKEND", "mongo")]).is_err());
        assert!(load(&[("SEED_DEMO_DATA", "maybe")]).is_err());
        assert!(load(&[("JWT_PRIVATE_KEY_PEM", "pem")]).is_err());
    }

    #[test]
    fn seed_flag_overrides_default() {
        let config = load(&[("SEED_DEMO_DATA", "false")]).unwrap();
        assert!(!config.storage.seed_demo_data);
    }
}
