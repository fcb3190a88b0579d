//! # Actix Middleware Library
//!
//! Unified middleware components for Aura Actix services
//!
//! ## Modules
//! - `jwt_auth`: Bearer token authentication middleware
//! - `correlation_id`: Request correlation ID propagation
//! - `logging`: Request/response logging via tracing
//! - `metrics`: Prometheus metrics middleware

pub mod correlation_id;
pub mod jwt_auth;
pub mod logging;
pub mod metrics;

pub use correlation_id::{get_correlation_id, CorrelationId, CorrelationIdMiddleware};
pub use jwt_auth::{AuthError, JwtAuthMiddleware, UserId};
pub use logging::Logging;
pub use metrics::MetricsMiddleware;
