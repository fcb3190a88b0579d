//! Aura network service
//!
//! Account store, post store and the REST gateway of the Aura professional
//! network. Storage is pluggable (`memory` or `postgres`) behind the traits
//! in [`db`]; the gateway is an Actix app assembled by
//! [`handlers::configure`].

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod security;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;
