//! Shared types, errors, and configuration for ARMAS.
//!
//! This crate provides common types used across all other crates:
//! - Application-wide error taxonomy
//! - Configuration management
//! - JWT claims and token service

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;

pub use auth::{Claims, ROLE_PREFIX};
pub use config::{AppConfig, FeatureFlags};
pub use error::{AppError, AppResult};
pub use jwt::{JwtConfig, JwtError, JwtService};
