//! Core domain logic for ARMAS.
//!
//! This crate contains pure domain logic with ZERO web or database dependencies.
//!
//! # Modules
//!
//! - `access` - Roles, privilege catalog, and authority resolution
//! - `auth` - Password hashing and credential checks
//! - `workflow` - Report lifecycle state machine and notifications
//! - `storage` - Report file archive

pub mod access;
pub mod auth;
pub mod storage;
pub mod workflow;
