//! # Taskdeck Shared Library
//!
//! This crate contains shared types, persistence, and business logic used by
//! the Taskdeck API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `db`: Connection pool and migrations
//! - `auth`: Login-attempt throttling
//! - `idp`: Identity provider gateway (Cognito adapter + test mock)

pub mod auth;
pub mod db;
pub mod idp;
pub mod models;

/// Current version of the Taskdeck shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
