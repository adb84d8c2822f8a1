//! # Taskie Shared Library
//!
//! Types, persistence and authentication primitives used by the Taskie API
//! server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their queries (roles, users, collections, tasks)
//! - `db`: Connection pool and embedded migrations
//! - `auth`: Password hashing, signed tokens, cookie authentication, role rules
//! - `mail`: Outgoing mail (password reset links)

pub mod auth;
pub mod db;
pub mod mail;
pub mod models;

/// Current version of the Taskie shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
