//! # TaskHub Shared Library
//!
//! Domain types, storage and access-control logic shared by the TaskHub API
//! server and its tests.
//!
//! ## Module Organization
//!
//! - `models`: Users, projects and tasks
//! - `store`: Storage traits with PostgreSQL and in-memory backends
//! - `auth`: Password hashing, JWT, authentication context and project authorization
//! - `db`: Connection pool and migrations
//! - `projects`: Project aggregate operations (collaborators, cascade delete)
//! - `tasks`: Task aggregate operations
//! - `stats`: Per-user statistics rollup
//! - `error`: Domain error taxonomy

pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod projects;
pub mod stats;
pub mod store;
pub mod tasks;

/// Current version of the TaskHub shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
