/// API route handlers, one module per resource
///
/// - `health`: liveness and storage check
/// - `auth`: register, login, profile
/// - `users`: user lookup
/// - `projects`: projects and their collaborators
/// - `tasks`: tasks within a project
/// - `stats`: per-user statistics

pub mod auth;
pub mod health;
pub mod projects;
pub mod stats;
pub mod tasks;
pub mod users;

use crate::error::ApiError;
use serde::Serialize;

/// `{ "message": ... }` body for operations without a resource to return
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Fallback for unmatched paths
pub async fn not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}
