/// Domain models for TaskHub
///
/// This module contains the persisted entities and the input/output shapes
/// built around them.
///
/// # Models
///
/// - `user`: Registered accounts (identity store records)
/// - `project`: Projects with a creator and an ordered collaborator list
/// - `task`: Tasks belonging to exactly one project
///
/// All identifiers are UUIDs. Identifiers arriving as strings (path segments,
/// request bodies) go through [`parse_id`]; a string that is not a UUID cannot
/// name any stored record.
///
/// # Example
///
/// ```
/// use taskhub_shared::models::parse_id;
///
/// assert!(parse_id("1b4e28ba-2fa1-11d2-883f-0016d3cca427").is_some());
/// assert!(parse_id("not-an-id").is_none());
/// ```

use uuid::Uuid;

pub mod project;
pub mod task;
pub mod user;

/// Parses an externally supplied identifier
///
/// Surrounding whitespace is ignored. Returns `None` for anything that is not
/// a UUID.
pub fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}
