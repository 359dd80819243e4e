/// Project model
///
/// A project has exactly one creator and an ordered list of collaborators.
/// The creator is fixed at creation; only the creator renames the project,
/// manages collaborators or deletes it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(200) NOT NULL,
///     creator_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     collaborators UUID[] NOT NULL DEFAULT '{}',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Collaborator order is insertion order. It matters for display only;
/// access checks treat the list as a set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserSummary;

/// Project record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Unique project ID
    pub id: Uuid,

    /// Project name (trimmed, never empty)
    pub name: String,

    /// User who created the project
    #[serde(rename = "creator")]
    pub creator_id: Uuid,

    /// Collaborator user IDs in the order they were added
    pub collaborators: Vec<Uuid>,

    /// When the project was created
    pub created_at: DateTime<Utc>,

    /// When the project was last modified
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Whether `user_id` appears in the collaborator list
    pub fn has_collaborator(&self, user_id: Uuid) -> bool {
        self.collaborators.contains(&user_id)
    }

    /// Creator followed by collaborators, without duplicates
    pub fn member_ids(&self) -> Vec<Uuid> {
        let mut ids = Vec::with_capacity(self.collaborators.len() + 1);
        ids.push(self.creator_id);
        for id in &self.collaborators {
            if !ids.contains(id) {
                ids.push(*id);
            }
        }
        ids
    }
}

/// Input for creating a project
#[derive(Debug, Clone)]
pub struct CreateProject {
    /// Project name
    pub name: String,

    /// Authenticated user creating the project
    pub creator_id: Uuid,
}

/// Project with its creator and collaborators resolved to user summaries
///
/// This is the shape returned by every project endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetails {
    pub id: Uuid,
    pub name: String,
    /// `None` only if the creator's account no longer exists
    pub creator: Option<UserSummary>,
    pub collaborators: Vec<UserSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
