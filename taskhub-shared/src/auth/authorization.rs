/// Project membership and access checks
///
/// Every project-scoped operation runs behind these guards. Access depends
/// on one fact: the caller's [`ProjectRole`] in the target project.
///
/// # Permission Model
///
/// 1. **Creator**: the user who created the project. Full control: rename,
///    delete, manage collaborators, plus everything a collaborator can do.
/// 2. **Collaborator**: a user in the project's collaborator list. Reads the
///    project and works on its tasks.
/// 3. **None**: everyone else. No access.
///
/// Guards return the loaded project inside a [`ProjectContext`]; handlers
/// pass that value on instead of fetching the project again.
///
/// # Example
///
/// ```no_run
/// use taskhub_shared::auth::authorization::{
///     require_project_access, require_task_in_project, ProjectAccess,
/// };
/// use taskhub_shared::store::Stores;
/// use uuid::Uuid;
///
/// # async fn example(stores: Stores, user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let ctx = require_project_access(
///     &stores,
///     user_id,
///     "1b4e28ba-2fa1-11d2-883f-0016d3cca427",
///     ProjectAccess::CreatorOrCollaborator,
/// )
/// .await?;
///
/// let task = require_task_in_project(&stores, ctx, "9a1c5e2e-8d0b-4f5e-a1b6-2f3c4d5e6f70").await?;
/// println!("{} in {}", task.task.description, task.project.project.name);
/// # Ok(())
/// # }
/// ```

use std::fmt;

use uuid::Uuid;

use crate::models::parse_id;
use crate::models::project::Project;
use crate::models::task::Task;
use crate::store::{StoreError, Stores};

/// A user's relationship to a project
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectRole {
    Creator,
    Collaborator,
    None,
}

impl ProjectRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectRole::Creator => "creator",
            ProjectRole::Collaborator => "collaborator",
            ProjectRole::None => "none",
        }
    }
}

impl fmt::Display for ProjectRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolves `user_id`'s role in `project`
///
/// Creator wins if the user is (incorrectly) also listed as a collaborator.
///
/// # Example
///
/// ```
/// use taskhub_shared::auth::authorization::{resolve_role, ProjectRole};
/// # use taskhub_shared::models::project::Project;
/// # use chrono::Utc;
/// # use uuid::Uuid;
/// # let creator = Uuid::new_v4();
/// # let project = Project {
/// #     id: Uuid::new_v4(), name: "P".into(), creator_id: creator,
/// #     collaborators: vec![], created_at: Utc::now(), updated_at: Utc::now(),
/// # };
///
/// assert_eq!(resolve_role(creator, &project), ProjectRole::Creator);
/// assert_eq!(resolve_role(Uuid::new_v4(), &project), ProjectRole::None);
/// ```
pub fn resolve_role(user_id: Uuid, project: &Project) -> ProjectRole {
    if project.creator_id == user_id {
        ProjectRole::Creator
    } else if project.has_collaborator(user_id) {
        ProjectRole::Collaborator
    } else {
        ProjectRole::None
    }
}

/// Access level an operation requires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectAccess {
    /// Rename, delete, manage collaborators
    CreatorOnly,

    /// Read the project, work on its tasks
    CreatorOrCollaborator,
}

impl ProjectAccess {
    /// Whether `role` satisfies this access level
    pub fn permits(&self, role: ProjectRole) -> bool {
        match (self, role) {
            (_, ProjectRole::Creator) => true,
            (ProjectAccess::CreatorOrCollaborator, ProjectRole::Collaborator) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ProjectAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectAccess::CreatorOnly => f.write_str("creator"),
            ProjectAccess::CreatorOrCollaborator => f.write_str("creator or collaborator"),
        }
    }
}

/// Error type for access checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// No project with this ID (or the ID is not a UUID)
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    /// No task with this ID (or the ID is not a UUID)
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// Caller's role does not satisfy the required access
    #[error("Not authorized: requires {required}, has {actual}")]
    NotAuthorized {
        required: ProjectAccess,
        actual: ProjectRole,
    },

    /// Task exists but belongs to a different project
    #[error("Task {task_id} does not belong to project {project_id}")]
    TaskOutsideProject { task_id: Uuid, project_id: Uuid },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of a successful project guard
#[derive(Debug, Clone)]
pub struct ProjectContext {
    /// Authenticated caller
    pub user_id: Uuid,

    /// Caller's role in `project` (never [`ProjectRole::None`])
    pub role: ProjectRole,

    /// Project as loaded by the guard
    pub project: Project,
}

/// Result of a successful task guard
#[derive(Debug, Clone)]
pub struct TaskContext {
    pub project: ProjectContext,

    /// Task as loaded by the guard; `task.project_id == project.project.id`
    pub task: Task,
}

/// Loads a project and checks the caller may access it
///
/// # Errors
///
/// - [`AuthzError::ProjectNotFound`] if no such project exists
/// - [`AuthzError::NotAuthorized`] if the caller's role is insufficient
pub async fn require_project_access(
    stores: &Stores,
    user_id: Uuid,
    project_id: &str,
    access: ProjectAccess,
) -> Result<ProjectContext, AuthzError> {
    let not_found = || AuthzError::ProjectNotFound(project_id.to_string());

    let id = parse_id(project_id).ok_or_else(not_found)?;
    let project = stores.projects.find_by_id(id).await?.ok_or_else(not_found)?;

    let role = resolve_role(user_id, &project);
    if !access.permits(role) {
        tracing::debug!(
            user_id = %user_id,
            project_id = %project.id,
            role = %role,
            required = %access,
            "Project access denied"
        );
        return Err(AuthzError::NotAuthorized {
            required: access,
            actual: role,
        });
    }

    Ok(ProjectContext {
        user_id,
        role,
        project,
    })
}

/// Loads a task and checks it belongs to the already-guarded project
///
/// # Errors
///
/// - [`AuthzError::TaskNotFound`] if no such task exists
/// - [`AuthzError::TaskOutsideProject`] if it belongs to another project
pub async fn require_task_in_project(
    stores: &Stores,
    ctx: ProjectContext,
    task_id: &str,
) -> Result<TaskContext, AuthzError> {
    let not_found = || AuthzError::TaskNotFound(task_id.to_string());

    let id = parse_id(task_id).ok_or_else(not_found)?;
    let task = stores.tasks.find_by_id(id).await?.ok_or_else(not_found)?;

    if task.project_id != ctx.project.id {
        return Err(AuthzError::TaskOutsideProject {
            task_id: task.id,
            project_id: ctx.project.id,
        });
    }

    Ok(TaskContext { project: ctx, task })
}
