/// Project aggregate operations
///
/// Everything that changes a project or its collaborator list goes through
/// here. Operations that act on an existing project take the
/// [`ProjectContext`] returned by the access guard, so they never run
/// without a prior access check and never re-fetch the project.
///
/// # Collaborator rules
///
/// - Only registered users can be added (looked up by normalized email).
/// - The creator is never a collaborator of their own project.
/// - A user appears at most once in the list.
/// - A collaborator with tasks assigned in the project cannot be removed.
///
/// Collaborator changes are read-modify-write on the loaded project; two
/// concurrent changes to the same project resolve as last write wins.
///
/// # Example
///
/// ```
/// use taskhub_shared::auth::authorization::{require_project_access, ProjectAccess};
/// use taskhub_shared::models::user::CreateUser;
/// use taskhub_shared::projects::{add_collaborator, create_project};
/// use taskhub_shared::store::Stores;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let stores = Stores::in_memory();
/// let owner = stores.users.create(CreateUser {
///     name: "Owner".into(), email: "owner@example.com".into(), password_hash: "x".into(),
/// }).await?;
/// stores.users.create(CreateUser {
///     name: "Friend".into(), email: "friend@example.com".into(), password_hash: "x".into(),
/// }).await?;
///
/// let project = create_project(&stores, owner.id, "Launch").await?;
/// let id = project.id.to_string();
/// let ctx = require_project_access(&stores, owner.id, &id, ProjectAccess::CreatorOnly).await?;
///
/// let project = add_collaborator(&stores, ctx, " Friend@Example.com ").await?;
/// assert_eq!(project.collaborators[0].email, "friend@example.com");
/// # Ok(())
/// # }
/// ```

use std::collections::HashMap;

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::authorization::ProjectContext;
use crate::error::{DomainError, DomainResult};
use crate::models::parse_id;
use crate::models::project::{CreateProject, Project, ProjectDetails};
use crate::models::user::{normalize_email, UserSummary};
use crate::store::query::{PageRequest, ProjectFilter, TaskFilter};
use crate::store::{StoreError, Stores};

/// Longest accepted project name, in characters
pub const MAX_NAME_LEN: usize = 200;

/// One page of a project listing
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPage {
    pub projects: Vec<ProjectDetails>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

fn validate_name(raw: &str) -> DomainResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(DomainError::invalid("name", "Project name is required"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(DomainError::invalid(
            "name",
            format!("Project name must be at most {} characters", MAX_NAME_LEN),
        ));
    }
    Ok(name.to_string())
}

// A project deleted between guard and write surfaces as NotFound.
fn project_write<T>(result: Result<T, StoreError>) -> DomainResult<T> {
    result.map_err(|e| match e {
        StoreError::RowNotFound => DomainError::not_found("Project not found"),
        other => DomainError::Store(other),
    })
}

/// Resolves creator and collaborators of several projects with one user lookup
async fn populate(stores: &Stores, projects: Vec<Project>) -> DomainResult<Vec<ProjectDetails>> {
    let mut ids: Vec<Uuid> = projects.iter().flat_map(|p| p.member_ids()).collect();
    ids.sort_unstable();
    ids.dedup();

    let users: HashMap<Uuid, UserSummary> = stores
        .users
        .find_by_ids(&ids)
        .await?
        .iter()
        .map(|u| (u.id, UserSummary::from(u)))
        .collect();

    Ok(projects
        .into_iter()
        .map(|p| ProjectDetails {
            id: p.id,
            name: p.name,
            creator: users.get(&p.creator_id).cloned(),
            collaborators: p
                .collaborators
                .iter()
                .filter_map(|id| users.get(id).cloned())
                .collect(),
            created_at: p.created_at,
            updated_at: p.updated_at,
        })
        .collect())
}

/// Resolves creator and collaborators of one project
pub async fn project_details(stores: &Stores, project: Project) -> DomainResult<ProjectDetails> {
    populate(stores, vec![project])
        .await?
        .pop()
        .ok_or_else(|| DomainError::not_found("Project not found"))
}

/// Creates a project owned by `creator_id` with no collaborators
pub async fn create_project(
    stores: &Stores,
    creator_id: Uuid,
    name: &str,
) -> DomainResult<ProjectDetails> {
    let name = validate_name(name)?;

    let project = stores
        .projects
        .create(CreateProject { name, creator_id })
        .await?;

    info!(project_id = %project.id, creator_id = %creator_id, "Project created");

    project_details(stores, project).await
}

/// Lists the projects `user_id` created or collaborates on, newest first
///
/// The total count and the page are fetched concurrently.
pub async fn list_projects(
    stores: &Stores,
    user_id: Uuid,
    page: PageRequest,
) -> DomainResult<ProjectPage> {
    let filter = ProjectFilter::accessible_by(user_id);

    let (total, projects) = tokio::try_join!(
        stores.projects.count(&filter),
        stores.projects.find(&filter, page),
    )?;

    Ok(ProjectPage {
        projects: populate(stores, projects).await?,
        page: page.page,
        limit: page.limit,
        total,
        total_pages: page.total_pages(total),
        has_next_page: page.has_next_page(total),
        has_prev_page: page.has_prev_page(),
    })
}

/// Renames a project; `None` leaves it unchanged
pub async fn rename_project(
    stores: &Stores,
    ctx: ProjectContext,
    name: Option<&str>,
) -> DomainResult<ProjectDetails> {
    let Some(name) = name else {
        return project_details(stores, ctx.project).await;
    };

    let mut project = ctx.project;
    project.name = validate_name(name)?;
    let project = project_write(stores.projects.save(&project).await)?;

    info!(project_id = %project.id, "Project renamed");

    project_details(stores, project).await
}

/// Deletes a project and all of its tasks
///
/// Returns the number of tasks removed.
pub async fn delete_project(stores: &Stores, ctx: ProjectContext) -> DomainResult<u64> {
    let project_id = ctx.project.id;

    let removed_tasks = stores.tasks.delete_by_project(project_id).await?;
    if !stores.projects.delete(project_id).await? {
        return Err(DomainError::not_found("Project not found"));
    }

    info!(project_id = %project_id, removed_tasks, "Project deleted");

    Ok(removed_tasks)
}

/// Adds the user registered under `email` as a collaborator
///
/// # Errors
///
/// - `NotFound` if no user has this email
/// - `Conflict` if the user is the creator or already a collaborator
pub async fn add_collaborator(
    stores: &Stores,
    ctx: ProjectContext,
    email: &str,
) -> DomainResult<ProjectDetails> {
    let user = stores
        .users
        .find_by_email(&normalize_email(email))
        .await?
        .ok_or_else(|| DomainError::not_found("User not found"))?;

    let mut project = ctx.project;

    if user.id == project.creator_id {
        return Err(DomainError::conflict(
            "The project creator cannot be added as a collaborator",
        ));
    }
    if project.has_collaborator(user.id) {
        return Err(DomainError::conflict("User is already a collaborator"));
    }

    project.collaborators.push(user.id);
    let project = project_write(stores.projects.save(&project).await)?;

    info!(project_id = %project.id, collaborator_id = %user.id, "Collaborator added");

    project_details(stores, project).await
}

/// Removes a collaborator from the project
///
/// # Errors
///
/// - `Conflict` if a task of the project is still assigned to them
///   (checked first)
/// - `NotFound` if they are not a collaborator
pub async fn remove_collaborator(
    stores: &Stores,
    ctx: ProjectContext,
    collaborator_id: &str,
) -> DomainResult<ProjectDetails> {
    let not_collaborator = || DomainError::not_found("User is not a collaborator of this project");

    let collaborator_id = parse_id(collaborator_id).ok_or_else(not_collaborator)?;
    let mut project = ctx.project;

    let assigned = TaskFilter::in_project(project.id).assigned_to(collaborator_id);
    if stores.tasks.exists(&assigned).await? {
        return Err(DomainError::conflict(
            "Collaborator has tasks assigned in this project",
        ));
    }

    if !project.has_collaborator(collaborator_id) {
        return Err(not_collaborator());
    }

    project.collaborators.retain(|id| *id != collaborator_id);
    let project = project_write(stores.projects.save(&project).await)?;

    info!(project_id = %project.id, collaborator_id = %collaborator_id, "Collaborator removed");

    project_details(stores, project).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::authorization::{require_project_access, ProjectAccess};
    use crate::models::task::{CreateTask, TaskPriority, TaskStatus};
    use crate::models::user::{CreateUser, User};

    async fn user(stores: &Stores, name: &str) -> User {
        stores
            .users
            .create(CreateUser {
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap()
    }

    async fn creator_ctx(stores: &Stores, owner: &User, project_id: Uuid) -> ProjectContext {
        let id = project_id.to_string();
        require_project_access(stores, owner.id, &id, ProjectAccess::CreatorOnly)
            .await
            .unwrap()
    }

    async fn assign_task(stores: &Stores, project_id: Uuid, assignee: Uuid) {
        stores
            .tasks
            .create(CreateTask {
                description: "Assigned work".to_string(),
                status: TaskStatus::Pending,
                priority: TaskPriority::Medium,
                project_id,
                assigned_to: assignee,
            })
            .await
            .unwrap();
    }

    fn collaborator_ids(details: &ProjectDetails) -> Vec<Uuid> {
        details.collaborators.iter().map(|c| c.id).collect()
    }

    #[tokio::test]
    async fn test_create_project_populates_creator() {
        let stores = Stores::in_memory();
        let owner = user(&stores, "Owner").await;

        let details = create_project(&stores, owner.id, "  Launch  ").await.unwrap();

        assert_eq!(details.name, "Launch");
        assert_eq!(details.creator.as_ref().map(|c| c.id), Some(owner.id));
        assert!(details.collaborators.is_empty());
    }

    #[tokio::test]
    async fn test_create_project_rejects_blank_name() {
        let stores = Stores::in_memory();
        let owner = user(&stores, "Owner").await;

        let result = create_project(&stores, owner.id, "   ").await;
        assert!(matches!(result, Err(DomainError::Invalid { field: "name", .. })));
    }

    #[tokio::test]
    async fn test_add_collaborator_by_email() {
        let stores = Stores::in_memory();
        let owner = user(&stores, "Owner").await;
        let ana = user(&stores, "Ana").await;
        let p = create_project(&stores, owner.id, "P").await.unwrap();

        let ctx = creator_ctx(&stores, &owner, p.id).await;
        let details = add_collaborator(&stores, ctx, "ANA@example.com ").await.unwrap();

        assert_eq!(collaborator_ids(&details), vec![ana.id]);
        assert_eq!(details.collaborators[0].name, "Ana");
    }

    #[tokio::test]
    async fn test_add_collaborator_twice_conflicts() {
        let stores = Stores::in_memory();
        let owner = user(&stores, "Owner").await;
        let ana = user(&stores, "Ana").await;
        let p = create_project(&stores, owner.id, "P").await.unwrap();

        add_collaborator(&stores, creator_ctx(&stores, &owner, p.id).await, &ana.email)
            .await
            .unwrap();
        let ctx = creator_ctx(&stores, &owner, p.id).await;
        let second = add_collaborator(&stores, ctx, &ana.email).await;
        assert!(matches!(second, Err(DomainError::Conflict(_))));

        let stored = stores.projects.find_by_id(p.id).await.unwrap().unwrap();
        assert_eq!(stored.collaborators, vec![ana.id]);
    }

    #[tokio::test]
    async fn test_add_creator_conflicts() {
        let stores = Stores::in_memory();
        let owner = user(&stores, "Owner").await;
        let p = create_project(&stores, owner.id, "P").await.unwrap();

        let ctx = creator_ctx(&stores, &owner, p.id).await;
        let result = add_collaborator(&stores, ctx, &owner.email).await;
        assert!(matches!(result, Err(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_add_unknown_email_not_found() {
        let stores = Stores::in_memory();
        let owner = user(&stores, "Owner").await;
        let p = create_project(&stores, owner.id, "P").await.unwrap();

        let ctx = creator_ctx(&stores, &owner, p.id).await;
        let result = add_collaborator(&stores, ctx, "ghost@example.com").await;
        assert!(matches!(result, Err(DomainError::NotFound(_))));

        let stored = stores.projects.find_by_id(p.id).await.unwrap().unwrap();
        assert!(stored.collaborators.is_empty());
    }

    #[tokio::test]
    async fn test_remove_collaborator_keeps_others() {
        let stores = Stores::in_memory();
        let owner = user(&stores, "Owner").await;
        let a = user(&stores, "A").await;
        let b = user(&stores, "B").await;
        let p = create_project(&stores, owner.id, "P").await.unwrap();
        for u in [&a, &b] {
            add_collaborator(&stores, creator_ctx(&stores, &owner, p.id).await, &u.email)
                .await
                .unwrap();
        }

        let ctx = creator_ctx(&stores, &owner, p.id).await;
        let details = remove_collaborator(&stores, ctx, &a.id.to_string()).await.unwrap();

        assert_eq!(collaborator_ids(&details), vec![b.id]);
    }

    #[tokio::test]
    async fn test_remove_collaborator_with_assigned_task_conflicts() {
        let stores = Stores::in_memory();
        let owner = user(&stores, "Owner").await;
        let a = user(&stores, "A").await;
        let p = create_project(&stores, owner.id, "P").await.unwrap();
        add_collaborator(&stores, creator_ctx(&stores, &owner, p.id).await, &a.email)
            .await
            .unwrap();
        assign_task(&stores, p.id, a.id).await;

        let ctx = creator_ctx(&stores, &owner, p.id).await;
        let result = remove_collaborator(&stores, ctx, &a.id.to_string()).await;
        assert!(matches!(result, Err(DomainError::Conflict(_))));

        let stored = stores.projects.find_by_id(p.id).await.unwrap().unwrap();
        assert_eq!(stored.collaborators, vec![a.id]);
    }

    #[tokio::test]
    async fn test_remove_non_collaborator_not_found() {
        let stores = Stores::in_memory();
        let owner = user(&stores, "Owner").await;
        let stranger = user(&stores, "Stranger").await;
        let p = create_project(&stores, owner.id, "P").await.unwrap();

        for id in [stranger.id.to_string(), "nope".to_string()] {
            let ctx = creator_ctx(&stores, &owner, p.id).await;
            let result = remove_collaborator(&stores, ctx, &id).await;
            assert!(matches!(result, Err(DomainError::NotFound(_))));
        }
    }

    #[tokio::test]
    async fn test_delete_project_removes_tasks() {
        let stores = Stores::in_memory();
        let owner = user(&stores, "Owner").await;
        let p = create_project(&stores, owner.id, "P").await.unwrap();
        assign_task(&stores, p.id, owner.id).await;
        assign_task(&stores, p.id, owner.id).await;

        let removed = delete_project(&stores, creator_ctx(&stores, &owner, p.id).await)
            .await
            .unwrap();

        assert_eq!(removed, 2);
        assert!(stores.projects.find_by_id(p.id).await.unwrap().is_none());
        assert_eq!(stores.tasks.count(&TaskFilter::in_project(p.id)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_rename_project() {
        let stores = Stores::in_memory();
        let owner = user(&stores, "Owner").await;
        let p = create_project(&stores, owner.id, "Old").await.unwrap();

        let unchanged = rename_project(&stores, creator_ctx(&stores, &owner, p.id).await, None)
            .await
            .unwrap();
        assert_eq!(unchanged.name, "Old");

        let renamed = rename_project(&stores, creator_ctx(&stores, &owner, p.id).await, Some("New"))
            .await
            .unwrap();
        assert_eq!(renamed.name, "New");
        assert!(renamed.updated_at > p.updated_at);
    }

    #[tokio::test]
    async fn test_list_projects_pagination() {
        let stores = Stores::in_memory();
        let owner = user(&stores, "Owner").await;
        let friend = user(&stores, "Friend").await;

        for i in 0..3 {
            create_project(&stores, owner.id, &format!("Mine {}", i)).await.unwrap();
        }
        let theirs = create_project(&stores, friend.id, "Theirs").await.unwrap();
        add_collaborator(&stores, creator_ctx(&stores, &friend, theirs.id).await, &owner.email)
            .await
            .unwrap();

        let page = list_projects(&stores, owner.id, PageRequest { page: 1, limit: 3 })
            .await
            .unwrap();
        assert_eq!(page.total, 4);
        assert_eq!(page.total_pages, 2);
        assert!(page.has_next_page);
        assert!(!page.has_prev_page);
        assert_eq!(page.projects[0].name, "Theirs");

        let last = list_projects(&stores, owner.id, PageRequest { page: 2, limit: 3 })
            .await
            .unwrap();
        assert_eq!(last.projects.len(), 1);
        assert!(!last.has_next_page);
        assert!(last.has_prev_page);

        let friend_view = list_projects(&stores, friend.id, PageRequest::default()).await.unwrap();
        assert_eq!(friend_view.total, 1);
    }
}
