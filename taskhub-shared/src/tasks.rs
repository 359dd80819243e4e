/// Task aggregate operations
///
/// All operations run inside an already-guarded project. The owning project
/// is taken from the guard context, never from client input, and cannot be
/// changed afterwards.
///
/// A task is always assigned to a member of its project: the creator or one
/// of the collaborators at the time of assignment.

use std::collections::HashMap;

use tracing::info;
use uuid::Uuid;

use crate::auth::authorization::{ProjectContext, TaskContext};
use crate::error::{DomainError, DomainResult};
use crate::models::project::Project;
use crate::models::task::{CreateTask, Task, TaskDetails, TaskPriority, TaskStatus, UpdateTask};
use crate::models::user::UserSummary;
use crate::store::query::{TaskFilter, TaskSort};
use crate::store::{StoreError, Stores};

/// Longest accepted task description, in characters
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Input for [`create_task`]
#[derive(Debug, Clone)]
pub struct NewTask {
    pub description: String,
    /// Defaults to pending
    pub status: Option<TaskStatus>,
    /// Defaults to medium
    pub priority: Option<TaskPriority>,
    pub assigned_to: Uuid,
}

/// Optional criteria for [`list_tasks`]
#[derive(Debug, Clone, Default)]
pub struct TaskQuery {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assigned_to: Option<Uuid>,
    pub sort: TaskSort,
}

fn validate_description(raw: &str) -> DomainResult<String> {
    let description = raw.trim();
    if description.is_empty() {
        return Err(DomainError::invalid("description", "Description is required"));
    }
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(DomainError::invalid(
            "description",
            format!("Description must be at most {} characters", MAX_DESCRIPTION_LEN),
        ));
    }
    Ok(description.to_string())
}

fn ensure_member(project: &Project, assignee: Uuid) -> DomainResult<()> {
    if project.creator_id == assignee || project.has_collaborator(assignee) {
        Ok(())
    } else {
        Err(DomainError::invalid(
            "assignedTo",
            "Assignee must be the project creator or a collaborator",
        ))
    }
}

async fn with_assignees(stores: &Stores, tasks: Vec<Task>) -> DomainResult<Vec<TaskDetails>> {
    let mut ids: Vec<Uuid> = tasks.iter().map(|t| t.assigned_to).collect();
    ids.sort_unstable();
    ids.dedup();

    let users: HashMap<Uuid, UserSummary> = stores
        .users
        .find_by_ids(&ids)
        .await?
        .iter()
        .map(|u| (u.id, UserSummary::from(u)))
        .collect();

    Ok(tasks
        .into_iter()
        .map(|t| {
            let assignee = users.get(&t.assigned_to).cloned();
            TaskDetails::new(t, assignee)
        })
        .collect())
}

async fn details(stores: &Stores, task: Task) -> DomainResult<TaskDetails> {
    let assignee = stores
        .users
        .find_by_id(task.assigned_to)
        .await?
        .map(|u| UserSummary::from(&u));
    Ok(TaskDetails::new(task, assignee))
}

/// Creates a task in the guarded project
pub async fn create_task(
    stores: &Stores,
    ctx: ProjectContext,
    input: NewTask,
) -> DomainResult<TaskDetails> {
    let description = validate_description(&input.description)?;
    ensure_member(&ctx.project, input.assigned_to)?;

    let task = stores
        .tasks
        .create(CreateTask {
            description,
            status: input.status.unwrap_or_default(),
            priority: input.priority.unwrap_or_default(),
            project_id: ctx.project.id,
            assigned_to: input.assigned_to,
        })
        .await
        .map_err(|e| match e {
            StoreError::RowNotFound => DomainError::not_found("Project not found"),
            other => DomainError::Store(other),
        })?;

    info!(
        task_id = %task.id,
        project_id = %task.project_id,
        user_id = %ctx.user_id,
        "Task created"
    );

    details(stores, task).await
}

/// Lists the tasks of the guarded project
pub async fn list_tasks(
    stores: &Stores,
    ctx: &ProjectContext,
    query: TaskQuery,
) -> DomainResult<Vec<TaskDetails>> {
    let filter = TaskFilter {
        project_ids: vec![ctx.project.id],
        status: query.status,
        priority: query.priority,
        assigned_to: query.assigned_to,
    };

    let tasks = stores.tasks.find(&filter, &query.sort).await?;
    with_assignees(stores, tasks).await
}

/// The guarded task with its assignee resolved
pub async fn task_details(stores: &Stores, ctx: TaskContext) -> DomainResult<TaskDetails> {
    details(stores, ctx.task).await
}

/// Applies a partial update to the guarded task
pub async fn update_task(
    stores: &Stores,
    ctx: TaskContext,
    mut update: UpdateTask,
) -> DomainResult<TaskDetails> {
    if let Some(description) = update.description.take() {
        update.description = Some(validate_description(&description)?);
    }
    if let Some(assignee) = update.assigned_to {
        ensure_member(&ctx.project.project, assignee)?;
    }

    let mut task = ctx.task;
    if update.is_empty() {
        return details(stores, task).await;
    }
    update.apply_to(&mut task);

    let task = stores.tasks.save(&task).await.map_err(|e| match e {
        StoreError::RowNotFound => DomainError::not_found("Task not found"),
        other => DomainError::Store(other),
    })?;

    info!(task_id = %task.id, user_id = %ctx.project.user_id, "Task updated");

    details(stores, task).await
}

/// Deletes the guarded task
pub async fn delete_task(stores: &Stores, ctx: TaskContext) -> DomainResult<()> {
    if !stores.tasks.delete(ctx.task.id).await? {
        return Err(DomainError::not_found("Task not found"));
    }

    info!(task_id = %ctx.task.id, user_id = %ctx.project.user_id, "Task deleted");

    Ok(())
}
