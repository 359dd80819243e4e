/// Task endpoints, nested under a project
///
/// Every handler first requires the caller to be the project's creator or a
/// collaborator. Handlers addressing one task also require that the task
/// belongs to the project in the path.
///
/// # Listing
///
/// ```text
/// GET /api/projects/:id/tasks?status=pending&priority=high&assignedTo=<uuid>&sort=-priority,createdAt:asc
/// ```
///
/// Unknown filter values are rejected with `400`. Unknown sort fields are
/// ignored.

use super::MessageResponse;
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use taskhub_shared::{
    auth::{
        authorization::{
            require_project_access, require_task_in_project, ProjectAccess, ProjectContext,
            TaskContext,
        },
        middleware::AuthContext,
    },
    models::{
        parse_id,
        task::{TaskDetails, TaskPriority, TaskStatus, UpdateTask},
    },
    store::query::TaskSort,
    tasks::{self, NewTask, TaskQuery},
};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub description: String,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assigned_to: String,
}

/// Partial update; absent fields keep their value
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assigned_to: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksQuery {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assigned_to: Option<String>,
    pub sort: Option<String>,
}

fn assignee(raw: &str) -> ApiResult<Uuid> {
    parse_id(raw).ok_or_else(|| ApiError::invalid_field("assignedTo", "Invalid user id"))
}

impl ListTasksQuery {
    fn into_task_query(self) -> ApiResult<TaskQuery> {
        Ok(TaskQuery {
            status: self
                .status
                .map(|s| s.parse::<TaskStatus>())
                .transpose()
                .map_err(|e| ApiError::BadRequest(e.to_string()))?,
            priority: self
                .priority
                .map(|p| p.parse::<TaskPriority>())
                .transpose()
                .map_err(|e| ApiError::BadRequest(e.to_string()))?,
            assigned_to: self
                .assigned_to
                .map(|raw| {
                    parse_id(&raw).ok_or_else(|| {
                        ApiError::BadRequest(format!("Invalid assignedTo: {}", raw))
                    })
                })
                .transpose()?,
            sort: self
                .sort
                .as_deref()
                .map(TaskSort::parse)
                .unwrap_or_default(),
        })
    }
}

async fn project_guard(
    state: &AppState,
    auth: AuthContext,
    project_id: &str,
) -> ApiResult<ProjectContext> {
    Ok(require_project_access(
        &state.stores,
        auth.user_id,
        project_id,
        ProjectAccess::CreatorOrCollaborator,
    )
    .await?)
}

async fn task_guard(
    state: &AppState,
    auth: AuthContext,
    project_id: &str,
    task_id: &str,
) -> ApiResult<TaskContext> {
    let project = project_guard(state, auth, project_id).await?;
    Ok(require_task_in_project(&state.stores, project, task_id).await?)
}

/// Creates a task; responds `201`
///
/// ```text
/// POST /api/projects/:id/tasks
///
/// { "description": "Write docs", "priority": "high", "assignedTo": "<uuid>" }
/// ```
///
/// `status` defaults to `pending`, `priority` to `medium`. The assignee
/// must be a member of the project (`422` otherwise).
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<String>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskDetails>)> {
    let ctx = project_guard(&state, auth, &project_id).await?;

    let task = tasks::create_task(
        &state.stores,
        ctx,
        NewTask {
            description: req.description,
            status: req.status,
            priority: req.priority,
            assigned_to: assignee(&req.assigned_to)?,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<String>,
    Query(query): Query<ListTasksQuery>,
) -> ApiResult<Json<Vec<TaskDetails>>> {
    let ctx = project_guard(&state, auth, &project_id).await?;
    let query = query.into_task_query()?;

    Ok(Json(tasks::list_tasks(&state.stores, &ctx, query).await?))
}

pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_id, task_id)): Path<(String, String)>,
) -> ApiResult<Json<TaskDetails>> {
    let ctx = task_guard(&state, auth, &project_id, &task_id).await?;
    Ok(Json(tasks::task_details(&state.stores, ctx).await?))
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_id, task_id)): Path<(String, String)>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<TaskDetails>> {
    let ctx = task_guard(&state, auth, &project_id, &task_id).await?;

    let update = UpdateTask {
        description: req.description,
        status: req.status,
        priority: req.priority,
        assigned_to: req.assigned_to.as_deref().map(assignee).transpose()?,
    };

    Ok(Json(tasks::update_task(&state.stores, ctx, update).await?))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_id, task_id)): Path<(String, String)>,
) -> ApiResult<Json<MessageResponse>> {
    let ctx = task_guard(&state, auth, &project_id, &task_id).await?;
    tasks::delete_task(&state.stores, ctx).await?;

    Ok(Json(MessageResponse {
        message: "Task deleted successfully".to_string(),
    }))
}
