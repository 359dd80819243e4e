/// Project endpoints
///
/// | Endpoint                                    | Required role            |
/// |---------------------------------------------|--------------------------|
/// | `POST /api/projects`                        | any user                 |
/// | `GET /api/projects`                         | any user (own projects)  |
/// | `GET /api/projects/:id`                     | creator or collaborator  |
/// | `PUT /api/projects/:id`                     | creator                  |
/// | `DELETE /api/projects/:id`                  | creator                  |
/// | `POST /api/projects/:id/collaborators`      | creator                  |
/// | `DELETE /api/projects/:id/collaborators`    | creator                  |

use super::MessageResponse;
use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use taskhub_shared::{
    auth::{
        authorization::{require_project_access, ProjectAccess, ProjectContext},
        middleware::AuthContext,
    },
    models::project::ProjectDetails,
    projects::{self, ProjectPage},
    store::query::PageRequest,
};
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
}

/// Raw paging parameters; bad values fall back to defaults
#[derive(Debug, Default, Deserialize)]
pub struct ListProjectsQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddCollaboratorRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveCollaboratorRequest {
    pub collaborator_id: String,
}

async fn guard(
    state: &AppState,
    auth: AuthContext,
    project_id: &str,
    access: ProjectAccess,
) -> ApiResult<ProjectContext> {
    Ok(require_project_access(&state.stores, auth.user_id, project_id, access).await?)
}

/// Creates a project owned by the caller; responds `201`
pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<ProjectDetails>)> {
    let project = projects::create_project(&state.stores, auth.user_id, &req.name).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

/// Lists the caller's projects, newest first
///
/// ```text
/// GET /api/projects?page=2&limit=5
/// ```
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListProjectsQuery>,
) -> ApiResult<Json<ProjectPage>> {
    let page = PageRequest::from_query(query.page.as_deref(), query.limit.as_deref());
    let page = projects::list_projects(&state.stores, auth.user_id, page).await?;
    Ok(Json(page))
}

pub async fn get_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<String>,
) -> ApiResult<Json<ProjectDetails>> {
    let ctx = guard(&state, auth, &project_id, ProjectAccess::CreatorOrCollaborator).await?;
    Ok(Json(projects::project_details(&state.stores, ctx.project).await?))
}

/// Renames a project; a body without `name` changes nothing
pub async fn update_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<String>,
    Json(req): Json<UpdateProjectRequest>,
) -> ApiResult<Json<ProjectDetails>> {
    let ctx = guard(&state, auth, &project_id, ProjectAccess::CreatorOnly).await?;
    let project = projects::rename_project(&state.stores, ctx, req.name.as_deref()).await?;
    Ok(Json(project))
}

/// Deletes a project together with its tasks
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let ctx = guard(&state, auth, &project_id, ProjectAccess::CreatorOnly).await?;
    projects::delete_project(&state.stores, ctx).await?;

    Ok(Json(MessageResponse {
        message: "Project deleted successfully".to_string(),
    }))
}

/// Adds a collaborator by email
///
/// ```text
/// POST /api/projects/:id/collaborators
///
/// { "email": "friend@example.com" }
/// ```
///
/// # Errors
///
/// - `404 Not Found`: no user with this email
/// - `409 Conflict`: the user is the creator or already a collaborator
pub async fn add_collaborator(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<String>,
    Json(mut req): Json<AddCollaboratorRequest>,
) -> ApiResult<Json<ProjectDetails>> {
    let ctx = guard(&state, auth, &project_id, ProjectAccess::CreatorOnly).await?;
    req.email = req.email.trim().to_string();
    req.validate()?;

    let project = projects::add_collaborator(&state.stores, ctx, &req.email).await?;
    Ok(Json(project))
}

/// Removes a collaborator
///
/// ```text
/// DELETE /api/projects/:id/collaborators
///
/// { "collaboratorId": "..." }
/// ```
///
/// # Errors
///
/// - `409 Conflict`: tasks of this project are still assigned to them
/// - `404 Not Found`: they are not a collaborator
pub async fn remove_collaborator(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<String>,
    Json(req): Json<RemoveCollaboratorRequest>,
) -> ApiResult<Json<ProjectDetails>> {
    let ctx = guard(&state, auth, &project_id, ProjectAccess::CreatorOnly).await?;

    let project = projects::remove_collaborator(&state.stores, ctx, &req.collaborator_id).await?;
    Ok(Json(project))
}
