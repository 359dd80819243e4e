/// User lookup
///
/// `GET /api/users/:user_id` returns `{ id, name, email }`. Any
/// authenticated user may look up any other user.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Json,
};
use taskhub_shared::models::{parse_id, user::UserSummary};

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<UserSummary>> {
    let not_found = || ApiError::NotFound("User not found".to_string());

    let id = parse_id(&user_id).ok_or_else(not_found)?;
    let user = state.stores.users.find_by_id(id).await?.ok_or_else(not_found)?;

    Ok(Json(UserSummary::from(&user)))
}
