/// Statistics endpoint
///
/// `GET /api/stats` returns the caller's project and task rollup, see
/// [`taskhub_shared::stats::UserStats`].

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Extension, Json};
use taskhub_shared::auth::middleware::AuthContext;
use taskhub_shared::stats::{compute_user_stats, UserStats};

pub async fn user_stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<UserStats>> {
    Ok(Json(compute_user_stats(&state.stores, auth.user_id).await?))
}
