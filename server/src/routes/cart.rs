//! Cart endpoint routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use basket_engine::{AddLineRequest, LineId, LinesResponse, RemoteCartLine, UpdateQuantityRequest};

use crate::auth::AuthUser;
use crate::error::Result;
use crate::handlers::{handle_add, handle_clear, handle_list, handle_remove, handle_update};
use crate::AppState;

/// Create cart routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/cart/lines",
            get(list_handler).post(add_handler).delete(clear_handler),
        )
        .route(
            "/cart/lines/{id}",
            patch(update_handler).delete(remove_handler),
        )
}

/// GET /cart/lines
async fn list_handler(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<LinesResponse>> {
    let response = handle_list(state.repo.as_ref(), &auth.owner).await?;
    Ok(Json(response))
}

/// POST /cart/lines
async fn add_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<AddLineRequest>,
) -> Result<Json<RemoteCartLine>> {
    let now = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0);
    let line = handle_add(state.repo.as_ref(), &auth.owner, request, now).await?;
    Ok(Json(line))
}

/// PATCH /cart/lines/{id}
async fn update_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<LineId>,
    Json(request): Json<UpdateQuantityRequest>,
) -> Result<StatusCode> {
    handle_update(state.repo.as_ref(), &auth.owner, id, request.quantity).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /cart/lines/{id}
async fn remove_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<LineId>,
) -> Result<StatusCode> {
    handle_remove(state.repo.as_ref(), &auth.owner, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /cart/lines
async fn clear_handler(State(state): State<AppState>, auth: AuthUser) -> Result<StatusCode> {
    handle_clear(state.repo.as_ref(), &auth.owner).await?;
    Ok(StatusCode::NO_CONTENT)
}
