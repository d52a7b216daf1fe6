//! Handlers for the `/children` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use storyteller_core::error::CoreError;
use storyteller_core::types::DbId;
use storyteller_core::validation::{validate_child_age, validate_child_name, validate_interests};
use storyteller_db::models::child::{Child, CreateChild};
use storyteller_db::repositories::ChildRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthParent;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/children
pub async fn list(
    State(state): State<AppState>,
    auth: AuthParent,
) -> AppResult<Json<DataResponse<Vec<Child>>>> {
    let children = ChildRepo::list_for_parent(&state.pool, auth.parent_id).await?;
    Ok(Json(DataResponse { data: children }))
}

/// POST /api/v1/children
///
/// Name and interests are trimmed before storing.
pub async fn create(
    State(state): State<AppState>,
    auth: AuthParent,
    Json(input): Json<CreateChild>,
) -> AppResult<(StatusCode, Json<DataResponse<Child>>)> {
    let input = CreateChild {
        name: validate_child_name(&input.name)?,
        age: input.age,
        interests: validate_interests(&input.interests)?,
    };
    validate_child_age(input.age)?;

    let child = ChildRepo::create(&state.pool, auth.parent_id, &input).await?;
    tracing::info!(parent_id = auth.parent_id, child_id = child.id, "Child created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: child })))
}

/// DELETE /api/v1/children/{id}
///
/// Stories that referenced the child keep existing with no child.
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthParent,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if ChildRepo::delete(&state.pool, auth.parent_id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound {
            entity: "Child",
            id,
        }))
    }
}
