//! Administrative catalog maintenance. Every handler requires [`AdminAccess`].

use crate::auth::AdminAccess;
use crate::error::{AppError, Result};
use crate::models::{CreateServerRequest, Server, UpdateServerRequest};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};

/// `POST /servers`
pub async fn create_server(
    State(state): State<AppState>,
    _admin: AdminAccess,
    request: std::result::Result<Json<CreateServerRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Server>)> {
    let Json(request) = request?;
    if request.name.trim().is_empty() || request.server_type.trim().is_empty() {
        return Err(AppError::Validation(
            "name and server_type are required".to_string(),
        ));
    }

    let server = state.registry.create(request).await?;
    Ok((StatusCode::CREATED, Json(server)))
}

/// `PUT /servers/{id}`
pub async fn update_server(
    State(state): State<AppState>,
    _admin: AdminAccess,
    Path(server_id): Path<String>,
    request: std::result::Result<Json<UpdateServerRequest>, JsonRejection>,
) -> Result<Json<Server>> {
    let Json(request) = request?;
    let server = state.registry.update(&server_id, request).await?;
    Ok(Json(server))
}

/// `DELETE /servers/{id}`
pub async fn delete_server(
    State(state): State<AppState>,
    _admin: AdminAccess,
    Path(server_id): Path<String>,
) -> Result<Json<Value>> {
    state.registry.delete(&server_id).await?;
    Ok(Json(json!({
        "message": "Server deleted successfully",
        "server_id": server_id,
    })))
}
