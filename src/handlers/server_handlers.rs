use crate::auth::CurrentUser;
use crate::error::{AppError, Result};
use crate::models::{
    ConnectRequest, ConnectionResponse, PublicServer, Server, ServerListResponse, ServerView,
    UpdateUserConfigRequest,
};
use crate::services::ConnectOutcome;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct ListServersQuery {
    pub all: Option<String>,
    pub available: Option<String>,
    pub connected: Option<String>,
    pub owner: Option<String>,
}

/// Presence-style flag: `?available`, `?available=true` and `?available=1`
/// are set, `false`/`0` or an absent key are not.
fn flag(name: &str, value: Option<&str>) -> Result<bool> {
    match value {
        None | Some("false") | Some("0") => Ok(false),
        Some("") | Some("true") | Some("1") => Ok(true),
        Some(other) => Err(AppError::Validation(format!(
            "{} must be true or false, got '{}'",
            name, other
        ))),
    }
}

/// `GET /servers`
///
/// `?available` lists servers anyone may claim. `?all` lists every active
/// server, showing claim details only on the caller's own. Otherwise the
/// caller's own servers are listed, narrowed to live connections with
/// `?connected`.
pub async fn list_servers(
    State(state): State<AppState>,
    user: CurrentUser,
    query: std::result::Result<Query<ListServersQuery>, QueryRejection>,
) -> Result<Response> {
    let Query(query) = query?;

    if flag("available", query.available.as_deref())? {
        let servers = state.registry.list_available().await?;
        let servers: Vec<PublicServer> = servers.into_iter().map(PublicServer::from).collect();
        return Ok(Json(ServerListResponse { servers }).into_response());
    }

    if flag("all", query.all.as_deref())? {
        let servers: Vec<ServerView> = state
            .registry
            .list_active()
            .await?
            .into_iter()
            .map(|server| ServerView::for_user(server, user.id()))
            .collect();
        return Ok(Json(ServerListResponse { servers }).into_response());
    }

    if let Some(owner) = query.owner.as_deref() {
        if owner != "me" && owner != user.id() {
            return Err(AppError::Validation(
                "owner filter only accepts the calling user".to_string(),
            ));
        }
    }

    let servers: Vec<Server> = if flag("connected", query.connected.as_deref())? {
        state.registry.list_connected(user.id()).await?
    } else {
        state.registry.list_claimed_by(user.id()).await?
    };

    Ok(Json(ServerListResponse { servers }).into_response())
}

/// `GET /servers/{id}`
pub async fn get_server(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(server_id): Path<String>,
) -> Result<Json<ServerView>> {
    let server = state.registry.get(&server_id).await?;
    Ok(Json(ServerView::for_user(server, user.id())))
}

/// `POST /servers/{id}/connect`
///
/// The body is optional; when present it must be `{"user_config": {...}}`.
pub async fn connect_server(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(server_id): Path<String>,
    body: Bytes,
) -> Result<Json<ConnectionResponse>> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        ConnectRequest::default()
    } else {
        serde_json::from_slice::<ConnectRequest>(&body)
            .map_err(|e| AppError::Validation(format!("Invalid request body: {}", e)))?
    };

    let outcome = state
        .registry
        .connect(&server_id, user.id(), request.user_config)
        .await?;

    let message = match outcome {
        ConnectOutcome::Claimed(_) => "Successfully connected to server",
        ConnectOutcome::Reconnected(_) => "Successfully reconnected to server",
    };

    Ok(Json(ConnectionResponse::new(message, &outcome.server().id)))
}

/// `POST /servers/{id}/disconnect`
pub async fn disconnect_server(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(server_id): Path<String>,
) -> Result<Json<ConnectionResponse>> {
    let server = state.registry.release(&server_id, user.id()).await?;

    Ok(Json(ConnectionResponse::new(
        "Successfully disconnected from server",
        server.id,
    )))
}

/// `PUT /servers/{id}/config`
pub async fn update_user_config(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(server_id): Path<String>,
    request: std::result::Result<Json<UpdateUserConfigRequest>, JsonRejection>,
) -> Result<Json<ConnectionResponse>> {
    let Json(request) = request?;
    let server = state
        .registry
        .update_user_config(&server_id, user.id(), request.user_config)
        .await?;

    Ok(Json(ConnectionResponse::new(
        "User configuration updated successfully",
        server.id,
    )))
}
