use crate::auth::CurrentUser;
use crate::error::Result;
use crate::models::{UpdateProfileRequest, User};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};

/// `GET /me`
pub async fn get_profile(user: CurrentUser) -> Json<User> {
    Json(user.0)
}

/// `PUT /me`
pub async fn update_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    request: std::result::Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<User>> {
    let Json(request) = request?;
    let updated = state
        .user_service
        .update_profile(user.id(), request)
        .await?;
    Ok(Json(updated))
}
