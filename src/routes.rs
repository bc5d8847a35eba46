use crate::{handlers, AppState};
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_handler))
        // Catalog and claim lifecycle
        .route(
            "/servers",
            get(handlers::list_servers).post(handlers::create_server),
        )
        .route(
            "/servers/{id}",
            get(handlers::get_server)
                .put(handlers::update_server)
                .delete(handlers::delete_server),
        )
        .route("/servers/{id}/connect", post(handlers::connect_server))
        .route("/servers/{id}/disconnect", post(handlers::disconnect_server))
        .route("/servers/{id}/config", put(handlers::update_user_config))
        // Profile
        .route(
            "/me",
            get(handlers::get_profile).put(handlers::update_profile),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
