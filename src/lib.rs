pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

// Make test_utils available for both unit tests and integration tests
pub mod test_utils;

use repositories::{SqliteServerRepository, SqliteUserRepository};
use services::{RegistryService, UserService};
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RegistryService>,
    pub user_service: Arc<UserService>,
    pub admin_token: Option<String>,
}

impl AppState {
    /// Wire the SQLite-backed repositories and services over one pool.
    pub fn new(pool: SqlitePool, admin_token: Option<String>) -> Self {
        let server_repository = Arc::new(SqliteServerRepository::new(pool.clone()));
        let user_repository = Arc::new(SqliteUserRepository::new(pool));

        AppState {
            registry: Arc::new(RegistryService::new(server_repository)),
            user_service: Arc::new(UserService::new(user_repository)),
            admin_token,
        }
    }
}
