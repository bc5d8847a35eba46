pub mod error;
pub mod server_repository;
pub mod user_repository;

pub use error::{RepositoryError, RepositoryResult};
pub use server_repository::{ServerRepository, SqliteServerRepository};
pub use user_repository::{SqliteUserRepository, UserRepository};
