pub mod registry_service;
pub mod user_service;

pub use registry_service::{ConnectOutcome, RegistryError, RegistryResult, RegistryService};
pub use user_service::{UserService, UserServiceError};
