pub mod admin_handlers;
pub mod server_handlers;
pub mod system_handlers;
pub mod user_handlers;

pub use admin_handlers::{create_server, delete_server, update_server};
pub use server_handlers::{
    connect_server, disconnect_server, get_server, list_servers, update_user_config,
};
pub use system_handlers::health_handler;
pub use user_handlers::{get_profile, update_profile};
