pub mod server;
pub mod user;

pub use server::{
    ConfigDocument, ConnectRequest, ConnectionResponse, CreateServerRequest, PublicServer, Server,
    ServerListResponse, ServerView, UpdateServerRequest, UpdateUserConfigRequest,
};
pub use user::{UpdateProfileRequest, User};
