use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque configuration payload attached to a server or to a user's claim.
///
/// The registry stores and returns it verbatim and never looks inside.
pub type ConfigDocument = serde_json::Map<String, serde_json::Value>;

/// A connectable MCP server descriptor together with its embedded claim state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub id: String,
    pub name: String,
    pub server_type: String,
    pub description: Option<String>,
    pub base_config: ConfigDocument,
    pub is_active: bool,
    /// Owning user. `None` means the server is available to be claimed.
    pub user_id: Option<String>,
    pub is_connected: bool,
    pub user_config: Option<ConfigDocument>,
    pub created_at: DateTime<Utc>,
    pub connected_at: Option<DateTime<Utc>>,
    pub last_used: Option<DateTime<Utc>>,
}

impl Server {
    pub fn is_claimed(&self) -> bool {
        self.user_id.is_some()
    }

    pub fn is_claimed_by(&self, user_id: &str) -> bool {
        self.user_id.as_deref() == Some(user_id)
    }

    /// Can a user who does not own this server claim it right now?
    pub fn is_available(&self) -> bool {
        self.is_active && !self.is_claimed()
    }
}

/// Server fields that are safe to show to anyone, without claim details.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicServer {
    pub id: String,
    pub name: String,
    pub server_type: String,
    pub description: Option<String>,
    pub base_config: ConfigDocument,
    pub is_active: bool,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Server> for PublicServer {
    fn from(server: Server) -> Self {
        let is_available = server.is_available();
        PublicServer {
            id: server.id,
            name: server.name,
            server_type: server.server_type,
            description: server.description,
            base_config: server.base_config,
            is_active: server.is_active,
            is_available,
            created_at: server.created_at,
        }
    }
}

/// What a caller sees for a single server: the full record for the owner,
/// the public view for everyone else.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ServerView {
    Owned(Server),
    Public(PublicServer),
}

impl ServerView {
    pub fn for_user(server: Server, user_id: &str) -> Self {
        if server.is_claimed_by(user_id) {
            ServerView::Owned(server)
        } else {
            ServerView::Public(server.into())
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateServerRequest {
    pub name: String,
    pub server_type: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub base_config: ConfigDocument,
}

/// Partial administrative update. Only fields that are `Some` are written.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateServerRequest {
    pub name: Option<String>,
    pub server_type: Option<String>,
    pub description: Option<String>,
    pub base_config: Option<ConfigDocument>,
    pub is_active: Option<bool>,
}

impl UpdateServerRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.server_type.is_none()
            && self.description.is_none()
            && self.base_config.is_none()
            && self.is_active.is_none()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectRequest {
    #[serde(default)]
    pub user_config: Option<ConfigDocument>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUserConfigRequest {
    pub user_config: ConfigDocument,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConnectionResponse {
    pub message: String,
    pub server_id: String,
}

impl ConnectionResponse {
    pub fn new(message: impl Into<String>, server_id: impl Into<String>) -> Self {
        ConnectionResponse {
            message: message.into(),
            server_id: server_id.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerListResponse<T> {
    pub servers: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_server() -> Server {
        Server {
            id: "3f6a".to_string(),
            name: "Git Operations Server".to_string(),
            server_type: "git".to_string(),
            description: None,
            base_config: json!({"transport": "stdio"})
                .as_object()
                .cloned()
                .unwrap_or_default(),
            is_active: true,
            user_id: None,
            is_connected: false,
            user_config: None,
            created_at: Utc::now(),
            connected_at: None,
            last_used: None,
        }
    }

    #[test]
    fn unclaimed_active_server_is_available() {
        let server = sample_server();
        assert!(server.is_available());
        assert!(!server.is_claimed());
    }

    #[test]
    fn inactive_or_claimed_server_is_not_available() {
        let mut inactive = sample_server();
        inactive.is_active = false;
        assert!(!inactive.is_available());

        let mut claimed = sample_server();
        claimed.user_id = Some("alice".to_string());
        assert!(!claimed.is_available());
        assert!(claimed.is_claimed_by("alice"));
        assert!(!claimed.is_claimed_by("bob"));
    }

    #[test]
    fn public_view_drops_claim_details() {
        let mut server = sample_server();
        server.user_id = Some("alice".to_string());
        server.user_config = Some(ConfigDocument::new());

        let public = PublicServer::from(server);
        let value = serde_json::to_value(&public).unwrap();

        assert!(value.get("user_id").is_none());
        assert!(value.get("user_config").is_none());
        assert_eq!(value["is_available"], json!(false));
    }

    #[test]
    fn update_request_deserializes_partial_body() {
        let request: UpdateServerRequest =
            serde_json::from_value(json!({"description": "new"})).unwrap();
        assert_eq!(request.description.as_deref(), Some("new"));
        assert!(request.name.is_none());
        assert!(request.is_active.is_none());
        assert!(!request.is_empty());
        assert!(UpdateServerRequest::default().is_empty());
    }
}
