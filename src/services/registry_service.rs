use crate::models::{ConfigDocument, CreateServerRequest, Server, UpdateServerRequest};
use crate::repositories::{RepositoryError, ServerRepository};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Server not found: {0}")]
    NotFound(String),
    #[error("Server is not active: {0}")]
    Inactive(String),
    #[error("Server is already claimed: {0}")]
    AlreadyClaimed(String),
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl RegistryError {
    /// The server exists but is not in a state that allows the operation.
    pub fn is_precondition_failed(&self) -> bool {
        matches!(
            self,
            RegistryError::Inactive(_) | RegistryError::AlreadyClaimed(_)
        )
    }
}

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Result of the claim-or-reconnect performed by `connect`.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectOutcome {
    Claimed(Server),
    Reconnected(Server),
}

impl ConnectOutcome {
    pub fn server(&self) -> &Server {
        match self {
            ConnectOutcome::Claimed(server) | ConnectOutcome::Reconnected(server) => server,
        }
    }
}

/// The connection registry: catalog queries, claim lifecycle and
/// administrative maintenance of MCP servers.
#[derive(Clone)]
pub struct RegistryService {
    repository: Arc<dyn ServerRepository>,
}

impl RegistryService {
    pub fn new(repository: Arc<dyn ServerRepository>) -> Self {
        Self { repository }
    }

    // Catalog queries
    pub async fn list_available(&self) -> RegistryResult<Vec<Server>> {
        Ok(self.repository.list_available().await?)
    }

    /// Every active server, whoever holds it.
    pub async fn list_active(&self) -> RegistryResult<Vec<Server>> {
        Ok(self.repository.list_active().await?)
    }

    pub async fn list_claimed_by(&self, user_id: &str) -> RegistryResult<Vec<Server>> {
        Ok(self.repository.list_by_user(user_id).await?)
    }

    pub async fn list_connected(&self, user_id: &str) -> RegistryResult<Vec<Server>> {
        Ok(self.repository.list_connected(user_id).await?)
    }

    pub async fn list_all(&self) -> RegistryResult<Vec<Server>> {
        Ok(self.repository.list_all().await?)
    }

    pub async fn get(&self, server_id: &str) -> RegistryResult<Server> {
        debug!(server_id, "Looking up server");
        self.repository
            .find_by_id(server_id)
            .await?
            .ok_or_else(|| RegistryError::NotFound(server_id.to_string()))
    }

    /// Ownership-scoped lookup: a server owned by someone else is reported
    /// exactly like a missing one.
    pub async fn get_claimed(&self, server_id: &str, user_id: &str) -> RegistryResult<Server> {
        self.repository
            .find_claimed(server_id, user_id)
            .await?
            .ok_or_else(|| RegistryError::NotFound(server_id.to_string()))
    }

    // Claim lifecycle
    pub async fn claim(
        &self,
        server_id: &str,
        user_id: &str,
        user_config: Option<ConfigDocument>,
    ) -> RegistryResult<Server> {
        let claimed = self
            .repository
            .claim(server_id, user_id, user_config, Utc::now())
            .await?;

        if !claimed {
            let err = match self.repository.find_by_id(server_id).await? {
                None => RegistryError::NotFound(server_id.to_string()),
                Some(server) if server.is_claimed() => {
                    RegistryError::AlreadyClaimed(server_id.to_string())
                }
                Some(_) => RegistryError::Inactive(server_id.to_string()),
            };
            warn!(server_id, user_id, error = %err, "Claim rejected");
            return Err(err);
        }

        info!(server_id, user_id, "Server claimed");
        self.get_claimed(server_id, user_id).await
    }

    pub async fn release(&self, server_id: &str, user_id: &str) -> RegistryResult<Server> {
        if !self
            .repository
            .release(server_id, user_id, Utc::now())
            .await?
        {
            return Err(RegistryError::NotFound(server_id.to_string()));
        }

        info!(server_id, user_id, "Server released");
        self.get_claimed(server_id, user_id).await
    }

    pub async fn reconnect(&self, server_id: &str, user_id: &str) -> RegistryResult<Server> {
        self.reconnect_with(server_id, user_id, None).await
    }

    async fn reconnect_with(
        &self,
        server_id: &str,
        user_id: &str,
        user_config: Option<ConfigDocument>,
    ) -> RegistryResult<Server> {
        let reconnected = self
            .repository
            .reconnect(server_id, user_id, user_config, Utc::now())
            .await?;

        if !reconnected {
            // Only an owned row can tell us it was the active flag that failed.
            let err = match self.repository.find_claimed(server_id, user_id).await? {
                Some(_) => RegistryError::Inactive(server_id.to_string()),
                None => RegistryError::NotFound(server_id.to_string()),
            };
            warn!(server_id, user_id, error = %err, "Reconnect rejected");
            return Err(err);
        }

        info!(server_id, user_id, "Server reconnected");
        self.get_claimed(server_id, user_id).await
    }

    /// Claim the server, or reconnect if the caller already owns it.
    pub async fn connect(
        &self,
        server_id: &str,
        user_id: &str,
        user_config: Option<ConfigDocument>,
    ) -> RegistryResult<ConnectOutcome> {
        if self
            .repository
            .find_claimed(server_id, user_id)
            .await?
            .is_some()
        {
            let server = self.reconnect_with(server_id, user_id, user_config).await?;
            return Ok(ConnectOutcome::Reconnected(server));
        }

        let server = self.claim(server_id, user_id, user_config).await?;
        Ok(ConnectOutcome::Claimed(server))
    }

    pub async fn update_user_config(
        &self,
        server_id: &str,
        user_id: &str,
        user_config: ConfigDocument,
    ) -> RegistryResult<Server> {
        if !self
            .repository
            .update_user_config(server_id, user_id, user_config, Utc::now())
            .await?
        {
            return Err(RegistryError::NotFound(server_id.to_string()));
        }

        debug!(server_id, user_id, "User config replaced");
        self.get_claimed(server_id, user_id).await
    }

    // Administration
    pub async fn create(&self, request: CreateServerRequest) -> RegistryResult<Server> {
        let server = self.repository.create(request).await?;
        info!(server_id = %server.id, name = %server.name, "Server created");
        Ok(server)
    }

    pub async fn update(
        &self,
        server_id: &str,
        request: UpdateServerRequest,
    ) -> RegistryResult<Server> {
        if !self.repository.update(server_id, request).await? {
            return Err(RegistryError::NotFound(server_id.to_string()));
        }

        info!(server_id, "Server updated");
        self.get(server_id).await
    }

    pub async fn delete(&self, server_id: &str) -> RegistryResult<()> {
        if !self.repository.delete(server_id).await? {
            return Err(RegistryError::NotFound(server_id.to_string()));
        }

        info!(server_id, "Server deleted");
        Ok(())
    }

    /// Populate an empty catalog with the stock sample servers. Returns how
    /// many were inserted; a catalog that already has rows is left alone.
    pub async fn seed_sample_servers(&self) -> RegistryResult<usize> {
        if self.repository.count().await? > 0 {
            debug!("Catalog already populated, skipping sample servers");
            return Ok(0);
        }

        let samples = sample_servers();
        let total = samples.len();
        for request in samples {
            self.repository.create(request).await?;
        }

        info!(count = total, "Created sample servers");
        Ok(total)
    }
}

fn sample_servers() -> Vec<CreateServerRequest> {
    [
        (
            "File System Server",
            "filesystem",
            "Access and manage files and directories",
            "stdio",
        ),
        (
            "Database Query Server",
            "database",
            "Execute database queries and manage data",
            "stdio",
        ),
        (
            "Web Search Server",
            "websearch",
            "Search the web for information",
            "http",
        ),
        (
            "Code Analysis Server",
            "codeanalysis",
            "Analyze and understand code repositories",
            "stdio",
        ),
        (
            "Git Operations Server",
            "git",
            "Perform Git operations and version control",
            "stdio",
        ),
        (
            "Terminal Server",
            "terminal",
            "Execute terminal commands",
            "stdio",
        ),
        (
            "API Client Server",
            "apiclient",
            "Make HTTP API calls and handle responses",
            "http",
        ),
        (
            "Calendar Server",
            "calendar",
            "Manage calendar events and schedules",
            "http",
        ),
    ]
    .into_iter()
    .map(|(name, server_type, description, transport)| {
        let mut base_config = ConfigDocument::new();
        base_config.insert("transport".to_string(), json!(transport));
        base_config.insert("url".to_string(), json!(format!("mcp://{}", server_type)));

        CreateServerRequest {
            name: name.to_string(),
            server_type: server_type.to_string(),
            description: Some(description.to_string()),
            base_config,
        }
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::server_repository::MockServerRepository;

    fn server(is_active: bool, user_id: Option<&str>) -> Server {
        Server {
            id: "srv-1".to_string(),
            name: "Terminal Server".to_string(),
            server_type: "terminal".to_string(),
            description: None,
            base_config: ConfigDocument::new(),
            is_active,
            user_id: user_id.map(str::to_string),
            is_connected: user_id.is_some(),
            user_config: None,
            created_at: Utc::now(),
            connected_at: None,
            last_used: None,
        }
    }

    fn service(mock: MockServerRepository) -> RegistryService {
        RegistryService::new(Arc::new(mock))
    }

    #[tokio::test]
    async fn claim_rejection_on_unknown_server_is_not_found() {
        let mut mock = MockServerRepository::new();
        mock.expect_claim().returning(|_, _, _, _| Ok(false));
        mock.expect_find_by_id().returning(|_| Ok(None));

        let err = service(mock).claim("srv-1", "alice", None).await.unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(_)));
        assert!(!err.is_precondition_failed());
    }

    #[tokio::test]
    async fn claim_rejection_on_inactive_server_is_inactive() {
        let mut mock = MockServerRepository::new();
        mock.expect_claim().returning(|_, _, _, _| Ok(false));
        mock.expect_find_by_id()
            .returning(|_| Ok(Some(server(false, None))));

        let err = service(mock).claim("srv-1", "alice", None).await.unwrap_err();
        assert!(matches!(err, RegistryError::Inactive(_)));
        assert!(err.is_precondition_failed());
    }

    #[tokio::test]
    async fn claim_rejection_on_owned_server_is_already_claimed() {
        let mut mock = MockServerRepository::new();
        mock.expect_claim().returning(|_, _, _, _| Ok(false));
        mock.expect_find_by_id()
            .returning(|_| Ok(Some(server(true, Some("bob")))));

        let err = service(mock).claim("srv-1", "alice", None).await.unwrap_err();
        assert!(matches!(err, RegistryError::AlreadyClaimed(_)));
    }

    #[tokio::test]
    async fn backend_failure_propagates_as_repository_error() {
        let mut mock = MockServerRepository::new();
        mock.expect_claim()
            .returning(|_, _, _, _| Err(RepositoryError::Database(sqlx::Error::PoolTimedOut)));

        let err = service(mock).claim("srv-1", "alice", None).await.unwrap_err();
        assert!(matches!(err, RegistryError::Repository(_)));
    }

    #[tokio::test]
    async fn connect_reconnects_when_caller_already_owns_server() {
        let mut mock = MockServerRepository::new();
        mock.expect_find_claimed()
            .returning(|_, _| Ok(Some(server(true, Some("alice")))));
        mock.expect_reconnect().times(1).returning(|_, _, _, _| Ok(true));
        mock.expect_claim().never();

        let outcome = service(mock)
            .connect("srv-1", "alice", None)
            .await
            .unwrap();
        assert!(matches!(outcome, ConnectOutcome::Reconnected(_)));
    }

    #[tokio::test]
    async fn reconnect_on_deactivated_owned_server_is_inactive() {
        let mut mock = MockServerRepository::new();
        mock.expect_reconnect().returning(|_, _, _, _| Ok(false));
        mock.expect_find_claimed()
            .returning(|_, _| Ok(Some(server(false, Some("alice")))));

        let err = service(mock).reconnect("srv-1", "alice").await.unwrap_err();
        assert!(matches!(err, RegistryError::Inactive(_)));
    }

    #[tokio::test]
    async fn seeding_skips_populated_catalog() {
        let mut mock = MockServerRepository::new();
        mock.expect_count().returning(|| Ok(3));
        mock.expect_create().never();

        assert_eq!(service(mock).seed_sample_servers().await.unwrap(), 0);
    }

    #[test]
    fn sample_servers_carry_transport_and_url() {
        let samples = sample_servers();
        assert_eq!(samples.len(), 8);

        let git = samples
            .iter()
            .find(|s| s.server_type == "git")
            .expect("git sample present");
        assert_eq!(git.base_config["transport"], json!("stdio"));
        assert_eq!(git.base_config["url"], json!("mcp://git"));
    }
}
