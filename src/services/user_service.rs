use crate::models::user::{UpdateProfileRequest, User};
use crate::repositories::user_repository::UserRepository;
use crate::repositories::RepositoryError;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    #[error("Invalid email address")]
    InvalidEmail,
    #[error("User id must not be empty")]
    EmptyUserId,
    #[error("User not found")]
    UserNotFound,
    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),
}

pub struct UserService {
    repository: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    /// Look the user up, creating it on first contact with the name set to the
    /// id and an empty email.
    pub async fn ensure_user(&self, user_id: &str) -> Result<User, UserServiceError> {
        if user_id.trim().is_empty() {
            return Err(UserServiceError::EmptyUserId);
        }

        Ok(self.repository.ensure_user(user_id).await?)
    }

    pub async fn get_user(&self, user_id: &str) -> Result<User, UserServiceError> {
        self.repository
            .find_by_id(user_id)
            .await?
            .ok_or(UserServiceError::UserNotFound)
    }

    pub async fn update_profile(
        &self,
        user_id: &str,
        request: UpdateProfileRequest,
    ) -> Result<User, UserServiceError> {
        let email = request.email.map(|e| e.trim().to_string());
        if let Some(ref email) = email {
            self.validate_email(email)?;
        }
        let name = request
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        self.ensure_user(user_id).await?;

        match self.repository.update_profile(user_id, name, email).await {
            Ok(()) => {}
            Err(RepositoryError::NotFound) => return Err(UserServiceError::UserNotFound),
            Err(e) => return Err(UserServiceError::RepositoryError(e)),
        }

        self.get_user(user_id).await
    }

    pub async fn list_users(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<User>, UserServiceError> {
        Ok(self.repository.list_users(limit, offset).await?)
    }

    // An empty email is allowed: it is the default for users created lazily.
    fn validate_email(&self, email: &str) -> Result<(), UserServiceError> {
        if email.is_empty() {
            return Ok(());
        }
        if !email.contains('@') || email.len() < 3 {
            return Err(UserServiceError::InvalidEmail);
        }
        Ok(())
    }
}
