use crate::application::auth_service::hash_password_blocking;
use crate::data::UserRepository;
use crate::domain::user::{NewUser, UserResponse};
use crate::domain::validation::{validate_password, validate_username, FieldErrors};
use crate::domain::DomainError;
use std::sync::Arc;

#[derive(Debug)]
pub enum AdminOutcome {
    Created(UserResponse),
    AlreadyExists,
}

/// Account administration performed outside the HTTP surface.
pub struct AdminService {
    user_repo: Arc<dyn UserRepository + Send + Sync>,
}

impl AdminService {
    pub fn new(user_repo: Arc<dyn UserRepository + Send + Sync>) -> Self {
        Self { user_repo }
    }

    /// Creates an administrator unless the username is already taken.
    pub async fn ensure_admin(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AdminOutcome, DomainError> {
        match self.user_repo.find_by_username(username).await {
            Ok(_) => return Ok(AdminOutcome::AlreadyExists),
            Err(DomainError::UserNotFound) => {}
            Err(e) => return Err(e),
        }

        let mut errors = FieldErrors::new();
        if let Err(e) = validate_username(username) {
            errors.merge(e);
        }
        if let Err(e) = validate_password(username, password) {
            errors.merge(e);
        }
        errors.into_result()?;

        let password_hash = hash_password_blocking(password.to_string()).await?;

        let user = self
            .user_repo
            .create(NewUser {
                username: username.to_string(),
                password_hash,
                is_admin: true,
            })
            .await?;

        tracing::info!("Administrator created: id={}, username={}", user.id, user.username);

        Ok(AdminOutcome::Created(UserResponse::from(user)))
    }

    /// Deletes the account along with everything it owns.
    pub async fn delete_user(&self, username: &str) -> Result<(), DomainError> {
        let user = self.user_repo.find_by_username(username).await?;
        self.user_repo.delete(user.id).await?;

        tracing::info!("User deleted: id={}, username={}", user.id, user.username);
        Ok(())
    }

    pub async fn list_users(&self) -> Result<Vec<UserResponse>, DomainError> {
        let users = self.user_repo.list().await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }
}
