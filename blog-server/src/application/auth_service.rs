use crate::data::UserRepository;
use crate::domain::user::{LoginForm, NewUser, RegisterForm, UserResponse};
use crate::domain::validation::{self, FieldErrors, DUPLICATE_USERNAME};
use crate::domain::{DomainError, User};
use crate::infrastructure::{SessionService, SessionUser};
use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use std::sync::Arc;

pub fn hash_password(password: &str) -> Result<String, DomainError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            tracing::error!("Password hashing failed: {}", e);
            DomainError::InternalError(format!("Password hashing failed: {}", e))
        })
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, DomainError> {
    let parsed_hash = PasswordHash::new(password_hash).map_err(|e| {
        tracing::error!("Invalid password hash format: {}", e);
        DomainError::InternalError(format!("Invalid password hash: {}", e))
    })?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

// Argon2 is CPU-bound; keep it off the async worker threads.
async fn run_blocking<T, F>(task: F) -> Result<T, DomainError>
where
    F: FnOnce() -> Result<T, DomainError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task).await.map_err(|e| {
        tracing::error!("Password task failed: {}", e);
        DomainError::InternalError(format!("Password task failed: {}", e))
    })?
}

pub async fn hash_password_blocking(password: String) -> Result<String, DomainError> {
    run_blocking(move || hash_password(&password)).await
}

pub async fn verify_password_blocking(
    password: String,
    password_hash: String,
) -> Result<bool, DomainError> {
    run_blocking(move || verify_password(&password, &password_hash)).await
}

pub struct AuthService {
    user_repo: Arc<dyn UserRepository + Send + Sync>,
    sessions: Arc<SessionService>,
}

impl AuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepository + Send + Sync>,
        sessions: Arc<SessionService>,
    ) -> Self {
        Self {
            user_repo,
            sessions,
        }
    }

    pub async fn register(&self, form: RegisterForm) -> Result<UserResponse, DomainError> {
        tracing::debug!("Registering username: {}", form.username);

        let mut errors = FieldErrors::new();
        if let Err(e) = validation::validate_username(&form.username) {
            errors.merge(e);
        }
        if let Err(e) = validation::validate_password(&form.username, &form.password) {
            errors.merge(e);
        }
        if form.password != form.password_confirm {
            errors.add("password_confirm", "passwords do not match");
        }
        if !errors.has("username") {
            match self.user_repo.find_by_username(&form.username).await {
                Ok(_) => errors.add("username", DUPLICATE_USERNAME),
                Err(DomainError::UserNotFound) => {}
                Err(e) => return Err(e),
            }
        }
        if !errors.is_empty() {
            tracing::debug!("Registration rejected: {}", errors);
            return Err(DomainError::Validation(errors));
        }

        let password_hash = hash_password_blocking(form.password).await?;

        let user = self
            .user_repo
            .create(NewUser {
                username: form.username,
                password_hash,
                is_admin: false,
            })
            .await
            .map_err(|e| match e {
                // lost a race with a concurrent registration
                DomainError::UserAlreadyExists => DomainError::field("username", DUPLICATE_USERNAME),
                other => other,
            })?;

        tracing::info!(
            "User registered successfully: id={}, username={}",
            user.id,
            user.username
        );

        Ok(UserResponse::from(user))
    }

    /// Credential check with no side effects. Unknown usernames and wrong
    /// passwords both yield `None`.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, DomainError> {
        let user = match self.user_repo.find_by_username(username).await {
            Ok(u) => u,
            Err(DomainError::UserNotFound) => {
                tracing::debug!("Unknown username: {}", username);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        if verify_password_blocking(password.to_string(), user.password_hash.clone()).await? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    pub fn start_session(&self, user: &User) -> Result<String, DomainError> {
        let token = self
            .sessions
            .issue(user.id, &user.username, user.session_version)?;
        tracing::info!(
            "User logged in successfully: id={}, username={}",
            user.id,
            user.username
        );
        Ok(token)
    }

    /// Revokes every token issued to the user so far.
    pub async fn end_session(&self, user_id: i64) -> Result<(), DomainError> {
        let version = self.user_repo.bump_session_version(user_id).await?;
        tracing::info!("User logged out: id={}, session_version={}", user_id, version);
        Ok(())
    }

    /// Maps a presented token to a live session. Bad signatures, expired
    /// tokens, deleted users and tokens from before a logout all yield `None`.
    pub async fn resolve_session(&self, token: &str) -> Result<Option<SessionUser>, DomainError> {
        let claimed = match self.sessions.verify(token) {
            Ok(user) => user,
            Err(_) => return Ok(None),
        };

        let user = match self.user_repo.find_by_id(claimed.id).await {
            Ok(user) => user,
            Err(DomainError::UserNotFound) => {
                tracing::debug!("Session for deleted user_id={} rejected", claimed.id);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        if user.session_version != claimed.version {
            tracing::debug!("Revoked session for user_id={} rejected", user.id);
            return Ok(None);
        }

        Ok(Some(SessionUser {
            id: user.id,
            username: user.username,
            version: user.session_version,
        }))
    }

    pub async fn login(&self, form: LoginForm) -> Result<(String, UserResponse), DomainError> {
        match self.authenticate(&form.username, &form.password).await? {
            Some(user) => {
                let token = self.start_session(&user)?;
                Ok((token, UserResponse::from(user)))
            }
            None => {
                tracing::warn!("Failed login attempt for username: {}", form.username);
                Err(DomainError::InvalidCredentials)
            }
        }
    }
}
