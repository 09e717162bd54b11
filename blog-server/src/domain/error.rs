use crate::domain::validation::FieldErrors;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("User not found")]
    UserNotFound,

    #[error("User already exists")]
    UserAlreadyExists,

    #[error("Please enter a correct username and password")]
    InvalidCredentials,

    #[error("Post not found")]
    PostNotFound,

    #[error("Forbidden: you don't have permission to perform this action")]
    Forbidden,

    #[error("Validation error: {0}")]
    Validation(FieldErrors),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl DomainError {
    pub fn to_status_code(&self) -> u16 {
        match self {
            Self::UserNotFound | Self::PostNotFound => 404,
            Self::UserAlreadyExists => 409,
            Self::InvalidCredentials | Self::Unauthorized(_) => 401,
            Self::Forbidden => 403,
            Self::Validation(_) => 400,
            Self::DatabaseError(_) | Self::InternalError(_) => 500,
        }
    }

    /// Shorthand for a validation failure blaming a single field.
    pub fn field(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.add(field, message);
        Self::Validation(errors)
    }
}

impl From<FieldErrors> for DomainError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::UserNotFound,
            _ => Self::DatabaseError(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_error_taxonomy() {
        assert_eq!(DomainError::InvalidCredentials.to_status_code(), 401);
        assert_eq!(DomainError::Forbidden.to_status_code(), 403);
        assert_eq!(DomainError::PostNotFound.to_status_code(), 404);
        assert_eq!(
            DomainError::field("title", "title too short").to_status_code(),
            400
        );
        assert_eq!(
            DomainError::DatabaseError("boom".into()).to_status_code(),
            500
        );
    }

    #[test]
    fn field_shorthand_blames_one_field() {
        match DomainError::field("username", "duplicate username") {
            DomainError::Validation(errors) => {
                assert_eq!(errors.get("username"), Some(&["duplicate username".to_string()][..]));
                assert_eq!(errors.len(), 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
