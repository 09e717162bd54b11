use crate::domain::user::NewUser;
use crate::domain::{DomainError, User};
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: NewUser) -> Result<User, DomainError>;
    async fn find_by_username(&self, username: &str) -> Result<User, DomainError>;
    async fn find_by_id(&self, id: i64) -> Result<User, DomainError>;
    async fn list(&self) -> Result<Vec<User>, DomainError>;
    /// Invalidates every session issued so far and returns the new version.
    async fn bump_session_version(&self, id: i64) -> Result<i64, DomainError>;
    /// Removes the user together with their posts, the comments on those
    /// posts and every comment they wrote, atomically.
    async fn delete(&self, id: i64) -> Result<(), DomainError>;
}

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &PgRow) -> Result<User, DomainError> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        is_admin: row.try_get("is_admin")?,
        session_version: row.try_get("session_version")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, DomainError> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, is_admin, created_at, updated_at)
            VALUES ($1, $2, $3, NOW(), NOW())
            RETURNING id, username, password_hash, is_admin, session_version, created_at, updated_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.is_admin)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            let unique_violation = e
                .as_database_error()
                .map(|db| db.is_unique_violation())
                .unwrap_or(false);
            if unique_violation {
                DomainError::UserAlreadyExists
            } else {
                tracing::error!("Failed to create user: {}", e);
                DomainError::DatabaseError(e.to_string())
            }
        })?;

        user_from_row(&row)
    }

    async fn find_by_username(&self, username: &str) -> Result<User, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, username, password_hash, is_admin, session_version, created_at, updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => user_from_row(&row),
            None => Err(DomainError::UserNotFound),
        }
    }

    async fn find_by_id(&self, id: i64) -> Result<User, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, username, password_hash, is_admin, session_version, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => user_from_row(&row),
            None => Err(DomainError::UserNotFound),
        }
    }

    async fn list(&self) -> Result<Vec<User>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, username, password_hash, is_admin, session_version, created_at, updated_at
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        rows.iter().map(user_from_row).collect()
    }

    async fn bump_session_version(&self, id: i64) -> Result<i64, DomainError> {
        let row = sqlx::query(
            r#"
            UPDATE users
            SET session_version = session_version + 1, updated_at = NOW()
            WHERE id = $1
            RETURNING session_version
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => Ok(row.try_get("session_version")?),
            None => Err(DomainError::UserNotFound),
        }
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            DELETE FROM comments
            WHERE author_id = $1
               OR post_id IN (SELECT id FROM posts WHERE author_id = $1)
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM posts WHERE author_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            // dropping the transaction rolls it back
            return Err(DomainError::UserNotFound);
        }

        tx.commit().await?;
        Ok(())
    }
}
