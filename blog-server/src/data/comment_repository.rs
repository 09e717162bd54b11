use crate::domain::{Comment, DomainError};
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create(
        &self,
        post_id: i64,
        author_id: i64,
        content: &str,
    ) -> Result<Comment, DomainError>;
    /// Comments on a post, oldest first.
    async fn list_for_post(&self, post_id: i64) -> Result<Vec<Comment>, DomainError>;
}

pub struct PostgresCommentRepository {
    pool: PgPool,
}

impl PostgresCommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn comment_from_row(row: &PgRow) -> Result<Comment, DomainError> {
    Ok(Comment {
        id: row.try_get("id")?,
        post_id: row.try_get("post_id")?,
        author_id: row.try_get("author_id")?,
        content: row.try_get("content")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn create(
        &self,
        post_id: i64,
        author_id: i64,
        content: &str,
    ) -> Result<Comment, DomainError> {
        let row = sqlx::query(
            r#"
            INSERT INTO comments (post_id, author_id, content, created_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING id, post_id, author_id, content, created_at
            "#,
        )
        .bind(post_id)
        .bind(author_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db) if db.is_foreign_key_violation() => {
                // comments_post_id_fkey or comments_author_id_fkey
                if db.constraint().is_some_and(|c| c.contains("post_id")) {
                    DomainError::PostNotFound
                } else {
                    DomainError::UserNotFound
                }
            }
            _ => {
                tracing::error!("Failed to create comment: {}", e);
                DomainError::DatabaseError(e.to_string())
            }
        })?;

        comment_from_row(&row)
    }

    async fn list_for_post(&self, post_id: i64) -> Result<Vec<Comment>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, post_id, author_id, content, created_at
            FROM comments
            WHERE post_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        rows.iter().map(comment_from_row).collect()
    }
}
