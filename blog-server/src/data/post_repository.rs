use crate::domain::post::PostDraft;
use crate::domain::{DomainError, Post};
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, author_id: i64, draft: PostDraft) -> Result<Post, DomainError>;
    async fn find_by_id(&self, id: i64) -> Result<Post, DomainError>;
    async fn update(&self, id: i64, draft: PostDraft) -> Result<Post, DomainError>;
    /// Deletes the post and all of its comments in one transaction.
    async fn delete(&self, id: i64) -> Result<(), DomainError>;
    /// Published posts, newest first, with the total number of published posts.
    async fn list_published(&self, limit: i64, offset: i64)
        -> Result<(Vec<Post>, i64), DomainError>;
}

pub struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn post_from_row(row: &PgRow) -> Result<Post, DomainError> {
    Ok(Post {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        author_id: row.try_get("author_id")?,
        published: row.try_get("published")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create(&self, author_id: i64, draft: PostDraft) -> Result<Post, DomainError> {
        let row = sqlx::query(
            r#"
            INSERT INTO posts (title, content, author_id, published, created_at, updated_at)
            VALUES ($1, $2, $3, $4, NOW(), NOW())
            RETURNING id, title, content, author_id, published, created_at, updated_at
            "#,
        )
        .bind(&draft.title)
        .bind(&draft.content)
        .bind(author_id)
        .bind(draft.published)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            let missing_author = e
                .as_database_error()
                .map(|db| db.is_foreign_key_violation())
                .unwrap_or(false);
            if missing_author {
                tracing::warn!("Post rejected, author {} no longer exists", author_id);
                DomainError::UserNotFound
            } else {
                tracing::error!("Failed to create post: {}", e);
                DomainError::DatabaseError(e.to_string())
            }
        })?;

        post_from_row(&row)
    }

    async fn find_by_id(&self, id: i64) -> Result<Post, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, title, content, author_id, published, created_at, updated_at
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => post_from_row(&row),
            None => Err(DomainError::PostNotFound),
        }
    }

    async fn update(&self, id: i64, draft: PostDraft) -> Result<Post, DomainError> {
        let row = sqlx::query(
            r#"
            UPDATE posts
            SET
                title = $1,
                content = $2,
                published = $3,
                updated_at = NOW()
            WHERE id = $4
            RETURNING id, title, content, author_id, published, created_at, updated_at
            "#,
        )
        .bind(&draft.title)
        .bind(&draft.content)
        .bind(draft.published)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => post_from_row(&row),
            None => Err(DomainError::PostNotFound),
        }
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await?;

        let comments = sqlx::query("DELETE FROM comments WHERE post_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        let result = sqlx::query(
            r#"
            DELETE FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::PostNotFound);
        }

        tx.commit().await?;

        tracing::debug!(
            "Post {} removed with {} comment(s)",
            id,
            comments.rows_affected()
        );
        Ok(())
    }

    async fn list_published(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Post>, i64), DomainError> {
        let count_row = sqlx::query("SELECT COUNT(*) AS count FROM posts WHERE published")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        let total: i64 = count_row.try_get("count")?;

        let rows = sqlx::query(
            r#"
            SELECT id, title, content, author_id, published, created_at, updated_at
            FROM posts
            WHERE published
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        let posts = rows
            .iter()
            .map(post_from_row)
            .collect::<Result<Vec<Post>, DomainError>>()?;

        Ok((posts, total))
    }
}
