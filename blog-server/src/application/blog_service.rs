use crate::data::{CommentRepository, PostRepository, UserRepository};
use crate::domain::comment::{CommentForm, CommentResponse};
use crate::domain::post::{PostDetailResponse, PostDraft, PostForm, PostResponse};
use crate::domain::validation::{validate_comment, validate_post};
use crate::domain::{can, Action, DomainError, Post};
use std::sync::Arc;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

pub struct BlogService {
    post_repo: Arc<dyn PostRepository + Send + Sync>,
    comment_repo: Arc<dyn CommentRepository + Send + Sync>,
    user_repo: Arc<dyn UserRepository + Send + Sync>,
}

impl BlogService {
    pub fn new(
        post_repo: Arc<dyn PostRepository + Send + Sync>,
        comment_repo: Arc<dyn CommentRepository + Send + Sync>,
        user_repo: Arc<dyn UserRepository + Send + Sync>,
    ) -> Self {
        Self {
            post_repo,
            comment_repo,
            user_repo,
        }
    }

    /// Loads a post and checks that `viewer` may perform `action` on it.
    pub async fn authorize(
        &self,
        id: i64,
        viewer: Option<i64>,
        action: Action,
    ) -> Result<Post, DomainError> {
        let post = self.post_repo.find_by_id(id).await?;

        if !can(viewer, action, &post) {
            tracing::warn!(
                "Viewer {:?} denied {:?} on post {} owned by {}",
                viewer,
                action,
                id,
                post.author_id
            );
            return Err(DomainError::Forbidden);
        }

        Ok(post)
    }

    /// Published posts only, newest first. Drafts never appear here, not
    /// even for their author.
    pub async fn list_posts(
        &self,
        viewer: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<PostResponse>, i64), DomainError> {
        if !(1..=MAX_PAGE_SIZE).contains(&limit) {
            return Err(DomainError::field(
                "limit",
                format!("limit must be between 1 and {}", MAX_PAGE_SIZE),
            ));
        }
        if offset < 0 {
            return Err(DomainError::field("offset", "offset cannot be negative"));
        }

        tracing::debug!(
            "Listing posts for viewer {:?} (limit={}, offset={})",
            viewer,
            limit,
            offset
        );

        let (posts, total) = self.post_repo.list_published(limit, offset).await?;

        Ok((posts.into_iter().map(PostResponse::from).collect(), total))
    }

    pub async fn get_post(
        &self,
        id: i64,
        viewer: Option<i64>,
    ) -> Result<PostDetailResponse, DomainError> {
        let post = self.authorize(id, viewer, Action::View).await?;

        let author_username = self.user_repo.find_by_id(post.author_id).await?.username;
        let comments = self.comments_for(id).await?;

        Ok(PostDetailResponse {
            post: PostResponse::from(post),
            author_username,
            comments,
        })
    }

    pub async fn create_post(
        &self,
        viewer: i64,
        form: PostForm,
    ) -> Result<PostResponse, DomainError> {
        validate_post(&form.title, &form.content)?;

        let draft = PostDraft {
            title: form.title,
            content: form.content,
            published: form.published,
        };

        let post = self.post_repo.create(viewer, draft).await?;

        tracing::info!(
            "Post created: id={}, author_id={}, published={}",
            post.id,
            viewer,
            post.published
        );

        Ok(PostResponse::from(post))
    }

    /// Ownership is checked before validation. Title, content and the
    /// published flag are all overwritten.
    pub async fn update_post(
        &self,
        id: i64,
        viewer: i64,
        form: PostForm,
    ) -> Result<PostResponse, DomainError> {
        self.authorize(id, Some(viewer), Action::Edit).await?;

        validate_post(&form.title, &form.content)?;

        let draft = PostDraft {
            title: form.title,
            content: form.content,
            published: form.published,
        };

        let updated_post = self.post_repo.update(id, draft).await?;

        tracing::info!("Post updated: id={}, author_id={}", id, viewer);

        Ok(PostResponse::from(updated_post))
    }

    pub async fn delete_post(&self, id: i64, viewer: i64) -> Result<(), DomainError> {
        self.authorize(id, Some(viewer), Action::Delete).await?;

        self.post_repo.delete(id).await?;

        tracing::info!("Post deleted: id={}, author_id={}", id, viewer);

        Ok(())
    }

    pub async fn add_comment(
        &self,
        post_id: i64,
        viewer: i64,
        form: CommentForm,
    ) -> Result<CommentResponse, DomainError> {
        self.authorize(post_id, Some(viewer), Action::Comment).await?;

        let content = form.content.trim();
        validate_comment(content)?;

        let comment = self.comment_repo.create(post_id, viewer, content).await?;

        tracing::info!(
            "Comment added: id={}, post_id={}, author_id={}",
            comment.id,
            post_id,
            viewer
        );

        Ok(CommentResponse::from(comment))
    }

    pub async fn comments_for(&self, post_id: i64) -> Result<Vec<CommentResponse>, DomainError> {
        let comments = self.comment_repo.list_for_post(post_id).await?;
        Ok(comments.into_iter().map(CommentResponse::from).collect())
    }
}
