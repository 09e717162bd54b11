//! In-process store backing the service and HTTP tests.

use crate::data::{CommentRepository, PostRepository, UserRepository};
use crate::domain::post::PostDraft;
use crate::domain::user::NewUser;
use crate::domain::{Comment, DomainError, Post, User};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Mutex;

#[derive(Default)]
struct State {
    users: Vec<User>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    next_id: i64,
    ticks: i64,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn has_user(&self, id: i64) -> bool {
        self.users.iter().any(|u| u.id == id)
    }

    // strictly increasing timestamps keep ordering deterministic
    fn now(&mut self) -> chrono::DateTime<Utc> {
        self.ticks += 1;
        Utc::now() + Duration::milliseconds(self.ticks)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("memory store poisoned")
    }

    pub fn post_count(&self) -> usize {
        self.lock().posts.len()
    }

    pub fn comment_count(&self) -> usize {
        self.lock().comments.len()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: NewUser) -> Result<User, DomainError> {
        let mut state = self.lock();
        if state.users.iter().any(|u| u.username == user.username) {
            return Err(DomainError::UserAlreadyExists);
        }
        let now = state.now();
        let user = User {
            id: state.next_id(),
            username: user.username,
            password_hash: user.password_hash,
            is_admin: user.is_admin,
            session_version: 0,
            created_at: now,
            updated_at: now,
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<User, DomainError> {
        self.lock()
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned()
            .ok_or(DomainError::UserNotFound)
    }

    async fn find_by_id(&self, id: i64) -> Result<User, DomainError> {
        self.lock()
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(DomainError::UserNotFound)
    }

    async fn list(&self) -> Result<Vec<User>, DomainError> {
        Ok(self.lock().users.clone())
    }

    async fn bump_session_version(&self, id: i64) -> Result<i64, DomainError> {
        let mut state = self.lock();
        let now = state.now();
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(DomainError::UserNotFound)?;
        user.session_version += 1;
        user.updated_at = now;
        Ok(user.session_version)
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let mut state = self.lock();
        if !state.users.iter().any(|u| u.id == id) {
            return Err(DomainError::UserNotFound);
        }
        let owned_posts: Vec<i64> = state
            .posts
            .iter()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        state
            .comments
            .retain(|c| c.author_id != id && !owned_posts.contains(&c.post_id));
        state.posts.retain(|p| p.author_id != id);
        state.users.retain(|u| u.id != id);
        Ok(())
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn create(&self, author_id: i64, draft: PostDraft) -> Result<Post, DomainError> {
        let mut state = self.lock();
        // foreign key on posts.author_id
        if !state.has_user(author_id) {
            return Err(DomainError::UserNotFound);
        }
        let now = state.now();
        let post = Post {
            id: state.next_id(),
            title: draft.title,
            content: draft.content,
            author_id,
            published: draft.published,
            created_at: now,
            updated_at: now,
        };
        state.posts.push(post.clone());
        Ok(post)
    }

    async fn find_by_id(&self, id: i64) -> Result<Post, DomainError> {
        self.lock()
            .posts
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(DomainError::PostNotFound)
    }

    async fn update(&self, id: i64, draft: PostDraft) -> Result<Post, DomainError> {
        let mut state = self.lock();
        let now = state.now();
        let post = state
            .posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(DomainError::PostNotFound)?;
        post.title = draft.title;
        post.content = draft.content;
        post.published = draft.published;
        post.updated_at = now;
        Ok(post.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let mut state = self.lock();
        if !state.posts.iter().any(|p| p.id == id) {
            return Err(DomainError::PostNotFound);
        }
        state.comments.retain(|c| c.post_id != id);
        state.posts.retain(|p| p.id != id);
        Ok(())
    }

    async fn list_published(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Post>, i64), DomainError> {
        let state = self.lock();
        let mut posts: Vec<Post> = state.posts.iter().filter(|p| p.published).cloned().collect();
        posts.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        let total = posts.len() as i64;
        let page = posts
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        Ok((page, total))
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn create(
        &self,
        post_id: i64,
        author_id: i64,
        content: &str,
    ) -> Result<Comment, DomainError> {
        let mut state = self.lock();
        if !state.posts.iter().any(|p| p.id == post_id) {
            return Err(DomainError::PostNotFound);
        }
        if !state.has_user(author_id) {
            return Err(DomainError::UserNotFound);
        }
        let now = state.now();
        let comment = Comment {
            id: state.next_id(),
            post_id,
            author_id,
            content: content.to_string(),
            created_at: now,
        };
        state.comments.push(comment.clone());
        Ok(comment)
    }

    async fn list_for_post(&self, post_id: i64) -> Result<Vec<Comment>, DomainError> {
        Ok(self
            .lock()
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> PostDraft {
        PostDraft {
            title: "Hello World!".into(),
            content: "This is long enough.".into(),
            published: true,
        }
    }

    #[tokio::test]
    async fn writes_require_an_existing_author() {
        let store = MemoryStore::new();
        assert!(matches!(
            PostRepository::create(&store, 77, draft()).await,
            Err(DomainError::UserNotFound)
        ));

        let user = UserRepository::create(
            &store,
            NewUser {
                username: "alice".into(),
                password_hash: "hash".into(),
                is_admin: false,
            },
        )
        .await
        .unwrap();
        let post = PostRepository::create(&store, user.id, draft()).await.unwrap();
        assert!(matches!(
            CommentRepository::create(&store, post.id, 77, "hi").await,
            Err(DomainError::UserNotFound)
        ));
        assert_eq!(store.comment_count(), 0);
    }

    #[tokio::test]
    async fn session_version_increments() {
        let store = MemoryStore::new();
        let user = UserRepository::create(
            &store,
            NewUser {
                username: "alice".into(),
                password_hash: "hash".into(),
                is_admin: false,
            },
        )
        .await
        .unwrap();
        assert_eq!(user.session_version, 0);
        assert_eq!(store.bump_session_version(user.id).await.unwrap(), 1);
        assert_eq!(store.bump_session_version(user.id).await.unwrap(), 2);
        assert!(matches!(
            store.bump_session_version(999).await,
            Err(DomainError::UserNotFound)
        ));
    }
}
