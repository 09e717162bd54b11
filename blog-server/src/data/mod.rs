pub mod comment_repository;
pub mod post_repository;
pub mod user_repository;

#[cfg(test)]
pub mod memory;

pub use comment_repository::{CommentRepository, PostgresCommentRepository};
pub use post_repository::{PostRepository, PostgresPostRepository};
pub use user_repository::{PostgresUserRepository, UserRepository};
