pub mod comment;
pub mod error;
pub mod permissions;
pub mod post;
pub mod user;
pub mod validation;

pub use comment::Comment;
pub use error::DomainError;
pub use permissions::{can, Action};
pub use post::Post;
pub use user::User;
pub use validation::FieldErrors;
