pub mod admin_service;
pub mod auth_service;
pub mod blog_service;

pub use admin_service::{AdminOutcome, AdminService};
pub use auth_service::AuthService;
pub use blog_service::BlogService;
