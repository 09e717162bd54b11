//! Blog platform: accounts, posts and comments with ownership-based
//! permissions, served over HTTP by actix-web and stored in PostgreSQL.

pub mod application;
pub mod data;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
