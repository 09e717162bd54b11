pub mod config;
pub mod database;
pub mod logging;
pub mod session;

pub use config::AppConfig;
pub use session::{SessionService, SessionUser};
