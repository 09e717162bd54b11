use anyhow::Context;
use dotenvy::dotenv;
use std::sync::Arc;

use blog_server::application::{AuthService, BlogService};
use blog_server::data::{
    PostgresCommentRepository, PostgresPostRepository, PostgresUserRepository,
};
use blog_server::infrastructure::{
    database::{create_pool, run_migrations},
    logging::{init_logging, LogStyle},
    AppConfig, SessionService,
};
use blog_server::presentation;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    init_logging(LogStyle::Server, "info,blog_server=debug");

    let config = AppConfig::from_env().context("Invalid configuration")?;
    let http_addr = config.http_addr();

    tracing::info!("Starting blog server...");
    tracing::info!("HTTP server will listen on {}", http_addr);

    // Initialize database connection pool
    tracing::info!("Connecting to database...");
    let pool = create_pool(&config.database_url, config.database_max_connections).await?;

    // Run database migrations
    tracing::info!("Running database migrations...");
    run_migrations(&pool).await?;

    // Initialize services
    let sessions = Arc::new(SessionService::new(
        &config.session_secret,
        config.session_ttl_hours,
        config.session_cookie_secure,
    ));

    // Repositories
    let user_repo = Arc::new(PostgresUserRepository::new(pool.clone()));
    let post_repo = Arc::new(PostgresPostRepository::new(pool.clone()));
    let comment_repo = Arc::new(PostgresCommentRepository::new(pool.clone()));

    // Application services
    let auth_service = Arc::new(AuthService::new(user_repo.clone(), sessions.clone()));
    let blog_service = Arc::new(BlogService::new(post_repo, comment_repo, user_repo));

    tracing::info!("Services initialized successfully");

    run_http_server(http_addr, auth_service, blog_service, sessions).await?;

    tracing::info!("Shutting down...");
    Ok(())
}

async fn run_http_server(
    addr: String,
    auth_service: Arc<AuthService>,
    blog_service: Arc<BlogService>,
    sessions: Arc<SessionService>,
) -> anyhow::Result<()> {
    use actix_web::{middleware::Logger, web, App, HttpServer};

    tracing::info!("Configuring HTTP server...");

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(blog_service.clone()))
            .app_data(web::Data::new(sessions.clone()))
            .configure(presentation::configure)
    })
    .bind(&addr)?
    .run();

    tracing::info!("HTTP server running on {}", addr);

    server.await?;

    Ok(())
}
