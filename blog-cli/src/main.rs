use anyhow::{Context, Result};
use blog_server::application::{AdminOutcome, AdminService};
use blog_server::data::PostgresUserRepository;
use blog_server::domain::DomainError;
use blog_server::infrastructure::database::{create_pool, run_migrations};
use blog_server::infrastructure::logging::{init_logging, LogStyle};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Overrides DATABASE_URL from the environment or .env
    #[arg(long)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Create the administrator account if it does not exist yet
    CreateAdmin {
        #[arg(short, long, default_value = "admin")]
        username: String,

        #[arg(short, long)]
        password: String,
    },

    /// Delete a user together with their posts and comments
    DeleteUser {
        #[arg(short, long)]
        username: String,

        /// Skip the confirmation guard
        #[arg(long)]
        yes: bool,
    },

    /// List registered users
    ListUsers,
}

fn database_url(cli: &Cli) -> Result<String> {
    match &cli.database_url {
        Some(url) => Ok(url.clone()),
        None => std::env::var("DATABASE_URL")
            .context("DATABASE_URL must be set (or pass --database-url)"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_logging(LogStyle::Cli, "warn,blog_server=info");

    let cli = Cli::parse();

    let pool = create_pool(&database_url(&cli)?, 1)
        .await
        .context("Failed to connect to database")?;
    run_migrations(&pool).await?;

    let admin = AdminService::new(Arc::new(PostgresUserRepository::new(pool)));

    match cli.command {
        Commands::CreateAdmin { username, password } => {
            match admin.ensure_admin(&username, &password).await {
                Ok(AdminOutcome::Created(user)) => {
                    println!("{} Administrator created", "✓".green());
                    println!("   ID: {}", user.id);
                    println!("   Username: {}", user.username);
                }
                Ok(AdminOutcome::AlreadyExists) => {
                    println!("{} Account {} already exists", "•".yellow(), username);
                }
                Err(DomainError::Validation(errors)) => {
                    println!("{} Invalid account details: {}", "✗".red(), errors);
                    std::process::exit(1);
                }
                Err(e) => return Err(e).context("Failed to create administrator"),
            }
        }

        Commands::DeleteUser { username, yes } => {
            if !yes {
                println!(
                    "{} This deletes {} and every post and comment they own.",
                    "!".yellow(),
                    username.bold()
                );
                println!("   Re-run with --yes to confirm.");
                std::process::exit(2);
            }

            match admin.delete_user(&username).await {
                Ok(()) => println!("{} User {} deleted", "✓".green(), username),
                Err(DomainError::UserNotFound) => {
                    println!("{} User {} not found", "✗".red(), username);
                    std::process::exit(1);
                }
                Err(e) => return Err(e).context("Failed to delete user"),
            }
        }

        Commands::ListUsers => {
            let users = admin.list_users().await.context("Failed to list users")?;

            if users.is_empty() {
                println!("   No users found");
            }
            for user in users {
                let role = if user.is_admin {
                    "admin".cyan().to_string()
                } else {
                    "user".normal().to_string()
                };
                println!(
                    "   [{}] {} ({}) joined {}",
                    user.id,
                    user.username.bold(),
                    role,
                    user.created_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_admin_defaults_username() {
        let cli = Cli::try_parse_from(["blog-admin", "create-admin", "--password", "admin123"])
            .unwrap();
        assert_eq!(
            cli.command,
            Commands::CreateAdmin {
                username: "admin".into(),
                password: "admin123".into(),
            }
        );
        assert!(cli.database_url.is_none());
    }

    #[test]
    fn create_admin_requires_password() {
        assert!(Cli::try_parse_from(["blog-admin", "create-admin"]).is_err());
    }

    #[test]
    fn delete_user_needs_explicit_confirmation_flag() {
        let cli = Cli::try_parse_from(["blog-admin", "delete-user", "-u", "bob"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::DeleteUser {
                username: "bob".into(),
                yes: false,
            }
        );
    }

    #[test]
    fn database_url_flag_wins() {
        let cli = Cli::try_parse_from([
            "blog-admin",
            "--database-url",
            "postgres://cli/blog",
            "list-users",
        ])
        .unwrap();
        assert_eq!(database_url(&cli).unwrap(), "postgres://cli/blog");
    }
}
