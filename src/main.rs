use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use storefront_api::auth::Role;
use storefront_api::config::config;
use storefront_api::database::models::NewEmployee;
use storefront_api::database::DatabaseManager;
use storefront_api::images::{HttpImageHost, ImageHost};
use storefront_api::services::EmployeeService;
use storefront_api::{app, AppState};

#[derive(Parser)]
#[command(name = "storefront-api")]
#[command(about = "Storefront API server and maintenance commands")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Run the HTTP server (default)")]
    Serve,

    #[command(about = "Apply pending database migrations and exit")]
    Migrate,

    #[command(about = "Create the first Admin employee")]
    CreateAdmin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("storefront_api=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let result = match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve().await,
        Command::Migrate => migrate().await,
        Command::CreateAdmin { email, first_name, last_name, password } => {
            create_admin(email, first_name, last_name, password).await
        }
    };

    DatabaseManager::close().await;
    result
}

async fn serve() -> anyhow::Result<()> {
    let config = config();
    tracing::info!("Starting Storefront API in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        bail!("JWT_SECRET must be set outside development");
    }

    let pool = DatabaseManager::pool().await.context("failed to connect to database")?;
    if config.database.run_migrations {
        DatabaseManager::migrate(&pool).await.context("failed to run migrations")?;
    }

    let images = HttpImageHost::from_config(&config.images)
        .context("invalid image host configuration")?
        .map(|host| Arc::new(host) as Arc<dyn ImageHost>);
    if images.is_none() {
        tracing::warn!("No image host configured; image uploads will answer 503");
    }

    let app = app(AppState::new(pool, images));

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Storefront API listening on http://{}", bind_addr);

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    tracing::info!("Server stopped");
    Ok(())
}

async fn migrate() -> anyhow::Result<()> {
    let pool = DatabaseManager::pool().await.context("failed to connect to database")?;
    DatabaseManager::migrate(&pool).await?;
    Ok(())
}

async fn create_admin(email: String, first_name: String, last_name: String, password: String) -> anyhow::Result<()> {
    let pool = DatabaseManager::pool().await.context("failed to connect to database")?;
    let employees = EmployeeService::new(pool);

    if employees.has_admin().await? {
        tracing::warn!("An Admin employee already exists; creating another");
    }

    let admin = employees
        .create(&NewEmployee {
            first_name,
            last_name,
            email,
            phone: None,
            role: Role::Admin,
            hire_date: None,
            password,
        })
        .await?;

    tracing::info!("Created Admin employee {} ({})", admin.employee_id, admin.email);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
