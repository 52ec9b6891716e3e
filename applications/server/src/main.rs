/// Accounts Server - user registration and token authentication
use accounts_server::{
    api,
    config::ServerConfig,
    services::{AccountManager, AuthService, UserExtras},
    state::AppState,
};
use accounts_storage::Database;
use clap::{Parser, Subcommand};
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "accounts-server")]
#[command(about = "User account and token authentication server", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "ACCOUNTS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Create an account with staff and superuser rights
    CreateSuperuser {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },
    /// Create a normal account
    CreateUser {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
        /// Display name
        #[arg(short, long, default_value = "")]
        name: String,
    },
    /// List all users
    ListUsers,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "accounts_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = ServerConfig::load(cli.config.as_deref())?;
    config.validate()?;

    match cli.command {
        Commands::Serve => {
            serve(&config).await?;
        }
        Commands::CreateSuperuser { email, password } => {
            let accounts = account_manager(&config).await?;
            let user = accounts
                .create_superuser(Some(&email), Some(&password))
                .await?;
            tracing::info!("Superuser {} created", user.email);
        }
        Commands::CreateUser {
            email,
            password,
            name,
        } => {
            let accounts = account_manager(&config).await?;
            let user = accounts
                .create_user(
                    Some(&email),
                    Some(&password),
                    UserExtras {
                        name,
                        ..Default::default()
                    },
                )
                .await?;
            tracing::info!("User {} created", user.email);
        }
        Commands::ListUsers => {
            list_users(&config).await?;
        }
    }

    Ok(())
}

async fn account_manager(config: &ServerConfig) -> anyhow::Result<AccountManager> {
    let db = Database::connect(&config.storage.database_url).await?;
    tracing::info!("Database connected");

    let auth_service = AuthService::new(config.auth.password_hash_cost);

    Ok(AccountManager::new(Arc::new(db), auth_service))
}

async fn serve(config: &ServerConfig) -> anyhow::Result<()> {
    tracing::info!("Starting Accounts Server");
    tracing::info!("Host: {}", config.server.host);
    tracing::info!("Port: {}", config.server.port);

    let accounts = Arc::new(account_manager(config).await?);
    let app = api::router(AppState::new(accounts));

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn list_users(config: &ServerConfig) -> anyhow::Result<()> {
    let accounts = account_manager(config).await?;
    let users = accounts.list_users().await?;

    println!("Users:");
    for user in users {
        let mut flags = Vec::new();
        if !user.is_active {
            flags.push("inactive");
        }
        if user.is_staff {
            flags.push("staff");
        }
        if user.is_superuser {
            flags.push("superuser");
        }
        println!("  {}  {}  {}  {}", user.id, user.email, user.name, flags.join(","));
    }

    Ok(())
}
