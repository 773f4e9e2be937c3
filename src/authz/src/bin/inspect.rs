//! # Authority inspection tool
//!
//! Loads the authority caches from a JSON snapshot (or, with the `postgres`
//! feature, from `DATABASE_URL`) and prints menus or route checks as JSON.
//!
//! ## Commands
//!
//! - `menu --user <id> --uri <route>` - menu visible to a user
//! - `menus` - complete menu tree
//! - `check --user <id> --route <route>` - route authorization check
//!
//! ## Configuration
//!
//! Environment variables:
//! - `RUST_LOG` - Log level (default: info)
//! - `AUTHZ_SNAPSHOT` - snapshot file, same as `--snapshot`
//! - `AUTHZ_ROLE_INDEX_RELOAD`, `DATABASE_URL` - see `AuthzConfig`

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use menu_authz::{AuthorityStore, AuthzConfig, AuthzService, InMemoryAuthorityStore, StoreSnapshot};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "authz-inspect", version, about = "Inspect cached menus and route authorizations")]
struct Cli {
    /// JSON snapshot with `authorities`, `role_authorities` and `user_roles`
    #[arg(long, env = "AUTHZ_SNAPSHOT")]
    snapshot: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Menu visible to a user
    Menu {
        #[arg(long)]
        user: i64,

        /// Current route, used to mark the active section
        #[arg(long, default_value = "")]
        uri: String,
    },

    /// Complete menu tree
    Menus,

    /// Whether a user may access a route
    Check {
        #[arg(long)]
        user: i64,

        #[arg(long)]
        route: String,
    },
}

async fn open_store(cli: &Cli, config: &AuthzConfig) -> Result<Arc<dyn AuthorityStore>> {
    if let Some(path) = &cli.snapshot {
        let snapshot = StoreSnapshot::from_path(path)
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        info!(path = %path.display(), authorities = snapshot.authorities.len(), "Using snapshot store");
        return Ok(Arc::new(InMemoryAuthorityStore::from_snapshot(snapshot)));
    }

    #[cfg(feature = "postgres")]
    if let Some(url) = &config.database_url {
        let store = menu_authz::store::PostgresAuthorityStore::new(url)
            .await
            .context("Failed to connect to authority database")?;
        info!("Using PostgreSQL store");
        return Ok(Arc::new(store));
    }

    #[cfg(not(feature = "postgres"))]
    let _ = config;

    anyhow::bail!("no authority source: pass --snapshot or set DATABASE_URL")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("authz-inspect v{}", menu_authz::VERSION);

    let cli = Cli::parse();
    let config = AuthzConfig::from_env().context("Invalid configuration")?;
    let store = open_store(&cli, &config).await?;

    let service = AuthzService::new(config, store)?;
    service.load_authorities().await.context("Failed to load authorities")?;
    service
        .load_role_authorities()
        .await
        .context("Failed to load role authorities")?;

    let output = match &cli.command {
        Command::Menu { user, uri } => {
            let menu = service
                .try_get_user_menu(*user, uri)
                .await
                .context("Failed to resolve user menu")?;
            serde_json::to_value(menu)?
        }
        Command::Menus => serde_json::to_value(service.get_menus().await)?,
        Command::Check { user, route } => {
            let allowed = service
                .check_authority(*user, route)
                .await
                .context("Failed to resolve user authorities")?;
            json!({ "user": user, "route": route, "allowed": allowed })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
