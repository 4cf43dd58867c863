//! Runs the roster web server.

use std::{path::PathBuf, sync::Arc};

use axum_extra::extract::cookie::Key;
use clap::Parser;
use diesel_migrations::MigrationHarness;
use rosters::{
    MIGRATIONS,
    config::create_app,
    rosters::config::RosterConfig,
    state::{AppState, make_pool},
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
pub struct Args {
    #[clap(long)]
    database_url: Option<String>,
    #[clap(long, default_value = "127.0.0.1:8000")]
    bind: String,
    /// TOML file with the roster settings. Defaults apply without one.
    #[clap(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let db_url = match args.database_url {
        Some(url) => url,
        None => std::env::var("DATABASE_URL").map_err(|_| {
            "please either set `DATABASE_URL` or pass the `--database-url` flag"
        })?,
    };

    let roster_config = match &args.config {
        Some(path) => RosterConfig::load(path)?,
        None => RosterConfig::default(),
    };

    let key = match std::env::var("SECRET_KEY") {
        Ok(secret) => Key::try_from(secret.as_bytes())?,
        Err(_) => {
            tracing::warn!(
                "SECRET_KEY is not set, login cookies will not survive a restart"
            );
            Key::generate()
        }
    };

    let pool = make_pool(&db_url)?;
    pool.get()?
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| e.to_string())?;

    let app = create_app(AppState {
        pool,
        key,
        roster_config: Arc::new(roster_config),
    });

    let listener = tokio::net::TcpListener::bind(&args.bind).await?;
    tracing::info!("listening on {}", args.bind);
    axum::serve(listener, app).await?;

    Ok(())
}
