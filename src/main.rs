use sea_orm::{ConnectOptions, Database};
use std::{process::ExitCode, sync::Arc};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use bookshop::config::Config;
use bookshop::entities::{primary_setup, setup_schema};
use bookshop::routes::api_router;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let mut options = ConnectOptions::new(config.database_url.clone());
    options.sqlx_logging(false);
    let db = match Database::connect(options).await {
        Ok(db) => db,
        Err(err) => {
            error!(error = %err, "Failed to connect to the database");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = setup_schema(&db).await {
        error!(error = %err, "Failed to create the schema");
        return ExitCode::FAILURE;
    }
    if let Err(err) = primary_setup(&db, &config).await {
        error!(error = %err, "Failed to create the admin account");
        return ExitCode::FAILURE;
    }

    let app = api_router(Arc::new(db), Arc::from(config.secret.as_str()));

    let listener = match tokio::net::TcpListener::bind(&config.bind_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(addr = %config.bind_addr, error = %err, "Failed to bind");
            return ExitCode::FAILURE;
        }
    };
    info!(addr = %config.bind_addr, "Running");

    if let Err(err) = axum::serve(listener, app).await {
        error!(error = %err, "Server stopped");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
