//! Documentation of a carbon emissions tracking dashboard.
//!
//! Companies log emission line items against GHG protocol categories, then read them back
//! as totals, per scope subtotals, per category shares, trends over time and frozen reports.
//! Support tickets and a help centre sit next to it.
//!
//!
//!
//! # General Infrastructure
//! - JSON REST API under `/api`, served by axum
//! - Records live in Redis (see [`database`]), or in process memory for tests and demos
//! - Aggregation happens in the `ledger` crate, which never touches storage
//! - Sessions are bearer tokens with a TTL, stored next to the records
//!
//!
//!
//! # Tenancy
//!
//! **Goal**: a company never sees another company's emissions or reports.
//!
//! - Every emissions, report and subscription endpoint resolves the caller's company first
//! - Callers without a company get a 400 before any lookup happens
//! - Records fetched by id are checked against the caller's company, 403 on mismatch
//! - Listings only ever read the caller's own ownership set
//!
//!
//!
//! # Notes
//!
//! ## Summaries
//! The dashboard summary is recomputed on every request from the filtered records. Reports are
//! the exception: their summary is computed once at creation and stored, so a published report
//! does not drift when emissions are edited later. Changing a report's period regenerates it.
//!
//! ## Amounts
//! Amounts are decimals end to end. Clients may send them as numbers or numeric strings,
//! anything else is rejected at the boundary instead of poisoning totals.
//!
//!
//!
//! # Setup
//!
//! View current docs.
//! ```sh
//! cargo doc --open
//! ```
//!
//! Run against a local Redis.
//! ```sh
//! REDIS_URL=redis://127.0.0.1:6379 RUST_LOG=info cargo run -p server
//! ```
//!
//! Run without Redis, starting from an empty store.
//! ```sh
//! STORAGE=memory RUST_LOG=info cargo run -p server
//! ```
//!
//! Seed a Redis database.
//! ```sh
//! cargo run -p seed -- --demo --sample-emissions 30
//! ```
//!
//!
//!
//! # Environment
//!
//! | Variable | Default |
//! |---|---|
//! | `RUST_PORT` | `1111` |
//! | `REDIS_URL` | `redis://127.0.0.1:6379`, also read from `/run/secrets/REDIS_URL` |
//! | `STORAGE` | `redis` |
//! | `SESSION_TTL_SECS` | `604800` |
//! | `PASSWORD_COST` | `12` (bcrypt work factor, 4 to 31) |
//! | `RUST_LOG` | unset, see `tracing_subscriber::EnvFilter` |
use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use axum::{
    Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
};
use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod routes;
pub mod state;
pub mod store;
pub mod utils;

use state::State;

pub fn app(state: Arc<State>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .nest("/api", routes::api())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn start_server() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = State::new().await?;

    info!("Starting server...");
    let app = app(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
