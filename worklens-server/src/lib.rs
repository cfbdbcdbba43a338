//! Worklens server - routing and bootstrap
//!
//! The server is a thin shell over [`worklens_core`]: every handler
//! authenticates via the session cookie, performs at most one write
//! through a core service, and redirects to a rendering endpoint.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    routing::get,
    Router,
};
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod auth;
pub mod error;
pub mod routes;
pub mod state;
pub mod views;

use state::AppState;

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(routes::home))
        .route("/signup", get(routes::signup_form).post(routes::signup))
        .route("/login", get(routes::login_form).post(routes::login))
        .route("/logout", get(routes::logout))
        .route(
            "/profile",
            get(routes::profile_form).post(routes::update_profile),
        )
        .route(
            "/create_listing",
            get(routes::create_listing_form).post(routes::create_listing),
        )
        .route(
            "/company/{id}",
            get(routes::company_page).post(routes::submit_review),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Load state, bind, and serve until shutdown
pub async fn start_server(data_dir: &Path, port_override: Option<u16>) -> Result<()> {
    info!("Initializing state from {}", data_dir.display());
    let state = AppState::new(data_dir, port_override)?;

    let app = router(state.clone());

    let address = format!("{}:{}", state.ctx.config.bind_address, state.ctx.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutting down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("Failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
