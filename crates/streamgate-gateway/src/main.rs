//! streamgate gateway
//!
//! - `POST /streams/:id/access`  : subscription check, rules, access record
//! - `POST /streams/:id/publish` : data hash verification
//! - `GET  /health`, `GET /metrics`

use std::process::ExitCode;

use tracing_subscriber::{fmt, EnvFilter};

use streamgate_gateway::{app_state, config, router};

#[tokio::main]
async fn main() -> ExitCode {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "streamgate-gateway failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> streamgate_core::Result<()> {
    let cfg = config::load()?;
    let listen = cfg.gateway.listen_addr()?;

    let state = app_state::AppState::new(cfg)?;
    let network = state.network().to_string();
    let app = router::build_router(state);

    tracing::info!(%listen, %network, "streamgate-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| streamgate_core::GateError::Internal(format!("bind {listen} failed: {e}")))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| streamgate_core::GateError::Internal(format!("server failed: {e}")))
}
