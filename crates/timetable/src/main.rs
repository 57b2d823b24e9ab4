//! Timetable HTTP server.
//!
//! Reads its configuration from the JSON file named by `TIMETABLE_CONFIG`
//! (defaults are used when unset), opens the SQLite database and serves the
//! timetable API until interrupted. Log level comes from `RUST_LOG`.

use std::env;
use std::sync::Arc;

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use timetable::config::AppConfig;
use timetable::server::create_router;
use timetable::types::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .init();

    let config = AppConfig::from_env().map_err(|e| anyhow::anyhow!("Bad config: {}", e))?;
    let state = Arc::new(AppState::from_config(&config)?);
    info!(
        db_path = %config.db_path,
        recognizer = %state.recognizer.endpoint(),
        "Opened timetable store"
    );

    let app = create_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("Listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    Ok(())
}
