use anyhow::Result;
use smart_solar_backend::{api, config::Config, logging, state::AppState};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;
    logging::init_tracing(&cfg.log);

    if cfg.llm.api_key.is_none() {
        warn!("OPENAI_API_KEY is not set, /api/analyze will report a configuration error");
    }

    let state = AppState::new(cfg.clone())?;
    let app = api::router(state);

    let addr = cfg.server.socket_addr()?;
    if cfg.server.host == "0.0.0.0" {
        warn!("server binding to 0.0.0.0, the API is reachable from the network");
    }

    info!(%addr, "starting smart solar backend");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(logging::shutdown_signal())
        .await?;

    warn!("shutdown complete");
    Ok(())
}
