use anyhow::Result;
use std::sync::Arc;

use crate::analysis::{Analyzer, CompletionClient};
use crate::config::Config;
use crate::forecast::WeatherClient;
use crate::store::{build_store, TelemetryStore};

/// Shared, read-only service state built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub store: Arc<dyn TelemetryStore>,
    pub weather: Arc<WeatherClient>,
    pub llm: Arc<CompletionClient>,
    pub analyzer: Arc<Analyzer>,
}

impl AppState {
    pub fn new(cfg: Config) -> Result<Self> {
        let store = build_store(&cfg.store)?;
        Self::with_store(cfg, store)
    }

    /// Build around an existing store (tests, alternative backends).
    pub fn with_store(cfg: Config, store: Arc<dyn TelemetryStore>) -> Result<Self> {
        let weather = Arc::new(WeatherClient::new(&cfg.weather)?);
        let llm = Arc::new(CompletionClient::new(&cfg.llm)?);
        let analyzer = Arc::new(Analyzer::new(
            store.clone(),
            weather.clone(),
            llm.clone(),
            cfg.system.clone(),
        ));

        Ok(Self {
            cfg: Arc::new(cfg),
            store,
            weather,
            llm,
            analyzer,
        })
    }
}
