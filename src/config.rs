use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;
use validator::Validate;

use crate::domain::SystemParams;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct Config {
    #[validate(nested)]
    pub server: ServerConfig,
    #[validate(nested)]
    pub system: SystemParams,
    #[validate(nested)]
    pub store: StoreConfig,
    #[validate(nested)]
    pub weather: WeatherConfig,
    #[validate(nested)]
    pub llm: LlmConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogConfig {
    pub format: LogFormat,
    /// `EnvFilter` directives used when `RUST_LOG` is unset
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
    /// Allowed origins; empty allows any origin
    pub cors_origins: Vec<String>,
    #[validate(range(min = 1))]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            enable_cors: true,
            cors_origins: Vec::new(),
            request_timeout_secs: 90,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

/// Realtime database holding hardware telemetry
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StoreConfig {
    /// Database root URL; the in-memory store is used when unset
    #[validate(url)]
    pub database_url: Option<String>,
    #[validate(length(min = 1))]
    pub path: String,
    /// Database secret or ID token appended as `auth=`
    pub auth_token: Option<String>,
    #[validate(range(min = 1))]
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            path: "solar_telemetry".to_string(),
            auth_token: None,
            timeout_secs: 10,
        }
    }
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// api.weather.gov settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WeatherConfig {
    #[validate(url)]
    pub base_url: String,
    #[validate(length(min = 1))]
    pub station_id: String,
    pub latitude: f64,
    pub longitude: f64,
    /// weather.gov rejects requests without an identifying User-Agent
    #[validate(length(min = 1))]
    pub user_agent: String,
    #[validate(range(min = 1, max = 156))]
    pub forecast_periods: usize,
    #[validate(range(min = 1))]
    pub timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.weather.gov".to_string(),
            station_id: "KDCA".to_string(),
            latitude: 38.85,
            longitude: -77.03,
            user_agent: "(Smart Solar Project, solar@example.invalid)".to_string(),
            forecast_periods: 12,
            timeout_secs: 10,
        }
    }
}

impl WeatherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Chat-completion endpoint used for the analysis report
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LlmConfig {
    #[validate(url)]
    pub base_url: String,
    pub api_key: Option<String>,
    #[validate(length(min = 1))]
    pub model: String,
    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: f64,
    #[validate(range(min = 1))]
    pub max_tokens: u32,
    #[validate(range(min = 1))]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.2,
            max_tokens: 300,
            timeout_secs: 60,
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Defaults, then `config/default.toml`, then `SOLAR__*` variables, then
    /// a bare `OPENAI_API_KEY`.
    pub fn load() -> Result<Self> {
        Self::from_figment(Self::figment())
    }

    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("config/default.toml"))
            .merge(Env::prefixed("SOLAR__").split("__"))
            .merge(
                Env::raw()
                    .only(&["OPENAI_API_KEY"])
                    .map(|_| "llm.api_key".into()),
            )
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let cfg: Config = figment.extract()?;
        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_toml(toml: &str) -> Result<Config> {
        Config::from_figment(
            Figment::from(Serialized::defaults(Config::default())).merge(Toml::string(toml)),
        )
    }

    #[test]
    fn test_defaults_match_installation() {
        let cfg = with_toml("").unwrap();
        assert_eq!(cfg.server.port, 5000);
        assert_eq!(cfg.system.baseline_load_w, 2.5);
        assert_eq!(cfg.system.battery_capacity_wh, 96.0);
        assert_eq!(cfg.system.history_days, 7);
        assert_eq!(cfg.weather.station_id, "KDCA");
        assert_eq!(cfg.weather.forecast_periods, 12);
        assert_eq!(cfg.llm.model, "gpt-3.5-turbo");
        assert!(cfg.llm.api_key.is_none());
        assert!(cfg.store.database_url.is_none());
        assert_eq!(cfg.log.format, LogFormat::Json);
    }

    #[test]
    fn test_pretty_log_format() {
        let cfg = with_toml("[log]\nformat = \"pretty\"").unwrap();
        assert_eq!(cfg.log.format, LogFormat::Pretty);
    }

    #[test]
    fn test_toml_overrides_nested_sections() {
        let cfg = with_toml(
            r#"
            [server]
            port = 8080

            [store]
            database_url = "https://solar-default-rtdb.example.invalid"

            [llm]
            api_key = "sk-test"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(
            cfg.store.database_url.as_deref(),
            Some("https://solar-default-rtdb.example.invalid")
        );
        assert_eq!(cfg.llm.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_out_of_range_values_are_rejected() {
        assert!(with_toml("[system]\nhistory_days = 0").is_err());
        assert!(with_toml("[system]\nbattery_capacity_wh = 0.0").is_err());
        assert!(with_toml("[weather]\nforecast_periods = 0").is_err());
        assert!(with_toml("[store]\ndatabase_url = \"not a url\"").is_err());
    }

    #[test]
    fn test_socket_addr() {
        let server = ServerConfig::default();
        assert_eq!(server.socket_addr().unwrap().port(), 5000);
    }
}
