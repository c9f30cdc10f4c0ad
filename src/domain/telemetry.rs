use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

/// Key prefix reserved for synthetic samples so they never collide with
/// hardware-pushed entries in the telemetry store.
pub const MOCK_KEY_PREFIX: &str = "mock_";

/// One telemetry observation from the solar charging system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    /// Seconds since the Unix epoch
    pub timestamp: i64,
    #[serde(default)]
    pub sunlight_lux: u32,
    #[serde(default)]
    pub panel_temp_c: f64,
    #[serde(default)]
    pub dc_voltage_v: f64,
    #[serde(default)]
    pub dc_current_ma: u32,
    #[serde(default)]
    pub dc_power_w: f64,
    #[serde(default)]
    pub battery_soc_perc: f64,
}

impl TelemetrySample {
    pub fn mock_key(&self) -> String {
        format!("{}{}", MOCK_KEY_PREFIX, self.timestamp)
    }
}

/// Telemetry as stored: entry key to sample.
pub type KeyedHistory = BTreeMap<String, TelemetrySample>;

/// Key synthetic samples with the `mock_` prefix.
pub fn into_keyed(samples: Vec<TelemetrySample>) -> KeyedHistory {
    samples.into_iter().map(|s| (s.mock_key(), s)).collect()
}

/// Samples of a keyed history ordered oldest first.
pub fn sorted_by_timestamp(history: &KeyedHistory) -> Vec<TelemetrySample> {
    let mut samples: Vec<TelemetrySample> = history.values().cloned().collect();
    samples.sort_by_key(|s| s.timestamp);
    samples
}

/// Physical parameters of the monitored installation.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SystemParams {
    /// Constant load drawn from the battery, in watts
    #[validate(range(min = 0.0))]
    pub baseline_load_w: f64,
    /// Usable battery capacity, in watt-hours
    #[validate(range(min = 1.0))]
    pub battery_capacity_wh: f64,
    /// Trailing window used for history queries and synthetic data
    #[validate(range(min = 1, max = 366))]
    pub history_days: u32,
}

impl Default for SystemParams {
    fn default() -> Self {
        Self {
            baseline_load_w: 2.5,
            battery_capacity_wh: 96.0,
            history_days: 7,
        }
    }
}
