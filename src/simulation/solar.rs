//! # Solar Telemetry Simulation
//!
//! Produces a plausible multi-day history of panel and battery telemetry for
//! demos and tests when no hardware is reporting. The irradiance shape is a
//! fixed diurnal parabola; only the per-sample detail is random.

use chrono::{DateTime, Duration, FixedOffset, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::noise::NoiseSource;
use crate::domain::{into_keyed, KeyedHistory, SystemParams, TelemetrySample};

/// First daylight hour (inclusive)
pub const DAYLIGHT_START_HOUR: u32 = 6;
/// Last daylight hour (inclusive)
pub const DAYLIGHT_END_HOUR: u32 = 20;
pub const SOLAR_NOON_HOUR: u32 = 13;
/// Hours from solar noon to the edge of the daylight window
const HALF_DAYLIGHT_HOURS: f64 = 7.0;

pub const PEAK_LUX: f64 = 100_000.0;
pub const AMBIENT_TEMP_C: f64 = 20.0;
pub const PEAK_HEATING_C: f64 = 30.0;
pub const NOMINAL_VOLTAGE_V: f64 = 18.0;
pub const VOLTAGE_BAND_V: f64 = 2.0;
pub const PEAK_PANEL_W: f64 = 20.0;
pub const INITIAL_SOC_PERCENT: f64 = 50.0;

const NOISE_MIN: f64 = 0.8;
const NOISE_MAX: f64 = 1.2;

#[derive(Debug, Error, PartialEq)]
pub enum SimulationError {
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

impl SimulationError {
    fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Simulator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Length of the generated window in days
    pub days: u32,
    /// Samples per simulated hour (must divide 3600)
    pub samples_per_hour: u32,
    /// Constant load subtracted from panel production, in watts
    pub baseline_load_w: f64,
    /// Battery capacity in watt-hours
    pub battery_capacity_wh: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self::from(&SystemParams::default())
    }
}

impl From<&SystemParams> for SimulatorConfig {
    fn from(params: &SystemParams) -> Self {
        Self {
            days: params.history_days,
            samples_per_hour: 1,
            baseline_load_w: params.baseline_load_w,
            battery_capacity_wh: params.battery_capacity_wh,
        }
    }
}

impl SimulatorConfig {
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.days == 0 {
            return Err(SimulationError::invalid("days", "must be positive"));
        }
        if self.samples_per_hour == 0 {
            return Err(SimulationError::invalid(
                "samples_per_hour",
                "must be positive",
            ));
        }
        if 3600 % self.samples_per_hour != 0 {
            return Err(SimulationError::invalid(
                "samples_per_hour",
                format!("{} does not divide an hour into whole seconds", self.samples_per_hour),
            ));
        }
        if !self.baseline_load_w.is_finite() {
            return Err(SimulationError::invalid("baseline_load_w", "must be finite"));
        }
        if !self.battery_capacity_wh.is_finite() || self.battery_capacity_wh <= 0.0 {
            return Err(SimulationError::invalid(
                "battery_capacity_wh",
                "must be a positive finite number",
            ));
        }
        Ok(())
    }

    /// Spacing between consecutive samples
    pub fn step_seconds(&self) -> i64 {
        3600 / i64::from(self.samples_per_hour.max(1))
    }

    pub fn total_points(&self) -> u64 {
        u64::from(self.days) * 24 * u64::from(self.samples_per_hour)
    }

    fn hours_per_sample(&self) -> f64 {
        1.0 / f64::from(self.samples_per_hour)
    }
}

/// Diurnal irradiance multiplier in `[0, 1]`: a parabola peaking at solar
/// noon and reaching zero at the daylight window edges.
pub fn sun_factor(hour: u32) -> f64 {
    if !(DAYLIGHT_START_HOUR..=DAYLIGHT_END_HOUR).contains(&hour) {
        return 0.0;
    }
    let offset = (f64::from(hour) - f64::from(SOLAR_NOON_HOUR)) / HALF_DAYLIGHT_HOURS;
    (1.0 - offset.powi(2)).max(0.0)
}

/// Advance the battery state of charge by one sample.
///
/// The clamp is applied after the change is added, so a full battery still
/// drains on the next sample when production drops below the load.
pub fn integrate_soc(prev_soc: f64, power_w: f64, config: &SimulatorConfig) -> f64 {
    let net_power_w = power_w - config.baseline_load_w;
    let wh_change = net_power_w * config.hours_per_sample();
    let soc_change = wh_change / config.battery_capacity_wh * 100.0;
    (prev_soc + soc_change).clamp(0.0, 100.0)
}

/// Panel-side reading of one sample, before battery integration.
#[derive(Debug, Clone, Copy)]
struct PanelReading {
    timestamp: i64,
    sunlight_lux: u32,
    panel_temp_c: f64,
    dc_voltage_v: f64,
    dc_current_ma: u32,
    dc_power_w: f64,
}

impl PanelReading {
    fn into_sample(self, battery_soc_perc: f64) -> TelemetrySample {
        TelemetrySample {
            timestamp: self.timestamp,
            sunlight_lux: self.sunlight_lux,
            panel_temp_c: round_to(self.panel_temp_c, 1),
            dc_voltage_v: round_to(self.dc_voltage_v, 2),
            dc_current_ma: self.dc_current_ma,
            dc_power_w: round_to(self.dc_power_w, 2),
            battery_soc_perc: round_to(battery_soc_perc, 1),
        }
    }
}

/// Half-to-even, so exact halves land where the dashboard's history does.
fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round_ties_even() / factor
}

/// Generates synthetic solar/battery telemetry histories.
pub struct SolarTelemetrySimulator<N> {
    config: SimulatorConfig,
    noise: N,
}

impl<N: NoiseSource> SolarTelemetrySimulator<N> {
    pub fn new(config: SimulatorConfig, noise: N) -> Self {
        Self { config, noise }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Generate the history ending just before `end_time`, oldest sample
    /// first. Hours of day are taken in `end_time`'s offset.
    pub fn generate(
        &mut self,
        end_time: DateTime<FixedOffset>,
    ) -> Result<Vec<TelemetrySample>, SimulationError> {
        self.config.validate()?;

        let total = self.config.total_points();
        let step_seconds = self.config.step_seconds();
        let start = i64::try_from(total)
            .ok()
            .and_then(|n| n.checked_mul(step_seconds))
            .and_then(Duration::try_seconds)
            .and_then(|span| end_time.checked_sub_signed(span))
            .ok_or_else(|| {
                SimulationError::invalid("end_time", "window start is out of range")
            })?;

        let readings: Vec<PanelReading> = (0..total)
            .map(|i| {
                let at = start + Duration::seconds(i as i64 * step_seconds);
                self.read_panel(at)
            })
            .collect();

        let config = &self.config;
        let samples = readings
            .into_iter()
            .scan(INITIAL_SOC_PERCENT, |soc, reading| {
                *soc = integrate_soc(*soc, reading.dc_power_w, config);
                Some(reading.into_sample(*soc))
            })
            .collect();

        Ok(samples)
    }

    /// Same as [`generate`](Self::generate), keyed for bulk storage writes.
    pub fn generate_keyed(
        &mut self,
        end_time: DateTime<FixedOffset>,
    ) -> Result<KeyedHistory, SimulationError> {
        self.generate(end_time).map(into_keyed)
    }

    fn read_panel(&mut self, at: DateTime<FixedOffset>) -> PanelReading {
        let sun = sun_factor(at.hour());
        // Shared by lux, temperature and power; voltage draws its own.
        let noise = self.noise.uniform(NOISE_MIN, NOISE_MAX);

        let sunlight_lux = if sun > 0.0 {
            (PEAK_LUX * sun * noise) as u32
        } else {
            0
        };
        let panel_temp_c = AMBIENT_TEMP_C + PEAK_HEATING_C * sun * noise;
        let dc_voltage_v = if sun > 0.0 {
            NOMINAL_VOLTAGE_V + VOLTAGE_BAND_V * self.noise.uniform(-1.0, 1.0)
        } else {
            0.0
        };
        let dc_power_w = PEAK_PANEL_W * sun * noise;
        let dc_current_ma = if dc_voltage_v > 0.0 {
            (dc_power_w / dc_voltage_v * 1000.0) as u32
        } else {
            0
        };

        PanelReading {
            timestamp: at.timestamp(),
            sunlight_lux,
            panel_temp_c,
            dc_voltage_v,
            dc_current_ma,
            dc_power_w,
        }
    }
}
