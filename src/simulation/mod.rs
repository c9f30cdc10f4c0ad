//! # Telemetry Simulation Module
//!
//! Synthetic solar-panel and battery telemetry for dashboards running
//! without hardware.
//!
//! ## Usage
//!
//! ```rust
//! use chrono::Local;
//! use smart_solar_backend::simulation::{NeutralNoise, SimulatorConfig, SolarTelemetrySimulator};
//!
//! let config = SimulatorConfig {
//!     days: 1,
//!     ..Default::default()
//! };
//! let mut sim = SolarTelemetrySimulator::new(config, NeutralNoise);
//! let samples = sim.generate(Local::now().fixed_offset()).unwrap();
//! assert_eq!(samples.len(), 24);
//! ```

pub mod noise;
pub mod solar;

pub use noise::{NeutralNoise, NoiseSource, RngNoise};
pub use solar::{
    integrate_soc, sun_factor, SimulationError, SimulatorConfig, SolarTelemetrySimulator,
};
