//! Backend for the Smart Solar dashboard: telemetry history, weather.gov
//! forecasts, AI battery outlooks and synthetic telemetry for demos.

pub mod analysis;
pub mod api;
pub mod config;
pub mod domain;
pub mod forecast;
pub mod logging;
pub mod simulation;
pub mod state;
pub mod store;
