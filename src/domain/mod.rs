//! Simulation core: indicators, entry and exit rules, analytics.

pub mod analytics;
pub mod bar;
pub mod blackout;
pub mod config_validation;
pub mod entry;
pub mod error;
pub mod exit;
pub mod indicator;
pub mod params;
pub mod runner;
pub mod trade;
