//! Signal generation for weather temperature-bracket markets.
//!
//! Turns ensemble forecasts and market prices into sized trade signals.

pub mod config;
pub mod data;
pub mod execution;
pub mod monitoring;
pub mod strategies;
