//! Pairs-trading analysis: Engle-Granger cointegration, z-score signals
//! and a lagged-position backtest, served over HTTP.

pub mod config;
pub mod errors;
pub mod feeds;
pub mod models;
pub mod paper;
pub mod series;
pub mod server;
pub mod state;
pub mod strategy;
