pub mod backtest;
pub mod performance;
