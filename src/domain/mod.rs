//! Core domain types and logic.

pub mod ohlcv;
pub mod outcome;
pub mod indicator;
pub mod signal;
pub mod strategy;
pub mod backtest;
pub mod position;
pub mod metrics;
pub mod risk;
pub mod universe;
pub mod scanner;
pub mod config_validation;
pub mod error;
