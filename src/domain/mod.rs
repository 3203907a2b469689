//! Core domain types and logic.

pub mod ohlcv;
pub mod calendar;
pub mod instrument;
pub mod benchmark;
pub mod rolling;
pub mod cross_section;
pub mod alpha;
pub mod signal;
pub mod portfolio;
pub mod execution;
pub mod backtest;
pub mod metrics;
pub mod strategy;
pub mod universe;
pub mod config_validation;
pub mod error;
