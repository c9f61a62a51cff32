//! Core domain types and logic.

pub mod backtest;
pub mod candle;
pub mod config_validation;
pub mod equation;
pub mod equation_eval;
pub mod equation_parser;
pub mod error;
pub mod execution;
pub mod indicator;
pub mod metrics;
pub mod position;
pub mod strategy;
pub mod tokenizer;
pub mod trade;
pub mod validation;
pub mod variables;
