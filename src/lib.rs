//! Apura - average-cost ledger for B3/CEI brokerage statements
//!
//! This library replays a brokerage transaction history (buys, sells, splits,
//! bonuses, dividend reinvestment) through one average-cost ledger per asset
//! and consolidates the results into the positions and realized gains needed
//! for annual tax-return reporting.

pub mod b3;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod importers;
pub mod ledger;
pub mod normalizer;
pub mod reports;
pub mod utils;
