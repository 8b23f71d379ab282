//! Domain types for the pairing panel.

pub mod config;

pub use config::PairConfig;
