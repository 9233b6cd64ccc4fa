//! Wire types and configuration shared by the alias client crates.

pub mod config;
pub mod types;
