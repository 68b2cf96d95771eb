//! Configuration and service wiring shared by the scout binary.

pub mod bootstrap;
pub mod config;

pub use config::{Config, ConfigError};
