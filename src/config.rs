//! Configuration module for the Apollo monitor.
//!
//! Provides run configuration and validation for:
//! - Annotation store settings (connection string, acquire timeout)
//! - InfluxDB settings (host, port, database, credentials, timeout)
//! - Collection options (instance tag, username suffix, prefix, dry run, date range)

mod app;
mod validation;

pub use app::{DatabaseConfig, MonitorConfig};
pub use validation::{ConfigError, expand_env_vars, parse_duration};
