//! # volfitter_service: Fit Cycle, Adapters and Scheduler
//!
//! ## Layer 3 (Service) Role
//!
//! volfitter_service connects the per-expiry pipeline in `volfitter_models`
//! to the outside world:
//!
//! - [`ports`]: Supplier and consumer traits the fit cycle talks to
//! - [`adapters`]: Sample-data (OptionMetrics CSV) implementations of the ports
//! - [`service`]: `VolfitterService::fit_full_surface`, one complete fit cycle
//! - [`config`]: TOML / environment / CLI configuration
//! - [`error`]: Service error type
//!
//! The `volfitter` binary runs fit cycles on a fixed interval.

pub mod adapters;
pub mod config;
pub mod error;
pub mod ports;
pub mod service;

pub use config::{build_config, CliArgs, ConfigError, VolfitterConfig, VolfitterMode};
pub use error::ServiceError;
pub use service::{FitCycleResult, VolfitterService};

/// Service version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
