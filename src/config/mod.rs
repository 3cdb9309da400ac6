//! Configuration module for Botwatch
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use botwatch::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("botwatch.toml")).unwrap();
//! println!("Scheduler ticks every {}s", config.scheduler.tick_interval_secs);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{AuditConfig, Config, SchedulerConfig, StorageConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
