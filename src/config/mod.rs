//! Configuration module for Price-Watch
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use price_watch::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("price-watch.toml")).unwrap();
//! println!("Attempts per URL: {}", config.job.attempts);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, JobConfig, PricingConfig, ProviderEntry, WorkbookBackend, WorkbookConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::{parse_timezone, validate};
