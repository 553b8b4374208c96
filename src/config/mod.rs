//! Configuration module for tiki-harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! All keys are optional; missing sections fall back to defaults for tiki.vn.
//!
//! # Example
//!
//! ```no_run
//! use tiki_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Writing to: {}", config.output.database_path);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, OutputConfig, SelectorConfig, SiteConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
