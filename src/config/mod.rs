//! Configuration module for Linkreach
//!
//! This module handles loading, overriding and validating the run settings.
//! Settings are resolved once at startup (TOML file, then environment
//! overrides, then validation) and passed by reference afterwards.
//!
//! # Example
//!
//! ```no_run
//! use linkreach::config::load_settings;
//! use std::path::Path;
//!
//! let settings = load_settings(Path::new("linkreach.toml")).unwrap();
//! println!("Checkpoint timeout: {}s", settings.checkpoint_timeout_seconds);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ButtonLabels, Cooldown, ScrollSettings, Settings};

// Re-export parser functions
pub use parser::{
    apply_env_overrides, compute_config_hash, load_settings, load_settings_from,
    load_settings_with_hash, parse_settings, resolve_settings,
};
pub use validation::validate;
