//! Configuration file loading for tfdriver
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `TFDRIVER_` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./tfdriver.toml` or `./.tfdriver.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/tfdriver/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{ConfigValidationError, FileConfig, FileTerraformConfig};
pub use loader::ConfigLoader;
