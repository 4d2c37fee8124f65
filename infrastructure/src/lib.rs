//! Infrastructure layer for tfdriver
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, plus binary discovery and configuration
//! file loading.

pub mod config;
pub mod locate;
pub mod process;
pub mod version;

// Re-export commonly used types
pub use config::{ConfigLoader, ConfigValidationError, FileConfig, FileTerraformConfig};
pub use locate::{LocateError, locate_terraform};
pub use process::{TokioProcessRunner, TracingSink, WriterSink};
pub use version::CliVersionSource;
