//! Application layer for tfdriver
//!
//! This crate contains the [`Terraform`] handle, its error taxonomy and the
//! port definitions it runs through. It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::DriverSettings;
pub use ports::{
    process_runner::{OutputSink, ProcessOutput, ProcessRequest, ProcessRunner, RunnerError},
    version_source::{VersionError, VersionSource},
};
pub use use_cases::terraform::{FormatReport, Terraform, TerraformError};
