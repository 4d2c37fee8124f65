//! Core domain concepts shared across all subdomains.
//!
//! - [`version::ToolVersion`]: semantic version of the terraform binary
//! - [`version::VersionConstraint`]: half-open version range
//! - [`error`]: domain-level errors

pub mod error;
pub mod version;
