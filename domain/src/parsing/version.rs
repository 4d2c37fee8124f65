//! `terraform version` stdout
//!
//! ```text
//! Terraform v1.5.7
//! on linux_amd64
//! + provider registry.terraform.io/hashicorp/aws v5.17.0
//! ```
//!
//! Releases before 0.13 print providers as `+ provider.aws v2.70.0`.

use crate::core::error::ParseError;
use crate::core::version::ToolVersion;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const HEADER: &str = "Terraform v";
const PROVIDER_PREFIX: &str = "+ provider";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionReport {
    pub terraform: ToolVersion,
    /// Provider source address (or legacy name) → version.
    pub providers: BTreeMap<String, ToolVersion>,
}

/// Parse the plain-text output of `terraform version`.
///
/// Provider lines that do not parse are skipped; a missing or malformed
/// header is an error.
pub fn parse_version_output(stdout: &str) -> Result<VersionReport, ParseError> {
    let mut lines = stdout.lines().map(str::trim).filter(|l| !l.is_empty());

    let header = lines
        .next()
        .and_then(|l| l.strip_prefix(HEADER))
        .ok_or(ParseError::MissingVersionHeader)?;
    let terraform: ToolVersion = header
        .split_whitespace()
        .next()
        .ok_or(ParseError::MissingVersionHeader)?
        .parse()?;

    let providers = lines
        .filter_map(|line| line.strip_prefix(PROVIDER_PREFIX))
        .filter_map(parse_provider_line)
        .collect();

    Ok(VersionReport {
        terraform,
        providers,
    })
}

fn parse_provider_line(rest: &str) -> Option<(String, ToolVersion)> {
    // " registry.terraform.io/hashicorp/aws v5.17.0" or ".aws v2.70.0"
    let rest = rest.strip_prefix('.').unwrap_or(rest);
    let mut parts = rest.split_whitespace();
    let name = parts.next()?;
    let version = parts.next()?.parse().ok()?;
    Some((name.to_string(), version))
}
