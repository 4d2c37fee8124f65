//! `terraform output -json` stdout

use crate::core::error::ParseError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One root module output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputMeta {
    pub sensitive: bool,
    /// Type constraint, as terraform encodes it (`"string"`, `["list","string"]`, ...).
    #[serde(rename = "type")]
    pub value_type: serde_json::Value,
    pub value: serde_json::Value,
}

/// Parse the full output map. Empty stdout means no outputs.
pub fn parse_output_json(stdout: &str) -> Result<BTreeMap<String, OutputMeta>, ParseError> {
    if stdout.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_str(stdout).map_err(|source| ParseError::Json {
        context: "output",
        source,
    })
}

/// Parse arbitrary JSON stdout (`show -json`, `providers schema -json`).
pub fn parse_json_value(stdout: &str, context: &'static str) -> Result<serde_json::Value, ParseError> {
    serde_json::from_str(stdout).map_err(|source| ParseError::Json { context, source })
}
