//! `terraform validate -json` stdout

use crate::core::error::ParseError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateOutput {
    pub valid: bool,
    #[serde(default)]
    pub error_count: u32,
    #[serde(default)]
    pub warning_count: u32,
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidateOutput {
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    #[serde(default)]
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Parse the validation report.
///
/// Terraform prints the report for both valid and invalid configurations,
/// exiting 1 in the latter case.
pub fn parse_validate_json(stdout: &str) -> Result<ValidateOutput, ParseError> {
    serde_json::from_str(stdout).map_err(|source| ParseError::Json {
        context: "validate",
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let out = parse_validate_json(
            r#"{"format_version":"1.0","valid":true,"error_count":0,"warning_count":0,"diagnostics":[]}"#,
        )
        .unwrap();
        assert!(out.valid);
        assert_eq!(out.errors().count(), 0);
    }

    #[test]
    fn test_invalid_config() {
        let out = parse_validate_json(
            r#"{
  "valid": false,
  "error_count": 1,
  "warning_count": 1,
  "diagnostics": [
    {"severity": "error", "summary": "Unsupported argument", "detail": "An argument named \"foo\" is not expected here.",
     "range": {"filename": "main.tf", "start": {"line": 3}}},
    {"severity": "warning", "summary": "Deprecated attribute"}
  ]
}"#,
        )
        .unwrap();
        assert!(!out.valid);
        assert_eq!(out.error_count, 1);
        let errors: Vec<_> = out.errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].summary, "Unsupported argument");
        assert_eq!(out.diagnostics[1].detail, "");
    }

    #[test]
    fn test_not_json() {
        assert!(matches!(
            parse_validate_json("Success! The configuration is valid."),
            Err(ParseError::Json { context: "validate", .. })
        ));
    }
}
