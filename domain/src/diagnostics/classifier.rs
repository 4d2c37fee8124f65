//! Stderr classification.
//!
//! [`classify`] is a pure function over the stderr text of a failed
//! invocation. Signatures are evaluated in [`signature_order`], first match
//! wins; the order matters because an init failure can also print a usage
//! banner, and a missing variable can mention plugins.
//!
//! Exit code 127 with the usage banner on *stdout* is not recognised: only
//! stderr is inspected.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// A failed terraform invocation, mapped to what went wrong.
///
/// Every variant's `Display` carries the raw context needed to diagnose the
/// failure: the variable name, or stderr verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedError {
    /// A required input variable was not supplied.
    ///
    /// `name` is empty when stderr did not name it.
    #[error("variable {name:?} was required but not supplied")]
    MissingVariable { name: String },

    /// The flag or argument combination was rejected.
    #[error("{stderr}")]
    CliUsage { stderr: String },

    /// Providers or plugins are not installed; `init` has not run.
    #[error("{stderr}")]
    NotInitialized { stderr: String },

    /// The working directory has no configuration files.
    #[error("{stderr}")]
    NoConfiguration { stderr: String },

    /// No known signature matched.
    #[error("terraform exited with {}: {stderr}", describe_exit(.exit_code))]
    Unclassified {
        exit_code: Option<i32>,
        stderr: String,
    },
}

impl ClassifiedError {
    /// The signature that produced this error, `None` for unclassified ones.
    pub fn signature(&self) -> Option<FailureSignature> {
        match self {
            Self::MissingVariable { .. } => Some(FailureSignature::MissingVariable),
            Self::CliUsage { .. } => Some(FailureSignature::CliUsage),
            Self::NotInitialized { .. } => Some(FailureSignature::NotInitialized),
            Self::NoConfiguration { .. } => Some(FailureSignature::NoConfiguration),
            Self::Unclassified { .. } => None,
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

/// A known stderr signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureSignature {
    MissingVariable,
    CliUsage,
    NotInitialized,
    NoConfiguration,
}

impl FailureSignature {
    fn build(self, stderr: &str) -> ClassifiedError {
        match self {
            Self::MissingVariable => ClassifiedError::MissingVariable {
                name: missing_variable_name(stderr).unwrap_or_default(),
            },
            Self::CliUsage => ClassifiedError::CliUsage {
                stderr: stderr.to_string(),
            },
            Self::NotInitialized => ClassifiedError::NotInitialized {
                stderr: stderr.to_string(),
            },
            Self::NoConfiguration => ClassifiedError::NoConfiguration {
                stderr: stderr.to_string(),
            },
        }
    }
}

fn compile(pattern: &str) -> Regex {
    // Patterns are literals below; a failure is a programming error caught by tests.
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid signature pattern {pattern:?}: {e}"))
}

static SIGNATURES: LazyLock<Vec<(FailureSignature, Regex)>> = LazyLock::new(|| {
    vec![
        (
            FailureSignature::MissingVariable,
            // the second wording is printed by 0.11
            compile(r"Error: No value for required variable|Error: Required variable not set:"),
        ),
        (
            FailureSignature::CliUsage,
            compile(r"(?m)Too many command line arguments|^Usage: |Error: Invalid -\d+ option"),
        ),
        (
            FailureSignature::NotInitialized,
            // "Could not load plugin" is the 0.13 wording
            compile(r"Error: Could not satisfy plugin requirements|Error: Could not load plugin"),
        ),
        (
            FailureSignature::NoConfiguration,
            compile(r"Error: No configuration files"),
        ),
    ]
});

static VARIABLE_NAME_TIERS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        compile(r#"The root module input variable\s+"([^"]+)"\s+is\s+not\s+set"#),
        compile(r#"No value for required variable:?\s*"([^"]*)""#),
        compile(r"Error: Required variable not set:\s*(.+)"),
    ]
});

/// Signatures in evaluation order.
pub fn signature_order() -> Vec<FailureSignature> {
    SIGNATURES.iter().map(|(signature, _)| *signature).collect()
}

/// Map the stderr of a non-zero exit to a [`ClassifiedError`].
pub fn classify(stderr: &str, exit_code: Option<i32>) -> ClassifiedError {
    SIGNATURES
        .iter()
        .find(|(_, pattern)| pattern.is_match(stderr))
        .map(|(signature, _)| signature.build(stderr))
        .unwrap_or_else(|| ClassifiedError::Unclassified {
            exit_code,
            stderr: stderr.to_string(),
        })
}

/// Name of the missing variable, trying each known wording in turn.
pub fn missing_variable_name(stderr: &str) -> Option<String> {
    VARIABLE_NAME_TIERS.iter().find_map(|pattern| {
        pattern
            .captures(stderr)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().trim_matches('"').to_string())
            .filter(|name| !name.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MISSING_VAR_1X: &str = "
Error: No value for required variable

  on variables.tf line 1:
   1: variable \"region\" {

The root module input variable \"region\" is not set, and has no default
value. Use a -var or -var-file command line argument to provide a value for
this variable.
";

    const USAGE: &str = "Usage: terraform plan [options] [DIR]

  Generates a speculative execution plan.

Options:

  -destroy            Select the \"destroy\" planning mode.
";

    const NO_INIT_012: &str = "
Error: Could not satisfy plugin requirements

Plugin reinitialization required. Please run \"terraform init\".
";

    const NO_INIT_013: &str = "
Error: Could not load plugin

Plugin reinitialization required. Please run \"terraform init\".
";

    const NO_CONFIG: &str = "
Error: No configuration files

Apply requires configuration to be present.
";

    #[test]
    fn test_missing_variable_current_wording() {
        assert_eq!(
            classify(MISSING_VAR_1X, Some(1)),
            ClassifiedError::MissingVariable {
                name: "region".to_string()
            }
        );
    }

    #[test]
    fn test_missing_variable_inline_name() {
        assert_eq!(
            classify("Error: No value for required variable: \"region\"", Some(1)),
            ClassifiedError::MissingVariable {
                name: "region".to_string()
            }
        );
    }

    #[test]
    fn test_missing_variable_legacy_wording() {
        assert_eq!(
            classify("Error: Required variable not set: region\n", Some(1)),
            ClassifiedError::MissingVariable {
                name: "region".to_string()
            }
        );
    }

    #[test]
    fn test_missing_variable_without_name() {
        assert_eq!(
            classify("Error: No value for required variable\n", Some(1)),
            ClassifiedError::MissingVariable {
                name: String::new()
            }
        );
    }

    #[test]
    fn test_usage_banner_is_verbatim() {
        let err = classify(USAGE, Some(1));
        assert_eq!(
            err,
            ClassifiedError::CliUsage {
                stderr: USAGE.to_string()
            }
        );
        assert_eq!(err.to_string(), USAGE);
    }

    #[test]
    fn test_usage_signatures() {
        for stderr in [
            "Too many command line arguments. Did you mean to use -chdir?",
            "Error: Invalid -2 option",
        ] {
            assert_eq!(
                classify(stderr, Some(1)).signature(),
                Some(FailureSignature::CliUsage),
                "{stderr}"
            );
        }
    }

    #[test]
    fn test_not_initialized_both_wordings() {
        for stderr in [NO_INIT_012, NO_INIT_013] {
            assert!(matches!(
                classify(stderr, Some(1)),
                ClassifiedError::NotInitialized { stderr: ref s } if s == stderr
            ));
        }
    }

    #[test]
    fn test_no_configuration() {
        assert!(matches!(
            classify(NO_CONFIG, Some(1)),
            ClassifiedError::NoConfiguration { .. }
        ));
    }

    #[test]
    fn test_unclassified_keeps_stderr_and_status() {
        let err = classify("Error: Failed to get existing workspaces", Some(1));
        assert_eq!(
            err,
            ClassifiedError::Unclassified {
                exit_code: Some(1),
                stderr: "Error: Failed to get existing workspaces".to_string()
            }
        );
        assert!(err.to_string().contains("Failed to get existing workspaces"));
        assert!(err.signature().is_none());
    }

    #[test]
    fn test_signature_order_is_fixed() {
        assert_eq!(
            signature_order(),
            vec![
                FailureSignature::MissingVariable,
                FailureSignature::CliUsage,
                FailureSignature::NotInitialized,
                FailureSignature::NoConfiguration,
            ]
        );
    }

    #[test]
    fn test_earlier_signature_wins_on_overlap() {
        let both = format!("{}\n{}", NO_INIT_012, USAGE);
        assert!(matches!(
            classify(&both, Some(1)),
            ClassifiedError::CliUsage { .. }
        ));

        let var_and_config = format!("{}\n{}", NO_CONFIG, MISSING_VAR_1X);
        assert!(matches!(
            classify(&var_and_config, Some(1)),
            ClassifiedError::MissingVariable { .. }
        ));
    }

    #[test]
    fn test_usage_must_start_a_line() {
        assert!(matches!(
            classify("see Usage: below", Some(1)),
            ClassifiedError::Unclassified { .. }
        ));
    }

    #[test]
    fn test_total_on_arbitrary_input() {
        for stderr in ["", "\u{0}\u{fffd}", "Error:", "\"\"\""] {
            let _ = classify(stderr, None);
        }
    }
}
