//! Domain error types

use crate::command::{OptionKey, Operation};
use crate::core::version::{ToolVersion, VersionConstraint};
use thiserror::Error;

/// A version constraint on an operation or option was not satisfied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{subject} requires terraform {constraint}, found {actual}")]
pub struct VersionMismatch {
    /// What carried the constraint: an operation (`workspace show`) or a flag (`-replace`)
    pub subject: String,
    pub constraint: VersionConstraint,
    pub actual: ToolVersion,
}

/// Errors raised while building an argument vector.
///
/// All of these are detected before a subprocess is spawned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("option {option} is not applicable to `terraform {operation}`")]
    OptionNotApplicable {
        option: OptionKey,
        operation: Operation,
    },

    #[error("options {first} and {second} cannot be combined for `terraform {operation}`")]
    ConflictingOptions {
        first: OptionKey,
        second: OptionKey,
        operation: Operation,
    },

    #[error("invalid value for option {option}: {reason}")]
    InvalidOption { option: OptionKey, reason: String },

    #[error("`terraform {operation}` requires at least {expected} argument(s), got {actual}")]
    MissingArgument {
        operation: Operation,
        expected: usize,
        actual: usize,
    },

    #[error("`terraform {operation}` accepts at most {expected} argument(s), got {actual}")]
    UnexpectedArgument {
        operation: Operation,
        expected: usize,
        actual: usize,
    },

    #[error(transparent)]
    VersionMismatch(#[from] VersionMismatch),
}

/// Errors from the environment guard
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvironmentError {
    #[error("environment variable {name} is managed by tfdriver and must be set through typed options")]
    ManualOverride { name: String },

    #[error("environment variable names cannot be empty")]
    EmptyName,
}

/// Errors from the stdout parsers and value-object parsing
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("invalid version string: {0:?}")]
    InvalidVersion(String),

    #[error("no `Terraform vX.Y.Z` line found in version output")]
    MissingVersionHeader,

    #[error("unknown operation: {0:?}")]
    UnknownOperation(String),

    #[error("failed to parse {context} JSON: {source}")]
    Json {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
