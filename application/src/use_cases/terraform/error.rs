//! Error taxonomy of the Terraform handle.

use crate::ports::process_runner::RunnerError;
use crate::ports::version_source::VersionError;
use tfdriver_domain::{
    ClassifiedError, CommandError, EnvironmentError, ParseError, VersionMismatch,
};
use thiserror::Error;

/// Errors returned by [`Terraform`](super::Terraform) operations.
///
/// `Command`, `VersionMismatch`, `ManualEnvVar` and `InvalidEnv` are raised
/// before anything is spawned. `Classified` is the mapped stderr of a
/// non-zero exit. `Cancelled` is never produced by the tool itself.
#[derive(Error, Debug)]
pub enum TerraformError {
    #[error("no suitable terraform binary could be found at {path}: {reason}")]
    NoSuitableBinary { path: String, reason: String },

    #[error("invalid working directory {path}: {reason}")]
    WorkingDir { path: String, reason: String },

    #[error(transparent)]
    VersionMismatch(VersionMismatch),

    #[error("manual setting of environment variable {name:?} detected; use the typed options instead")]
    ManualEnvVar { name: String },

    #[error("invalid environment: {0}")]
    InvalidEnv(EnvironmentError),

    #[error("Invalid command: {0}")]
    Command(CommandError),

    #[error(transparent)]
    Classified(#[from] ClassifiedError),

    #[error("Unexpected terraform output: {0}")]
    Parse(#[from] ParseError),

    #[error("Execution error: {0}")]
    Runner(RunnerError),

    #[error("Operation cancelled")]
    Cancelled,
}

impl TerraformError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TerraformError::Cancelled)
    }

    /// The classified tool failure, if the tool ran and exited non-zero.
    pub fn classified(&self) -> Option<&ClassifiedError> {
        match self {
            TerraformError::Classified(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CommandError> for TerraformError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::VersionMismatch(mismatch) => TerraformError::VersionMismatch(mismatch),
            other => TerraformError::Command(other),
        }
    }
}

impl From<VersionMismatch> for TerraformError {
    fn from(err: VersionMismatch) -> Self {
        TerraformError::VersionMismatch(err)
    }
}

impl From<EnvironmentError> for TerraformError {
    fn from(err: EnvironmentError) -> Self {
        match err {
            EnvironmentError::ManualOverride { name } => TerraformError::ManualEnvVar { name },
            other => TerraformError::InvalidEnv(other),
        }
    }
}

impl From<RunnerError> for TerraformError {
    fn from(err: RunnerError) -> Self {
        match err {
            RunnerError::Cancelled => TerraformError::Cancelled,
            other => TerraformError::Runner(other),
        }
    }
}

impl From<VersionError> for TerraformError {
    fn from(err: VersionError) -> Self {
        match err {
            VersionError::NoSuitableBinary { path, reason } => {
                TerraformError::NoSuitableBinary { path, reason }
            }
            VersionError::Cancelled => TerraformError::Cancelled,
        }
    }
}
