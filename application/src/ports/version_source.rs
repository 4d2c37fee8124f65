//! Version source port

use async_trait::async_trait;
use std::path::Path;
use tfdriver_domain::ToolVersion;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("no suitable terraform binary could be found at {path}: {reason}")]
    NoSuitableBinary { path: String, reason: String },

    #[error("Operation cancelled")]
    Cancelled,
}

/// Reports the version of the binary at an execution path.
#[async_trait]
pub trait VersionSource: Send + Sync {
    async fn version(
        &self,
        exec_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<ToolVersion, VersionError>;
}
