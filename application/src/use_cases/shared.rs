//! Shared utilities for use cases.

use crate::use_cases::terraform::TerraformError;
use tokio_util::sync::CancellationToken;

/// Check if cancellation has been requested.
///
/// Returns `Err(TerraformError::Cancelled)` if the token is cancelled.
pub(crate) fn check_cancelled(token: &CancellationToken) -> Result<(), TerraformError> {
    if token.is_cancelled() {
        return Err(TerraformError::Cancelled);
    }
    Ok(())
}
