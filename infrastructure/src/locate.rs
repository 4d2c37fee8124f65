//! Terraform binary discovery

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const DEFAULT_BINARY: &str = "terraform";

#[derive(Debug, Error)]
pub enum LocateError {
    #[error("terraform binary {0} does not exist")]
    Missing(String),

    #[error("could not find {name} on PATH: {source}")]
    NotOnPath {
        name: String,
        #[source]
        source: which::Error,
    },
}

/// Resolve the binary to run.
///
/// `exec_path` may be a path (anything containing a separator) or a bare
/// name looked up on `PATH`; `None` looks up `terraform`.
pub fn locate_terraform(exec_path: Option<&str>) -> Result<PathBuf, LocateError> {
    let requested = exec_path.unwrap_or(DEFAULT_BINARY);

    let path = if requested.contains(std::path::MAIN_SEPARATOR) || requested.contains('/') {
        let path = Path::new(requested);
        if !path.exists() {
            return Err(LocateError::Missing(requested.to_string()));
        }
        path.to_path_buf()
    } else {
        which::which(requested).map_err(|source| LocateError::NotOnPath {
            name: requested.to_string(),
            source,
        })?
    };

    debug!(path = %path.display(), "Located terraform binary");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_must_exist() {
        let err = locate_terraform(Some("/definitely/not/terraform")).unwrap_err();
        assert!(matches!(err, LocateError::Missing(_)));
    }

    #[test]
    fn test_explicit_path_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let binary = dir.path().join("terraform");
        std::fs::write(&binary, "").unwrap();

        let found = locate_terraform(Some(binary.to_str().unwrap())).unwrap();
        assert_eq!(found, binary);
    }

    #[test]
    fn test_bare_name_uses_path() {
        assert!(locate_terraform(Some("sh")).is_ok());
        assert!(matches!(
            locate_terraform(Some("tfdriver-no-such-binary")),
            Err(LocateError::NotOnPath { .. })
        ));
    }
}
