//! [`VersionSource`] backed by `terraform version`.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tfdriver_application::{ProcessRequest, ProcessRunner, RunnerError, VersionError, VersionSource};
use tfdriver_domain::environment::{self, EnvironmentSpec, ManagedEnv};
use tfdriver_domain::parsing::parse_version_output;
use tfdriver_domain::ToolVersion;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Asks the binary itself, through a [`ProcessRunner`].
pub struct CliVersionSource {
    runner: Arc<dyn ProcessRunner>,
}

impl CliVersionSource {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl VersionSource for CliVersionSource {
    async fn version(
        &self,
        exec_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<ToolVersion, VersionError> {
        let unsuitable = |reason: String| VersionError::NoSuitableBinary {
            path: exec_path.display().to_string(),
            reason,
        };

        let working_dir = std::env::current_dir().map_err(|e| unsuitable(e.to_string()))?;
        let env = environment::compose(
            &EnvironmentSpec::Inherit,
            environment::host_vars(),
            &ManagedEnv::default(),
        );
        let request = ProcessRequest::new(exec_path, working_dir)
            .with_args(vec!["version".to_string()])
            .with_env(env);

        let output = match self.runner.run(request, cancel).await {
            Ok(output) => output,
            Err(RunnerError::Cancelled) => return Err(VersionError::Cancelled),
            Err(e) => return Err(unsuitable(e.to_string())),
        };

        if !output.success() {
            return Err(unsuitable(format!(
                "`version` exited with {:?}: {}",
                output.exit_code,
                output.stderr.trim()
            )));
        }

        let report = parse_version_output(&output.stdout).map_err(|e| unsuitable(e.to_string()))?;
        debug!(version = %report.terraform, providers = report.providers.len(), "Parsed version output");
        Ok(report.terraform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfdriver_application::ProcessOutput;

    enum Canned {
        Exited(ProcessOutput),
        SpawnFails,
        Cancelled,
    }

    #[async_trait]
    impl ProcessRunner for Canned {
        async fn run(
            &self,
            request: ProcessRequest,
            _cancel: &CancellationToken,
        ) -> Result<ProcessOutput, RunnerError> {
            assert_eq!(request.args, vec!["version"]);
            match self {
                Canned::Exited(output) => Ok(output.clone()),
                Canned::SpawnFails => Err(RunnerError::Spawn {
                    program: request.program.display().to_string(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                }),
                Canned::Cancelled => Err(RunnerError::Cancelled),
            }
        }
    }

    fn source(canned: Canned) -> CliVersionSource {
        CliVersionSource::new(Arc::new(canned))
    }

    fn exited(code: i32, stdout: &str, stderr: &str) -> Canned {
        Canned::Exited(ProcessOutput {
            exit_code: Some(code),
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        })
    }

    #[tokio::test]
    async fn test_parses_version() {
        let version = source(exited(0, "Terraform v1.5.7\non linux_amd64\n", ""))
            .version(Path::new("/usr/bin/terraform"), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(version, ToolVersion::new(1, 5, 7));
    }

    #[tokio::test]
    async fn test_not_terraform() {
        let err = source(exited(0, "Python 3.12.1\n", ""))
            .version(Path::new("/usr/bin/python3"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, VersionError::NoSuitableBinary { ref path, .. } if path == "/usr/bin/python3"));
    }

    #[tokio::test]
    async fn test_failed_exit() {
        let err = source(exited(1, "", "boom"))
            .version(Path::new("/usr/bin/terraform"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, VersionError::NoSuitableBinary { ref reason, .. } if reason.contains("boom")));
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let err = source(Canned::SpawnFails)
            .version(Path::new("/nope"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, VersionError::NoSuitableBinary { .. }));
    }

    #[tokio::test]
    async fn test_cancelled() {
        let err = source(Canned::Cancelled)
            .version(Path::new("/usr/bin/terraform"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err, VersionError::Cancelled);
    }
}
