//! The Terraform handle
//!
//! [`Terraform`] owns everything needed to invoke the binary for one working
//! directory: the executable path, the base environment, the managed
//! settings (log path, user agent), the output sinks and the lazily resolved
//! tool version.
//!
//! Every operation follows the same path:
//!
//! ```text
//! version (cached) → CommandBuilder → compose env → ProcessRunner
//!     exit 0  → stdout parser
//!     exit ≠0 → classify(stderr)
//! ```
//!
//! Settings are changed through `&mut self`, so a call in flight always sees
//! the configuration it started with. The version cache is a
//! [`tokio::sync::OnceCell`]: concurrent first callers share one resolution
//! and a failed resolution is retried by the next call.

mod error;
mod operations;

pub use error::TerraformError;
pub use operations::FormatReport;

use crate::config::DriverSettings;
use crate::ports::process_runner::{OutputSink, ProcessOutput, ProcessRequest, ProcessRunner};
use crate::ports::version_source::VersionSource;
use crate::use_cases::shared::check_cancelled;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tfdriver_domain::environment::{self, EnvironmentSpec, ManagedEnv};
use tfdriver_domain::{ArgumentVector, CommandBuilder, Operation, ToolVersion, classify};
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Driver for one terraform working directory.
pub struct Terraform {
    exec_path: PathBuf,
    working_dir: PathBuf,
    env: EnvironmentSpec,
    managed: ManagedEnv,
    stdout_sink: Option<Arc<dyn OutputSink>>,
    stderr_sink: Option<Arc<dyn OutputSink>>,
    runner: Arc<dyn ProcessRunner>,
    versions: Arc<dyn VersionSource>,
    version: OnceCell<ToolVersion>,
}

impl Terraform {
    /// Create a handle.
    ///
    /// Fails when `working_dir` is empty or not an existing directory, or
    /// when `exec_path` is empty. The binary itself is not probed until the
    /// first call.
    pub fn new(
        working_dir: impl Into<PathBuf>,
        exec_path: impl Into<PathBuf>,
        runner: Arc<dyn ProcessRunner>,
        versions: Arc<dyn VersionSource>,
    ) -> Result<Self, TerraformError> {
        let working_dir = working_dir.into();
        let exec_path = exec_path.into();

        if working_dir.as_os_str().is_empty() {
            return Err(TerraformError::WorkingDir {
                path: String::new(),
                reason: "working directory cannot be empty".to_string(),
            });
        }
        match std::fs::metadata(&working_dir) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(TerraformError::WorkingDir {
                    path: working_dir.display().to_string(),
                    reason: "not a directory".to_string(),
                });
            }
            Err(e) => {
                return Err(TerraformError::WorkingDir {
                    path: working_dir.display().to_string(),
                    reason: e.to_string(),
                });
            }
        }

        if exec_path.as_os_str().is_empty() {
            return Err(TerraformError::NoSuitableBinary {
                path: String::new(),
                reason: "no path to a terraform executable was supplied".to_string(),
            });
        }

        Ok(Self {
            exec_path,
            working_dir,
            env: EnvironmentSpec::Inherit,
            managed: ManagedEnv::default(),
            stdout_sink: None,
            stderr_sink: None,
            runner,
            versions,
            version: OnceCell::new(),
        })
    }

    pub fn exec_path(&self) -> &Path {
        &self.exec_path
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn env(&self) -> &EnvironmentSpec {
        &self.env
    }

    /// Use exactly `vars` as the base environment.
    ///
    /// Variables managed through options (`TF_VAR_*`, `TF_LOG`, ...) are
    /// rejected with [`TerraformError::ManualEnvVar`]; the handle is left
    /// unchanged.
    pub fn set_env(&mut self, vars: BTreeMap<String, String>) -> Result<(), TerraformError> {
        self.env = EnvironmentSpec::explicit(vars)?;
        Ok(())
    }

    /// Use the host process environment as the base (the default).
    pub fn inherit_env(&mut self) {
        self.env = EnvironmentSpec::Inherit;
    }

    /// Have terraform write a trace log to `path` (`TF_LOG_PATH`).
    pub fn set_log_path(&mut self, path: impl AsRef<Path>) {
        self.managed.log_path = Some(path.as_ref().display().to_string());
    }

    pub fn clear_log_path(&mut self) {
        self.managed.log_path = None;
    }

    /// Suffix for the User-Agent terraform sends to providers and registries.
    pub fn set_append_user_agent(&mut self, agent: impl Into<String>) {
        self.managed.append_user_agent = Some(agent.into());
    }

    /// Apply handle-wide settings in one step.
    ///
    /// An explicit environment is checked like [`Terraform::set_env`]; on
    /// error nothing is changed.
    pub fn apply_settings(&mut self, settings: &DriverSettings) -> Result<(), TerraformError> {
        if let EnvironmentSpec::Explicit(vars) = &settings.env {
            environment::check_overrides(vars)?;
        }
        self.env = settings.env.clone();
        self.managed = ManagedEnv {
            log_path: settings.log_path.clone(),
            append_user_agent: settings.append_user_agent.clone(),
        };
        Ok(())
    }

    /// Stream stdout of every call to `sink`. For display only.
    pub fn set_stdout(&mut self, sink: Arc<dyn OutputSink>) {
        self.stdout_sink = Some(sink);
    }

    /// Stream stderr of every call to `sink`. For display only.
    pub fn set_stderr(&mut self, sink: Arc<dyn OutputSink>) {
        self.stderr_sink = Some(sink);
    }

    /// Version of the terraform binary, resolved once per handle.
    pub async fn version(&self, cancel: &CancellationToken) -> Result<ToolVersion, TerraformError> {
        let version = self
            .version
            .get_or_try_init(|| async {
                let version = self.versions.version(&self.exec_path, cancel).await?;
                info!(
                    exec_path = %self.exec_path.display(),
                    version = %version,
                    "Resolved terraform version"
                );
                Ok::<_, TerraformError>(version)
            })
            .await?;
        Ok(version.clone())
    }

    /// Render the argument vector a call would use, without running it.
    pub async fn command(
        &self,
        builder: &CommandBuilder,
        cancel: &CancellationToken,
    ) -> Result<ArgumentVector, TerraformError> {
        let version = self.version(cancel).await?;
        Ok(builder.build(&version)?)
    }

    /// Environment the next call would run with.
    pub fn composed_env(&self) -> BTreeMap<String, String> {
        environment::compose(&self.env, environment::host_vars(), &self.managed)
    }

    /// Run the operation and fail on a non-zero exit.
    pub(crate) async fn execute(
        &self,
        builder: CommandBuilder,
        cancel: &CancellationToken,
    ) -> Result<ProcessOutput, TerraformError> {
        let operation = builder.operation();
        let output = self.execute_raw(builder, cancel).await?;
        if output.success() {
            Ok(output)
        } else {
            Err(self.failure(operation, &output))
        }
    }

    /// Run the operation and return its output whatever the exit status.
    pub(crate) async fn execute_raw(
        &self,
        builder: CommandBuilder,
        cancel: &CancellationToken,
    ) -> Result<ProcessOutput, TerraformError> {
        check_cancelled(cancel)?;

        let argv = self.command(&builder, cancel).await?;
        let operation = argv.operation();
        debug!(operation = %operation, args = %argv, "Running terraform");

        let request = ProcessRequest::new(&self.exec_path, &self.working_dir)
            .with_args(argv.into_vec())
            .with_env(self.composed_env())
            .with_stdout_sink(self.stdout_sink.clone())
            .with_stderr_sink(self.stderr_sink.clone());

        let output = self.runner.run(request, cancel).await?;
        debug!(operation = %operation, exit_code = ?output.exit_code, "terraform exited");
        Ok(output)
    }

    pub(crate) fn failure(&self, operation: Operation, output: &ProcessOutput) -> TerraformError {
        let err = classify(&output.stderr, output.exit_code);
        warn!(
            operation = %operation,
            exit_code = ?output.exit_code,
            signature = ?err.signature(),
            "terraform failed"
        );
        err.into()
    }
}

impl std::fmt::Debug for Terraform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Terraform")
            .field("exec_path", &self.exec_path)
            .field("working_dir", &self.working_dir)
            .field("env", &self.env)
            .field("managed", &self.managed)
            .field("version", &self.version.get())
            .finish_non_exhaustive()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use std::time::Duration;
    use tfdriver_domain::{ClassifiedError, CommandOption};

    fn latest() -> ToolVersion {
        ToolVersion::new(1, 5, 7)
    }

    #[test]
    fn test_new_rejects_missing_working_dir() {
        let runner = Arc::new(ScriptedRunner::new());
        let versions = Arc::new(FixedVersion::new(latest()));

        let err = Terraform::new("", "/bin/terraform", runner.clone(), versions.clone()).unwrap_err();
        assert!(matches!(err, TerraformError::WorkingDir { .. }));

        let err = Terraform::new(
            "/definitely/not/a/real/dir",
            "/bin/terraform",
            runner,
            versions,
        )
        .unwrap_err();
        assert!(matches!(err, TerraformError::WorkingDir { .. }));
    }

    #[test]
    fn test_new_rejects_empty_exec_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = Terraform::new(
            dir.path(),
            "",
            Arc::new(ScriptedRunner::new()),
            Arc::new(FixedVersion::new(latest())),
        )
        .unwrap_err();
        assert!(matches!(err, TerraformError::NoSuitableBinary { .. }));
    }

    #[test]
    fn test_set_env_rejects_managed_variables() {
        let dir = tempfile::tempdir().unwrap();
        let (mut tf, _, _) = handle(dir.path(), latest());

        let vars = BTreeMap::from([("TF_VAR_foo".to_string(), "bar".to_string())]);
        let err = tf.set_env(vars).unwrap_err();

        assert!(matches!(&err, TerraformError::ManualEnvVar { name } if name == "TF_VAR_foo"));
        assert!(tf.env().is_inherit());
    }

    #[test]
    fn test_apply_settings() {
        let dir = tempfile::tempdir().unwrap();
        let (mut tf, _, _) = handle(dir.path(), latest());

        let settings = DriverSettings::default()
            .with_env(EnvironmentSpec::Explicit(BTreeMap::new()))
            .with_append_user_agent("ci/1.0");
        tf.apply_settings(&settings).unwrap();

        let env = tf.composed_env();
        assert!(!env.contains_key("PATH"));
        assert_eq!(
            env.get("TF_APPEND_USER_AGENT").map(String::as_str),
            Some("ci/1.0")
        );

        let bad = DriverSettings::default().with_env(EnvironmentSpec::Explicit(BTreeMap::from([(
            "TF_WORKSPACE".to_string(),
            "prod".to_string(),
        )])));
        assert!(matches!(
            tf.apply_settings(&bad),
            Err(TerraformError::ManualEnvVar { .. })
        ));
        assert!(!tf.env().is_inherit());
    }

    #[tokio::test]
    async fn test_request_carries_path_dir_and_env() {
        let dir = tempfile::tempdir().unwrap();
        let (mut tf, runner, _) = handle(dir.path(), latest());
        tf.set_env(BTreeMap::from([("HOME".to_string(), "/home/ci".to_string())]))
            .unwrap();
        tf.set_log_path("/tmp/tf.log");

        tf.workspace_list(&CancellationToken::new()).await.unwrap();

        let env = runner.last_env();
        assert_eq!(env.get("HOME").map(String::as_str), Some("/home/ci"));
        assert_eq!(env.get("TF_LOG").map(String::as_str), Some("TRACE"));
        assert_eq!(env.get("TF_LOG_PATH").map(String::as_str), Some("/tmp/tf.log"));
        assert!(!env.contains_key("PATH"));

        let requests = runner.requests.lock().unwrap();
        let request = &requests[0];
        assert_eq!(request.program, PathBuf::from("/usr/local/bin/terraform"));
        assert_eq!(request.working_dir, dir.path());
        assert_eq!(request.args, vec!["workspace", "list", "-no-color"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_inherited_env_tolerates_non_utf8_host_vars() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        // SAFETY: std serializes environment access; the names are unique to this test.
        unsafe {
            std::env::set_var("TFDRIVER_TEST_LATIN1", OsStr::from_bytes(b"caf\xe9"));
            std::env::set_var("TFDRIVER_TEST_PLAIN", "ok");
        }

        let dir = tempfile::tempdir().unwrap();
        let (tf, runner, _) = handle(dir.path(), latest());
        runner.push(0, "* default\n  staging\n", "");

        let listing = tf.workspace_list(&CancellationToken::new()).await.unwrap();
        assert_eq!(listing.current, "default");

        let env = runner.last_env();
        assert_eq!(env.get("TFDRIVER_TEST_PLAIN").map(String::as_str), Some("ok"));
        assert!(!env.contains_key("TFDRIVER_TEST_LATIN1"));
        assert_eq!(env.get("TF_IN_AUTOMATION").map(String::as_str), Some("1"));
    }

    #[tokio::test]
    async fn test_version_resolved_once_under_concurrency() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(ScriptedRunner::new());
        let versions = Arc::new(FixedVersion {
            delay: Duration::from_millis(20),
            ..FixedVersion::new(latest())
        });
        let tf = Terraform::new(dir.path(), "/bin/terraform", runner.clone(), versions.clone())
            .unwrap();
        let cancel = CancellationToken::new();

        let results = futures::future::join_all((0..8).map(|_| tf.version(&cancel))).await;

        assert!(results.iter().all(|r| r.as_ref().unwrap() == &latest()));
        assert_eq!(versions.lookups(), 1);
    }

    #[tokio::test]
    async fn test_failed_version_lookup_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let versions = Arc::new(FixedVersion::missing());
        let tf = Terraform::new(
            dir.path(),
            "/bin/terraform",
            Arc::new(ScriptedRunner::new()),
            versions.clone(),
        )
        .unwrap();
        let cancel = CancellationToken::new();

        for _ in 0..2 {
            let err = tf.version(&cancel).await.unwrap_err();
            assert!(matches!(err, TerraformError::NoSuitableBinary { .. }));
        }
        assert_eq!(versions.lookups(), 2);
    }

    #[tokio::test]
    async fn test_inapplicable_option_spawns_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (tf, runner, _) = handle(dir.path(), latest());

        let err = tf
            .init([CommandOption::destroy(true)], &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, TerraformError::Command(_)));
        assert_eq!(runner.calls(), 0);
    }

    #[tokio::test]
    async fn test_version_mismatch_spawns_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (tf, runner, _) = handle(dir.path(), ToolVersion::new(0, 14, 0));

        let err = tf
            .plan([CommandOption::replace("aws_instance.a")], &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, TerraformError::VersionMismatch(_)));
        assert_eq!(runner.calls(), 0);
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_classified() {
        let dir = tempfile::tempdir().unwrap();
        let (tf, runner, _) = handle(dir.path(), latest());
        runner.push(
            1,
            "",
            "Error: No value for required variable: \"region\"",
        );

        let err = tf.plan([], &CancellationToken::new()).await.unwrap_err();
        assert_eq!(
            err.classified(),
            Some(&ClassifiedError::MissingVariable {
                name: "region".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let dir = tempfile::tempdir().unwrap();
        let (tf, runner, versions) = handle(dir.path(), latest());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = tf.workspace_list(&cancel).await.unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(runner.calls(), 0);
        assert_eq!(versions.lookups(), 0);
    }

    #[tokio::test]
    async fn test_cancel_in_flight() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(ScriptedRunner::hanging());
        let tf = Terraform::new(
            dir.path(),
            "/bin/terraform",
            runner.clone(),
            Arc::new(FixedVersion::new(latest())),
        )
        .unwrap();
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let err = tf.apply([], &cancel).await.unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(runner.calls(), 1);
    }
}
