//! Process runner port
//!
//! Defines how the application layer runs the terraform binary. The adapter
//! (spawning, streaming, killing) lives in the infrastructure layer.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Receives subprocess output line by line while it runs.
///
/// Sinks observe output for logging or display only; parsing always works on
/// the captured [`ProcessOutput`].
pub trait OutputSink: Send + Sync {
    /// Called once per line, without the trailing newline.
    fn write_line(&self, line: &str);
}

/// One fully-resolved subprocess invocation.
#[derive(Clone)]
pub struct ProcessRequest {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    /// Complete environment; the host environment is not inherited.
    pub env: BTreeMap<String, String>,
    pub stdout_sink: Option<Arc<dyn OutputSink>>,
    pub stderr_sink: Option<Arc<dyn OutputSink>>,
}

impl ProcessRequest {
    pub fn new(program: impl Into<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: working_dir.into(),
            env: BTreeMap::new(),
            stdout_sink: None,
            stderr_sink: None,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = env;
        self
    }

    pub fn with_stdout_sink(mut self, sink: Option<Arc<dyn OutputSink>>) -> Self {
        self.stdout_sink = sink;
        self
    }

    pub fn with_stderr_sink(mut self, sink: Option<Arc<dyn OutputSink>>) -> Self {
        self.stderr_sink = sink;
        self
    }
}

impl std::fmt::Debug for ProcessRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessRequest")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("working_dir", &self.working_dir)
            .field("env", &self.env.keys().collect::<Vec<_>>())
            .field("stdout_sink", &self.stdout_sink.is_some())
            .field("stderr_sink", &self.stderr_sink.is_some())
            .finish()
    }
}

/// Captured result of a subprocess that ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Failures that are not a process exit. These are never classified.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while running terraform: {0}")]
    Io(#[from] std::io::Error),

    #[error("Operation cancelled")]
    Cancelled,
}

/// Port for running a subprocess to completion
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run the request, streaming to its sinks and capturing output.
    ///
    /// A non-zero exit is `Ok`; callers inspect [`ProcessOutput::exit_code`].
    /// When `cancel` fires, the child is killed and
    /// [`RunnerError::Cancelled`] is returned.
    async fn run(
        &self,
        request: ProcessRequest,
        cancel: &CancellationToken,
    ) -> Result<ProcessOutput, RunnerError>;
}
