//! Tokio-based [`ProcessRunner`] adapter.
//!
//! The child gets exactly the environment in the request (`env_clear`),
//! piped stdout/stderr and a null stdin. Both streams are read line by line
//! concurrently, forwarded to the request's sinks and captured. When the
//! cancellation token fires first, the child is killed and
//! [`RunnerError::Cancelled`] is returned.

use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use tfdriver_application::{OutputSink, ProcessOutput, ProcessRequest, ProcessRunner, RunnerError};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Runs requests as local child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioProcessRunner;

impl TokioProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

/// Read `reader` to the end, forwarding each line to `sink`.
async fn pump<R>(reader: R, sink: Option<Arc<dyn OutputSink>>) -> std::io::Result<String>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut captured = String::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let bytes_read = reader.read_until(b'\n', &mut buf).await?;
        if bytes_read == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        if let Some(sink) = &sink {
            sink.write_line(line.trim_end_matches(['\n', '\r']));
        }
        captured.push_str(&line);
    }

    Ok(captured)
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(
        &self,
        request: ProcessRequest,
        cancel: &CancellationToken,
    ) -> Result<ProcessOutput, RunnerError> {
        if cancel.is_cancelled() {
            return Err(RunnerError::Cancelled);
        }

        let mut cmd = Command::new(&request.program);
        cmd.args(&request.args)
            .current_dir(&request.working_dir)
            .env_clear()
            .envs(&request.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Linux: request kernel to send SIGTERM to child when parent dies.
        // This catches cases where Drop doesn't run (SIGKILL, OOM kill).
        #[cfg(target_os = "linux")]
        unsafe {
            cmd.pre_exec(|| {
                libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM);
                Ok(())
            });
        }

        let mut child = cmd.spawn().map_err(|source| RunnerError::Spawn {
            program: request.program.display().to_string(),
            source,
        })?;
        debug!(pid = ?child.id(), program = %request.program.display(), "Spawned process");

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::other("Failed to capture stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| std::io::Error::other("Failed to capture stderr"))?;

        let completion = async {
            let (stdout, stderr, status) = tokio::try_join!(
                pump(stdout, request.stdout_sink.clone()),
                pump(stderr, request.stderr_sink.clone()),
                child.wait(),
            )?;
            Ok::<_, std::io::Error>(ProcessOutput {
                exit_code: status.code(),
                stdout,
                stderr,
            })
        };

        let finished = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = completion => Some(result),
        };

        match finished {
            Some(result) => Ok(result?),
            None => {
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "Failed to kill cancelled process");
                }
                debug!(program = %request.program.display(), "Process cancelled");
                Err(RunnerError::Cancelled)
            }
        }
    }
}
