//! [`OutputSink`] adapters.

use std::io::Write;
use std::sync::Mutex;
use tfdriver_application::OutputSink;
use tracing::trace;

/// Writes each line, newline-terminated, to a [`Write`] target.
pub struct WriterSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl WriterSink<std::io::Stderr> {
    /// Mirror output to the terminal's stderr.
    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }
}

impl<W: Write + Send> OutputSink for WriterSink<W> {
    fn write_line(&self, line: &str) {
        let mut writer = match self.writer.lock() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        };
        // Display only; a closed pipe must not fail the invocation.
        let _ = writeln!(writer, "{}", line);
        let _ = writer.flush();
    }
}

/// Forwards lines to `tracing` at trace level.
#[derive(Debug, Clone, Copy)]
pub struct TracingSink {
    stream: &'static str,
}

impl TracingSink {
    pub fn stdout() -> Self {
        Self { stream: "stdout" }
    }

    pub fn stderr() -> Self {
        Self { stream: "stderr" }
    }
}

impl OutputSink for TracingSink {
    fn write_line(&self, line: &str) {
        trace!(stream = self.stream, "{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_sink_appends_newlines() {
        let sink = WriterSink::new(Vec::new());
        sink.write_line("Initializing the backend...");
        sink.write_line("");
        sink.write_line("Terraform has been successfully initialized!");

        let written = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            written,
            "Initializing the backend...\n\nTerraform has been successfully initialized!\n"
        );
    }

    #[test]
    fn test_tracing_sink_accepts_lines() {
        TracingSink::stdout().write_line("No changes.");
        TracingSink::stderr().write_line("Warning: deprecated");
    }
}
