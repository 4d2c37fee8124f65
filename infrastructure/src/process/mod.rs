//! Subprocess adapters: the tokio runner and output sinks

mod runner;
mod sink;

pub use runner::TokioProcessRunner;
pub use sink::{TracingSink, WriterSink};
