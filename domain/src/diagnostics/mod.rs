//! Failure diagnostics for terraform invocations

pub mod classifier;

pub use classifier::{ClassifiedError, FailureSignature, classify, missing_variable_name, signature_order};
