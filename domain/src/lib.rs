//! Domain layer for tfdriver
//!
//! This crate contains the pure model of a terraform invocation. It has no
//! dependencies on process execution, configuration files or presentation
//! concerns.
//!
//! # Core Concepts
//!
//! ## Command construction
//!
//! An [`Operation`] (`plan`, `workspace list`, ...) accepts a fixed set of
//! typed [`CommandOption`]s described by its [`OperationTemplate`]. The
//! [`CommandBuilder`] checks them against the resolved [`ToolVersion`] and
//! renders a reproducible [`ArgumentVector`]:
//!
//! ```
//! use tfdriver_domain::{CommandBuilder, CommandOption, Operation, ToolVersion};
//!
//! let argv = CommandBuilder::new(Operation::Plan)
//!     .option(CommandOption::out("plan.tfplan"))
//!     .build(&ToolVersion::new(1, 5, 7))
//!     .unwrap();
//! assert!(argv.to_string().starts_with("plan -no-color -input=false"));
//! ```
//!
//! ## Environment guard
//!
//! Variables that tfdriver manages (`TF_VAR_*`, `TF_LOG`, ...) cannot be
//! overridden by callers; see [`environment`].
//!
//! ## Diagnostics
//!
//! The stderr of a failed invocation is mapped to a [`ClassifiedError`] by
//! an ordered signature list; see [`diagnostics`].
//!
//! ## Parsing
//!
//! Read-oriented operations have small stdout parsers; see [`parsing`].

pub mod command;
pub mod core;
pub mod diagnostics;
pub mod environment;
pub mod parsing;

// Re-export commonly used types
pub use command::{
    ArgumentVector, Arity, CommandBuilder, CommandOption, DirPlacement, Operation,
    OperationTemplate, OptionKey, OptionKind, OptionValue, Slot,
};
pub use core::{
    error::{CommandError, EnvironmentError, ParseError, VersionMismatch},
    version::{ToolVersion, VersionConstraint},
};
pub use diagnostics::{ClassifiedError, FailureSignature, classify, signature_order};
pub use environment::{EnvironmentSpec, ManagedEnv};
pub use parsing::{
    Diagnostic, OutputMeta, Severity, ValidateOutput, VersionReport, WorkspaceListing,
};
