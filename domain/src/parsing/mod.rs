//! Stdout parsers for read-oriented operations
//!
//! Each parser is a deterministic function of the captured stdout.
//! [`parse_workspace_list`] is total; the JSON parsers report malformed
//! input as [`ParseError::Json`](crate::core::error::ParseError::Json).

pub mod output;
pub mod validate;
pub mod version;
pub mod workspace;

pub use output::{OutputMeta, parse_json_value, parse_output_json};
pub use validate::{Diagnostic, Severity, ValidateOutput, parse_validate_json};
pub use version::{VersionReport, parse_version_output};
pub use workspace::{WorkspaceListing, parse_workspace_list, parse_workspace_show};
