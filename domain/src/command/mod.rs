//! Command construction
//!
//! Typed options ([`CommandOption`]) are checked against the
//! [`OperationTemplate`] of the target [`Operation`] and rendered into an
//! [`ArgumentVector`] by [`CommandBuilder`].

pub mod builder;
pub mod operation;
pub mod option;
pub mod template;

pub use builder::{ArgumentVector, CommandBuilder};
pub use operation::Operation;
pub use option::{CommandOption, OptionKey, OptionKind, OptionValue};
pub use template::{Arity, DirPlacement, OperationTemplate, Slot};
