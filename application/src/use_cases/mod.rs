//! Use cases
//!
//! [`terraform::Terraform`] drives one terraform working directory.

pub mod shared;
pub mod terraform;
