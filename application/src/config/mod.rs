//! Application-level configuration.
//!
//! - [`DriverSettings`]: handle-wide environment, log path and user agent

pub mod driver_settings;

pub use driver_settings::DriverSettings;
