//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file:
//!
//! ```toml
//! [terraform]
//! exec_path = "/usr/local/bin/terraform"
//! working_dir = "infra/prod"
//! log_path = ".terraform/trace.log"
//! append_user_agent = "deploy-bot/2.1"
//! inherit_env = true
//!
//! [terraform.env]
//! AWS_REGION = "eu-west-1"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tfdriver_application::DriverSettings;
use tfdriver_domain::EnvironmentSpec;
use tfdriver_domain::environment::is_managed;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("terraform.exec_path cannot be empty")]
    EmptyExecPath,

    #[error("terraform.env contains an empty variable name")]
    EmptyEnvName,

    #[error("terraform.env sets {0}, which tfdriver manages itself")]
    ManagedEnvVar(String),
}

/// Raw terraform configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileTerraformConfig {
    /// Binary to run; looked up on `PATH` when unset
    pub exec_path: Option<String>,
    /// Working directory; the current directory when unset
    pub working_dir: Option<String>,
    /// Trace log destination (`TF_LOG_PATH`)
    pub log_path: Option<String>,
    /// User-Agent suffix (`TF_APPEND_USER_AGENT`)
    pub append_user_agent: Option<String>,
    /// Start from the host environment
    pub inherit_env: bool,
    /// Extra variables, layered over the host environment when inheriting
    pub env: BTreeMap<String, String>,
}

impl Default for FileTerraformConfig {
    fn default() -> Self {
        Self {
            exec_path: None,
            working_dir: None,
            log_path: None,
            append_user_agent: None,
            inherit_env: true,
            env: BTreeMap::new(),
        }
    }
}

/// Complete configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub terraform: FileTerraformConfig,
}

impl FileConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if let Some(path) = &self.terraform.exec_path
            && path.trim().is_empty()
        {
            return Err(ConfigValidationError::EmptyExecPath);
        }

        for name in self.terraform.env.keys() {
            if name.trim().is_empty() {
                return Err(ConfigValidationError::EmptyEnvName);
            }
            if is_managed(name) {
                return Err(ConfigValidationError::ManagedEnvVar(name.clone()));
            }
        }

        Ok(())
    }

    /// Handle settings for this configuration.
    ///
    /// Inheriting with no extra variables keeps [`EnvironmentSpec::Inherit`].
    /// Inheriting with extras snapshots `host` (minus managed variables)
    /// and layers the extras on top. Otherwise only the extras are used.
    pub fn driver_settings<I>(&self, host: I) -> DriverSettings
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let terraform = &self.terraform;
        let env = match (terraform.inherit_env, terraform.env.is_empty()) {
            (true, true) => EnvironmentSpec::Inherit,
            (true, false) => {
                let mut vars: BTreeMap<String, String> =
                    host.into_iter().filter(|(k, _)| !is_managed(k)).collect();
                vars.extend(terraform.env.clone());
                EnvironmentSpec::Explicit(vars)
            }
            (false, _) => EnvironmentSpec::Explicit(terraform.env.clone()),
        };

        DriverSettings {
            env,
            log_path: terraform.log_path.clone(),
            append_user_agent: terraform.append_user_agent.clone(),
        }
    }
}
