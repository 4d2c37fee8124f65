//! Environment guard
//!
//! Some terraform environment variables change behaviour that tfdriver
//! controls through typed options or handle settings (`-var`, log path,
//! automation mode). Callers cannot set them directly: [`check_overrides`]
//! rejects them, and [`compose`] strips them from an inherited host
//! environment before the managed values are applied.

use crate::core::error::EnvironmentError;
use std::collections::BTreeMap;
use std::ffi::OsString;

/// Variable names reserved for tfdriver.
pub const PROHIBITED_ENV_VARS: &[&str] = &[
    "TF_APPEND_USER_AGENT",
    "TF_CLI_ARGS",
    "TF_DISABLE_PLUGIN_TLS",
    "TF_INPUT",
    "TF_IN_AUTOMATION",
    "TF_LOG",
    "TF_LOG_PATH",
    "TF_REATTACH_PROVIDERS",
    "TF_SKIP_PROVIDER_VERIFY",
    "TF_WORKSPACE",
];

/// Name prefixes reserved for tfdriver (`TF_VAR_name` is the `-var` option).
pub const PROHIBITED_ENV_PREFIXES: &[&str] = &["TF_VAR_", "TF_CLI_ARGS_"];

const AUTOMATION_VAR: &str = "TF_IN_AUTOMATION";
const LOG_VAR: &str = "TF_LOG";
const LOG_PATH_VAR: &str = "TF_LOG_PATH";
const USER_AGENT_VAR: &str = "TF_APPEND_USER_AGENT";
const CHECKPOINT_VAR: &str = "CHECKPOINT_DISABLE";

/// Whether `name` may only be set by tfdriver itself.
pub fn is_managed(name: &str) -> bool {
    PROHIBITED_ENV_VARS.contains(&name)
        || PROHIBITED_ENV_PREFIXES
            .iter()
            .any(|prefix| name.starts_with(prefix))
}

/// Reject empty names and any managed variable.
///
/// Keys are checked in map order, so the first offending key is reported.
pub fn check_overrides(vars: &BTreeMap<String, String>) -> Result<(), EnvironmentError> {
    for name in vars.keys() {
        if name.is_empty() {
            return Err(EnvironmentError::EmptyName);
        }
        if is_managed(name) {
            return Err(EnvironmentError::ManualOverride { name: name.clone() });
        }
    }
    Ok(())
}

/// Base environment of the subprocess.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EnvironmentSpec {
    /// Start from the host process environment.
    #[default]
    Inherit,
    /// Start from exactly this map. An empty map means an empty environment.
    Explicit(BTreeMap<String, String>),
}

impl EnvironmentSpec {
    /// Explicit environment, rejecting managed variables.
    pub fn explicit(vars: BTreeMap<String, String>) -> Result<Self, EnvironmentError> {
        check_overrides(&vars)?;
        Ok(Self::Explicit(vars))
    }

    pub fn is_inherit(&self) -> bool {
        matches!(self, Self::Inherit)
    }
}

/// Values tfdriver injects into every subprocess environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManagedEnv {
    pub log_path: Option<String>,
    pub append_user_agent: Option<String>,
}

/// Entries of an OS environment listing whose name and value are both
/// valid Unicode. Other entries are skipped.
pub fn unicode_vars<I>(vars: I) -> impl Iterator<Item = (String, String)>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
}

/// The current process environment as [`unicode_vars`] sees it.
pub fn host_vars() -> impl Iterator<Item = (String, String)> {
    unicode_vars(std::env::vars_os())
}

/// Build the final subprocess environment.
///
/// `host` is only read for [`EnvironmentSpec::Inherit`].
pub fn compose<I, K, V>(spec: &EnvironmentSpec, host: I, managed: &ManagedEnv) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let mut env: BTreeMap<String, String> = match spec {
        EnvironmentSpec::Inherit => host
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(k, _)| !is_managed(k))
            .collect(),
        EnvironmentSpec::Explicit(vars) => vars.clone(),
    };

    env.insert(AUTOMATION_VAR.to_string(), "1".to_string());

    match &managed.log_path {
        Some(path) => {
            env.insert(LOG_PATH_VAR.to_string(), path.clone());
            env.insert(LOG_VAR.to_string(), "TRACE".to_string());
        }
        None => {
            env.insert(LOG_PATH_VAR.to_string(), String::new());
            env.insert(LOG_VAR.to_string(), String::new());
        }
    }

    if let Some(agent) = &managed.append_user_agent {
        env.insert(USER_AGENT_VAR.to_string(), agent.clone());
    }

    env.entry(CHECKPOINT_VAR.to_string())
        .or_insert_with(|| "1".to_string());

    env
}
