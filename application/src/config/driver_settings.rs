//! Driver settings: handle-wide options applied before any call.
//!
//! [`DriverSettings`] groups what [`Terraform`](crate::use_cases::terraform::Terraform)
//! takes through its setters, so callers that load configuration from
//! files can apply it in one step with
//! [`Terraform::apply_settings`](crate::use_cases::terraform::Terraform::apply_settings).

use tfdriver_domain::EnvironmentSpec;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverSettings {
    /// Base environment of the subprocess.
    pub env: EnvironmentSpec,
    /// Trace log destination (`TF_LOG_PATH`).
    pub log_path: Option<String>,
    /// User-Agent suffix (`TF_APPEND_USER_AGENT`).
    pub append_user_agent: Option<String>,
}

impl DriverSettings {
    // ==================== Builder Methods ====================

    pub fn with_env(mut self, env: EnvironmentSpec) -> Self {
        self.env = env;
        self
    }

    pub fn with_log_path(mut self, path: impl Into<String>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    pub fn with_append_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.append_user_agent = Some(agent.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_inherits() {
        let settings = DriverSettings::default();
        assert!(settings.env.is_inherit());
        assert!(settings.log_path.is_none());
    }

    #[test]
    fn test_builder_methods() {
        let settings = DriverSettings::default()
            .with_log_path("/tmp/tf.log")
            .with_append_user_agent("ci/1.0");
        assert_eq!(settings.log_path.as_deref(), Some("/tmp/tf.log"));
        assert_eq!(settings.append_user_agent.as_deref(), Some("ci/1.0"));
    }
}
