//! Option model: typed terraform flags
//!
//! A [`CommandOption`] pairs an [`OptionKey`] (which flag) with an
//! [`OptionValue`]. The key decides how the value renders:
//!
//! | Kind | Example | Rendering |
//! |------|---------|-----------|
//! | [`OptionKind::Bool`] | `Lock(false)` | `-lock=false` |
//! | [`OptionKind::Switch`] | `Destroy(true)` | `-destroy` (omitted when false) |
//! | [`OptionKind::Duration`] | `LockTimeout("22s")` | `-lock-timeout=22s` |
//! | [`OptionKind::Int`] | `Parallelism(42)` | `-parallelism=42` |
//! | [`OptionKind::Text`] | `Out("whale")` | `-out=whale` |
//! | [`OptionKind::Repeated`] | `Target("zaphod")` | `-target=zaphod`, once per option |
//! | [`OptionKind::KeyValue`] | `Var("a", "b")` | `-var` `a=b` (two tokens) |
//! | [`OptionKind::Positional`] | `Dir("earth")` | `earth` |
//!
//! Which keys an operation accepts, in which order they render and what
//! their implicit defaults are is decided by the operation's template, not
//! here.

use crate::core::error::CommandError;
use serde::{Deserialize, Serialize};

/// How an option's value is rendered into argument tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Bool,
    Switch,
    Duration,
    Int,
    Text,
    Repeated,
    KeyValue,
    Positional,
}

impl OptionKind {
    /// Whether several options with the same key accumulate instead of the
    /// last one winning.
    pub fn is_repeatable(self) -> bool {
        matches!(self, OptionKind::Repeated | OptionKind::KeyValue)
    }
}

/// Identifies a terraform flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OptionKey {
    AllowMissing,
    AllowMissingConfig,
    Backend,
    BackendConfig,
    Backup,
    Check,
    Config,
    Destroy,
    Diff,
    Dir,
    DrawCycles,
    Force,
    FromModule,
    Get,
    GetPlugins,
    GraphType,
    List,
    Lock,
    LockTimeout,
    Out,
    Parallelism,
    PluginDir,
    Reconfigure,
    Recursive,
    Refresh,
    RefreshOnly,
    Replace,
    State,
    StateOut,
    Target,
    Update,
    Upgrade,
    Var,
    VarFile,
    VerifyPlugins,
    Write,
}

impl OptionKey {
    /// Flag name without the leading dash.
    pub fn flag(self) -> &'static str {
        match self {
            OptionKey::AllowMissing => "allow-missing",
            OptionKey::AllowMissingConfig => "allow-missing-config",
            OptionKey::Backend => "backend",
            OptionKey::BackendConfig => "backend-config",
            OptionKey::Backup => "backup",
            OptionKey::Check => "check",
            OptionKey::Config => "config",
            OptionKey::Destroy => "destroy",
            OptionKey::Diff => "diff",
            OptionKey::Dir => "dir",
            OptionKey::DrawCycles => "draw-cycles",
            OptionKey::Force => "force",
            OptionKey::FromModule => "from-module",
            OptionKey::Get => "get",
            OptionKey::GetPlugins => "get-plugins",
            OptionKey::GraphType => "type",
            OptionKey::List => "list",
            OptionKey::Lock => "lock",
            OptionKey::LockTimeout => "lock-timeout",
            OptionKey::Out => "out",
            OptionKey::Parallelism => "parallelism",
            OptionKey::PluginDir => "plugin-dir",
            OptionKey::Reconfigure => "reconfigure",
            OptionKey::Recursive => "recursive",
            OptionKey::Refresh => "refresh",
            OptionKey::RefreshOnly => "refresh-only",
            OptionKey::Replace => "replace",
            OptionKey::State => "state",
            OptionKey::StateOut => "state-out",
            OptionKey::Target => "target",
            OptionKey::Update => "update",
            OptionKey::Upgrade => "upgrade",
            OptionKey::Var => "var",
            OptionKey::VarFile => "var-file",
            OptionKey::VerifyPlugins => "verify-plugins",
            OptionKey::Write => "write",
        }
    }

    pub fn kind(self) -> OptionKind {
        match self {
            OptionKey::Backend
            | OptionKey::Get
            | OptionKey::GetPlugins
            | OptionKey::List
            | OptionKey::Lock
            | OptionKey::Refresh
            | OptionKey::Update
            | OptionKey::Upgrade
            | OptionKey::VerifyPlugins
            | OptionKey::Write => OptionKind::Bool,

            OptionKey::AllowMissing
            | OptionKey::AllowMissingConfig
            | OptionKey::Check
            | OptionKey::Destroy
            | OptionKey::Diff
            | OptionKey::DrawCycles
            | OptionKey::Force
            | OptionKey::Reconfigure
            | OptionKey::Recursive
            | OptionKey::RefreshOnly => OptionKind::Switch,

            OptionKey::LockTimeout => OptionKind::Duration,
            OptionKey::Parallelism => OptionKind::Int,

            OptionKey::Backup
            | OptionKey::Config
            | OptionKey::FromModule
            | OptionKey::GraphType
            | OptionKey::Out
            | OptionKey::State
            | OptionKey::StateOut
            | OptionKey::VarFile => OptionKind::Text,

            OptionKey::BackendConfig | OptionKey::PluginDir | OptionKey::Replace | OptionKey::Target => {
                OptionKind::Repeated
            }

            OptionKey::Var => OptionKind::KeyValue,
            OptionKey::Dir => OptionKind::Positional,
        }
    }
}

impl std::fmt::Display for OptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionKey::Dir => write!(f, "<dir>"),
            other => write!(f, "-{}", other.flag()),
        }
    }
}

/// Raw option value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(u32),
    Text(String),
    Pair { key: String, value: String },
}

/// One typed option supplied for a single invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOption {
    pub key: OptionKey,
    pub value: OptionValue,
}

impl CommandOption {
    pub fn new(key: OptionKey, value: OptionValue) -> Self {
        Self { key, value }
    }

    fn flag(key: OptionKey, on: bool) -> Self {
        Self::new(key, OptionValue::Bool(on))
    }

    fn text(key: OptionKey, value: impl Into<String>) -> Self {
        Self::new(key, OptionValue::Text(value.into()))
    }

    // Valued booleans
    pub fn backend(on: bool) -> Self {
        Self::flag(OptionKey::Backend, on)
    }
    pub fn get(on: bool) -> Self {
        Self::flag(OptionKey::Get, on)
    }
    pub fn get_plugins(on: bool) -> Self {
        Self::flag(OptionKey::GetPlugins, on)
    }
    pub fn list(on: bool) -> Self {
        Self::flag(OptionKey::List, on)
    }
    pub fn lock(on: bool) -> Self {
        Self::flag(OptionKey::Lock, on)
    }
    pub fn refresh(on: bool) -> Self {
        Self::flag(OptionKey::Refresh, on)
    }
    pub fn update(on: bool) -> Self {
        Self::flag(OptionKey::Update, on)
    }
    pub fn upgrade(on: bool) -> Self {
        Self::flag(OptionKey::Upgrade, on)
    }
    pub fn verify_plugins(on: bool) -> Self {
        Self::flag(OptionKey::VerifyPlugins, on)
    }
    pub fn write(on: bool) -> Self {
        Self::flag(OptionKey::Write, on)
    }

    // Switches
    pub fn allow_missing(on: bool) -> Self {
        Self::flag(OptionKey::AllowMissing, on)
    }
    pub fn allow_missing_config(on: bool) -> Self {
        Self::flag(OptionKey::AllowMissingConfig, on)
    }
    pub fn check(on: bool) -> Self {
        Self::flag(OptionKey::Check, on)
    }
    pub fn destroy(on: bool) -> Self {
        Self::flag(OptionKey::Destroy, on)
    }
    pub fn diff(on: bool) -> Self {
        Self::flag(OptionKey::Diff, on)
    }
    pub fn draw_cycles(on: bool) -> Self {
        Self::flag(OptionKey::DrawCycles, on)
    }
    pub fn force(on: bool) -> Self {
        Self::flag(OptionKey::Force, on)
    }
    pub fn reconfigure(on: bool) -> Self {
        Self::flag(OptionKey::Reconfigure, on)
    }
    pub fn recursive(on: bool) -> Self {
        Self::flag(OptionKey::Recursive, on)
    }
    pub fn refresh_only(on: bool) -> Self {
        Self::flag(OptionKey::RefreshOnly, on)
    }

    // Scalars
    pub fn lock_timeout(duration: impl Into<String>) -> Self {
        Self::text(OptionKey::LockTimeout, duration)
    }
    pub fn parallelism(n: u32) -> Self {
        Self::new(OptionKey::Parallelism, OptionValue::Int(n))
    }
    pub fn backup(path: impl Into<String>) -> Self {
        Self::text(OptionKey::Backup, path)
    }
    pub fn config(dir: impl Into<String>) -> Self {
        Self::text(OptionKey::Config, dir)
    }
    pub fn from_module(source: impl Into<String>) -> Self {
        Self::text(OptionKey::FromModule, source)
    }
    pub fn graph_type(kind: impl Into<String>) -> Self {
        Self::text(OptionKey::GraphType, kind)
    }
    pub fn out(path: impl Into<String>) -> Self {
        Self::text(OptionKey::Out, path)
    }
    pub fn state(path: impl Into<String>) -> Self {
        Self::text(OptionKey::State, path)
    }
    pub fn state_out(path: impl Into<String>) -> Self {
        Self::text(OptionKey::StateOut, path)
    }
    pub fn var_file(path: impl Into<String>) -> Self {
        Self::text(OptionKey::VarFile, path)
    }

    // Repeatable
    pub fn backend_config(entry: impl Into<String>) -> Self {
        Self::text(OptionKey::BackendConfig, entry)
    }
    pub fn plugin_dir(dir: impl Into<String>) -> Self {
        Self::text(OptionKey::PluginDir, dir)
    }
    pub fn replace(address: impl Into<String>) -> Self {
        Self::text(OptionKey::Replace, address)
    }
    pub fn target(address: impl Into<String>) -> Self {
        Self::text(OptionKey::Target, address)
    }
    pub fn var(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(
            OptionKey::Var,
            OptionValue::Pair {
                key: key.into(),
                value: value.into(),
            },
        )
    }

    /// Per-call directory override, rendered as a trailing positional.
    pub fn dir(path: impl Into<String>) -> Self {
        Self::text(OptionKey::Dir, path)
    }

    /// Parse a `KEY=VALUE` assignment into a `-var` option.
    pub fn parse_var(assignment: &str) -> Result<Self, CommandError> {
        match assignment.split_once('=') {
            Some((key, value)) => {
                let option = Self::var(key.trim(), value);
                option.validate()?;
                Ok(option)
            }
            None => Err(CommandError::InvalidOption {
                option: OptionKey::Var,
                reason: format!("expected KEY=VALUE, got {:?}", assignment),
            }),
        }
    }

    /// Check the value shape against the key's kind and basic syntax.
    pub fn validate(&self) -> Result<(), CommandError> {
        let invalid = |reason: &str| CommandError::InvalidOption {
            option: self.key,
            reason: reason.to_string(),
        };

        match (self.key.kind(), &self.value) {
            (OptionKind::Bool | OptionKind::Switch, OptionValue::Bool(_)) => Ok(()),
            (OptionKind::Int, OptionValue::Int(_)) => Ok(()),
            (OptionKind::Duration, OptionValue::Text(s)) if s.trim().is_empty() => {
                Err(invalid("duration cannot be empty"))
            }
            (OptionKind::Positional, OptionValue::Text(s)) if s.is_empty() => {
                Err(invalid("directory cannot be empty"))
            }
            (
                OptionKind::Duration | OptionKind::Text | OptionKind::Repeated | OptionKind::Positional,
                OptionValue::Text(_),
            ) => Ok(()),
            (OptionKind::KeyValue, OptionValue::Pair { key, .. }) if key.trim().is_empty() => {
                Err(invalid("variable name cannot be empty"))
            }
            (OptionKind::KeyValue, OptionValue::Pair { .. }) => Ok(()),
            (kind, _) => Err(invalid(&format!("value does not match a {:?} option", kind))),
        }
    }

    /// Whether the option contributes anything when rendered.
    ///
    /// A switch set to `false` is equivalent to not passing it.
    pub fn is_active(&self) -> bool {
        !matches!(
            (self.key.kind(), &self.value),
            (OptionKind::Switch, OptionValue::Bool(false))
        )
    }

    /// Append this option's tokens to `out`.
    ///
    /// Call [`validate`](Self::validate) first; a mismatched value renders
    /// nothing.
    pub fn render(&self, out: &mut Vec<String>) {
        let flag = self.key.flag();
        match (self.key.kind(), &self.value) {
            (OptionKind::Bool, OptionValue::Bool(on)) => out.push(format!("-{}={}", flag, on)),
            (OptionKind::Switch, OptionValue::Bool(true)) => out.push(format!("-{}", flag)),
            (OptionKind::Switch, OptionValue::Bool(false)) => {}
            (OptionKind::Int, OptionValue::Int(n)) => out.push(format!("-{}={}", flag, n)),
            (OptionKind::Duration | OptionKind::Text | OptionKind::Repeated, OptionValue::Text(s)) => {
                out.push(format!("-{}={}", flag, s))
            }
            (OptionKind::KeyValue, OptionValue::Pair { key, value }) => {
                out.push(format!("-{}", flag));
                out.push(format!("{}={}", key, value));
            }
            (OptionKind::Positional, OptionValue::Text(s)) => out.push(s.clone()),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(option: &CommandOption) -> Vec<String> {
        let mut out = Vec::new();
        option.render(&mut out);
        out
    }

    #[test]
    fn test_bool_renders_explicit_value() {
        assert_eq!(rendered(&CommandOption::lock(false)), vec!["-lock=false"]);
        assert_eq!(rendered(&CommandOption::refresh(true)), vec!["-refresh=true"]);
    }

    #[test]
    fn test_switch_renders_only_when_set() {
        assert_eq!(rendered(&CommandOption::destroy(true)), vec!["-destroy"]);
        assert!(rendered(&CommandOption::destroy(false)).is_empty());
        assert!(!CommandOption::destroy(false).is_active());
        assert!(CommandOption::destroy(true).is_active());
    }

    #[test]
    fn test_duration_is_passed_through_unvalidated() {
        assert_eq!(
            rendered(&CommandOption::lock_timeout("22s")),
            vec!["-lock-timeout=22s"]
        );
        assert!(CommandOption::lock_timeout("forever").validate().is_ok());
        assert!(CommandOption::lock_timeout("  ").validate().is_err());
    }

    #[test]
    fn test_var_renders_two_tokens() {
        assert_eq!(
            rendered(&CommandOption::var("android", "paranoid")),
            vec!["-var", "android=paranoid"]
        );
    }

    #[test]
    fn test_var_with_empty_name_is_invalid() {
        let err = CommandOption::var("", "x").validate().unwrap_err();
        assert!(matches!(
            err,
            CommandError::InvalidOption {
                option: OptionKey::Var,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_var_assignment() {
        let option = CommandOption::parse_var("brain_size=planet=large").unwrap();
        assert_eq!(option, CommandOption::var("brain_size", "planet=large"));
        assert!(CommandOption::parse_var("no-equals").is_err());
        assert!(CommandOption::parse_var("=value").is_err());
    }

    #[test]
    fn test_mismatched_value_is_rejected() {
        let option = CommandOption::new(OptionKey::Parallelism, OptionValue::Text("ten".into()));
        assert!(option.validate().is_err());
        let option = CommandOption::new(OptionKey::Lock, OptionValue::Int(1));
        assert!(option.validate().is_err());
    }

    #[test]
    fn test_dir_renders_as_positional() {
        assert_eq!(rendered(&CommandOption::dir("earth")), vec!["earth"]);
        assert!(CommandOption::dir("").validate().is_err());
    }

    #[test]
    fn test_key_display() {
        assert_eq!(OptionKey::LockTimeout.to_string(), "-lock-timeout");
        assert_eq!(OptionKey::GraphType.to_string(), "-type");
        assert_eq!(OptionKey::Dir.to_string(), "<dir>");
    }
}
