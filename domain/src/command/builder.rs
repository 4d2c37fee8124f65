//! Command builder: renders one invocation into an [`ArgumentVector`]
//!
//! Rendering order:
//!
//! 1. sub-command words (`workspace list`)
//! 2. forced flags from the operation template (`-no-color`, ...)
//! 3. options in the template's canonical slot order, defaults filling
//!    unset slots
//! 4. required positional arguments, in supplied order
//! 5. the per-call directory override
//!
//! Because step 3 follows the template instead of call order, two builders
//! holding the same options in a different order render byte-identical
//! vectors. Every contract violation (inapplicable option, conflicting
//! options, bad arity, version constraint) is reported by
//! [`CommandBuilder::build`], before anything is executed.

use super::operation::Operation;
use super::option::{CommandOption, OptionKey};
use super::template::{DirPlacement, OperationTemplate};
use crate::core::error::{CommandError, VersionMismatch};
use crate::core::version::ToolVersion;
use std::collections::BTreeMap;

/// Ordered argument tokens for one invocation, without the binary path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentVector {
    operation: Operation,
    args: Vec<String>,
}

impl ArgumentVector {
    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn as_slice(&self) -> &[String] {
        &self.args
    }

    pub fn into_vec(self) -> Vec<String> {
        self.args
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

impl std::fmt::Display for ArgumentVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.args.join(" "))
    }
}

/// Collects options and positional arguments for one operation.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    operation: Operation,
    options: Vec<CommandOption>,
    args: Vec<String>,
}

impl CommandBuilder {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            options: Vec::new(),
            args: Vec::new(),
        }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn option(mut self, option: CommandOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn options(mut self, options: impl IntoIterator<Item = CommandOption>) -> Self {
        self.options.extend(options);
        self
    }

    /// Add a required positional argument (workspace name, resource address, ...).
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Render the argument vector for the given tool version.
    pub fn build(&self, version: &ToolVersion) -> Result<ArgumentVector, CommandError> {
        let template = OperationTemplate::for_operation(self.operation);
        template.check_version(version)?;

        if let DirPlacement::Flag(flag) = template.dir {
            let has = |key: OptionKey| self.options.iter().any(|o| o.key == key);
            if has(OptionKey::Dir) && has(flag) {
                return Err(CommandError::ConflictingOptions {
                    first: OptionKey::Dir,
                    second: flag,
                    operation: self.operation,
                });
            }
        }

        let mut supplied: BTreeMap<OptionKey, Vec<CommandOption>> = BTreeMap::new();
        let mut dir: Option<&CommandOption> = None;

        for option in &self.options {
            option.validate()?;

            let option = match (option.key, template.dir) {
                (OptionKey::Dir, DirPlacement::Trailing) => {
                    dir = Some(option);
                    continue;
                }
                (OptionKey::Dir, DirPlacement::Flag(flag)) => {
                    CommandOption::new(flag, option.value.clone())
                }
                _ => option.clone(),
            };

            let slot = template
                .find_slot(option.key)
                .ok_or(CommandError::OptionNotApplicable {
                    option: option.key,
                    operation: self.operation,
                })?;

            if option.is_active()
                && let Some(constraint) = &slot.constraint
                && !constraint.allows(version)
            {
                return Err(VersionMismatch {
                    subject: option.key.to_string(),
                    constraint: constraint.clone(),
                    actual: version.clone(),
                }
                .into());
            }

            let entry = supplied.entry(option.key).or_default();
            if !option.key.kind().is_repeatable() {
                // last one wins
                entry.clear();
            }
            entry.push(option);
        }

        for (first, second) in template.conflicts {
            let active = |key: &OptionKey| {
                supplied
                    .get(key)
                    .is_some_and(|opts| opts.iter().any(CommandOption::is_active))
            };
            if active(first) && active(second) {
                return Err(CommandError::ConflictingOptions {
                    first: *first,
                    second: *second,
                    operation: self.operation,
                });
            }
        }

        if self.args.len() < template.arity.min {
            return Err(CommandError::MissingArgument {
                operation: self.operation,
                expected: template.arity.min,
                actual: self.args.len(),
            });
        }
        if let Some(max) = template.arity.max
            && self.args.len() > max
        {
            return Err(CommandError::UnexpectedArgument {
                operation: self.operation,
                expected: max,
                actual: self.args.len(),
            });
        }

        let mut out: Vec<String> = self
            .operation
            .words()
            .iter()
            .chain(template.forced)
            .map(|s| s.to_string())
            .collect();

        for slot in &template.slots {
            match supplied.get(&slot.key) {
                Some(options) => options.iter().for_each(|o| o.render(&mut out)),
                None => {
                    if let Some(default) = &slot.default
                        && slot.allows(version)
                    {
                        CommandOption::new(slot.key, default.clone()).render(&mut out);
                    }
                }
            }
        }

        out.extend(self.args.iter().cloned());
        if let Some(dir) = dir {
            dir.render(&mut out);
        }

        Ok(ArgumentVector {
            operation: self.operation,
            args: out,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn latest() -> ToolVersion {
        ToolVersion::new(1, 5, 7)
    }

    fn render(builder: CommandBuilder) -> String {
        builder.build(&latest()).unwrap().to_string()
    }

    fn full_plan_options() -> Vec<CommandOption> {
        vec![
            CommandOption::destroy(true),
            CommandOption::lock(false),
            CommandOption::lock_timeout("22s"),
            CommandOption::out("whale"),
            CommandOption::parallelism(42),
            CommandOption::refresh(false),
            CommandOption::state("marvin"),
            CommandOption::target("zaphod"),
            CommandOption::target("beeblebrox"),
            CommandOption::var("android", "paranoid"),
            CommandOption::var("brain_size", "planet"),
            CommandOption::var_file("trillian"),
            CommandOption::dir("earth"),
        ]
    }

    #[test]
    fn test_default_plan() {
        assert_eq!(
            render(CommandBuilder::new(Operation::Plan)),
            "plan -no-color -input=false -lock-timeout=0s -lock=true -parallelism=10 -refresh=true"
        );
    }

    #[test]
    fn test_plan_with_every_option() {
        assert_eq!(
            render(CommandBuilder::new(Operation::Plan).options(full_plan_options())),
            "plan -no-color -input=false -lock-timeout=22s -out=whale -state=marvin \
             -var-file=trillian -lock=false -parallelism=42 -refresh=false -destroy \
             -target=zaphod -target=beeblebrox -var android=paranoid -var brain_size=planet earth"
        );
    }

    #[test]
    fn test_call_order_does_not_change_rendering() {
        let forward = CommandBuilder::new(Operation::Plan).options(full_plan_options());

        // Reverse everything, then restore the relative order of the
        // repeatable options, which is significant.
        let mut reversed = full_plan_options();
        reversed.reverse();
        let (mut repeated, mut rest): (Vec<_>, Vec<_>) = reversed
            .into_iter()
            .partition(|o| o.key.kind().is_repeatable());
        repeated.reverse();
        rest.extend(repeated);
        let backward = CommandBuilder::new(Operation::Plan).options(rest);

        assert_eq!(
            forward.build(&latest()).unwrap(),
            backward.build(&latest()).unwrap()
        );
    }

    #[test]
    fn test_repeatable_options_keep_caller_order() {
        let argv = render(
            CommandBuilder::new(Operation::Plan)
                .option(CommandOption::target("b"))
                .option(CommandOption::target("a")),
        );
        assert!(argv.ends_with("-target=b -target=a"));
    }

    #[test]
    fn test_last_scalar_wins() {
        let argv = render(
            CommandBuilder::new(Operation::Plan)
                .option(CommandOption::out("first"))
                .option(CommandOption::out("second")),
        );
        assert!(argv.contains("-out=second"));
        assert!(!argv.contains("-out=first"));
    }

    #[test]
    fn test_inapplicable_option_fails() {
        for op in Operation::all() {
            let template = OperationTemplate::for_operation(*op);
            if template.accepts(OptionKey::Destroy) {
                continue;
            }
            let err = CommandBuilder::new(*op)
                .option(CommandOption::destroy(true))
                .build(&latest())
                .unwrap_err();
            assert!(
                matches!(
                    err,
                    CommandError::OptionNotApplicable { option: OptionKey::Destroy, operation } if operation == *op
                ),
                "{} accepted -destroy",
                op
            );
        }
    }

    #[test]
    fn test_dir_rejected_where_operation_has_no_directory() {
        let err = CommandBuilder::new(Operation::WorkspaceShow)
            .option(CommandOption::dir("earth"))
            .build(&latest())
            .unwrap_err();
        assert!(matches!(
            err,
            CommandError::OptionNotApplicable {
                option: OptionKey::Dir,
                ..
            }
        ));
    }

    #[test]
    fn test_conflicting_options() {
        let err = CommandBuilder::new(Operation::Plan)
            .option(CommandOption::destroy(true))
            .option(CommandOption::refresh_only(true))
            .build(&latest())
            .unwrap_err();
        assert!(matches!(err, CommandError::ConflictingOptions { .. }));

        // An inactive switch does not conflict.
        assert!(
            CommandBuilder::new(Operation::Plan)
                .option(CommandOption::destroy(true))
                .option(CommandOption::refresh_only(false))
                .build(&latest())
                .is_ok()
        );
    }

    #[test]
    fn test_option_version_gate() {
        let old = ToolVersion::new(0, 14, 11);
        let err = CommandBuilder::new(Operation::Plan)
            .option(CommandOption::replace("aws_instance.web"))
            .build(&old)
            .unwrap_err();
        match err {
            CommandError::VersionMismatch(mismatch) => {
                assert_eq!(mismatch.subject, "-replace");
                assert_eq!(mismatch.actual, old);
                assert_eq!(mismatch.constraint.to_string(), ">= 0.15.2");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_operation_version_gate() {
        let err = CommandBuilder::new(Operation::Validate)
            .build(&ToolVersion::new(0, 11, 14))
            .unwrap_err();
        assert!(matches!(err, CommandError::VersionMismatch(_)));
    }

    #[test]
    fn test_init_defaults_follow_version() {
        let old = CommandBuilder::new(Operation::Init)
            .build(&ToolVersion::new(0, 14, 11))
            .unwrap()
            .to_string();
        assert_eq!(
            old,
            "init -no-color -force-copy -input=false -lock-timeout=0s -backend=true -get=true \
             -upgrade=false -lock=true -get-plugins=true -verify-plugins=true"
        );

        let new = render(CommandBuilder::new(Operation::Init));
        assert_eq!(
            new,
            "init -no-color -force-copy -input=false -lock-timeout=0s -backend=true -get=true \
             -upgrade=false -lock=true"
        );
    }

    #[test]
    fn test_init_with_backend_config() {
        let argv = render(
            CommandBuilder::new(Operation::Init)
                .option(CommandOption::backend_config("bucket=state"))
                .option(CommandOption::backend_config("key=prod"))
                .option(CommandOption::reconfigure(true))
                .option(CommandOption::upgrade(true)),
        );
        assert!(argv.contains("-upgrade=true"));
        assert!(argv.ends_with("-reconfigure -backend-config=bucket=state -backend-config=key=prod"));
    }

    #[test]
    fn test_apply_forces_auto_approve() {
        let argv = render(CommandBuilder::new(Operation::Apply).option(CommandOption::dir("plan.tfplan")));
        assert!(argv.starts_with("apply -no-color -auto-approve -input=false"));
        assert!(argv.ends_with("plan.tfplan"));
    }

    #[test]
    fn test_import_places_dir_as_config_flag() {
        let argv = render(
            CommandBuilder::new(Operation::Import)
                .option(CommandOption::dir("earth"))
                .args(["aws_instance.web", "i-12345"]),
        );
        assert_eq!(
            argv,
            "import -no-color -input=false -lock-timeout=0s -config=earth -lock=true \
             aws_instance.web i-12345"
        );
    }

    #[test]
    fn test_import_rejects_dir_together_with_config() {
        let err = CommandBuilder::new(Operation::Import)
            .option(CommandOption::config("a"))
            .option(CommandOption::dir("b"))
            .args(["aws_instance.web", "i-12345"])
            .build(&latest())
            .unwrap_err();
        assert!(matches!(
            err,
            CommandError::ConflictingOptions {
                first: OptionKey::Dir,
                second: OptionKey::Config,
                operation: Operation::Import,
            }
        ));
    }

    #[test]
    fn test_positional_arity() {
        let err = CommandBuilder::new(Operation::WorkspaceNew)
            .build(&latest())
            .unwrap_err();
        assert!(matches!(
            err,
            CommandError::MissingArgument {
                expected: 1,
                actual: 0,
                ..
            }
        ));

        let err = CommandBuilder::new(Operation::StateMv)
            .args(["a", "b", "c"])
            .build(&latest())
            .unwrap_err();
        assert!(matches!(err, CommandError::UnexpectedArgument { expected: 2, .. }));

        assert!(
            CommandBuilder::new(Operation::StateRm)
                .args(["a", "b", "c"])
                .build(&latest())
                .is_ok()
        );
    }

    #[test]
    fn test_workspace_new_argument_precedes_dir() {
        let argv = render(
            CommandBuilder::new(Operation::WorkspaceNew)
                .option(CommandOption::dir("earth"))
                .arg("staging"),
        );
        assert_eq!(
            argv,
            "workspace new -no-color -lock-timeout=0s -lock=true staging earth"
        );
    }

    #[test]
    fn test_workspace_list() {
        assert_eq!(
            render(CommandBuilder::new(Operation::WorkspaceList)),
            "workspace list -no-color"
        );
    }

    #[test]
    fn test_invalid_option_fails_before_rendering() {
        let err = CommandBuilder::new(Operation::Plan)
            .option(CommandOption::var("", "value"))
            .build(&latest())
            .unwrap_err();
        assert!(matches!(err, CommandError::InvalidOption { .. }));
    }
}
