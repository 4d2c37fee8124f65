//! Per-operation templates
//!
//! An [`OperationTemplate`] is the static description of how one
//! [`Operation`] is invoked:
//!
//! - the flags every invocation forces (`-no-color`, `-input=false`, ...)
//! - the accepted option slots, **in canonical render order**, each with an
//!   optional implicit default and version constraint
//! - pairs of options that cannot be combined
//! - how many positional arguments the operation takes
//! - where a per-call directory override goes
//!
//! The version constraints follow the terraform release that introduced
//! (or removed) the flag or sub-command.

use super::operation::Operation;
use super::option::{OptionKey, OptionValue};
use crate::core::error::VersionMismatch;
use crate::core::version::{ToolVersion, VersionConstraint};

/// One accepted option position in the argument vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub key: OptionKey,
    /// Rendered when the caller does not supply the option.
    pub default: Option<OptionValue>,
    pub constraint: Option<VersionConstraint>,
}

impl Slot {
    fn new(key: OptionKey) -> Self {
        Self {
            key,
            default: None,
            constraint: None,
        }
    }

    fn defaults_to(mut self, value: OptionValue) -> Self {
        self.default = Some(value);
        self
    }

    fn requires(mut self, constraint: VersionConstraint) -> Self {
        self.constraint = Some(constraint);
        self
    }

    /// Whether the slot exists in `version` of the tool.
    pub fn allows(&self, version: &ToolVersion) -> bool {
        self.constraint.as_ref().is_none_or(|c| c.allows(version))
    }
}

/// Where a per-call directory override ([`OptionKey::Dir`]) is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirPlacement {
    /// Appended after every other argument.
    Trailing,
    /// Rendered as the given flag instead (e.g. `import -config=DIR`).
    Flag(OptionKey),
    /// The operation has no directory argument.
    Rejected,
}

/// Number of positional arguments an operation takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    /// `None` means unbounded.
    pub max: Option<usize>,
}

impl Arity {
    const NONE: Arity = Arity::exactly(0);

    const fn exactly(n: usize) -> Self {
        Self {
            min: n,
            max: Some(n),
        }
    }

    const fn optional(max: usize) -> Self {
        Self { min: 0, max: Some(max) }
    }

    const fn at_least(min: usize) -> Self {
        Self { min, max: None }
    }
}

/// Static invocation shape of an operation.
#[derive(Debug, Clone)]
pub struct OperationTemplate {
    pub operation: Operation,
    pub forced: &'static [&'static str],
    pub slots: Vec<Slot>,
    pub conflicts: &'static [(OptionKey, OptionKey)],
    pub arity: Arity,
    pub dir: DirPlacement,
    pub constraint: Option<VersionConstraint>,
}

const fn v(major: u64, minor: u64, patch: u64) -> ToolVersion {
    ToolVersion::new(major, minor, patch)
}

fn on() -> OptionValue {
    OptionValue::Bool(true)
}

fn off() -> OptionValue {
    OptionValue::Bool(false)
}

fn no_timeout() -> OptionValue {
    OptionValue::Text("0s".to_string())
}

fn default_parallelism() -> OptionValue {
    OptionValue::Int(10)
}

const NO_COLOR: &[&str] = &["-no-color"];
const NO_COLOR_NO_INPUT: &[&str] = &["-no-color", "-input=false"];
const AUTO_APPROVE: &[&str] = &["-no-color", "-auto-approve", "-input=false"];
const DESTROY_OR_REFRESH_ONLY: &[(OptionKey, OptionKey)] =
    &[(OptionKey::Destroy, OptionKey::RefreshOnly)];

impl OperationTemplate {
    fn new(operation: Operation, forced: &'static [&'static str]) -> Self {
        Self {
            operation,
            forced,
            slots: Vec::new(),
            conflicts: &[],
            arity: Arity::NONE,
            dir: DirPlacement::Trailing,
            constraint: None,
        }
    }

    fn slot(mut self, slot: Slot) -> Self {
        self.slots.push(slot);
        self
    }

    fn slots(mut self, keys: &[OptionKey]) -> Self {
        self.slots.extend(keys.iter().copied().map(Slot::new));
        self
    }

    fn conflicts(mut self, pairs: &'static [(OptionKey, OptionKey)]) -> Self {
        self.conflicts = pairs;
        self
    }

    fn arity(mut self, arity: Arity) -> Self {
        self.arity = arity;
        self
    }

    fn dir(mut self, dir: DirPlacement) -> Self {
        self.dir = dir;
        self
    }

    fn requires(mut self, constraint: VersionConstraint) -> Self {
        self.constraint = Some(constraint);
        self
    }

    // Slots shared by the state-mutating operations
    fn lock_timeout(self) -> Self {
        self.slot(Slot::new(OptionKey::LockTimeout).defaults_to(no_timeout()))
    }

    fn lock(self) -> Self {
        self.slot(Slot::new(OptionKey::Lock).defaults_to(on()))
    }

    fn parallelism(self) -> Self {
        self.slot(Slot::new(OptionKey::Parallelism).defaults_to(default_parallelism()))
    }

    fn refresh(self) -> Self {
        self.slot(Slot::new(OptionKey::Refresh).defaults_to(on()))
    }

    fn refresh_only(self) -> Self {
        self.slot(Slot::new(OptionKey::RefreshOnly).requires(VersionConstraint::at_least(v(0, 15, 4))))
    }

    fn replace(self) -> Self {
        self.slot(Slot::new(OptionKey::Replace).requires(VersionConstraint::at_least(v(0, 15, 2))))
    }

    /// Template for `operation`.
    pub fn for_operation(operation: Operation) -> Self {
        use OptionKey as K;

        match operation {
            Operation::Init => OperationTemplate::new(
                operation,
                &["-no-color", "-force-copy", "-input=false"],
            )
            .slots(&[K::FromModule])
            .lock_timeout()
            .slot(Slot::new(K::Backend).defaults_to(on()))
            .slot(Slot::new(K::Get).defaults_to(on()))
            .slot(Slot::new(K::Upgrade).defaults_to(off()))
            .lock()
            .slot(
                Slot::new(K::GetPlugins)
                    .defaults_to(on())
                    .requires(VersionConstraint::below(v(0, 15, 0))),
            )
            .slot(
                Slot::new(K::VerifyPlugins)
                    .defaults_to(on())
                    .requires(VersionConstraint::below(v(0, 15, 0))),
            )
            .slots(&[K::Reconfigure, K::BackendConfig, K::PluginDir]),

            Operation::Plan => OperationTemplate::new(operation, NO_COLOR_NO_INPUT)
                .lock_timeout()
                .slots(&[K::Out, K::State, K::VarFile])
                .lock()
                .parallelism()
                .refresh()
                .slots(&[K::Destroy])
                .refresh_only()
                .replace()
                .slots(&[K::Target, K::Var])
                .conflicts(DESTROY_OR_REFRESH_ONLY),

            Operation::Apply => OperationTemplate::new(operation, AUTO_APPROVE)
                .slots(&[K::Backup])
                .lock_timeout()
                .slots(&[K::State, K::StateOut, K::VarFile])
                .lock()
                .parallelism()
                .refresh()
                .slot(Slot::new(K::Destroy).requires(VersionConstraint::at_least(v(0, 15, 2))))
                .refresh_only()
                .replace()
                .slots(&[K::Target, K::Var])
                .conflicts(DESTROY_OR_REFRESH_ONLY),

            Operation::Destroy => OperationTemplate::new(operation, AUTO_APPROVE)
                .slots(&[K::Backup])
                .lock_timeout()
                .slots(&[K::State, K::StateOut, K::VarFile])
                .lock()
                .parallelism()
                .refresh()
                .slots(&[K::Target, K::Var]),

            Operation::Refresh => OperationTemplate::new(operation, NO_COLOR_NO_INPUT)
                .slots(&[K::Backup])
                .lock_timeout()
                .slots(&[K::State, K::StateOut, K::VarFile])
                .lock()
                .slots(&[K::Target, K::Var]),

            Operation::Import => OperationTemplate::new(operation, NO_COLOR_NO_INPUT)
                .lock_timeout()
                .slots(&[K::Backup, K::Config, K::State, K::StateOut, K::VarFile, K::AllowMissingConfig])
                .lock()
                .slots(&[K::Var])
                .arity(Arity::exactly(2))
                .dir(DirPlacement::Flag(K::Config)),

            Operation::Output => OperationTemplate::new(operation, &["-no-color", "-json"])
                .slots(&[K::State])
                .dir(DirPlacement::Rejected),

            Operation::Show => OperationTemplate::new(operation, &["-json", "-no-color"])
                .arity(Arity::optional(1))
                .dir(DirPlacement::Rejected)
                .requires(VersionConstraint::at_least(v(0, 12, 0))),

            Operation::Validate => OperationTemplate::new(operation, &["-no-color", "-json"])
                .dir(DirPlacement::Rejected)
                .requires(VersionConstraint::at_least(v(0, 12, 0))),

            Operation::Fmt => OperationTemplate::new(operation, NO_COLOR)
                .slots(&[K::List, K::Write, K::Check, K::Diff, K::Recursive])
                .requires(VersionConstraint::at_least(v(0, 7, 7))),

            Operation::Get => OperationTemplate::new(operation, NO_COLOR)
                .slot(Slot::new(K::Update).defaults_to(off())),

            Operation::Graph => {
                OperationTemplate::new(operation, &[]).slots(&[K::GraphType, K::DrawCycles])
            }

            Operation::Taint | Operation::Untaint => OperationTemplate::new(operation, NO_COLOR)
                .slots(&[K::AllowMissing, K::Backup])
                .lock_timeout()
                .lock()
                .slots(&[K::State, K::StateOut])
                .arity(Arity::exactly(1))
                .dir(DirPlacement::Rejected),

            Operation::ForceUnlock => {
                OperationTemplate::new(operation, &["-no-color", "-force"]).arity(Arity::exactly(1))
            }

            Operation::StateMv | Operation::StateRm => OperationTemplate::new(operation, NO_COLOR)
                .slots(&[K::Backup])
                .lock_timeout()
                .lock()
                .slots(&[K::State, K::StateOut])
                .arity(if operation == Operation::StateMv {
                    Arity::exactly(2)
                } else {
                    Arity::at_least(1)
                })
                .dir(DirPlacement::Rejected),

            Operation::WorkspaceList => OperationTemplate::new(operation, NO_COLOR),

            Operation::WorkspaceShow => OperationTemplate::new(operation, NO_COLOR)
                .dir(DirPlacement::Rejected)
                .requires(VersionConstraint::at_least(v(0, 10, 0))),

            Operation::WorkspaceNew => OperationTemplate::new(operation, NO_COLOR)
                .lock_timeout()
                .lock()
                .slots(&[K::State])
                .arity(Arity::exactly(1)),

            Operation::WorkspaceSelect => {
                OperationTemplate::new(operation, NO_COLOR).arity(Arity::exactly(1))
            }

            Operation::WorkspaceDelete => OperationTemplate::new(operation, NO_COLOR)
                .slots(&[K::Force])
                .lock_timeout()
                .lock()
                .arity(Arity::exactly(1)),

            Operation::Version => {
                OperationTemplate::new(operation, &[]).dir(DirPlacement::Rejected)
            }

            Operation::ProvidersSchema => {
                OperationTemplate::new(operation, &["-json", "-no-color"])
                    .requires(VersionConstraint::at_least(v(0, 12, 0)))
            }
        }
    }

    /// Slot accepting `key`, if any.
    pub fn find_slot(&self, key: OptionKey) -> Option<&Slot> {
        self.slots.iter().find(|s| s.key == key)
    }

    /// Whether the operation accepts `key` at all (ignoring versions).
    pub fn accepts(&self, key: OptionKey) -> bool {
        match key {
            OptionKey::Dir => self.dir != DirPlacement::Rejected,
            other => self.find_slot(other).is_some(),
        }
    }

    /// Check the operation-level constraint.
    pub fn check_version(&self, version: &ToolVersion) -> Result<(), VersionMismatch> {
        match &self.constraint {
            Some(constraint) if !constraint.allows(version) => Err(VersionMismatch {
                subject: format!("terraform {}", self.operation),
                constraint: constraint.clone(),
                actual: version.clone(),
            }),
            _ => Ok(()),
        }
    }
}
