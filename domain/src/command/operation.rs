//! Operation value object: one terraform sub-command

use crate::core::error::ParseError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A terraform capability the driver knows how to invoke (Value Object)
///
/// The operation decides which options are accepted, the order they render
/// in and the positional arguments it needs (see
/// [`OperationTemplate`](super::template::OperationTemplate)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Init,
    Plan,
    Apply,
    Destroy,
    Refresh,
    Import,
    Output,
    Show,
    Validate,
    Fmt,
    Get,
    Graph,
    Taint,
    Untaint,
    ForceUnlock,
    StateMv,
    StateRm,
    WorkspaceList,
    WorkspaceShow,
    WorkspaceNew,
    WorkspaceSelect,
    WorkspaceDelete,
    Version,
    ProvidersSchema,
}

impl Operation {
    /// Sub-command words as passed to the binary.
    pub fn words(&self) -> &'static [&'static str] {
        match self {
            Operation::Init => &["init"],
            Operation::Plan => &["plan"],
            Operation::Apply => &["apply"],
            Operation::Destroy => &["destroy"],
            Operation::Refresh => &["refresh"],
            Operation::Import => &["import"],
            Operation::Output => &["output"],
            Operation::Show => &["show"],
            Operation::Validate => &["validate"],
            Operation::Fmt => &["fmt"],
            Operation::Get => &["get"],
            Operation::Graph => &["graph"],
            Operation::Taint => &["taint"],
            Operation::Untaint => &["untaint"],
            Operation::ForceUnlock => &["force-unlock"],
            Operation::StateMv => &["state", "mv"],
            Operation::StateRm => &["state", "rm"],
            Operation::WorkspaceList => &["workspace", "list"],
            Operation::WorkspaceShow => &["workspace", "show"],
            Operation::WorkspaceNew => &["workspace", "new"],
            Operation::WorkspaceSelect => &["workspace", "select"],
            Operation::WorkspaceDelete => &["workspace", "delete"],
            Operation::Version => &["version"],
            Operation::ProvidersSchema => &["providers", "schema"],
        }
    }

    /// Every known operation, in declaration order.
    pub fn all() -> &'static [Operation] {
        &[
            Operation::Init,
            Operation::Plan,
            Operation::Apply,
            Operation::Destroy,
            Operation::Refresh,
            Operation::Import,
            Operation::Output,
            Operation::Show,
            Operation::Validate,
            Operation::Fmt,
            Operation::Get,
            Operation::Graph,
            Operation::Taint,
            Operation::Untaint,
            Operation::ForceUnlock,
            Operation::StateMv,
            Operation::StateRm,
            Operation::WorkspaceList,
            Operation::WorkspaceShow,
            Operation::WorkspaceNew,
            Operation::WorkspaceSelect,
            Operation::WorkspaceDelete,
            Operation::Version,
            Operation::ProvidersSchema,
        ]
    }

    /// Space-joined name, e.g. `"workspace list"`.
    pub fn name(&self) -> String {
        self.words().join(" ")
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Operation {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>();
        Operation::all()
            .iter()
            .copied()
            .find(|op| op.words() == normalized.as_slice())
            .ok_or_else(|| ParseError::UnknownOperation(s.to_string()))
    }
}

impl Serialize for Operation {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.name())
    }
}

impl<'de> Deserialize<'de> for Operation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_roundtrip() {
        for op in Operation::all() {
            let parsed: Operation = op.to_string().parse().unwrap();
            assert_eq!(*op, parsed);
        }
    }

    #[test]
    fn test_multi_word_names() {
        assert_eq!(Operation::WorkspaceList.to_string(), "workspace list");
        assert_eq!(Operation::StateMv.words(), &["state", "mv"]);
        let parsed: Operation = "workspace   show".parse().unwrap();
        assert_eq!(parsed, Operation::WorkspaceShow);
    }

    #[test]
    fn test_unknown_operation() {
        assert!("console".parse::<Operation>().is_err());
        assert!("workspace".parse::<Operation>().is_err());
    }
}
