//! `workspace list` / `workspace show` stdout

use serde::{Deserialize, Serialize};

const CURRENT_MARKER: &str = "* ";

/// Workspaces known to the backend, in listing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceListing {
    pub workspaces: Vec<String>,
    /// Selected workspace; empty when the listing did not mark one.
    pub current: String,
}

impl WorkspaceListing {
    pub fn contains(&self, name: &str) -> bool {
        self.workspaces.iter().any(|w| w == name)
    }
}

/// Parse `terraform workspace list` output. Never fails.
pub fn parse_workspace_list(stdout: &str) -> WorkspaceListing {
    let mut listing = WorkspaceListing::default();

    for line in stdout.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let name = match line.strip_prefix(CURRENT_MARKER) {
            Some(name) => {
                listing.current = name.to_string();
                name
            }
            None => line,
        };
        listing.workspaces.push(name.to_string());
    }

    listing
}

/// Parse `terraform workspace show` output.
pub fn parse_workspace_show(stdout: &str) -> String {
    stdout.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_first() {
        let listing = parse_workspace_list("* default\n  foo\n");
        assert_eq!(listing.workspaces, vec!["default", "foo"]);
        assert_eq!(listing.current, "default");
    }

    #[test]
    fn test_current_last() {
        let listing = parse_workspace_list("  default\n* foo\n");
        assert_eq!(listing.workspaces, vec!["default", "foo"]);
        assert_eq!(listing.current, "foo");
    }

    #[test]
    fn test_blank_lines_and_no_marker() {
        let listing = parse_workspace_list("\n  default\n\n   \n  staging\r\n");
        assert_eq!(listing.workspaces, vec!["default", "staging"]);
        assert!(listing.current.is_empty());
        assert!(listing.contains("staging"));
    }

    #[test]
    fn test_empty_output() {
        assert_eq!(parse_workspace_list(""), WorkspaceListing::default());
    }

    #[test]
    fn test_show_trims() {
        assert_eq!(parse_workspace_show("staging\n"), "staging");
    }
}
