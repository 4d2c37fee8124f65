//! CLI command definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tfdriver_domain::CommandOption;

/// CLI arguments for tfdriver
#[derive(Parser, Debug)]
#[command(name = "tfdriver")]
#[command(author, version, about = "Run terraform with typed options and classified errors")]
#[command(long_about = r#"
tfdriver runs the terraform CLI non-interactively. Options are checked
against the installed terraform version before anything is executed, and
failures are reported as classified errors (missing variable, usage error,
not initialized, no configuration).

Configuration files are loaded from (in priority order):
1. TFDRIVER_* environment variables
2. --config <path>     Explicit config file
3. ./tfdriver.toml     Project-level config
4. ~/.config/tfdriver/config.toml   Global config

Example:
  tfdriver init --upgrade
  tfdriver plan --var region=eu-west-1 --target module.network --out plan.tfplan
  tfdriver apply plan.tfplan
  tfdriver workspace list
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Working directory (defaults to the configured one, then `.`)
    #[arg(long, global = true, value_name = "DIR")]
    pub chdir: Option<PathBuf>,

    /// Terraform binary: a path, or a name looked up on PATH
    #[arg(long, global = true, value_name = "PATH")]
    pub terraform: Option<String>,

    /// Write terraform's trace log to this file
    #[arg(long, global = true, value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Mirror terraform's output to stderr while it runs
    #[arg(long, global = true)]
    pub stream: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print terraform and provider versions
    Version,

    /// Prepare the working directory
    Init(InitArgs),

    /// Show the changes required by the current configuration
    Plan(PlanArgs),

    /// Apply changes, without asking for approval
    Apply(ApplyArgs),

    /// Destroy all managed objects, without asking for approval
    Destroy(RunArgs),

    /// Validate the configuration and print the report
    Validate,

    /// Rewrite (or check) configuration files in canonical format
    Fmt(FmtArgs),

    /// Print root module outputs
    Output(OutputArgs),

    /// Workspace management
    #[command(subcommand)]
    Workspace(WorkspaceCommand),
}

#[derive(Subcommand, Debug)]
pub enum WorkspaceCommand {
    /// List workspaces and the selected one
    List,
    /// Print the selected workspace
    Show,
    /// Create a workspace
    New { name: String },
    /// Select a workspace
    Select { name: String },
    /// Delete a workspace
    Delete {
        name: String,
        /// Delete even if the workspace still manages resources
        #[arg(long)]
        force: bool,
    },
}

fn parse_var(s: &str) -> Result<CommandOption, String> {
    CommandOption::parse_var(s).map_err(|e| e.to_string())
}

/// Options shared by plan, apply and destroy
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Set an input variable (repeatable)
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var)]
    pub vars: Vec<CommandOption>,

    /// Load variable values from a file
    #[arg(long, value_name = "FILE")]
    pub var_file: Option<String>,

    /// Limit the operation to a resource address (repeatable)
    #[arg(long, value_name = "ADDRESS")]
    pub target: Vec<String>,

    /// How long to retry acquiring the state lock, e.g. `30s`
    #[arg(long, value_name = "DURATION")]
    pub lock_timeout: Option<String>,

    /// Do not hold the state lock
    #[arg(long)]
    pub no_lock: bool,

    /// Number of concurrent operations
    #[arg(long, value_name = "N")]
    pub parallelism: Option<u32>,

    /// Skip refreshing state before the operation
    #[arg(long)]
    pub no_refresh: bool,
}

impl RunArgs {
    pub fn options(&self) -> Vec<CommandOption> {
        let mut options = self.vars.clone();
        options.extend(self.var_file.iter().map(CommandOption::var_file));
        options.extend(self.target.iter().map(CommandOption::target));
        options.extend(self.lock_timeout.iter().map(CommandOption::lock_timeout));
        options.extend(self.parallelism.map(CommandOption::parallelism));
        if self.no_lock {
            options.push(CommandOption::lock(false));
        }
        if self.no_refresh {
            options.push(CommandOption::refresh(false));
        }
        options
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct InitArgs {
    /// Upgrade modules and providers to the newest allowed versions
    #[arg(long)]
    pub upgrade: bool,

    /// Ignore any saved backend configuration
    #[arg(long)]
    pub reconfigure: bool,

    /// Partial backend configuration, `KEY=VALUE` or a file (repeatable)
    #[arg(long, value_name = "CONFIG")]
    pub backend_config: Vec<String>,

    /// Skip backend initialization
    #[arg(long)]
    pub no_backend: bool,

    /// Copy the given module into the empty working directory first
    #[arg(long, value_name = "SOURCE")]
    pub from_module: Option<String>,
}

impl InitArgs {
    pub fn options(&self) -> Vec<CommandOption> {
        let mut options: Vec<CommandOption> = self
            .backend_config
            .iter()
            .map(CommandOption::backend_config)
            .collect();
        options.extend(self.from_module.iter().map(CommandOption::from_module));
        if self.upgrade {
            options.push(CommandOption::upgrade(true));
        }
        if self.reconfigure {
            options.push(CommandOption::reconfigure(true));
        }
        if self.no_backend {
            options.push(CommandOption::backend(false));
        }
        options
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct PlanArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Save the plan to a file
    #[arg(long, value_name = "FILE")]
    pub out: Option<String>,

    /// Plan to destroy all managed objects
    #[arg(long)]
    pub destroy: bool,

    /// Only update state to match remote objects
    #[arg(long)]
    pub refresh_only: bool,

    /// Force replacement of a resource address (repeatable)
    #[arg(long, value_name = "ADDRESS")]
    pub replace: Vec<String>,
}

impl PlanArgs {
    pub fn options(&self) -> Vec<CommandOption> {
        let mut options = self.run.options();
        options.extend(self.out.iter().map(CommandOption::out));
        options.extend(self.replace.iter().map(CommandOption::replace));
        if self.destroy {
            options.push(CommandOption::destroy(true));
        }
        if self.refresh_only {
            options.push(CommandOption::refresh_only(true));
        }
        options
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Force replacement of a resource address (repeatable)
    #[arg(long, value_name = "ADDRESS")]
    pub replace: Vec<String>,

    /// Saved plan to apply
    pub plan_file: Option<String>,
}

impl ApplyArgs {
    pub fn options(&self) -> Vec<CommandOption> {
        let mut options = self.run.options();
        options.extend(self.replace.iter().map(CommandOption::replace));
        options.extend(self.plan_file.iter().map(CommandOption::dir));
        options
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct FmtArgs {
    /// Only check formatting; exit 3 when files need changes
    #[arg(long)]
    pub check: bool,

    /// Also process subdirectories
    #[arg(long)]
    pub recursive: bool,

    /// Print the differences
    #[arg(long)]
    pub diff: bool,
}

impl FmtArgs {
    pub fn options(&self) -> Vec<CommandOption> {
        vec![
            CommandOption::check(self.check),
            CommandOption::recursive(self.recursive),
            CommandOption::diff(self.diff),
        ]
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Read outputs from this state file
    #[arg(long, value_name = "PATH")]
    pub state: Option<String>,
}

impl OutputArgs {
    pub fn options(&self) -> Vec<CommandOption> {
        self.state.iter().map(CommandOption::state).collect()
    }
}
