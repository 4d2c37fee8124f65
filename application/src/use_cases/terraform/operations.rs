//! One method per terraform operation.

use super::{Terraform, TerraformError};
use serde_json::Value;
use std::collections::BTreeMap;
use tfdriver_domain::parsing::{
    parse_json_value, parse_output_json, parse_validate_json, parse_version_output,
    parse_workspace_list, parse_workspace_show,
};
use tfdriver_domain::{
    CommandBuilder, CommandOption, Operation, OutputMeta, ValidateOutput, VersionReport,
    WorkspaceListing,
};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// `fmt -check` exits 3 when files need formatting.
const FMT_CHECK_FAILED: i32 = 3;

/// Result of `terraform fmt`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatReport {
    /// Files that were rewritten, or with `-check` would be.
    pub files: Vec<String>,
    /// `false` only when `-check` found unformatted files.
    pub formatted: bool,
}

impl Terraform {
    async fn run(
        &self,
        builder: CommandBuilder,
        cancel: &CancellationToken,
    ) -> Result<String, TerraformError> {
        Ok(self.execute(builder, cancel).await?.stdout)
    }

    pub async fn init(
        &self,
        options: impl IntoIterator<Item = CommandOption>,
        cancel: &CancellationToken,
    ) -> Result<(), TerraformError> {
        self.run(CommandBuilder::new(Operation::Init).options(options), cancel)
            .await?;
        Ok(())
    }

    pub async fn plan(
        &self,
        options: impl IntoIterator<Item = CommandOption>,
        cancel: &CancellationToken,
    ) -> Result<(), TerraformError> {
        self.run(CommandBuilder::new(Operation::Plan).options(options), cancel)
            .await?;
        Ok(())
    }

    /// `apply -auto-approve`. Pass [`CommandOption::dir`] to apply a saved plan.
    pub async fn apply(
        &self,
        options: impl IntoIterator<Item = CommandOption>,
        cancel: &CancellationToken,
    ) -> Result<(), TerraformError> {
        self.run(CommandBuilder::new(Operation::Apply).options(options), cancel)
            .await?;
        Ok(())
    }

    pub async fn destroy(
        &self,
        options: impl IntoIterator<Item = CommandOption>,
        cancel: &CancellationToken,
    ) -> Result<(), TerraformError> {
        self.run(CommandBuilder::new(Operation::Destroy).options(options), cancel)
            .await?;
        Ok(())
    }

    pub async fn refresh(
        &self,
        options: impl IntoIterator<Item = CommandOption>,
        cancel: &CancellationToken,
    ) -> Result<(), TerraformError> {
        self.run(CommandBuilder::new(Operation::Refresh).options(options), cancel)
            .await?;
        Ok(())
    }

    /// Import the existing object `id` into `address`.
    pub async fn import(
        &self,
        address: &str,
        id: &str,
        options: impl IntoIterator<Item = CommandOption>,
        cancel: &CancellationToken,
    ) -> Result<(), TerraformError> {
        let builder = CommandBuilder::new(Operation::Import)
            .options(options)
            .args([address, id]);
        self.run(builder, cancel).await?;
        Ok(())
    }

    /// Root module outputs, keyed by name.
    pub async fn output(
        &self,
        options: impl IntoIterator<Item = CommandOption>,
        cancel: &CancellationToken,
    ) -> Result<BTreeMap<String, OutputMeta>, TerraformError> {
        let stdout = self
            .run(CommandBuilder::new(Operation::Output).options(options), cancel)
            .await?;
        Ok(parse_output_json(&stdout)?)
    }

    /// State (or the saved plan at `plan_file`) as JSON.
    pub async fn show(
        &self,
        plan_file: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Value, TerraformError> {
        let stdout = self
            .run(CommandBuilder::new(Operation::Show).args(plan_file), cancel)
            .await?;
        Ok(parse_json_value(&stdout, "show")?)
    }

    /// Validation report.
    ///
    /// An invalid configuration is reported through
    /// [`ValidateOutput::valid`], not as an error.
    pub async fn validate(&self, cancel: &CancellationToken) -> Result<ValidateOutput, TerraformError> {
        let output = self
            .execute_raw(CommandBuilder::new(Operation::Validate), cancel)
            .await?;

        match parse_validate_json(&output.stdout) {
            Ok(report) => Ok(report),
            Err(_) if !output.success() => Err(self.failure(Operation::Validate, &output)),
            Err(e) => Err(e.into()),
        }
    }

    /// Run `terraform fmt`.
    pub async fn fmt(
        &self,
        options: impl IntoIterator<Item = CommandOption>,
        cancel: &CancellationToken,
    ) -> Result<FormatReport, TerraformError> {
        let output = self
            .execute_raw(CommandBuilder::new(Operation::Fmt).options(options), cancel)
            .await?;

        let formatted = match output.exit_code {
            Some(0) => true,
            Some(FMT_CHECK_FAILED) if output.stderr.trim().is_empty() => false,
            _ => return Err(self.failure(Operation::Fmt, &output)),
        };
        let files = output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();

        Ok(FormatReport { files, formatted })
    }

    pub async fn get(
        &self,
        options: impl IntoIterator<Item = CommandOption>,
        cancel: &CancellationToken,
    ) -> Result<(), TerraformError> {
        self.run(CommandBuilder::new(Operation::Get).options(options), cancel)
            .await?;
        Ok(())
    }

    /// Dependency graph in DOT format.
    pub async fn graph(
        &self,
        options: impl IntoIterator<Item = CommandOption>,
        cancel: &CancellationToken,
    ) -> Result<String, TerraformError> {
        self.run(CommandBuilder::new(Operation::Graph).options(options), cancel)
            .await
    }

    pub async fn taint(
        &self,
        address: &str,
        options: impl IntoIterator<Item = CommandOption>,
        cancel: &CancellationToken,
    ) -> Result<(), TerraformError> {
        let builder = CommandBuilder::new(Operation::Taint)
            .options(options)
            .arg(address);
        self.run(builder, cancel).await?;
        Ok(())
    }

    pub async fn untaint(
        &self,
        address: &str,
        options: impl IntoIterator<Item = CommandOption>,
        cancel: &CancellationToken,
    ) -> Result<(), TerraformError> {
        let builder = CommandBuilder::new(Operation::Untaint)
            .options(options)
            .arg(address);
        self.run(builder, cancel).await?;
        Ok(())
    }

    pub async fn force_unlock(
        &self,
        lock_id: &str,
        options: impl IntoIterator<Item = CommandOption>,
        cancel: &CancellationToken,
    ) -> Result<(), TerraformError> {
        let builder = CommandBuilder::new(Operation::ForceUnlock)
            .options(options)
            .arg(lock_id);
        self.run(builder, cancel).await?;
        Ok(())
    }

    pub async fn state_mv(
        &self,
        source: &str,
        destination: &str,
        options: impl IntoIterator<Item = CommandOption>,
        cancel: &CancellationToken,
    ) -> Result<(), TerraformError> {
        let builder = CommandBuilder::new(Operation::StateMv)
            .options(options)
            .args([source, destination]);
        self.run(builder, cancel).await?;
        Ok(())
    }

    pub async fn state_rm<'a>(
        &self,
        addresses: impl IntoIterator<Item = &'a str>,
        options: impl IntoIterator<Item = CommandOption>,
        cancel: &CancellationToken,
    ) -> Result<(), TerraformError> {
        let builder = CommandBuilder::new(Operation::StateRm)
            .options(options)
            .args(addresses);
        self.run(builder, cancel).await?;
        Ok(())
    }

    pub async fn workspace_list(&self, cancel: &CancellationToken) -> Result<WorkspaceListing, TerraformError> {
        let stdout = self
            .run(CommandBuilder::new(Operation::WorkspaceList), cancel)
            .await?;
        let listing = parse_workspace_list(&stdout);
        debug!(
            count = listing.workspaces.len(),
            current = %listing.current,
            "Listed workspaces"
        );
        Ok(listing)
    }

    pub async fn workspace_show(&self, cancel: &CancellationToken) -> Result<String, TerraformError> {
        let stdout = self
            .run(CommandBuilder::new(Operation::WorkspaceShow), cancel)
            .await?;
        Ok(parse_workspace_show(&stdout))
    }

    pub async fn workspace_new(
        &self,
        name: &str,
        options: impl IntoIterator<Item = CommandOption>,
        cancel: &CancellationToken,
    ) -> Result<(), TerraformError> {
        let builder = CommandBuilder::new(Operation::WorkspaceNew)
            .options(options)
            .arg(name);
        self.run(builder, cancel).await?;
        Ok(())
    }

    pub async fn workspace_select(
        &self,
        name: &str,
        options: impl IntoIterator<Item = CommandOption>,
        cancel: &CancellationToken,
    ) -> Result<(), TerraformError> {
        let builder = CommandBuilder::new(Operation::WorkspaceSelect)
            .options(options)
            .arg(name);
        self.run(builder, cancel).await?;
        Ok(())
    }

    pub async fn workspace_delete(
        &self,
        name: &str,
        options: impl IntoIterator<Item = CommandOption>,
        cancel: &CancellationToken,
    ) -> Result<(), TerraformError> {
        let builder = CommandBuilder::new(Operation::WorkspaceDelete)
            .options(options)
            .arg(name);
        self.run(builder, cancel).await?;
        Ok(())
    }

    /// Run `terraform version` and report provider versions too.
    ///
    /// Unlike [`Terraform::version`] this is not cached.
    pub async fn version_report(&self, cancel: &CancellationToken) -> Result<VersionReport, TerraformError> {
        let stdout = self
            .run(CommandBuilder::new(Operation::Version), cancel)
            .await?;
        Ok(parse_version_output(&stdout)?)
    }

    pub async fn providers_schema(&self, cancel: &CancellationToken) -> Result<Value, TerraformError> {
        let stdout = self
            .run(CommandBuilder::new(Operation::ProvidersSchema), cancel)
            .await?;
        Ok(parse_json_value(&stdout, "providers schema")?)
    }
}
