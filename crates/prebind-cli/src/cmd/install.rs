//! Install command

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use prebind_core::Project;

use crate::EnvArgs;
use crate::ops::{self, Context};
use crate::ui::ConsoleReporter;

/// Rewire the native addons of the project at `root`.
///
/// Individual consumers may fail without failing the command; only an
/// unreadable config or project does.
pub async fn install(root: &Path, args: &EnvArgs, dry_run: bool) -> Result<()> {
    let reporter = Arc::new(ConsoleReporter::new());
    let ctx = Context::load(root, args.overrides(), reporter)
        .await
        .with_context(|| format!("Failed to prepare install in {}", root.display()))?;

    let project = Project::scan(root)
        .with_context(|| format!("Failed to scan {}", root.display()))?;

    let summary = ops::install::install(&ctx, &project, dry_run).await?;
    if !summary.is_clean() {
        tracing::debug!("Install finished with {} failed consumers", summary.failed);
    }
    Ok(())
}
