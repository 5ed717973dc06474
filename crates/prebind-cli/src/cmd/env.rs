//! Env command

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use prebind_core::NullReporter;

use crate::EnvArgs;
use crate::ops::Context;

/// Print the environment prebuilds are matched against, as JSON.
pub async fn env(root: &Path, args: &EnvArgs) -> Result<()> {
    let ctx = Context::load(root, args.overrides(), Arc::new(NullReporter))
        .await
        .context("Failed to resolve environment")?;
    println!("{}", serde_json::to_string_pretty(&ctx.env)?);
    Ok(())
}
