//! Locate command

use std::path::Path;

use anyhow::{Context as _, Result, bail};
use prebind_core::{LocalFs, environment, locate as locate_prebuild};

use crate::EnvArgs;

/// Print the prebuild `dir` would use, or fail if there is none.
pub async fn locate(dir: &Path, args: &EnvArgs) -> Result<()> {
    let env = environment::current().clone().with_overrides(&args.overrides());
    let fs = LocalFs::new(dir);

    let prebuild = locate_prebuild(dir, &fs, &env)
        .await
        .with_context(|| format!("Failed to search {}", dir.display()))?;

    match prebuild {
        Some(prebuild) => {
            println!("{}", prebuild.path.display());
            Ok(())
        }
        None => bail!("No matching prebuild in {} for {env}", dir.display()),
    }
}
