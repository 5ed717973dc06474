//! Shared operation context.
//!
//! Groups the resolved environment, the project config and the reporter so
//! operations do not take them one by one.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use prebind_core::{Config, Reporter, environment};
use prebind_schema::{Environment, EnvironmentOverrides};

use super::InstallError;

#[derive(Clone)]
pub struct Context {
    pub root: PathBuf,
    pub config: Config,
    pub env: Environment,
    pub reporter: Arc<dyn Reporter>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("root", &self.root)
            .field("env", &self.env)
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Load `prebind.toml` from `root` and resolve the environment.
    ///
    /// Detected values are replaced by the config's `[environment]` table,
    /// which is in turn replaced by `overrides`.
    pub async fn load(
        root: &Path,
        overrides: EnvironmentOverrides,
        reporter: Arc<dyn Reporter>,
    ) -> Result<Self, InstallError> {
        let config = Config::load(root).await?;
        Ok(Self::new(root, config, environment::current().clone(), overrides, reporter))
    }

    /// Build a context from already loaded parts.
    pub fn new(
        root: &Path,
        config: Config,
        detected: Environment,
        overrides: EnvironmentOverrides,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        let overrides = config.environment.clone().merge(overrides);
        let env = detected.with_overrides(&overrides);
        tracing::debug!("Resolved environment: {env}");
        Self {
            root: root.to_path_buf(),
            config,
            env,
            reporter,
        }
    }
}
