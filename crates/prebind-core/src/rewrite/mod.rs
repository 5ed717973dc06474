//! Package rewriter: commit a located prebuild into a package.
//!
//! A [`RewriteStrategy`] decides which consumers it handles and what files a
//! rewrite produces. [`mutate_package`] drives one consumer through
//! locate → render → commit → report, identically for every strategy.

mod loader;
mod shim;

pub use loader::{LOADER_OPERATIONS, LoaderStrategy};
pub use shim::ShimStrategy;

use std::path::{Component, Path, PathBuf};

use prebind_schema::{Environment, Locator};
use thiserror::Error;

use crate::config::{Config, ConfigError};
use crate::fs::{FsError, PackageFs};
use crate::locator::{Prebuild, locate};
use crate::project::{Package, Project, ProjectError};
use crate::reporter::Reporter;

/// Errors that abort the rewrite of one consumer.
#[derive(Error, Debug)]
pub enum RewriteError {
    /// No compatible prebuild exists and the strategy cannot do without one.
    #[error("Unable to locate prebuild for {0}")]
    NoPrebuild(Locator),

    /// The located prebuild could not be read.
    #[error("Prebuild {} of {consumer} could not be read: {source}", .path.display())]
    MissingFile {
        /// Consumer the prebuild belongs to.
        consumer: Locator,
        /// Prebuild path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: FsError,
    },

    /// A strategy that embeds the prebuild was rendered without its bytes.
    #[error("The {0} strategy needs the prebuild contents, but none were read")]
    ArtifactNotRead(&'static str),

    /// Listing or writing files failed.
    #[error(transparent)]
    Fs(#[from] FsError),

    /// The consumer or the target could not be located.
    #[error(transparent)]
    Project(#[from] ProjectError),
}

/// Contents of a generated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Contents {
    /// A structured manifest, written as pretty JSON.
    Json(serde_json::Value),
    /// Source text.
    Text(String),
    /// Raw bytes, e.g. a copied binary.
    Binary(Vec<u8>),
}

/// One file a rewrite writes, relative to the target location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Path relative to the target package.
    pub path: PathBuf,
    /// What to write.
    pub contents: Contents,
}

impl GeneratedFile {
    /// Create a generated file.
    pub fn new(path: impl Into<PathBuf>, contents: Contents) -> Self {
        Self {
            path: path.into(),
            contents,
        }
    }
}

/// A fully rendered rewrite of one consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    /// Consumer the prebuild was located in.
    pub consumer: Locator,
    /// Package that receives the files.
    pub target: Locator,
    /// Directory of the target package.
    pub target_location: PathBuf,
    /// Prebuild path relative to the consumer root.
    pub artifact: PathBuf,
    /// Files to write, in order.
    pub files: Vec<GeneratedFile>,
}

impl Mutation {
    /// Write every file through the target's filesystem view.
    ///
    /// # Errors
    ///
    /// Returns the first write failure; files written before it are kept.
    pub async fn commit(&self, fs: &dyn PackageFs) -> Result<(), FsError> {
        for file in &self.files {
            match &file.contents {
                Contents::Json(value) => fs.write_json(&file.path, value).await?,
                Contents::Text(text) => fs.write_file(&file.path, text.as_bytes()).await?,
                Contents::Binary(bytes) => fs.write_file(&file.path, bytes).await?,
            }
            tracing::debug!(
                "Wrote {}",
                self.target_location.join(&file.path).display()
            );
        }
        Ok(())
    }
}

/// What a strategy does when the consumer has no compatible prebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnMissing {
    /// Fail the consumer with [`RewriteError::NoPrebuild`].
    Abort,
    /// Report a warning and leave the consumer untouched.
    Skip,
}

/// Everything a strategy needs to render its files.
#[derive(Debug)]
pub struct RewriteInput<'a> {
    /// The consumer package.
    pub consumer: &'a Package,
    /// Package that receives the files.
    pub target: &'a Locator,
    /// The winning prebuild.
    pub prebuild: &'a Prebuild,
    /// Raw prebuild bytes, read only for strategies that embed them.
    pub artifact_bytes: Option<Vec<u8>>,
}

impl RewriteInput<'_> {
    /// Version shown in generated headers.
    pub fn consumer_version(&self) -> &str {
        self.consumer
            .version
            .as_deref()
            .unwrap_or(&self.consumer.locator.reference)
    }
}

/// One way of committing a prebuild into a package.
pub trait RewriteStrategy: Send + Sync + std::fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// The package this strategy would write to for `consumer`, or `None` if
    /// the consumer is not handled by this strategy.
    fn claim(
        &self,
        consumer: &Package,
        env: &Environment,
        reporter: &dyn Reporter,
    ) -> Option<Locator>;

    /// Behaviour when no prebuild matches.
    fn on_missing(&self) -> OnMissing;

    /// Whether [`RewriteInput::artifact_bytes`] must be provided.
    fn embeds_artifact(&self) -> bool;

    /// Render the files to write.
    ///
    /// # Errors
    ///
    /// Returns an error if the input lacks something the strategy needs.
    fn render(&self, input: &RewriteInput<'_>) -> Result<Vec<GeneratedFile>, RewriteError>;
}

/// Strategies in priority order: configured loaders first, then the shim.
///
/// # Errors
///
/// Returns an error if a configured loader package is invalid.
pub fn strategies(config: &Config) -> Result<Vec<Box<dyn RewriteStrategy>>, ConfigError> {
    let mut strategies: Vec<Box<dyn RewriteStrategy>> = config
        .loader_targets()?
        .into_iter()
        .map(|(package, loader)| -> Box<dyn RewriteStrategy> {
            Box::new(LoaderStrategy::new(package, loader))
        })
        .collect();
    strategies.push(Box::new(ShimStrategy));
    Ok(strategies)
}

/// Shared state of one rewrite pass.
#[derive(Clone, Copy)]
pub struct RewriteContext<'a> {
    /// Installed packages.
    pub project: &'a Project,
    /// Environment prebuilds are matched against.
    pub env: &'a Environment,
    /// User-facing sink.
    pub reporter: &'a dyn Reporter,
    /// Render without writing.
    pub dry_run: bool,
}

impl std::fmt::Debug for RewriteContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewriteContext")
            .field("root", &self.project.root())
            .field("env", &self.env)
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}

/// Result of processing one consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Files were written.
    Mutated(Mutation),
    /// Dry run: files were rendered but not written.
    Planned(Mutation),
    /// No prebuild, and the strategy tolerates that.
    Skipped,
}

/// Locate, render, commit and report the rewrite of one consumer.
///
/// The prebuild is read in full before anything is written. Both package
/// environments are dropped before returning.
///
/// # Errors
///
/// Returns [`RewriteError::NoPrebuild`] for an aborting strategy without a
/// match, and any location, read or write failure.
pub async fn mutate_package(
    ctx: RewriteContext<'_>,
    consumer: &Package,
    target: &Locator,
    strategy: &dyn RewriteStrategy,
) -> Result<Outcome, RewriteError> {
    let source = ctx.project.package_environment(&consumer.locator)?;
    let target_env = ctx.project.package_environment(target)?;
    tracing::debug!(
        "{} rewrite of {} into {}",
        strategy.name(),
        consumer.locator,
        target_env.location.display()
    );

    let Some(prebuild) = locate(&source.location, &source.fs, ctx.env).await? else {
        return match strategy.on_missing() {
            OnMissing::Abort => Err(RewriteError::NoPrebuild(consumer.locator.clone())),
            OnMissing::Skip => {
                ctx.reporter.warning(&format!(
                    "Unable to locate prebuild for {}, leaving it untouched",
                    consumer.locator
                ));
                Ok(Outcome::Skipped)
            }
        };
    };

    let artifact_bytes = if strategy.embeds_artifact() {
        let bytes = source
            .fs
            .read_file(&prebuild.path)
            .await
            .map_err(|e| RewriteError::MissingFile {
                consumer: consumer.locator.clone(),
                path: prebuild.path.clone(),
                source: e,
            })?;
        Some(bytes)
    } else {
        None
    };

    let input = RewriteInput {
        consumer,
        target,
        prebuild: &prebuild,
        artifact_bytes,
    };
    let mutation = Mutation {
        consumer: consumer.locator.clone(),
        target: target.clone(),
        target_location: target_env.location.clone(),
        artifact: prebuild.relative_path(),
        files: strategy.render(&input)?,
    };

    if ctx.dry_run {
        ctx.reporter.info(&format!(
            "Would install prebuild for {} from {} into {} ({} files)",
            mutation.consumer,
            portable(&mutation.artifact),
            mutation.target_location.display(),
            mutation.files.len()
        ));
        return Ok(Outcome::Planned(mutation));
    }

    mutation.commit(&target_env.fs).await?;
    ctx.reporter.info(&format!(
        "Installed prebuild for {} from {} into {}",
        mutation.consumer,
        portable(&mutation.artifact),
        mutation.target_location.display()
    ));
    Ok(Outcome::Mutated(mutation))
}

/// Lexical path from directory `from` to `to`, both relative to one root.
pub fn relative_path(from: &Path, to: &Path) -> PathBuf {
    let from: Vec<Component<'_>> = normal_components(from);
    let to: Vec<Component<'_>> = normal_components(to);
    let common = from
        .iter()
        .zip(&to)
        .take_while(|(a, b)| a == b)
        .count();

    let mut path = PathBuf::new();
    for _ in common..from.len() {
        path.push("..");
    }
    for component in &to[common..] {
        path.push(component);
    }
    path
}

fn normal_components(path: &Path) -> Vec<Component<'_>> {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Render a relative path with forward slashes.
pub fn portable(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// A `require` specifier for a relative path: `./`-prefixed unless it
/// already climbs out with `../`.
pub fn require_specifier(path: &Path) -> String {
    let path = portable(path);
    if path.starts_with("../") {
        path
    } else {
        format!("./{path}")
    }
}
