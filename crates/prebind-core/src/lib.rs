//! Prebuild location and package rewriting for prebind.
//!
//! Everything here talks to the disk through injected capabilities
//! ([`PackageFs`], [`Project`]) and to the user through a [`Reporter`].

pub mod config;
pub mod environment;
pub mod fs;
pub mod locator;
pub mod project;
pub mod reporter;
pub mod rewrite;
pub mod router;

pub use config::{Config, ConfigError};
pub use fs::{FsError, LocalFs, PackageFs};
pub use locator::{Prebuild, locate};
pub use project::{Linker, NodeModulesLinker, Package, PackageEnvironment, Project, ProjectError};
pub use reporter::{NullReporter, RecordingReporter, Reporter, Severity};
pub use rewrite::{
    LoaderStrategy, Mutation, OnMissing, Outcome, RewriteContext, RewriteError, RewriteStrategy,
    ShimStrategy, mutate_package, strategies,
};
