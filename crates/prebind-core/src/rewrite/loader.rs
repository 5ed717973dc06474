//! In-place loader regeneration strategy.
//!
//! Some packages load their binary from a fixed module instead of going
//! through `node-gyp-build`. That module is regenerated to `require` the
//! winning prebuild directly and to expose a fixed set of promise-returning
//! operations.

use std::path::{Path, PathBuf};

use prebind_schema::{Environment, Ident, Locator};

use super::{Contents, GeneratedFile, OnMissing, RewriteError, RewriteInput, RewriteStrategy};
use crate::project::Package;
use crate::reporter::Reporter;

/// Operations exported by a regenerated loader, in output order.
pub const LOADER_OPERATIONS: &[&str] = &[
    "close",
    "drain",
    "flush",
    "get",
    "getBaudRate",
    "list",
    "open",
    "set",
    "update",
    "read",
    "write",
];

/// Regenerates a package's own loader module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderStrategy {
    package: Ident,
    loader: PathBuf,
}

impl LoaderStrategy {
    /// Handle `package`, whose loader lives at `loader` relative to its root.
    pub fn new(package: Ident, loader: impl Into<PathBuf>) -> Self {
        Self {
            package,
            loader: loader.into(),
        }
    }

    /// Package this strategy applies to.
    pub fn package(&self) -> &Ident {
        &self.package
    }

    /// Loader module path relative to the package root.
    pub fn loader(&self) -> &Path {
        &self.loader
    }

    /// Full loader source for `input`.
    pub fn source(&self, input: &RewriteInput<'_>) -> String {
        let artifact = input.prebuild.relative_path();
        let loader_dir = self.loader.parent().unwrap_or_else(|| Path::new(""));
        let specifier = super::require_specifier(&super::relative_path(loader_dir, &artifact));

        let header = format!(
            "// Automatically generated bindings file for {ident}\n\
             // Package version: {version}\n\
             // Bindings taken from: {artifact}\n\
             \n\
             \"use strict\";\n\
             \n\
             const {{ promisify }} = require(\"util\");\n\
             const binding = require(\"{specifier}\");\n\
             \n\
             function notImplemented(name) {{\n\
             \x20 return () => Promise.reject(new Error(`${{name}} is not implemented on this platform`));\n\
             }}\n\
             \n",
            ident = input.consumer.ident(),
            version = input.consumer_version(),
            artifact = super::portable(&artifact),
        );

        let exports: String = LOADER_OPERATIONS
            .iter()
            .map(|op| {
                format!(
                    "exports.{op} = typeof binding.{op} === \"function\" ? promisify(binding.{op}) : notImplemented(\"{op}\");\n"
                )
            })
            .collect();

        header + &exports
    }
}

impl RewriteStrategy for LoaderStrategy {
    fn name(&self) -> &'static str {
        "loader"
    }

    fn claim(
        &self,
        consumer: &Package,
        _env: &Environment,
        _reporter: &dyn Reporter,
    ) -> Option<Locator> {
        (consumer.ident() == &self.package).then(|| consumer.locator.clone())
    }

    fn on_missing(&self) -> OnMissing {
        OnMissing::Skip
    }

    fn embeds_artifact(&self) -> bool {
        false
    }

    fn render(&self, input: &RewriteInput<'_>) -> Result<Vec<GeneratedFile>, RewriteError> {
        Ok(vec![GeneratedFile::new(
            self.loader.clone(),
            Contents::Text(self.source(input)),
        )])
    }
}
