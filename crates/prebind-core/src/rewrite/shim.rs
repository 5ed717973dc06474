//! Copy-and-shim strategy.
//!
//! Consumers that load their binary through `node-gyp-build` get a private
//! copy of that package: a manifest, an entry point that ignores the lookup
//! directory it is called with, and the winning binary itself.

use std::path::Path;

use prebind_schema::{Environment, Locator};
use serde_json::json;

use super::{Contents, GeneratedFile, OnMissing, RewriteError, RewriteInput, RewriteStrategy};
use crate::project::Package;
use crate::reporter::Reporter;
use crate::router;

/// Package only useful on macOS; never rewritten elsewhere.
const DARWIN_ONLY: &str = "fsevents";

/// Replaces a consumer's `node-gyp-build` with a single-binary shim.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShimStrategy;

impl ShimStrategy {
    fn index_js(input: &RewriteInput<'_>, file_name: &str) -> String {
        format!(
            "// Automatically generated bindings file for {ident}\n\
             // Package version: {version}\n\
             // Bindings taken from: {artifact}\n\
             \n\
             const staticRequire = require(\"./{file_name}\");\n\
             module.exports = (fileLookingFor) => {{\n\
             \x20 return staticRequire;\n\
             }};\n",
            ident = input.consumer.ident(),
            version = input.consumer_version(),
            artifact = super::portable(&input.prebuild.relative_path()),
        )
    }
}

impl RewriteStrategy for ShimStrategy {
    fn name(&self) -> &'static str {
        "shim"
    }

    fn claim(
        &self,
        consumer: &Package,
        env: &Environment,
        reporter: &dyn Reporter,
    ) -> Option<Locator> {
        if consumer.ident().scope.is_none()
            && consumer.ident().name == DARWIN_ONLY
            && env.platform != "darwin"
        {
            return None;
        }
        let dependency = consumer.find_dependency(|d| router::is_native_loader(&d.ident))?;
        let routed = router::reduce_dependency(dependency, &consumer.locator, reporter);
        Some(Locator::new(routed.ident, routed.range))
    }

    fn on_missing(&self) -> OnMissing {
        OnMissing::Abort
    }

    fn embeds_artifact(&self) -> bool {
        true
    }

    fn render(&self, input: &RewriteInput<'_>) -> Result<Vec<GeneratedFile>, RewriteError> {
        let bytes = input
            .artifact_bytes
            .clone()
            .ok_or(RewriteError::ArtifactNotRead(self.name()))?;
        let file_name = input.prebuild.tags.file.as_str();

        let manifest = json!({
            "name": input.target.slug(),
            "main": "./index.js",
            "preferUnplugged": true,
        });

        Ok(vec![
            GeneratedFile::new("package.json", Contents::Json(manifest)),
            GeneratedFile::new("index.js", Contents::Text(Self::index_js(input, file_name))),
            GeneratedFile::new(Path::new(file_name), Contents::Binary(bytes)),
        ])
    }
}
