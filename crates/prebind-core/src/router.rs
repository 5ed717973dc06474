//! Dependency router.
//!
//! Packages that ship prebuilds usually load them through the generic
//! `node-gyp-build` helper. Rewriting a single shared copy of that helper
//! would hand every consumer the same binary, so each consumer's dependency
//! edge is rerouted to a synthetic, consumer-specific identity first:
//!
//! ```text
//! node-gyp-build@npm:^4.3.0
//!   -> node-gyp-build@static-prebuild:node-gyp-build@npm%3A^4.3.0#node-gyp-build<leveldown@npm%3A6.1.1>
//! ```

use prebind_schema::{Descriptor, Ident, Locator, Range};

use crate::reporter::Reporter;

/// Name of the generic native-loader package.
pub const NATIVE_LOADER: &str = "node-gyp-build";

/// Protocol of rerouted dependencies.
pub const ROUTED_PROTOCOL: &str = "static-prebuild:";

/// Whether an ident is the generic native loader. Scoped packages with the
/// same name do not count.
pub fn is_native_loader(ident: &Ident) -> bool {
    ident.scope.is_none() && ident.name == NATIVE_LOADER
}

/// Reroute a dependency of `consumer` if it targets the native loader.
///
/// Any other dependency is returned unchanged.
pub fn reduce_dependency(
    dependency: &Descriptor,
    consumer: &Locator,
    reporter: &dyn Reporter,
) -> Descriptor {
    if !is_native_loader(&dependency.ident) {
        return dependency.clone();
    }

    let range = Range {
        protocol: Some(ROUTED_PROTOCOL.to_string()),
        source: Some(dependency.to_string()),
        selector: format!("{NATIVE_LOADER}<{consumer}>"),
        params: None,
    };
    let routed = Descriptor::new(dependency.ident.clone(), range.to_string());

    reporter.info(&format!(
        "Found a {NATIVE_LOADER} dependency in {consumer}, re-routing to prebuild under name {}",
        routed.ident
    ));
    routed
}

/// The consumer a rerouted reference was created for.
///
/// Returns `None` for references that were not produced by
/// [`reduce_dependency`].
pub fn routed_consumer(reference: &str) -> Option<Locator> {
    let range = Range::parse(reference);
    if range.protocol.as_deref() != Some(ROUTED_PROTOCOL) {
        return None;
    }
    let inner = range
        .selector
        .strip_prefix(NATIVE_LOADER)?
        .strip_prefix('<')?
        .strip_suffix('>')?;
    Locator::parse(inner).ok()
}
