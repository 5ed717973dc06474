//! Compatibility filter: can a tuple or tag set be used at all?
//!
//! Both checks are pure functions of their arguments.

use crate::environment::Environment;
use crate::tags::TagSet;
use crate::tuple::Tuple;

/// A tuple is compatible when its platform matches exactly and the
/// architecture is one of the tuple's architectures.
pub fn is_compatible_tuple(tuple: &Tuple, platform: &str, arch: &str) -> bool {
    tuple.platform == platform && tuple.architectures.iter().any(|a| a == arch)
}

/// Check a tag set against the environment.
///
/// - runtime must match, unless the build is runtime-agnostic (`node` + `napi`)
/// - abi must match, unless the build is N-API
/// - `uv`, `armv` and `libc` must match when the build specifies them
pub fn is_compatible_tag_set(tags: &TagSet, env: &Environment) -> bool {
    if tags.runtime != Some(env.runtime) && !tags.is_runtime_agnostic() {
        return false;
    }
    if tags.abi.as_deref() != Some(env.abi.as_str()) && !tags.napi {
        return false;
    }
    if constrained(tags.uv.as_deref()).is_some_and(|uv| env.uv.as_deref() != Some(uv)) {
        return false;
    }
    if constrained(tags.armv.as_deref()).is_some_and(|armv| env.armv.as_deref() != Some(armv)) {
        return false;
    }
    if tags.libc.is_some_and(|libc| libc != env.libc) {
        return false;
    }
    true
}

// An empty `uv`/`armv` value leaves the dimension unconstrained.
fn constrained(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::{Libc, Runtime};

    fn env() -> Environment {
        Environment {
            arch: "x64".to_string(),
            platform: "linux".to_string(),
            libc: Libc::Glibc,
            runtime: Runtime::Node,
            abi: "93".to_string(),
            uv: Some("1".to_string()),
            armv: None,
        }
    }

    fn tags(file: &str) -> TagSet {
        TagSet::parse(file).unwrap()
    }

    #[test]
    fn test_tuple_platform_and_arch() {
        let fat = Tuple::parse("darwin-x64+arm64").unwrap();
        assert!(is_compatible_tuple(&fat, "darwin", "arm64"));
        assert!(is_compatible_tuple(&fat, "darwin", "x64"));
        assert!(!is_compatible_tuple(&fat, "linux", "x64"));
        assert!(!is_compatible_tuple(&fat, "darwin", "ia32"));
    }

    #[test]
    fn test_runtime_must_match() {
        let env = env();
        assert!(is_compatible_tag_set(&tags("node.abi93.node"), &env));
        assert!(!is_compatible_tag_set(&tags("electron.abi93.node"), &env));
        assert!(!is_compatible_tag_set(&tags("abi93.node"), &env));
    }

    #[test]
    fn test_node_napi_is_runtime_agnostic() {
        let electron = Environment {
            runtime: Runtime::Electron,
            ..env()
        };
        assert!(is_compatible_tag_set(&tags("node.napi.node"), &electron));
        assert!(!is_compatible_tag_set(&tags("node.abi93.node"), &electron));
    }

    #[test]
    fn test_napi_bypasses_abi() {
        let env = env();
        assert!(is_compatible_tag_set(&tags("node.napi.node"), &env));
        assert!(is_compatible_tag_set(&tags("node.abi64.napi.node"), &env));
        assert!(!is_compatible_tag_set(&tags("node.abi64.node"), &env));
    }

    #[test]
    fn test_optional_dimensions() {
        let env = env();
        assert!(is_compatible_tag_set(&tags("node.napi.uv1.node"), &env));
        assert!(!is_compatible_tag_set(&tags("node.napi.uv2.node"), &env));
        assert!(!is_compatible_tag_set(&tags("node.napi.armv7.node"), &env));
        assert!(is_compatible_tag_set(&tags("node.napi.glibc.node"), &env));
        assert!(!is_compatible_tag_set(&tags("node.napi.musl.node"), &env));

        let arm = Environment {
            arch: "arm".to_string(),
            armv: Some("7".to_string()),
            ..env
        };
        assert!(is_compatible_tag_set(&tags("node.napi.armv7.node"), &arm));
        assert!(!is_compatible_tag_set(&tags("node.napi.armv6.node"), &arm));
    }

    #[test]
    fn test_filter_is_pure() {
        let env = env();
        let candidate = tags("node.abi93.uv1.glibc.node");
        let first = is_compatible_tag_set(&candidate, &env);
        let second = is_compatible_tag_set(&candidate, &env);
        assert_eq!(first, second);
        assert!(first);
    }
}
