//! Host environment detection.
//!
//! Resolution order for each field:
//! 1. npm-style environment variables (`npm_config_arch`, `npm_config_platform`,
//!    `LIBC`, `ARM_VERSION`) and the `PREBIND_*` variables
//! 2. the `node` executable on `PATH`, for the ABI, libuv and ARM versions
//! 3. host introspection via `std::env::consts`

use std::path::Path;
use std::process::Command;
use std::sync::OnceLock;

use prebind_schema::environment::{node_arch, node_platform};
use prebind_schema::{Environment, Libc, Runtime};
use serde::Deserialize;

/// Marker file present on Alpine Linux, the common musl distribution.
const ALPINE_RELEASE: &str = "/etc/alpine-release";

/// Prints the values only a JavaScript runtime knows about as one JSON object.
const NODE_PROBE_SCRIPT: &str = "const v = (process.config && process.config.variables) || {};\
console.log(JSON.stringify({\
modules: process.versions.modules,\
uv: process.versions.uv || null,\
arm_version: v.arm_version == null ? null : String(v.arm_version)\
}))";

/// Values reported by the `node` executable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NodeProbe {
    /// `process.versions.modules`.
    pub modules: String,
    /// `process.versions.uv`, full version.
    pub uv: Option<String>,
    /// `process.config.variables.arm_version`.
    pub arm_version: Option<String>,
}

impl NodeProbe {
    /// Run `node` from `PATH` and parse its answer.
    ///
    /// Returns `None` if node is not installed or its output is unusable.
    pub fn run() -> Option<Self> {
        let node = which::which("node").ok()?;
        Self::run_with(&node)
    }

    /// Run a specific node executable.
    pub fn run_with(node: &Path) -> Option<Self> {
        let output = Command::new(node)
            .args(["-e", NODE_PROBE_SCRIPT])
            .output()
            .inspect_err(|e| tracing::debug!("Failed to spawn {}: {e}", node.display()))
            .ok()?;

        if !output.status.success() {
            tracing::debug!(
                "{} exited with {}: {}",
                node.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr)
            );
            return None;
        }

        serde_json::from_slice(&output.stdout)
            .inspect_err(|e| tracing::debug!("Unreadable node probe output: {e}"))
            .ok()
    }

    /// Major component of the libuv version.
    pub fn uv_major(&self) -> Option<String> {
        self.uv
            .as_deref()
            .and_then(|uv| uv.split('.').next())
            .filter(|major| !major.is_empty())
            .map(str::to_string)
    }
}

/// Build an environment from explicit inputs.
///
/// `var` looks up an environment variable; empty values count as unset.
/// `probe` is consulted only for fields no variable provides. `alpine`
/// tells whether the host looks like a musl distribution.
pub fn resolve(
    var: &dyn Fn(&str) -> Option<String>,
    probe: Option<&NodeProbe>,
    alpine: bool,
) -> Environment {
    let var = |name: &str| var(name).filter(|v| !v.is_empty());

    let arch =
        var("npm_config_arch").unwrap_or_else(|| node_arch(std::env::consts::ARCH).to_string());
    let platform = var("npm_config_platform")
        .unwrap_or_else(|| node_platform(std::env::consts::OS).to_string());

    let libc = var("LIBC")
        .and_then(|libc| libc.parse().ok())
        .unwrap_or(if platform == "linux" && alpine {
            Libc::Musl
        } else {
            Libc::Glibc
        });

    let runtime = var("PREBIND_RUNTIME")
        .and_then(|runtime| runtime.parse().ok())
        .unwrap_or(if var("ELECTRON_RUN_AS_NODE").is_some() {
            Runtime::Electron
        } else {
            Runtime::Node
        });

    let abi = var("PREBIND_ABI")
        .or_else(|| probe.map(|p| p.modules.clone()))
        .unwrap_or_default();

    let uv = var("PREBIND_UV").or_else(|| probe.and_then(NodeProbe::uv_major));

    let armv = var("ARM_VERSION").or_else(|| {
        if arch == "arm64" {
            Some("8".to_string())
        } else {
            probe
                .and_then(|p| p.arm_version.clone())
                .filter(|v| !v.is_empty())
        }
    });

    Environment {
        arch,
        platform,
        libc,
        runtime,
        abi,
        uv,
        armv,
    }
}

/// Detect the environment of this process.
pub fn detect() -> Environment {
    let probe = NodeProbe::run();
    if probe.is_none() {
        tracing::debug!("No usable node executable; ABI-specific prebuilds will not match");
    }
    let env = resolve(
        &|name| std::env::var(name).ok(),
        probe.as_ref(),
        Path::new(ALPINE_RELEASE).exists(),
    );
    tracing::debug!("Detected environment: {env}");
    env
}

/// The environment of this process, detected once and then reused.
pub fn current() -> &'static Environment {
    static CURRENT: OnceLock<Environment> = OnceLock::new();
    CURRENT.get_or_init(detect)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn probe() -> NodeProbe {
        NodeProbe {
            modules: "115".to_string(),
            uv: Some("1.46.0".to_string()),
            arm_version: Some("7".to_string()),
        }
    }

    #[test]
    fn test_variables_win_over_probe() {
        let env = resolve(
            &vars(&[
                ("npm_config_arch", "arm"),
                ("npm_config_platform", "linux"),
                ("LIBC", "musl"),
                ("ARM_VERSION", "6"),
                ("PREBIND_ABI", "108"),
            ]),
            Some(&probe()),
            false,
        );
        assert_eq!(env.arch, "arm");
        assert_eq!(env.platform, "linux");
        assert_eq!(env.libc, Libc::Musl);
        assert_eq!(env.abi, "108");
        assert_eq!(env.uv.as_deref(), Some("1"));
        assert_eq!(env.armv.as_deref(), Some("6"));
    }

    #[test]
    fn test_probe_fills_runtime_values() {
        let env = resolve(
            &vars(&[("npm_config_arch", "arm"), ("npm_config_platform", "linux")]),
            Some(&probe()),
            false,
        );
        assert_eq!(env.abi, "115");
        assert_eq!(env.uv.as_deref(), Some("1"));
        assert_eq!(env.armv.as_deref(), Some("7"));
        assert_eq!(env.runtime, Runtime::Node);
    }

    #[test]
    fn test_arm64_implies_armv8() {
        let env = resolve(&vars(&[("npm_config_arch", "arm64")]), Some(&probe()), false);
        assert_eq!(env.armv.as_deref(), Some("8"));
    }

    #[test]
    fn test_defaults_without_node() {
        let env = resolve(&vars(&[("npm_config_arch", "x64")]), None, false);
        assert_eq!(env.abi, "");
        assert_eq!(env.uv, None);
        assert_eq!(env.armv, None);
    }

    #[test]
    fn test_alpine_means_musl_on_linux_only() {
        let linux = resolve(&vars(&[("npm_config_platform", "linux")]), None, true);
        assert_eq!(linux.libc, Libc::Musl);
        let darwin = resolve(&vars(&[("npm_config_platform", "darwin")]), None, true);
        assert_eq!(darwin.libc, Libc::Glibc);
    }

    #[test]
    fn test_electron_runtime() {
        let env = resolve(&vars(&[("ELECTRON_RUN_AS_NODE", "1")]), None, false);
        assert_eq!(env.runtime, Runtime::Electron);
        let env = resolve(&vars(&[("PREBIND_RUNTIME", "node-webkit")]), None, false);
        assert_eq!(env.runtime, Runtime::NodeWebkit);
    }

    #[test]
    fn test_empty_variables_are_unset() {
        let env = resolve(
            &vars(&[("npm_config_arch", ""), ("PREBIND_ABI", "")]),
            Some(&probe()),
            false,
        );
        assert_eq!(env.arch, node_arch(std::env::consts::ARCH));
        assert_eq!(env.abi, "115");
    }

    #[test]
    fn test_uv_major() {
        assert_eq!(probe().uv_major().as_deref(), Some("1"));
        let empty = NodeProbe::default();
        assert_eq!(empty.uv_major(), None);
    }
}
