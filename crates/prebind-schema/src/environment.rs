//! The execution environment prebuilds are matched against.
//!
//! Values use the naming of the Node.js ecosystem (`x64`, `arm64`, `darwin`,
//! `win32`) because that is how prebuild directories and files are named.

use serde::{Deserialize, Serialize};

/// C library flavor of the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Libc {
    /// GNU C library (most Linux distributions).
    #[default]
    Glibc,
    /// musl libc (Alpine and other minimal distributions).
    Musl,
}

impl Libc {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Glibc => "glibc",
            Self::Musl => "musl",
        }
    }
}

impl std::fmt::Display for Libc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Libc {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "glibc" => Ok(Self::Glibc),
            "musl" => Ok(Self::Musl),
            _ => Err(format!("Unknown libc: {s}")),
        }
    }
}

/// JavaScript runtime family that will load the native module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Runtime {
    /// Plain Node.js. Also the generic keyword used by N-API builds.
    #[default]
    Node,
    /// Electron (main or renderer process).
    Electron,
    /// NW.js, formerly node-webkit.
    NodeWebkit,
}

impl Runtime {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Electron => "electron",
            Self::NodeWebkit => "node-webkit",
        }
    }
}

impl std::fmt::Display for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Runtime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "node" => Ok(Self::Node),
            "electron" => Ok(Self::Electron),
            "node-webkit" => Ok(Self::NodeWebkit),
            _ => Err(format!("Unknown runtime: {s}")),
        }
    }
}

/// Immutable description of the environment a prebuild must run in.
///
/// Built once per process and passed by reference into the compatibility
/// filter and the ranker. Every field is either a concrete value or its
/// documented default:
///
/// - `abi` defaults to the empty string, which matches no ABI-specific build
/// - `uv` and `armv` default to unset, which only matches builds that do not
///   constrain those dimensions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    /// CPU architecture in Node naming (`x64`, `arm64`, `ia32`, ...).
    pub arch: String,
    /// Operating system in Node naming (`linux`, `darwin`, `win32`, ...).
    pub platform: String,
    /// C library flavor.
    pub libc: Libc,
    /// Runtime family.
    pub runtime: Runtime,
    /// Native module ABI version (`process.versions.modules`).
    pub abi: String,
    /// Major version of libuv, if known.
    pub uv: Option<String>,
    /// ARM sub-revision (`7`, `8`), if known.
    pub armv: Option<String>,
}

impl Environment {
    /// Apply a set of overrides on top of this environment.
    ///
    /// An override of `armv` is applied as-is. When `arch` changes and no
    /// `armv` is given, the ARM version is re-derived: `8` for `arm64`,
    /// unset otherwise.
    pub fn with_overrides(mut self, overrides: &EnvironmentOverrides) -> Self {
        if let Some(arch) = &overrides.arch {
            if arch != &self.arch && overrides.armv.is_none() {
                self.armv = (arch == "arm64").then(|| "8".to_string());
            }
            self.arch.clone_from(arch);
        }
        if let Some(platform) = &overrides.platform {
            self.platform.clone_from(platform);
        }
        if let Some(libc) = overrides.libc {
            self.libc = libc;
        }
        if let Some(runtime) = overrides.runtime {
            self.runtime = runtime;
        }
        if let Some(abi) = &overrides.abi {
            self.abi.clone_from(abi);
        }
        if let Some(uv) = &overrides.uv {
            self.uv = non_empty(uv);
        }
        if let Some(armv) = &overrides.armv {
            self.armv = non_empty(armv);
        }
        self
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{} {} abi{} {}",
            self.platform, self.arch, self.runtime, self.abi, self.libc
        )?;
        if let Some(uv) = &self.uv {
            write!(f, " uv{uv}")?;
        }
        if let Some(armv) = &self.armv {
            write!(f, " armv{armv}")?;
        }
        Ok(())
    }
}

/// Partial environment used to override detected values.
///
/// Deserialized from the `[environment]` table of `prebind.toml` and filled
/// from command line flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentOverrides {
    /// Architecture override.
    pub arch: Option<String>,
    /// Platform override.
    pub platform: Option<String>,
    /// C library override.
    pub libc: Option<Libc>,
    /// Runtime override.
    pub runtime: Option<Runtime>,
    /// ABI version override.
    pub abi: Option<String>,
    /// libuv major version override. An empty string clears it.
    pub uv: Option<String>,
    /// ARM version override. An empty string clears it.
    pub armv: Option<String>,
}

impl EnvironmentOverrides {
    /// Merge two override sets; values in `other` win.
    pub fn merge(self, other: Self) -> Self {
        Self {
            arch: other.arch.or(self.arch),
            platform: other.platform.or(self.platform),
            libc: other.libc.or(self.libc),
            runtime: other.runtime.or(self.runtime),
            abi: other.abi.or(self.abi),
            uv: other.uv.or(self.uv),
            armv: other.armv.or(self.armv),
        }
    }
}

/// Map a Rust target architecture (`std::env::consts::ARCH`) to Node naming.
pub fn node_arch(rust_arch: &str) -> &str {
    match rust_arch {
        "x86_64" => "x64",
        "aarch64" => "arm64",
        "x86" => "ia32",
        "powerpc64" => "ppc64",
        "powerpc" => "ppc",
        "mips64" => "mips64el",
        other => other,
    }
}

/// Map a Rust target OS (`std::env::consts::OS`) to Node naming.
pub fn node_platform(rust_os: &str) -> &str {
    match rust_os {
        "macos" => "darwin",
        "windows" => "win32",
        other => other,
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
