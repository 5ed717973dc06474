//! Artifact locator: find the prebuild of a package that fits the environment.
//!
//! Selection is a two-stage funnel. The `prebuilds/` directory holds one
//! folder per platform/architecture tuple, and each tuple holds one file per
//! runtime/ABI flavor:
//!
//! ```text
//! prebuilds/
//! ├── darwin-x64+arm64/
//! │   ├── node.napi.node
//! │   └── electron.abi110.node
//! └── linux-x64/
//!     ├── node.napi.glibc.node
//!     └── node.napi.musl.node
//! ```
//!
//! The best tuple is chosen first, then the best file inside it. A package
//! without a match is a normal outcome, reported as `Ok(None)`.

use std::path::{Path, PathBuf};

use prebind_schema::{Environment, PREBUILDS_DIR, TagSet, Tuple, best_tag_set, best_tuple};

use crate::fs::{FsError, PackageFs};

/// The winning artifact of a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prebuild {
    /// Tuple directory the artifact was found in.
    pub tuple: Tuple,
    /// Decoded tags of the artifact.
    pub tags: TagSet,
    /// Full path: the package root joined with `prebuilds/<tuple>/<file>`.
    pub path: PathBuf,
}

impl Prebuild {
    /// Path of the artifact relative to the package root.
    pub fn relative_path(&self) -> PathBuf {
        Path::new(PREBUILDS_DIR)
            .join(&self.tuple.name)
            .join(&self.tags.file)
    }
}

/// Locate the best prebuild under `package_root`.
///
/// # Errors
///
/// Returns an error only for I/O failures. A package without a `prebuilds`
/// directory, or without a compatible tuple or file, yields `Ok(None)`.
pub async fn locate(
    package_root: &Path,
    fs: &dyn PackageFs,
    env: &Environment,
) -> Result<Option<Prebuild>, FsError> {
    let prebuilds = package_root.join(PREBUILDS_DIR);

    let entries = match fs.read_dir(&prebuilds).await {
        Ok(entries) => entries,
        Err(e) if e.is_not_found() => {
            tracing::debug!("No {PREBUILDS_DIR} directory in {}", package_root.display());
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    let Some(tuple) = best_tuple(&entries, env) else {
        tracing::debug!(
            "No tuple for {}-{} among {entries:?}",
            env.platform,
            env.arch
        );
        return Ok(None);
    };
    tracing::debug!("Selected tuple {}", tuple.name);

    let tuple_dir = prebuilds.join(&tuple.name);
    let files = fs.read_dir(&tuple_dir).await?;

    let Some(tags) = best_tag_set(&files, env) else {
        tracing::debug!("No prebuild in {} matches {env}", tuple.name);
        return Ok(None);
    };
    tracing::debug!("Selected prebuild {}", tags.file);

    let path = tuple_dir.join(&tags.file);
    Ok(Some(Prebuild { tuple, tags, path }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::LocalFs;
    use prebind_schema::{Libc, Runtime};
    use tempfile::{TempDir, tempdir};

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

    fn package(files: &[&str]) -> TempDir {
        let dir = tempdir().unwrap();
        for file in files {
            let path = dir.path().join(file);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, file.as_bytes()).unwrap();
        }
        dir
    }

    async fn locate_in(dir: &TempDir, env: &Environment) -> Option<Prebuild> {
        let fs = LocalFs::new(dir.path());
        locate(dir.path(), &fs, env).await.unwrap()
    }

    #[tokio::test]
    async fn test_picks_runtime_specific_file() {
        let dir = package(&[
            "prebuilds/linux-x64/node.abi93.node",
            "prebuilds/linux-x64/electron.abi93.node",
        ]);

        let prebuild = locate_in(&dir, &env()).await.unwrap();
        assert_eq!(
            prebuild.path,
            dir.path().join("prebuilds/linux-x64/node.abi93.node")
        );
        assert_eq!(
            prebuild.relative_path(),
            Path::new("prebuilds/linux-x64/node.abi93.node")
        );
    }

    #[tokio::test]
    async fn test_wrong_platform_is_not_found() {
        let dir = package(&["prebuilds/darwin-x64/node.napi.node"]);
        assert!(locate_in(&dir, &env()).await.is_none());
    }

    #[tokio::test]
    async fn test_missing_prebuilds_dir_is_not_found() {
        let dir = package(&["package.json"]);
        assert!(locate_in(&dir, &env()).await.is_none());
    }

    #[tokio::test]
    async fn test_prefers_single_arch_tuple() {
        let dir = package(&[
            "prebuilds/linux-arm64+x64/node.napi.node",
            "prebuilds/linux-x64/node.napi.node",
        ]);
        let prebuild = locate_in(&dir, &env()).await.unwrap();
        assert_eq!(prebuild.tuple.name, "linux-x64");
    }

    #[tokio::test]
    async fn test_no_fallback_to_second_tuple() {
        // Only the best tuple is searched, even if it has no usable file.
        let dir = package(&[
            "prebuilds/linux-x64/node.abi64.node",
            "prebuilds/linux-x64+arm64/node.napi.node",
        ]);
        assert!(locate_in(&dir, &env()).await.is_none());
    }

    #[tokio::test]
    async fn test_skips_noise_and_respects_libc() {
        let dir = package(&[
            "prebuilds/linux-x64/node.napi.musl.node",
            "prebuilds/linux-x64/node.napi.glibc.node",
            "prebuilds/linux-x64/README.md",
            "prebuilds/not-a-tuple-name/node.napi.node",
            "prebuilds/linux-x64/node.napi.node.sig",
        ]);
        let prebuild = locate_in(&dir, &env()).await.unwrap();
        assert_eq!(prebuild.tags.file, "node.napi.glibc.node");

        let musl = Environment {
            libc: Libc::Musl,
            ..env()
        };
        let prebuild = locate_in(&dir, &musl).await.unwrap();
        assert_eq!(prebuild.tags.file, "node.napi.musl.node");
    }

    #[tokio::test]
    async fn test_abi_build_preferred_over_napi() {
        let dir = package(&[
            "prebuilds/linux-x64/node.napi.node",
            "prebuilds/linux-x64/node.abi93.node",
        ]);
        let prebuild = locate_in(&dir, &env()).await.unwrap();
        assert_eq!(prebuild.tags.file, "node.abi93.node");
    }
}
