//! Installed project model and package-location capability.
//!
//! A [`Project`] is the set of packages installed under a project root,
//! together with their dependency edges. [`Linker`]s map a package identity
//! to the directory it is installed in, the way a package manager's install
//! strategy does.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use prebind_schema::{Descriptor, Ident, IdentError, Locator};
use serde::Deserialize;
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

use crate::fs::LocalFs;
use crate::router;

/// Reference given to the project root package.
pub const ROOT_REFERENCE: &str = "workspace:.";

const MANIFEST: &str = "package.json";
const NODE_MODULES: &str = "node_modules";

/// Errors raised while scanning a project or locating packages.
#[derive(Error, Debug)]
pub enum ProjectError {
    /// No linker can place the package on disk.
    #[error("The package {0} isn't supported by any of the available linkers")]
    UnsupportedPackage(Locator),

    /// A linker claimed the package but has no location for it.
    #[error("Package for {0} not found in the project")]
    UnknownPackage(Locator),

    /// A consumer's private copy would be picked up by other packages too.
    #[error(
        "Refusing to rewrite {consumer}: {} is also resolved by {}",
        .location.display(),
        join_locators(.dependents)
    )]
    SharedLocation {
        /// Consumer the private copy was meant for.
        consumer: Locator,
        /// Directory the copy would be written to.
        location: PathBuf,
        /// Other packages whose lookup stops at `location`.
        dependents: Vec<Locator>,
    },

    /// A `package.json` could not be read.
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        /// Manifest path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A `package.json` is not valid JSON or has an unexpected shape.
    #[error("Failed to parse {}: {source}", .path.display())]
    Manifest {
        /// Manifest path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// A package name is not a valid ident.
    #[error("Invalid package name in {}: {source}", .path.display())]
    Ident {
        /// Manifest path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: IdentError,
    },
}

/// The subset of `package.json` the project model needs.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageManifest {
    name: Option<String>,
    version: Option<String>,
    #[serde(default)]
    dependencies: BTreeMap<String, String>,
    #[serde(default)]
    optional_dependencies: BTreeMap<String, String>,
}

/// One installed package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    /// Resolved identity.
    pub locator: Locator,
    /// Declared version, if any.
    pub version: Option<String>,
    /// Dependency edges, regular dependencies first, each group sorted by name.
    pub dependencies: Vec<Descriptor>,
}

impl Package {
    /// The package's ident.
    pub fn ident(&self) -> &Ident {
        &self.locator.ident
    }

    /// First dependency matching a predicate.
    pub fn find_dependency(&self, pred: impl Fn(&Descriptor) -> bool) -> Option<&Descriptor> {
        self.dependencies.iter().find(|d| pred(d))
    }
}

/// Normalise a raw `package.json` range into a protocol-qualified range.
///
/// Bare semver ranges and dist-tags become `npm:` ranges; ranges that already
/// carry a protocol, and paths or URLs, are kept as-is.
pub fn normalize_range(range: &str) -> String {
    if range.contains(':') || range.contains('/') {
        range.to_string()
    } else {
        format!("npm:{range}")
    }
}

/// Maps a package identity to its on-disk location.
pub trait Linker: Send + Sync + std::fmt::Debug {
    /// Whether this linker knows where the package lives.
    fn supports_package(&self, locator: &Locator, project: &Project) -> bool;

    /// Directory of the package.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectError::UnknownPackage`] if the package has no location,
    /// or [`ProjectError::SharedLocation`] if its location is not private.
    fn find_package_location(
        &self,
        locator: &Locator,
        project: &Project,
    ) -> Result<PathBuf, ProjectError>;
}

/// Linker for the classic `node_modules` layout.
///
/// Scanned packages live where they were found. Rerouted native loaders
/// live in the consumer's own `node_modules`, which node resolution checks
/// before any hoisted copy. That directory is refused when a package
/// installed below the consumer (or anywhere, for the project root) would
/// resolve the loader there too.
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeModulesLinker;

impl NodeModulesLinker {
    fn routed_location(locator: &Locator, project: &Project) -> Option<(Locator, PathBuf)> {
        let consumer = router::routed_consumer(&locator.reference)?;
        let consumer_dir = project.location_of(&consumer)?;
        let location = consumer_dir.join(NODE_MODULES).join(locator.ident.path());
        Some((consumer, location))
    }
}

impl Linker for NodeModulesLinker {
    fn supports_package(&self, locator: &Locator, project: &Project) -> bool {
        project.location_of(locator).is_some()
            || Self::routed_location(locator, project).is_some()
    }

    fn find_package_location(
        &self,
        locator: &Locator,
        project: &Project,
    ) -> Result<PathBuf, ProjectError> {
        if let Some(location) = project.location_of(locator) {
            return Ok(location.to_path_buf());
        }
        let (consumer, location) = Self::routed_location(locator, project)
            .ok_or_else(|| ProjectError::UnknownPackage(locator.clone()))?;

        let dependents = project.resolved_at(&consumer, &locator.ident, &location);
        if !dependents.is_empty() {
            return Err(ProjectError::SharedLocation {
                consumer,
                location,
                dependents,
            });
        }
        Ok(location)
    }
}

/// A package's location and a filesystem view scoped to it.
///
/// The view is only valid for the duration of one package's processing;
/// drop it before moving on to the next package.
#[derive(Debug, Clone)]
pub struct PackageEnvironment {
    /// Directory of the package.
    pub location: PathBuf,
    /// View rooted at `location`.
    pub fs: LocalFs,
}

/// Installed packages of a project.
#[derive(Debug)]
pub struct Project {
    root: PathBuf,
    packages: Vec<Package>,
    locations: HashMap<Locator, PathBuf>,
    duplicates: Vec<(Locator, PathBuf)>,
    linkers: Vec<Box<dyn Linker>>,
}

impl Project {
    /// Create an empty project using the default linkers.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            packages: Vec::new(),
            locations: HashMap::new(),
            duplicates: Vec::new(),
            linkers: vec![Box::new(NodeModulesLinker)],
        }
    }

    /// Scan the root package and everything installed under `node_modules`.
    ///
    /// Packages are listed in walk order (sorted by file name). Directories
    /// without a readable `package.json` are skipped with a warning; a broken
    /// root manifest is an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the root `package.json` exists but cannot be read
    /// or parsed.
    pub fn scan(root: impl Into<PathBuf>) -> Result<Self, ProjectError> {
        let mut project = Self::new(root);
        let root = project.root.clone();

        let root_manifest = root.join(MANIFEST);
        if root_manifest.exists() {
            let manifest = read_manifest(&root_manifest)?;
            let name = manifest
                .name
                .clone()
                .unwrap_or_else(|| "root-workspace".to_string());
            let reference = ROOT_REFERENCE.to_string();
            let package = build_package(&root_manifest, &name, reference, manifest)?;
            project.insert(package, root.clone());
        }

        let node_modules = root.join(NODE_MODULES);
        if !node_modules.is_dir() {
            tracing::debug!("No {NODE_MODULES} in {}", root.display());
            return Ok(project);
        }

        for entry in WalkDir::new(&node_modules)
            .follow_links(true)
            // Manifests before nested node_modules, so parents come first.
            .sort_by(|a, b| {
                a.file_type()
                    .is_dir()
                    .cmp(&b.file_type().is_dir())
                    .then_with(|| a.file_name().cmp(b.file_name()))
            })
            .into_iter()
            .filter_entry(is_relevant)
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
        {
            let manifest_path = entry.path();
            let Some(dir) = manifest_path.parent() else {
                continue;
            };
            match scan_package(manifest_path, dir) {
                Ok(package) => project.insert(package, dir.to_path_buf()),
                Err(e) => tracing::warn!("Skipping {}: {e}", dir.display()),
            }
        }

        tracing::debug!("Scanned {} packages in {}", project.packages.len(), root.display());
        Ok(project)
    }

    /// Register a package installed at `location`.
    ///
    /// The first location registered for a locator wins; later duplicates
    /// are kept aside in [`Project::duplicates`].
    pub fn insert(&mut self, package: Package, location: PathBuf) {
        if self.locations.contains_key(&package.locator) {
            tracing::debug!(
                "Ignoring duplicate install of {} at {}",
                package.locator,
                location.display()
            );
            self.duplicates.push((package.locator, location));
            return;
        }
        self.locations.insert(package.locator.clone(), location);
        self.packages.push(package);
    }

    /// Project root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Installed packages in enumeration order.
    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    /// Extra install locations of packages already registered elsewhere.
    /// These copies are never rewritten.
    pub fn duplicates(&self) -> &[(Locator, PathBuf)] {
        &self.duplicates
    }

    /// Installs other than `owner`'s that depend on `ident` and would load
    /// it from `location`, following node's lookup through parent
    /// `node_modules` directories. Duplicate installs count too.
    ///
    /// An install is shielded when a copy of `ident` already sits in a
    /// `node_modules` between it and `location`.
    pub fn resolved_at(&self, owner: &Locator, ident: &Ident, location: &Path) -> Vec<Locator> {
        let Some(modules) = location.ancestors().find(|p| file_name(p) == NODE_MODULES) else {
            return Vec::new();
        };
        let Some(base) = modules.parent() else {
            return Vec::new();
        };

        let installs = self
            .packages
            .iter()
            .filter_map(|p| Some((&p.locator, self.location_of(&p.locator)?)))
            .chain(self.duplicates.iter().map(|(l, dir)| (l, dir.as_path())));

        installs
            .filter(|(locator, dir)| *locator != owner && dir.starts_with(modules))
            .filter(|(locator, _)| self.depends_on(locator, ident))
            .filter(|(_, dir)| {
                !dir.ancestors()
                    .take_while(|a| *a != base)
                    .filter(|a| file_name(a) != NODE_MODULES)
                    .any(|a| a.join(NODE_MODULES).join(ident.path()).exists())
            })
            .map(|(locator, _)| locator.clone())
            .collect()
    }

    fn depends_on(&self, locator: &Locator, ident: &Ident) -> bool {
        self.packages
            .iter()
            .find(|p| p.locator == *locator)
            .is_some_and(|p| p.dependencies.iter().any(|d| d.ident == *ident))
    }

    /// Directory a scanned package was found in.
    pub fn location_of(&self, locator: &Locator) -> Option<&Path> {
        self.locations.get(locator).map(PathBuf::as_path)
    }

    /// Resolve a package to its directory and a filesystem view of it.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectError::UnsupportedPackage`] when no linker supports
    /// the package, and [`ProjectError::SharedLocation`] when a consumer's
    /// private copy would leak to other packages.
    pub fn package_environment(
        &self,
        locator: &Locator,
    ) -> Result<PackageEnvironment, ProjectError> {
        let linker = self
            .linkers
            .iter()
            .find(|linker| linker.supports_package(locator, self))
            .ok_or_else(|| ProjectError::UnsupportedPackage(locator.clone()))?;

        let location = linker.find_package_location(locator, self)?;
        Ok(PackageEnvironment {
            fs: LocalFs::new(&location),
            location,
        })
    }
}

fn join_locators(locators: &[Locator]) -> String {
    locators
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn read_manifest(path: &Path) -> Result<PackageManifest, ProjectError> {
    let content = std::fs::read(path).map_err(|source| ProjectError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&content).map_err(|source| ProjectError::Manifest {
        path: path.to_path_buf(),
        source,
    })
}

fn scan_package(manifest_path: &Path, dir: &Path) -> Result<Package, ProjectError> {
    let manifest = read_manifest(manifest_path)?;
    let name = match &manifest.name {
        Some(name) => name.clone(),
        None => dir_ident(dir),
    };
    let reference = match &manifest.version {
        Some(version) => format!("npm:{version}"),
        None => format!("file:{}", dir.display()),
    };
    build_package(manifest_path, &name, reference, manifest)
}

fn build_package(
    manifest_path: &Path,
    name: &str,
    reference: String,
    manifest: PackageManifest,
) -> Result<Package, ProjectError> {
    let ident_err = |source| ProjectError::Ident {
        path: manifest_path.to_path_buf(),
        source,
    };
    let ident = Ident::parse(name).map_err(ident_err)?;

    let mut dependencies = Vec::new();
    for (name, range) in manifest
        .dependencies
        .iter()
        .chain(&manifest.optional_dependencies)
    {
        let ident = Ident::parse(name).map_err(ident_err)?;
        let descriptor = Descriptor::new(ident, normalize_range(range));
        if !dependencies.contains(&descriptor) {
            dependencies.push(descriptor);
        }
    }

    Ok(Package {
        locator: Locator::new(ident, reference),
        version: manifest.version,
        dependencies,
    })
}

/// Ident implied by a package directory (`.../@scope/name` or `.../name`).
fn dir_ident(dir: &Path) -> String {
    let name = file_name(dir);
    match dir.parent().map(file_name) {
        Some(scope) if scope.starts_with('@') => format!("{scope}/{name}"),
        _ => name,
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn parent_name(path: &Path) -> Option<String> {
    path.parent().map(file_name)
}

fn is_scope_dir(path: &Path) -> bool {
    file_name(path).starts_with('@') && parent_name(path).as_deref() == Some(NODE_MODULES)
}

fn is_package_dir(path: &Path) -> bool {
    let name = file_name(path);
    if name.starts_with('.') || name == NODE_MODULES {
        return false;
    }
    match parent_name(path) {
        Some(parent) if parent == NODE_MODULES => !name.starts_with('@'),
        Some(parent) if parent.starts_with('@') => path
            .parent()
            .and_then(Path::parent)
            .is_some_and(|p| file_name(p) == NODE_MODULES),
        _ => false,
    }
}

/// Only descend into `node_modules`, scopes, package directories and their
/// manifests.
fn is_relevant(entry: &DirEntry) -> bool {
    if entry.depth() == 0 {
        return true;
    }
    let path = entry.path();
    if entry.file_type().is_dir() {
        file_name(path) == NODE_MODULES || is_scope_dir(path) || is_package_dir(path)
    } else {
        file_name(path) == MANIFEST && path.parent().is_some_and(is_package_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn fixture() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(
            root,
            "package.json",
            r#"{"name": "app", "dependencies": {"leveldown": "^6.1.0"}}"#,
        );
        write(
            root,
            "node_modules/leveldown/package.json",
            r#"{"name": "leveldown", "version": "6.1.1", "dependencies": {"node-gyp-build": "^4.3.0", "napi-macros": "~2.0.0"}}"#,
        );
        write(
            root,
            "node_modules/node-gyp-build/package.json",
            r#"{"name": "node-gyp-build", "version": "4.8.1"}"#,
        );
        write(
            root,
            "node_modules/@serialport/bindings-cpp/package.json",
            r#"{"name": "@serialport/bindings-cpp", "version": "10.8.0", "optionalDependencies": {"node-gyp-build": "4.6.0"}}"#,
        );
        write(
            root,
            "node_modules/@serialport/bindings-cpp/node_modules/debug/package.json",
            r#"{"name": "debug", "version": "4.3.4"}"#,
        );
        write(root, "node_modules/leveldown/lib/package.json", r#"{"name": "not-a-package"}"#);
        write(root, "node_modules/.bin/package.json", r#"{"name": "dot-bin"}"#);
        write(root, "node_modules/broken/package.json", "{ nope");
        dir
    }

    fn names(project: &Project) -> Vec<String> {
        project
            .packages()
            .iter()
            .map(|p| p.locator.to_string())
            .collect()
    }

    #[test]
    fn test_scan_finds_hoisted_scoped_and_nested() {
        let dir = fixture();
        let project = Project::scan(dir.path()).unwrap();

        assert_eq!(
            names(&project),
            [
                "app@workspace:.",
                "@serialport/bindings-cpp@npm:10.8.0",
                "debug@npm:4.3.4",
                "leveldown@npm:6.1.1",
                "node-gyp-build@npm:4.8.1",
            ]
        );
    }

    #[test]
    fn test_scan_records_dependencies() {
        let dir = fixture();
        let project = Project::scan(dir.path()).unwrap();

        let leveldown = &project.packages()[3];
        let deps: Vec<String> = leveldown.dependencies.iter().map(ToString::to_string).collect();
        assert_eq!(deps, ["napi-macros@npm:~2.0.0", "node-gyp-build@npm:^4.3.0"]);

        let bindings = &project.packages()[1];
        assert!(bindings
            .find_dependency(|d| router::is_native_loader(&d.ident))
            .is_some());
    }

    #[test]
    fn test_package_environment_for_scanned_and_routed() {
        let dir = fixture();
        let project = Project::scan(dir.path()).unwrap();
        let leveldown = project.packages()[3].locator.clone();

        let env = project.package_environment(&leveldown).unwrap();
        assert_eq!(env.location, dir.path().join("node_modules/leveldown"));

        let dependency = Descriptor::parse("node-gyp-build@npm:^4.3.0").unwrap();
        let routed = router::reduce_dependency(&dependency, &leveldown, &crate::NullReporter);
        let target = Locator::new(routed.ident, routed.range);
        let env = project.package_environment(&target).unwrap();
        assert_eq!(
            env.location,
            dir.path().join("node_modules/leveldown/node_modules/node-gyp-build")
        );
    }

    fn routed_target(consumer: &Locator) -> Locator {
        let dependency = Descriptor::parse("node-gyp-build@npm:^4.0.0").unwrap();
        let routed = router::reduce_dependency(&dependency, consumer, &crate::NullReporter);
        Locator::new(routed.ident, routed.range)
    }

    fn loader_consumer(root: &Path, dir: &str, name: &str) {
        write(
            root,
            &format!("{dir}/package.json"),
            &format!(
                r#"{{"name": "{name}", "version": "1.0.0", "dependencies": {{"node-gyp-build": "^4.0.0"}}}}"#
            ),
        );
    }

    #[test]
    fn test_nested_dependent_blocks_private_copy() {
        let dir = tempdir().unwrap();
        loader_consumer(dir.path(), "node_modules/x", "x");
        loader_consumer(dir.path(), "node_modules/x/node_modules/y", "y");
        let project = Project::scan(dir.path()).unwrap();
        let x = Locator::parse("x@npm:1.0.0").unwrap();

        let err = project.package_environment(&routed_target(&x)).unwrap_err();
        let ProjectError::SharedLocation {
            consumer,
            location,
            dependents,
        } = &err
        else {
            panic!("expected a shared location, got {err}");
        };
        assert_eq!(*consumer, x);
        assert_eq!(
            *location,
            dir.path().join("node_modules/x/node_modules/node-gyp-build")
        );
        assert_eq!(*dependents, [Locator::parse("y@npm:1.0.0").unwrap()]);
        assert!(err.to_string().starts_with("Refusing to rewrite x@npm:1.0.0"));
    }

    #[test]
    fn test_nested_dependent_with_own_copy_is_shielded() {
        let dir = tempdir().unwrap();
        loader_consumer(dir.path(), "node_modules/x", "x");
        loader_consumer(dir.path(), "node_modules/x/node_modules/@s/y", "@s/y");
        write(
            dir.path(),
            "node_modules/x/node_modules/@s/y/node_modules/node-gyp-build/package.json",
            r#"{"name": "node-gyp-build", "version": "4.8.1"}"#,
        );
        let project = Project::scan(dir.path()).unwrap();
        let x = Locator::parse("x@npm:1.0.0").unwrap();

        let env = project.package_environment(&routed_target(&x)).unwrap();
        assert_eq!(
            env.location,
            dir.path().join("node_modules/x/node_modules/node-gyp-build")
        );
    }

    #[test]
    fn test_root_consumer_location_is_shared() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "package.json",
            r#"{"name": "app", "dependencies": {"node-gyp-build": "^4.0.0", "b": "1.0.0"}}"#,
        );
        loader_consumer(dir.path(), "node_modules/b", "b");
        write(
            dir.path(),
            "node_modules/node-gyp-build/package.json",
            r#"{"name": "node-gyp-build", "version": "4.8.1"}"#,
        );
        let project = Project::scan(dir.path()).unwrap();
        let app = Locator::parse("app@workspace:.").unwrap();

        let err = project.package_environment(&routed_target(&app)).unwrap_err();
        assert!(matches!(
            err,
            ProjectError::SharedLocation { ref dependents, .. }
                if *dependents == [Locator::parse("b@npm:1.0.0").unwrap()]
        ));
    }

    #[test]
    fn test_duplicates_are_recorded() {
        let dir = tempdir().unwrap();
        loader_consumer(dir.path(), "node_modules/a", "a");
        loader_consumer(dir.path(), "node_modules/b", "b");
        loader_consumer(dir.path(), "node_modules/b/node_modules/a", "a");
        let project = Project::scan(dir.path()).unwrap();

        assert_eq!(names(&project), ["a@npm:1.0.0", "b@npm:1.0.0"]);
        assert_eq!(
            project.duplicates(),
            [(
                Locator::parse("a@npm:1.0.0").unwrap(),
                dir.path().join("node_modules/b/node_modules/a")
            )]
        );
    }

    #[test]
    fn test_unknown_package_is_unsupported() {
        let dir = fixture();
        let project = Project::scan(dir.path()).unwrap();
        let missing = Locator::parse("ghost@npm:1.0.0").unwrap();

        let err = project.package_environment(&missing).unwrap_err();
        assert!(matches!(err, ProjectError::UnsupportedPackage(_)));
        assert!(err.to_string().contains("isn't supported by any of the available linkers"));
    }

    #[test]
    fn test_scan_without_node_modules() {
        let dir = tempdir().unwrap();
        let project = Project::scan(dir.path()).unwrap();
        assert!(project.packages().is_empty());
    }

    #[test]
    fn test_broken_root_manifest_is_an_error() {
        let dir = tempdir().unwrap();
        write(dir.path(), "package.json", "not json");
        assert!(matches!(
            Project::scan(dir.path()),
            Err(ProjectError::Manifest { .. })
        ));
    }

    #[test]
    fn test_normalize_range() {
        assert_eq!(normalize_range("^4.3.0"), "npm:^4.3.0");
        assert_eq!(normalize_range("latest"), "npm:latest");
        assert_eq!(normalize_range("workspace:*"), "workspace:*");
        assert_eq!(normalize_range("file:../local"), "file:../local");
        assert_eq!(normalize_range("user/repo"), "user/repo");
    }
}
