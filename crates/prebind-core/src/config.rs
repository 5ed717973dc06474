//! Project configuration parsed from a `prebind.toml` file.
//!
//! The file is optional. It can pin environment values (useful when
//! installing for another machine) and declare extra packages whose fixed
//! loader module should be regenerated in place.
//!
//! ```toml
//! [environment]
//! arch = "arm64"
//! abi = "115"
//!
//! [[loader]]
//! package = "@serialport/bindings-cpp"
//! path = "dist/load-bindings.js"
//! ```

use std::path::{Path, PathBuf};

use prebind_schema::{EnvironmentOverrides, Ident, IdentError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;

/// Config file name, looked up in the project root.
pub const FILE_NAME: &str = "prebind.toml";

/// Loader targets that are always known, as `(package, loader path)`.
pub const BUILTIN_LOADERS: &[(&str, &str)] =
    &[("@serialport/bindings-cpp", "dist/load-bindings.js")];

/// Errors raised while loading the config file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        /// Config path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema.
    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        /// Config path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: toml::de::Error,
    },

    /// A loader target names an invalid package.
    #[error("Invalid loader package: {0}")]
    InvalidIdent(#[from] IdentError),
}

/// A package whose loader module is regenerated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoaderTarget {
    /// Package name, e.g. `@serialport/bindings-cpp`.
    pub package: String,
    /// Loader module path relative to the package root.
    pub path: PathBuf,
}

/// Parsed `prebind.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Environment values that replace detected ones.
    #[serde(default)]
    pub environment: EnvironmentOverrides,
    /// Extra in-place loader targets.
    #[serde(default, rename = "loader")]
    pub loaders: Vec<LoaderTarget>,
}

impl Config {
    /// Load the config of a project root.
    ///
    /// A missing file yields the default config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(FILE_NAME);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No {FILE_NAME} in {}", root.display());
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Io { path, source }),
        };
        Self::parse(&content).map_err(|source| ConfigError::Parse { path, source })
    }

    /// Parse config text.
    ///
    /// # Errors
    ///
    /// Returns the TOML error if the text does not match the schema.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Built-in loader targets followed by configured ones.
    ///
    /// A configured entry for a built-in package replaces the built-in path.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured package name is not a valid ident.
    pub fn loader_targets(&self) -> Result<Vec<(Ident, PathBuf)>, ConfigError> {
        let mut targets: Vec<(Ident, PathBuf)> = Vec::new();
        let builtins = BUILTIN_LOADERS
            .iter()
            .map(|(package, path)| ((*package).to_string(), PathBuf::from(path)));
        let configured = self
            .loaders
            .iter()
            .map(|target| (target.package.clone(), target.path.clone()));

        for (package, path) in builtins.chain(configured) {
            let ident = Ident::parse(&package)?;
            match targets.iter_mut().find(|(known, _)| *known == ident) {
                Some(existing) => existing.1 = path,
                None => targets.push((ident, path)),
            }
        }
        Ok(targets)
    }
}
