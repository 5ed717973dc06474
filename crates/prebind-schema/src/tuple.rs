//! Directory tuples: the `<platform>-<arch1>+<arch2>` folders under `prebuilds/`.

use serde::{Deserialize, Serialize};

/// One platform/architecture grouping folder of prebuilt artifacts.
///
/// # Example
///
/// ```
/// use prebind_schema::Tuple;
///
/// let tuple = Tuple::parse("darwin-x64+arm64").unwrap();
/// assert_eq!(tuple.platform, "darwin");
/// assert_eq!(tuple.architectures, ["x64", "arm64"]);
/// assert!(Tuple::parse("linux-x64-musl").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tuple {
    /// Raw directory name, used as the path segment.
    pub name: String,
    /// Platform part of the name.
    pub platform: String,
    /// Architectures in the order they appear in the name. Never empty.
    pub architectures: Vec<String>,
}

impl Tuple {
    /// Parse a directory name.
    ///
    /// Returns `None` unless the name has exactly one `-`, a non-empty
    /// platform, and a `+`-separated architecture list with no empty element.
    pub fn parse(name: &str) -> Option<Self> {
        let mut parts = name.split('-');
        let (Some(platform), Some(archs), None) = (parts.next(), parts.next(), parts.next()) else {
            return None;
        };

        if platform.is_empty() {
            return None;
        }

        let architectures: Vec<String> = archs.split('+').map(str::to_string).collect();
        if architectures.iter().any(String::is_empty) {
            return None;
        }

        Some(Self {
            name: name.to_string(),
            platform: platform.to_string(),
            architectures,
        })
    }

    /// Whether this tuple bundles more than one architecture ("fat" build).
    pub fn is_multi_arch(&self) -> bool {
        self.architectures.len() > 1
    }
}
