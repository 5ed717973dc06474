//! Compatibility tags decoded from prebuild file names.
//!
//! A prebuild file name is a `.`-separated list of tags ending in the native
//! module extension, e.g. `node.napi.glibc.node` or `electron.abi110.node`.
//! Each segment is classified independently; segments that are not a known
//! tag are ignored.

use serde::{Deserialize, Serialize};

use crate::environment::{Libc, Runtime};

/// File extension of a dynamically loadable native module.
pub const NATIVE_EXTENSION: &str = "node";

/// Decoded compatibility attributes of one candidate artifact.
///
/// Absent fields are unconstrained dimensions. `abi`, `uv` and `armv` keep
/// the raw text following their prefix, which may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSet {
    /// File name the tags were decoded from.
    pub file: String,
    /// Number of recognized tags.
    pub specificity: u32,
    /// Runtime family the build targets.
    pub runtime: Option<Runtime>,
    /// Whether the build uses the ABI-stable N-API interface.
    pub napi: bool,
    /// Native module ABI version (`abi<N>`).
    pub abi: Option<String>,
    /// libuv major version (`uv<N>`).
    pub uv: Option<String>,
    /// ARM sub-revision (`armv<N>`).
    pub armv: Option<String>,
    /// C library flavor.
    pub libc: Option<Libc>,
}

impl TagSet {
    /// Parse a file name into a tag set.
    ///
    /// Returns `None` when the name does not end in [`NATIVE_EXTENSION`].
    ///
    /// # Example
    ///
    /// ```
    /// use prebind_schema::{Libc, Runtime, TagSet};
    ///
    /// let tags = TagSet::parse("node.napi.armv7.musl.node").unwrap();
    /// assert_eq!(tags.runtime, Some(Runtime::Node));
    /// assert!(tags.napi);
    /// assert_eq!(tags.armv.as_deref(), Some("7"));
    /// assert_eq!(tags.libc, Some(Libc::Musl));
    /// assert_eq!(tags.specificity, 4);
    ///
    /// assert!(TagSet::parse("binding.gyp").is_none());
    /// ```
    pub fn parse(file: &str) -> Option<Self> {
        let mut segments: Vec<&str> = file.split('.').collect();
        if segments.pop() != Some(NATIVE_EXTENSION) {
            return None;
        }

        let mut tags = Self {
            file: file.to_string(),
            ..Self::default()
        };

        for segment in segments {
            if tags.apply(segment) {
                tags.specificity += 1;
            }
        }

        Some(tags)
    }

    /// Classify one segment, returning whether it was a recognized tag.
    fn apply(&mut self, segment: &str) -> bool {
        if let Ok(runtime) = segment.parse::<Runtime>() {
            self.runtime = Some(runtime);
        } else if segment == "napi" {
            self.napi = true;
        } else if let Some(abi) = segment.strip_prefix("abi") {
            self.abi = Some(abi.to_string());
        } else if let Some(uv) = segment.strip_prefix("uv") {
            self.uv = Some(uv.to_string());
        } else if let Some(armv) = segment.strip_prefix("armv") {
            self.armv = Some(armv.to_string());
        } else if let Ok(libc) = segment.parse::<Libc>() {
            self.libc = Some(libc);
        } else {
            return false;
        }
        true
    }

    /// Whether the build carries an explicit, non-empty ABI version.
    pub fn has_abi(&self) -> bool {
        self.abi.as_deref().is_some_and(|abi| !abi.is_empty())
    }

    /// Whether the build works under any runtime family.
    ///
    /// Only N-API builds tagged with the generic `node` runtime qualify; an
    /// N-API build tagged `electron` is still electron-only.
    pub fn is_runtime_agnostic(&self) -> bool {
        self.runtime == Some(Runtime::Node) && self.napi
    }
}
