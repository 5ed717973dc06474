//! Shared types and pure matching rules for prebind.
//!
//! Everything in this crate is free of I/O: parsing prebuild directory and
//! file names, deciding whether a candidate is compatible with an
//! [`Environment`], and ranking compatible candidates.

pub mod compat;
pub mod environment;
pub mod ident;
pub mod rank;
pub mod tags;
pub mod tuple;

// Re-exports
pub use compat::{is_compatible_tag_set, is_compatible_tuple};
pub use environment::{Environment, EnvironmentOverrides, Libc, Runtime};
pub use ident::{Descriptor, Ident, IdentError, Locator, Range};
pub use rank::{best_tag_set, best_tuple, compare_tag_sets, rank_tag_sets, rank_tuples};
pub use tags::{NATIVE_EXTENSION, TagSet};
pub use tuple::Tuple;

/// Name of the directory, relative to a package root, holding prebuilds.
pub const PREBUILDS_DIR: &str = "prebuilds";
