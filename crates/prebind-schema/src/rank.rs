//! Ranking of compatible candidates.
//!
//! Sorting is stable, so candidates that tie on every criterion keep their
//! enumeration order and the first one seen wins.

use std::cmp::{Ordering, Reverse};

use crate::compat::{is_compatible_tag_set, is_compatible_tuple};
use crate::environment::{Environment, Runtime};
use crate::tags::TagSet;
use crate::tuple::Tuple;

/// Order tuples best-first: fewer architectures win.
pub fn rank_tuples(tuples: &mut [Tuple]) {
    tuples.sort_by_key(|tuple| tuple.architectures.len());
}

/// Compare two tag sets for the given runtime; `Less` means `a` ranks higher.
///
/// Precedence:
/// 1. exact runtime match over runtime-agnostic builds
/// 2. an explicit ABI over a pure N-API build
/// 3. higher specificity
pub fn compare_tag_sets(a: &TagSet, b: &TagSet, runtime: Runtime) -> Ordering {
    tag_key(a, runtime).cmp(&tag_key(b, runtime))
}

/// Order tag sets best-first for the given runtime.
pub fn rank_tag_sets(tag_sets: &mut [TagSet], runtime: Runtime) {
    tag_sets.sort_by(|a, b| compare_tag_sets(a, b, runtime));
}

fn tag_key(tags: &TagSet, runtime: Runtime) -> (bool, bool, Reverse<u32>) {
    (
        tags.runtime != Some(runtime),
        !tags.has_abi(),
        Reverse(tags.specificity),
    )
}

/// Pick the best directory tuple among raw directory names.
///
/// Invalid names are skipped. Returns `None` if nothing is compatible.
pub fn best_tuple<I, S>(names: I, env: &Environment) -> Option<Tuple>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tuples: Vec<Tuple> = names
        .into_iter()
        .filter_map(|name| Tuple::parse(name.as_ref()))
        .filter(|tuple| is_compatible_tuple(tuple, &env.platform, &env.arch))
        .collect();
    rank_tuples(&mut tuples);
    tuples.into_iter().next()
}

/// Pick the best artifact among raw file names of one tuple directory.
///
/// Names without the native extension are skipped. Returns `None` if nothing
/// is compatible.
pub fn best_tag_set<I, S>(files: I, env: &Environment) -> Option<TagSet>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut candidates: Vec<TagSet> = files
        .into_iter()
        .filter_map(|file| TagSet::parse(file.as_ref()))
        .filter(|tags| is_compatible_tag_set(tags, env))
        .collect();
    rank_tag_sets(&mut candidates, env.runtime);
    candidates.into_iter().next()
}
