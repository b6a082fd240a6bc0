//! Profmorph holds sampled call-stack profiles in a de-duplicated, columnar data model and
//! rewrites them with a chain of structural _transforms_ for interactive call-tree exploration.
//!
//! A profile, much like the processed profiles that the Firefox Profiler works with, is a set
//! of threads. Each thread is a bundle of parallel-array tables: samples point into a [stack
//! table], stacks point at frames, frames at functions, functions at resources and libraries,
//! and every string goes through a single [string table]. Stacks form a trie: a stack is a
//! `(prefix, frame)` pair, and two samples with the same call path share the same stack index.
//!
//! # Transforms
//!
//! Looking at a big call tree is a lot easier if you can cut it down to the part you care about.
//! The [`transforms`] module implements the eight rewrites a user can stack on top of each other:
//!
//!  - focus on a subtree (optionally of the inverted tree), or on a function,
//!  - merge a single call node, or a function everywhere it appears,
//!  - drop every sample that went through a function,
//!  - collapse a whole library into one node, direct recursion into a single call, or a
//!    function's subtree into the function itself.
//!
//! Every transform takes a thread and produces a brand new one. The input thread is never
//! touched, and tables that a transform does not need to rewrite are shared between the two.
//! Because stack indices change with every transform, the user's selection is tracked as a
//! [call node path] (a list of function indices), which each transform knows how to rewrite.
//!
//! A stack of transforms can be written as a compact, URL-friendly string such as
//! `f-combined-0w2~mf-3`, and read back with [`transforms::parse_transforms`].
//!
//! # Command-line use
//!
//! The `profmorph-transform` binary reads folded stack traces (the output of inferno's
//! `inferno-collapse-*` tools, among others), applies a transform stack and prints folded
//! stacks again, ready to be turned into a flame graph:
//!
//! ```console
//! $ perf script | inferno-collapse-perf > stacks.folded
//! $ profmorph-transform --funcs stacks.folded
//! $ profmorph-transform -t "mf-3~rec-combined-7" stacks.folded | inferno-flamegraph > profile.svg
//! ```
//!
//!   [stack table]: profile::StackTable
//!   [string table]: profile::UniqueStringArray
//!   [call node path]: profile::CallNodePath

#![deny(missing_docs)]

#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;

#[macro_use]
extern crate log;

/// The columnar profile data model.
///
/// See the [crate-level documentation] for details.
///
///   [crate-level documentation]: ../index.html
pub mod profile;

/// Structural rewrites of a thread's call tree, and their URL encoding.
///
/// See the [crate-level documentation] for details.
///
///   [crate-level documentation]: ../index.html
pub mod transforms;
