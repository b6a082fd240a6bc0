mod call_node_path;
mod codec;
mod collapse;
mod focus;
mod merge;
mod uint_array;

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use crate::profile::{ImplementationFilter, Thread};

pub use self::codec::{parse_transforms, stringify_transforms};
pub use self::collapse::{
    collapse_direct_recursion, collapse_function_subtree, collapse_resource,
    func_has_direct_recursive_call, func_has_recursive_call,
};
pub use self::focus::{focus_function, focus_inverted_subtree, focus_subtree};
pub use self::merge::{drop_function, merge_call_node, merge_function};
pub use self::uint_array::{decode_uint_array, encode_uint_array};

/// A single rewrite of a thread's call tree.
///
/// Call node paths are lists of function indices from the root. Function and resource indices
/// refer to the thread the transform is applied to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Transform {
    /// Only keep the samples that go through `call_node_path`, and make its last node the root.
    ///
    /// When `inverted` is set, `call_node_path` is a path of the inverted tree: it starts at the
    /// leaf function, and samples are cut off right above its last function instead.
    FocusSubtree {
        /// The call node to focus on.
        call_node_path: Vec<usize>,
        /// Implementation filter the path was selected under.
        implementation: ImplementationFilter,
        /// Whether the path is a path of the inverted tree.
        inverted: bool,
    },
    /// Only keep samples that contain the function, and make its first occurrence the root.
    FocusFunction {
        /// The function to focus on.
        func_index: usize,
    },
    /// Remove one call node, giving its time to its parent.
    MergeCallNode {
        /// The call node to merge away.
        call_node_path: Vec<usize>,
        /// Implementation filter the path was selected under.
        implementation: ImplementationFilter,
    },
    /// Remove a function from every stack, giving its time to its callers.
    MergeFunction {
        /// The function to merge away.
        func_index: usize,
    },
    /// Drop every sample that went through the function.
    DropFunction {
        /// The function to drop.
        func_index: usize,
    },
    /// Replace every run of functions from one resource by a single new function named after
    /// the resource.
    CollapseResource {
        /// The resource to collapse.
        resource_index: usize,
        /// The index that the new function ends up with in the transformed thread.
        collapsed_func_index: usize,
        /// Implementation filter the transform was chosen under.
        implementation: ImplementationFilter,
    },
    /// Turn direct recursion of a function into a single call.
    CollapseDirectRecursion {
        /// The recursive function.
        func_index: usize,
        /// Implementation filter the transform was chosen under. Calls in between that this
        /// filter hides do not interrupt the recursion.
        implementation: ImplementationFilter,
    },
    /// Attribute everything a function calls to the function itself.
    CollapseFunctionSubtree {
        /// The function whose subtree is collapsed.
        func_index: usize,
    },
}

/// The kinds of [`Transform`], without their parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformKind {
    /// [`Transform::FocusSubtree`]
    FocusSubtree,
    /// [`Transform::FocusFunction`]
    FocusFunction,
    /// [`Transform::MergeCallNode`]
    MergeCallNode,
    /// [`Transform::MergeFunction`]
    MergeFunction,
    /// [`Transform::DropFunction`]
    DropFunction,
    /// [`Transform::CollapseResource`]
    CollapseResource,
    /// [`Transform::CollapseDirectRecursion`]
    CollapseDirectRecursion,
    /// [`Transform::CollapseFunctionSubtree`]
    CollapseFunctionSubtree,
}

impl TransformKind {
    /// Every kind of transform.
    pub const ALL: [TransformKind; 8] = [
        TransformKind::FocusSubtree,
        TransformKind::FocusFunction,
        TransformKind::MergeCallNode,
        TransformKind::MergeFunction,
        TransformKind::DropFunction,
        TransformKind::CollapseResource,
        TransformKind::CollapseDirectRecursion,
        TransformKind::CollapseFunctionSubtree,
    ];

    /// The human-readable name of the transform.
    pub fn name(self) -> &'static str {
        match self {
            TransformKind::FocusSubtree => "focus-subtree",
            TransformKind::FocusFunction => "focus-function",
            TransformKind::MergeCallNode => "merge-call-node",
            TransformKind::MergeFunction => "merge-function",
            TransformKind::DropFunction => "drop-function",
            TransformKind::CollapseResource => "collapse-resource",
            TransformKind::CollapseDirectRecursion => "collapse-direct-recursion",
            TransformKind::CollapseFunctionSubtree => "collapse-function-subtree",
        }
    }

    /// The key that starts the transform's encoded form.
    pub fn short_key(self) -> &'static str {
        match self {
            TransformKind::FocusSubtree => "f",
            TransformKind::FocusFunction => "ff",
            TransformKind::MergeCallNode => "mcn",
            TransformKind::MergeFunction => "mf",
            TransformKind::DropFunction => "df",
            TransformKind::CollapseResource => "cr",
            TransformKind::CollapseDirectRecursion => "rec",
            TransformKind::CollapseFunctionSubtree => "cfs",
        }
    }

    /// Looks up a kind by its short key.
    pub fn from_short_key(key: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.short_key() == key)
    }
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Transform {
    /// The kind of this transform.
    pub fn kind(&self) -> TransformKind {
        match self {
            Transform::FocusSubtree { .. } => TransformKind::FocusSubtree,
            Transform::FocusFunction { .. } => TransformKind::FocusFunction,
            Transform::MergeCallNode { .. } => TransformKind::MergeCallNode,
            Transform::MergeFunction { .. } => TransformKind::MergeFunction,
            Transform::DropFunction { .. } => TransformKind::DropFunction,
            Transform::CollapseResource { .. } => TransformKind::CollapseResource,
            Transform::CollapseDirectRecursion { .. } => TransformKind::CollapseDirectRecursion,
            Transform::CollapseFunctionSubtree { .. } => TransformKind::CollapseFunctionSubtree,
        }
    }
}

/// Applies `transform` to `thread` and returns the transformed thread.
///
/// `default_category` is the category given to stacks that end up merging stacks of different
/// categories (see [`ProfileMeta::default_category`]).
///
///   [`ProfileMeta::default_category`]: crate::profile::ProfileMeta::default_category
pub fn apply_transform(thread: &Thread, transform: &Transform, default_category: usize) -> Thread {
    debug!("Applying {} to thread {}", transform.kind(), thread.name);
    match *transform {
        Transform::FocusSubtree {
            ref call_node_path,
            implementation,
            inverted,
        } => {
            if inverted {
                focus_inverted_subtree(thread, call_node_path, implementation)
            } else {
                focus_subtree(thread, call_node_path, implementation, default_category)
            }
        }
        Transform::FocusFunction { func_index } => {
            focus_function(thread, func_index, default_category)
        }
        Transform::MergeCallNode {
            ref call_node_path,
            implementation,
        } => merge_call_node(thread, call_node_path, implementation, default_category),
        Transform::MergeFunction { func_index } => {
            merge_function(thread, func_index, default_category)
        }
        Transform::DropFunction { func_index } => drop_function(thread, func_index),
        Transform::CollapseResource {
            resource_index,
            implementation,
            ..
        } => collapse_resource(thread, resource_index, implementation, default_category),
        Transform::CollapseDirectRecursion {
            func_index,
            implementation,
        } => collapse_direct_recursion(thread, func_index, implementation, default_category),
        Transform::CollapseFunctionSubtree { func_index } => {
            collapse_function_subtree(thread, func_index, default_category)
        }
    }
}

/// An ordered list of transforms, applied first to last.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TransformStack(Vec<Transform>);

impl TransformStack {
    /// Creates an empty transform stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a transform on top of the stack.
    pub fn push(&mut self, transform: Transform) {
        self.0.push(transform);
    }

    /// Removes the transform at `first_popped` and every transform after it.
    pub fn pop_from(&mut self, first_popped: usize) {
        self.0.truncate(first_popped);
    }

    /// The transforms, in the order they are applied.
    pub fn transforms(&self) -> &[Transform] {
        &self.0
    }

    /// Returns the number of transforms.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no transforms.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Applies every transform to `thread` in order.
    pub fn apply(&self, thread: &Thread, default_category: usize) -> Thread {
        let mut transformed: Option<Thread> = None;
        for transform in &self.0 {
            let input = transformed.as_ref().unwrap_or(thread);
            transformed = Some(apply_transform(input, transform, default_category));
        }
        transformed.unwrap_or_else(|| thread.clone())
    }
}

impl From<Vec<Transform>> for TransformStack {
    fn from(transforms: Vec<Transform>) -> Self {
        TransformStack(transforms)
    }
}

impl FromIterator<Transform> for TransformStack {
    fn from_iter<I: IntoIterator<Item = Transform>>(iter: I) -> Self {
        TransformStack(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a TransformStack {
    type Item = &'a Transform;
    type IntoIter = std::slice::Iter<'a, Transform>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for TransformStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&stringify_transforms(&self.0))
    }
}

impl FromStr for TransformStack {
    type Err = Infallible;

    /// Parses an encoded transform stack. Malformed transforms are skipped with a warning.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(TransformStack(parse_transforms(s)))
    }
}
