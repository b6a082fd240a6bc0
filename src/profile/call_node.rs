use ahash::RandomState;
use indexmap::IndexSet;

use super::Thread;

/// A call node, identified by the functions on the way from the root to it, root first.
///
/// Unlike stack indices, call node paths stay meaningful across transforms.
pub type CallNodePath = Vec<usize>;

columnar_table! {
    /// The call tree of a thread: like the stack table, but keyed on functions instead of
    /// frames, so stacks whose frames belong to the same functions share a call node.
    pub struct CallNodeTable => CallNodeRow {
        /// The parent call node, `None` for roots.
        pub prefix: Option<usize>,
        /// The function of the call node.
        pub func: usize,
        /// Category, merged over all stacks of the call node.
        pub category: usize,
        /// Subcategory, merged over all stacks of the call node.
        pub subcategory: usize,
        /// Number of ancestors.
        pub depth: usize,
    }
}

/// The call node table of a thread, and how its stacks map onto it.
#[derive(Debug, Clone)]
pub struct CallNodeInfo {
    call_node_table: CallNodeTable,
    stack_to_call_node: Vec<usize>,
    index: IndexSet<(Option<usize>, usize), RandomState>,
}

impl CallNodeInfo {
    /// Computes the call nodes of `thread`.
    pub fn new(thread: &Thread, default_category: usize) -> Self {
        let stack_table = &thread.stack_table;
        let mut call_node_table = CallNodeTable::with_capacity(stack_table.length);
        let mut stack_to_call_node = Vec::with_capacity(stack_table.length);
        let mut index = IndexSet::with_capacity_and_hasher(stack_table.length, RandomState::new());

        for stack in 0..stack_table.length {
            let prefix = stack_table.prefix[stack].map(|prefix| stack_to_call_node[prefix]);
            let func = thread.func_for_stack(stack);
            let category = stack_table.category[stack];
            let subcategory = stack_table.subcategory[stack];

            let (call_node, inserted) = index.insert_full((prefix, func));
            if inserted {
                let depth = prefix.map_or(0, |prefix| call_node_table.depth[prefix] + 1);
                call_node_table.push(CallNodeRow {
                    prefix,
                    func,
                    category,
                    subcategory,
                    depth,
                });
            } else if call_node_table.category[call_node] != category {
                call_node_table.category[call_node] = default_category;
                call_node_table.subcategory[call_node] = 0;
            } else if call_node_table.subcategory[call_node] != subcategory {
                call_node_table.subcategory[call_node] = 0;
            }
            stack_to_call_node.push(call_node);
        }

        CallNodeInfo {
            call_node_table,
            stack_to_call_node,
            index,
        }
    }

    /// The call node table.
    pub fn call_node_table(&self) -> &CallNodeTable {
        &self.call_node_table
    }

    /// Returns the call node that `stack` belongs to.
    pub fn call_node_for_stack(&self, stack: usize) -> usize {
        self.stack_to_call_node[stack]
    }

    /// Returns the call node at `path`, or `None` if there is none (or `path` is empty).
    pub fn call_node_index_from_path(&self, path: &[usize]) -> Option<usize> {
        let mut call_node = None;
        for &func in path {
            call_node = Some(self.index.get_index_of(&(call_node, func))?);
        }
        call_node
    }

    /// Returns the path of `call_node`.
    pub fn call_node_path(&self, call_node: usize) -> CallNodePath {
        let mut path = Vec::with_capacity(self.call_node_table.depth[call_node] + 1);
        let mut next = Some(call_node);
        while let Some(call_node) = next {
            path.push(self.call_node_table.func[call_node]);
            next = self.call_node_table.prefix[call_node];
        }
        path.reverse();
        path
    }
}

/// A call tree with sample weights, as far as path inversion is concerned.
pub trait CallTree {
    /// Returns the children of `call_node`, heaviest first.
    fn children(&self, call_node: usize) -> Vec<usize>;
}

/// Turns a path of the non-inverted tree into a path of the inverted tree.
///
/// Starting at `path`, follows the heaviest child down to a leaf and returns that leaf's path
/// reversed, so that the selection stays on the heaviest part of the tree. Returns an empty path
/// if `path` does not exist.
pub fn invert_call_node_path<T>(
    path: &[usize],
    call_tree: &T,
    call_node_info: &CallNodeInfo,
) -> CallNodePath
where
    T: CallTree + ?Sized,
{
    let mut call_node = match call_node_info.call_node_index_from_path(path) {
        Some(call_node) => call_node,
        None => return Vec::new(),
    };
    while let Some(&heaviest) = call_tree.children(call_node).first() {
        call_node = heaviest;
    }

    let mut inverted = call_node_info.call_node_path(call_node);
    inverted.reverse();
    inverted
}
