use std::sync::Arc;

use crate::profile::{
    update_thread_stacks, ImplementationFilter, StackIndexMap, StackTableBuilder, Thread,
};

/// Removes the call node at `call_node_path`: its time goes to its parent, and its children
/// become children of its parent.
///
/// Only the node at the exact path is merged. Frames that `implementation` hides may appear
/// anywhere between the functions of the path. An empty path merges nothing.
pub fn merge_call_node(
    thread: &Thread,
    call_node_path: &[usize],
    implementation: ImplementationFilter,
    default_category: usize,
) -> Thread {
    let stack_table = &thread.stack_table;
    let path_len = call_node_path.len();
    let mut builder = StackTableBuilder::with_capacity(default_category, stack_table.length);
    let mut map = StackIndexMap::new(stack_table.length);

    // Whether a stack still follows the path, and how many of its functions it has matched.
    let mut on_path: Vec<bool> = Vec::with_capacity(stack_table.length);
    let mut depths: Vec<usize> = Vec::with_capacity(stack_table.length);

    for stack in 0..stack_table.length {
        let prefix = stack_table.prefix[stack];
        let (prefix_on_path, prefix_depth) = match prefix {
            Some(prefix) => (on_path[prefix], depths[prefix]),
            None => (true, 0),
        };

        let mut stack_on_path = false;
        let mut depth = prefix_depth;
        if prefix_on_path && prefix_depth < path_len {
            let func = thread.func_for_stack(stack);
            if func == call_node_path[prefix_depth] {
                stack_on_path = true;
                depth += 1;
            } else if !implementation.matches_func(thread, func) {
                stack_on_path = true;
            }
        }
        on_path.push(stack_on_path);
        depths.push(depth);

        let new_prefix = map.get(prefix);
        if stack_on_path && depth == path_len {
            map.set(stack, new_prefix);
        } else {
            let new_stack = builder.index_for_old_stack(stack_table, stack, new_prefix);
            map.set(stack, Some(new_stack));
        }
    }

    update_thread_stacks(thread, Arc::new(builder.finish()), |stack| map.get(stack))
}

/// Removes `func_index` from every stack. Its time goes to its callers.
pub fn merge_function(thread: &Thread, func_index: usize, default_category: usize) -> Thread {
    let stack_table = &thread.stack_table;
    let mut builder = StackTableBuilder::with_capacity(default_category, stack_table.length);
    let mut map = StackIndexMap::new(stack_table.length);

    for stack in 0..stack_table.length {
        let new_prefix = map.get(stack_table.prefix[stack]);
        if thread.func_for_stack(stack) == func_index {
            map.set(stack, new_prefix);
        } else {
            let new_stack = builder.index_for_old_stack(stack_table, stack, new_prefix);
            map.set(stack, Some(new_stack));
        }
    }

    update_thread_stacks(thread, Arc::new(builder.finish()), |stack| map.get(stack))
}

/// Drops every sample whose stack contains `func_index`.
///
/// The stack table is shared with `thread`; only the samples change.
pub fn drop_function(thread: &Thread, func_index: usize) -> Thread {
    let stack_table = &thread.stack_table;
    let mut contains_func: Vec<bool> = Vec::with_capacity(stack_table.length);
    for stack in 0..stack_table.length {
        let prefix_contains_func =
            stack_table.prefix[stack].map_or(false, |prefix| contains_func[prefix]);
        contains_func.push(prefix_contains_func || thread.func_for_stack(stack) == func_index);
    }

    update_thread_stacks(thread, Arc::clone(stack_table), |stack| {
        stack.filter(|&stack| !contains_func[stack])
    })
}
