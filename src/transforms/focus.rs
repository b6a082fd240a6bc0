use std::sync::Arc;

use ahash::AHashMap;

use crate::profile::{
    update_thread_stacks, ImplementationFilter, StackIndexMap, StackTableBuilder, Thread,
};

/// Keeps the samples whose stack goes through `call_node_path`, cutting off everything above
/// the path's last function so that it becomes a root.
///
/// Frames that `implementation` hides may appear anywhere between the functions of the path.
/// An empty path keeps the thread as it is.
pub fn focus_subtree(
    thread: &Thread,
    call_node_path: &[usize],
    implementation: ImplementationFilter,
    default_category: usize,
) -> Thread {
    let stack_table = &thread.stack_table;
    let path_len = call_node_path.len();
    let mut builder = StackTableBuilder::with_capacity(default_category, stack_table.length);
    let mut map = StackIndexMap::new(stack_table.length);

    // How many functions of the path a stack has matched so far, `None` once it diverged.
    let mut matched: Vec<Option<usize>> = Vec::with_capacity(stack_table.length);

    for stack in 0..stack_table.length {
        let prefix = stack_table.prefix[stack];
        let prefix_matched = match prefix {
            Some(prefix) => matched[prefix],
            None => Some(0),
        };
        let stack_matched = prefix_matched.and_then(|depth| {
            if depth == path_len {
                return Some(depth);
            }
            let func = thread.func_for_stack(stack);
            if func == call_node_path[depth] {
                Some(depth + 1)
            } else if !implementation.matches_func(thread, func) {
                Some(depth)
            } else {
                None
            }
        });
        matched.push(stack_matched);

        if stack_matched == Some(path_len) {
            // Stacks on the path itself map to `None`, so the path's last stack becomes a root.
            let new_prefix = map.get(prefix);
            let new_stack = builder.index_for_old_stack(stack_table, stack, new_prefix);
            map.set(stack, Some(new_stack));
        } else {
            map.set(stack, None);
        }
    }

    update_thread_stacks(thread, Arc::new(builder.finish()), |stack| map.get(stack))
}

/// Focus on a subtree of the inverted tree.
///
/// `postfix` lists functions from the leaf towards the root. A sample is kept if its stack,
/// read from the leaf upwards, starts with those functions (ignoring frames `implementation`
/// hides), and is cut off right above the last of them. Should the functions match more than
/// once along a stack, the match closest to the leaf wins.
///
/// Stacks are only cut, never rebuilt, so the stack table is shared with `thread`.
pub fn focus_inverted_subtree(
    thread: &Thread,
    postfix: &[usize],
    implementation: ImplementationFilter,
) -> Thread {
    if postfix.is_empty() {
        return thread.clone();
    }

    let stack_table = &thread.stack_table;
    let convert_stack = |leaf: usize| {
        let mut matched = 0;
        let mut next = Some(leaf);
        while let Some(stack) = next {
            let func = thread.func_for_stack(stack);
            if func == postfix[matched] {
                matched += 1;
                if matched == postfix.len() {
                    return Some(stack);
                }
            } else if implementation.matches_func(thread, func) {
                return None;
            }
            next = stack_table.prefix[stack];
        }
        None
    };

    let mut converted: AHashMap<usize, Option<usize>> = AHashMap::default();
    update_thread_stacks(thread, Arc::clone(stack_table), |stack| {
        let stack = stack?;
        *converted
            .entry(stack)
            .or_insert_with(|| convert_stack(stack))
    })
}

/// Keeps the samples that contain `func_index`, with everything above its first (outermost)
/// occurrence cut off.
pub fn focus_function(thread: &Thread, func_index: usize, default_category: usize) -> Thread {
    let stack_table = &thread.stack_table;
    let mut builder = StackTableBuilder::with_capacity(default_category, stack_table.length);
    let mut map = StackIndexMap::new(stack_table.length);

    for stack in 0..stack_table.length {
        let new_prefix = map.get(stack_table.prefix[stack]);
        if new_prefix.is_some() || thread.func_for_stack(stack) == func_index {
            let new_stack = builder.index_for_old_stack(stack_table, stack, new_prefix);
            map.set(stack, Some(new_stack));
        } else {
            map.set(stack, None);
        }
    }

    update_thread_stacks(thread, Arc::new(builder.finish()), |stack| map.get(stack))
}
