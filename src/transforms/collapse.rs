use std::sync::Arc;

use ahash::AHashSet;

use crate::profile::{
    update_thread_stacks, FrameRow, FrameTable, FuncRow, FuncTable, ImplementationFilter,
    StackIndexMap, StackTableBuilder, Thread,
};

/// Copies of a thread's frame and func tables, extended with the frame and function that
/// stand for a collapsed resource.
struct CollapsedTables {
    frame_table: FrameTable,
    func_table: FuncTable,
    frame: usize,
}

impl CollapsedTables {
    /// Modelled on `template_frame`, the first frame of the resource that gets collapsed.
    fn new(thread: &Thread, resource_index: usize, template_frame: usize) -> Self {
        let mut frame_table = FrameTable::clone(&thread.frame_table);
        let mut func_table = FuncTable::clone(&thread.func_table);
        let template_func = frame_table.func[template_frame];

        let func = func_table.push(FuncRow {
            name: thread.resource_table.name[resource_index],
            is_js: func_table.is_js[template_func],
            relevant_for_js: func_table.relevant_for_js[template_func],
            resource: Some(resource_index),
            file_name: func_table.file_name[template_func],
            line_number: None,
            column_number: None,
        });
        let frame = frame_table.push(FrameRow {
            address: None,
            inline_depth: 0,
            category: frame_table.category[template_frame],
            subcategory: frame_table.subcategory[template_frame],
            func,
            native_symbol: None,
            inner_window_id: frame_table.inner_window_id[template_frame],
            implementation: frame_table.implementation[template_frame],
            line: None,
            column: None,
        });

        CollapsedTables {
            frame_table,
            func_table,
            frame,
        }
    }
}

/// Replaces every run of consecutive calls into `resource_index` by a single call to a new
/// function named after the resource.
///
/// The new function is appended to the func table, so it gets the index the func table had
/// as its length. Frames that `implementation` hides are absorbed into a run, as are the
/// frames of the resource itself. Collapsing a resource that does not exist does nothing.
pub fn collapse_resource(
    thread: &Thread,
    resource_index: usize,
    implementation: ImplementationFilter,
    default_category: usize,
) -> Thread {
    if resource_index >= thread.resource_table.length {
        debug!("Resource {} does not exist, nothing to collapse", resource_index);
        return thread.clone();
    }

    let stack_table = &thread.stack_table;
    let mut builder = StackTableBuilder::with_capacity(default_category, stack_table.length);
    let mut map = StackIndexMap::new(stack_table.length);
    let mut collapsed: Option<CollapsedTables> = None;

    // new stacks that stand for a collapsed run
    let mut collapsed_stacks: AHashSet<usize> = AHashSet::default();

    for stack in 0..stack_table.length {
        let new_prefix = map.get(stack_table.prefix[stack]);
        let prefix_is_collapsed =
            new_prefix.map_or(false, |prefix| collapsed_stacks.contains(&prefix));
        let frame = stack_table.frame[stack];
        let func = thread.frame_table.func[frame];

        if thread.func_table.resource[func] == Some(resource_index) {
            if prefix_is_collapsed {
                map.set(stack, new_prefix);
                continue;
            }
            let collapsed_frame = match &collapsed {
                Some(tables) => tables.frame,
                None => {
                    let tables = CollapsedTables::new(thread, resource_index, frame);
                    let frame = tables.frame;
                    collapsed = Some(tables);
                    frame
                }
            };
            let new_stack = builder.index_for_stack(
                new_prefix,
                collapsed_frame,
                stack_table.category[stack],
                stack_table.subcategory[stack],
            );
            collapsed_stacks.insert(new_stack);
            map.set(stack, Some(new_stack));
        } else if prefix_is_collapsed && !implementation.matches_func(thread, func) {
            map.set(stack, new_prefix);
        } else {
            let new_stack = builder.index_for_old_stack(stack_table, stack, new_prefix);
            map.set(stack, Some(new_stack));
        }
    }

    let mut new_thread =
        update_thread_stacks(thread, Arc::new(builder.finish()), |stack| map.get(stack));
    if let Some(tables) = collapsed {
        new_thread.frame_table = Arc::new(tables.frame_table);
        new_thread.func_table = Arc::new(tables.func_table);
    }
    new_thread
}

/// Turns every chain of direct recursive calls to `func_index` into a single call.
///
/// Frames that `implementation` hides do not interrupt a chain, and are absorbed into it.
pub fn collapse_direct_recursion(
    thread: &Thread,
    func_index: usize,
    implementation: ImplementationFilter,
    default_category: usize,
) -> Thread {
    let stack_table = &thread.stack_table;
    let mut builder = StackTableBuilder::with_capacity(default_category, stack_table.length);
    let mut map = StackIndexMap::new(stack_table.length);

    // For stacks inside a recursion chain, the new stack of the chain's outermost call.
    let mut chain_start: Vec<Option<usize>> = Vec::with_capacity(stack_table.length);

    for stack in 0..stack_table.length {
        let prefix = stack_table.prefix[stack];
        let func = thread.func_for_stack(stack);
        match prefix.and_then(|prefix| chain_start[prefix]) {
            Some(start) if func == func_index || !implementation.matches_func(thread, func) => {
                map.set(stack, Some(start));
                chain_start.push(Some(start));
            }
            _ => {
                let new_stack = builder.index_for_old_stack(stack_table, stack, map.get(prefix));
                map.set(stack, Some(new_stack));
                chain_start.push(if func == func_index {
                    Some(new_stack)
                } else {
                    None
                });
            }
        }
    }

    update_thread_stacks(thread, Arc::new(builder.finish()), |stack| map.get(stack))
}

/// Attributes everything called by `func_index` to the function itself: every stack below its
/// outermost occurrence is merged into that occurrence.
///
/// The merged stack keeps its category only if all of its descendants agree with it.
pub fn collapse_function_subtree(
    thread: &Thread,
    func_index: usize,
    default_category: usize,
) -> Thread {
    let stack_table = &thread.stack_table;
    let mut builder = StackTableBuilder::with_capacity(default_category, stack_table.length);
    let mut map = StackIndexMap::new(stack_table.length);

    // For stacks at or below an occurrence of the function, the new stack of that occurrence.
    let mut collapsed_root: Vec<Option<usize>> = Vec::with_capacity(stack_table.length);

    for stack in 0..stack_table.length {
        let prefix = stack_table.prefix[stack];
        match prefix.and_then(|prefix| collapsed_root[prefix]) {
            Some(root) => {
                builder.merge_category(
                    root,
                    stack_table.category[stack],
                    stack_table.subcategory[stack],
                );
                map.set(stack, Some(root));
                collapsed_root.push(Some(root));
            }
            None => {
                let new_stack = builder.index_for_old_stack(stack_table, stack, map.get(prefix));
                map.set(stack, Some(new_stack));
                collapsed_root.push(if thread.func_for_stack(stack) == func_index {
                    Some(new_stack)
                } else {
                    None
                });
            }
        }
    }

    update_thread_stacks(thread, Arc::new(builder.finish()), |stack| map.get(stack))
}

/// Returns `true` if `func_index` ever calls itself, directly or through other functions.
pub fn func_has_recursive_call(thread: &Thread, func_index: usize) -> bool {
    let stack_table = &thread.stack_table;
    let mut contains_func: Vec<bool> = Vec::with_capacity(stack_table.length);
    for stack in 0..stack_table.length {
        let prefix_contains_func =
            stack_table.prefix[stack].map_or(false, |prefix| contains_func[prefix]);
        let is_func = thread.func_for_stack(stack) == func_index;
        if is_func && prefix_contains_func {
            return true;
        }
        contains_func.push(prefix_contains_func || is_func);
    }
    false
}

/// Returns `true` if `func_index` ever calls itself directly, not counting the frames that
/// `implementation` hides.
pub fn func_has_direct_recursive_call(
    thread: &Thread,
    implementation: ImplementationFilter,
    func_index: usize,
) -> bool {
    let stack_table = &thread.stack_table;

    // The closest function on the stack that `implementation` shows.
    let mut shown_func: Vec<Option<usize>> = Vec::with_capacity(stack_table.length);
    for stack in 0..stack_table.length {
        let prefix_shown_func = stack_table.prefix[stack].and_then(|prefix| shown_func[prefix]);
        let func = thread.func_for_stack(stack);
        if func == func_index && prefix_shown_func == Some(func_index) {
            return true;
        }
        shown_func.push(if implementation.matches_func(thread, func) {
            Some(func)
        } else {
            prefix_shown_func
        });
    }
    false
}
