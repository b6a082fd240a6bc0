use crate::profile::{CallNodePath, FuncTable, Thread};

use super::Transform;

impl Transform {
    /// Rewrites `path`, a call node path of the thread this transform was applied to, into the
    /// matching path of `transformed_thread`.
    ///
    /// Returns an empty path if the call node no longer exists after the transform.
    ///
    /// An inverted focus-subtree rewrites paths with the same prefix rule as a non-inverted one.
    pub fn apply_to_call_node_path(
        &self,
        path: &[usize],
        transformed_thread: &Thread,
    ) -> CallNodePath {
        match *self {
            Transform::FocusSubtree {
                ref call_node_path,
                ..
            } => remove_prefix(call_node_path, path),
            Transform::FocusFunction { func_index } => start_at_function(func_index, path),
            Transform::MergeCallNode {
                ref call_node_path,
                ..
            } => merge_call_node(call_node_path, path),
            Transform::MergeFunction { func_index } => {
                path.iter().copied().filter(|&func| func != func_index).collect()
            }
            Transform::DropFunction { func_index } => {
                if path.contains(&func_index) {
                    Vec::new()
                } else {
                    path.to_vec()
                }
            }
            Transform::CollapseResource {
                resource_index,
                collapsed_func_index,
                ..
            } => collapse_resource(
                resource_index,
                collapsed_func_index,
                &transformed_thread.func_table,
                path,
            ),
            Transform::CollapseDirectRecursion { func_index, .. } => {
                let mut new_path: CallNodePath = Vec::with_capacity(path.len());
                for &func in path {
                    if func == func_index && new_path.last() == Some(&func_index) {
                        continue;
                    }
                    new_path.push(func);
                }
                new_path
            }
            Transform::CollapseFunctionSubtree { func_index } => {
                match path.iter().position(|&func| func == func_index) {
                    Some(i) => path[..=i].to_vec(),
                    None => path.to_vec(),
                }
            }
        }
    }
}

// The focused call node becomes the root, so everything before it goes away.
fn remove_prefix(prefix: &[usize], path: &[usize]) -> CallNodePath {
    if prefix.is_empty() {
        return path.to_vec();
    }
    if path.starts_with(prefix) {
        path[(prefix.len() - 1)..].to_vec()
    } else {
        Vec::new()
    }
}

fn start_at_function(func_index: usize, path: &[usize]) -> CallNodePath {
    match path.iter().position(|&func| func == func_index) {
        Some(i) => path[i..].to_vec(),
        None => Vec::new(),
    }
}

fn merge_call_node(merged_path: &[usize], path: &[usize]) -> CallNodePath {
    if merged_path.is_empty() || !path.starts_with(merged_path) {
        return path.to_vec();
    }
    let mut new_path = path.to_vec();
    new_path.remove(merged_path.len() - 1);
    new_path
}

fn collapse_resource(
    resource_index: usize,
    collapsed_func_index: usize,
    func_table: &FuncTable,
    path: &[usize],
) -> CallNodePath {
    let mut new_path: CallNodePath = Vec::with_capacity(path.len());
    for &func in path {
        let in_resource = func == collapsed_func_index
            || func_table.resource.get(func).copied().flatten() == Some(resource_index);
        if !in_resource {
            new_path.push(func);
        } else if new_path.last() != Some(&collapsed_func_index) {
            new_path.push(collapsed_func_index);
        }
    }
    new_path
}
