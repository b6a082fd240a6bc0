mod common;

use std::sync::Arc;

use pretty_assertions::assert_eq;
use profmorph::profile::{
    invert_call_node_path, CallNodeInfo, FrameRow, FrameTable, FuncRow, FuncTable,
    ImplementationFilter, StackTableBuilder, Thread, UniqueStringArray,
};
use profmorph::transforms::{
    apply_transform, func_has_direct_recursive_call, func_has_recursive_call, Transform,
};

use common::{func, path, resource, thread, SampleCallTree, DEFAULT_CATEGORY};

fn rewrite(transform: Transform, call_node_path: &[usize]) -> Vec<usize> {
    transform.apply_to_call_node_path(call_node_path, &Thread::new("unused"))
}

#[test]
fn focus_subtree_strips_the_prefix() {
    let focus = || Transform::FocusSubtree {
        call_node_path: vec![0, 1],
        implementation: ImplementationFilter::Combined,
        inverted: false,
    };
    assert_eq!(rewrite(focus(), &[0, 1, 2, 3]), vec![1, 2, 3]);
    assert_eq!(rewrite(focus(), &[0, 1]), vec![1]);
    assert_eq!(rewrite(focus(), &[0, 4]), Vec::<usize>::new());
}

#[test]
fn inverted_focus_subtree_uses_the_same_prefix_rule() {
    let focus = || Transform::FocusSubtree {
        call_node_path: vec![3, 2],
        implementation: ImplementationFilter::Js,
        inverted: true,
    };
    assert_eq!(rewrite(focus(), &[3, 2, 1]), vec![2, 1]);
    assert_eq!(rewrite(focus(), &[1, 2, 3]), Vec::<usize>::new());
}

#[test]
fn focus_function_starts_at_the_function() {
    let focus = || Transform::FocusFunction { func_index: 2 };
    assert_eq!(rewrite(focus(), &[0, 1, 2, 3, 2]), vec![2, 3, 2]);
    assert_eq!(rewrite(focus(), &[0, 1]), Vec::<usize>::new());
}

#[test]
fn merge_call_node_removes_the_node() {
    let merge = || Transform::MergeCallNode {
        call_node_path: vec![0, 1],
        implementation: ImplementationFilter::Combined,
    };
    assert_eq!(rewrite(merge(), &[0, 1, 2]), vec![0, 2]);
    assert_eq!(rewrite(merge(), &[0, 3, 1]), vec![0, 3, 1]);
}

#[test]
fn merge_and_drop_function() {
    assert_eq!(
        rewrite(Transform::MergeFunction { func_index: 1 }, &[1, 0, 1, 2]),
        vec![0, 2]
    );
    assert_eq!(
        rewrite(Transform::DropFunction { func_index: 1 }, &[0, 1]),
        Vec::<usize>::new()
    );
    assert_eq!(
        rewrite(Transform::DropFunction { func_index: 1 }, &[0, 2]),
        vec![0, 2]
    );
}

#[test]
fn collapse_recursion_and_subtree() {
    let recursion = Transform::CollapseDirectRecursion {
        func_index: 1,
        implementation: ImplementationFilter::Combined,
    };
    assert_eq!(rewrite(recursion, &[0, 1, 1, 2, 1, 1]), vec![0, 1, 2, 1]);

    let subtree = || Transform::CollapseFunctionSubtree { func_index: 1 };
    assert_eq!(rewrite(subtree(), &[0, 1, 2, 3]), vec![0, 1]);
    assert_eq!(rewrite(subtree(), &[0, 2]), vec![0, 2]);
}

#[test]
fn collapse_resource_replaces_resource_functions() {
    let t = thread(&["main;lib1`f1;lib1`f2;other 1"]);
    let transform = Transform::CollapseResource {
        resource_index: resource(&t, "lib1"),
        collapsed_func_index: t.func_table.length,
        implementation: ImplementationFilter::Combined,
    };
    let collapsed = apply_transform(&t, &transform, DEFAULT_CATEGORY);

    let old_path = path(&t, &["main", "lib1`f1", "lib1`f2", "other"]);
    let new_path = transform.apply_to_call_node_path(&old_path, &collapsed);
    assert_eq!(
        new_path,
        vec![func(&t, "main"), t.func_table.length, func(&t, "other")]
    );

    // the rewritten path exists in the transformed thread
    let info = CallNodeInfo::new(&collapsed, DEFAULT_CATEGORY);
    assert!(info.call_node_index_from_path(&new_path).is_some());
}

#[test]
fn focus_then_invert_follows_the_heaviest_branch() {
    let t = thread(&["A;B;C 3", "A;B;D 1", "A;E 5"]);
    let info = CallNodeInfo::new(&t, DEFAULT_CATEGORY);
    let tree = SampleCallTree::new(&t, &info);
    assert_eq!(
        invert_call_node_path(&path(&t, &["A", "B"]), &tree, &info),
        path(&t, &["C", "B", "A"])
    );

    let focus = Transform::FocusSubtree {
        call_node_path: path(&t, &["A", "B"]),
        implementation: ImplementationFilter::Combined,
        inverted: false,
    };
    let focused = apply_transform(&t, &focus, DEFAULT_CATEGORY);
    let selected = focus.apply_to_call_node_path(&path(&t, &["A", "B", "C"]), &focused);
    assert_eq!(selected, path(&t, &["B", "C"]));

    let focused_info = CallNodeInfo::new(&focused, DEFAULT_CATEGORY);
    let focused_tree = SampleCallTree::new(&focused, &focused_info);
    assert!(focused_info.call_node_index_from_path(&selected).is_some());
    assert_eq!(
        invert_call_node_path(&path(&t, &["B"]), &focused_tree, &focused_info),
        path(&t, &["C", "B"])
    );
}

#[test]
fn inverting_a_missing_path_gives_nothing() {
    let t = thread(&["A;B 1"]);
    let info = CallNodeInfo::new(&t, DEFAULT_CATEGORY);
    let tree = SampleCallTree::new(&t, &info);
    assert_eq!(
        invert_call_node_path(&path(&t, &["B"]), &tree, &info),
        Vec::<usize>::new()
    );
    assert_eq!(invert_call_node_path(&[], &tree, &info), Vec::<usize>::new());
}

#[test]
fn call_nodes_join_frames_of_the_same_function() {
    let mut strings = UniqueStringArray::new();
    let mut func_table = FuncTable::new();
    for name in ["work", "helper"] {
        func_table.push(FuncRow {
            name: strings.index_for_string(name),
            is_js: false,
            relevant_for_js: false,
            resource: None,
            file_name: None,
            line_number: None,
            column_number: None,
        });
    }

    // two frames (different addresses) in `work`, one in `helper`
    let mut frame_table = FrameTable::new();
    for (address, func) in [(0x10, 0), (0x20, 0), (0x30, 1)] {
        frame_table.push(FrameRow {
            address: Some(address),
            inline_depth: 0,
            category: None,
            subcategory: None,
            func,
            native_symbol: None,
            inner_window_id: None,
            implementation: None,
            line: None,
            column: None,
        });
    }

    let mut builder = StackTableBuilder::new(DEFAULT_CATEGORY);
    let first = builder.index_for_stack(None, 0, 1, 0);
    let second = builder.index_for_stack(None, 1, 2, 0);
    let child = builder.index_for_stack(Some(second), 2, 2, 0);

    let mut t = Thread::new("manual");
    t.string_table = Arc::new(strings);
    t.func_table = Arc::new(func_table);
    t.frame_table = Arc::new(frame_table);
    t.stack_table = Arc::new(builder.finish());

    let info = CallNodeInfo::new(&t, DEFAULT_CATEGORY);
    assert_eq!(info.call_node_for_stack(first), info.call_node_for_stack(second));
    assert_eq!(info.call_node_table().length, 2);

    let work = info.call_node_for_stack(first);
    let helper = info.call_node_for_stack(child);
    assert_eq!(info.call_node_index_from_path(&[0, 1]), Some(helper));
    assert_eq!(info.call_node_path(helper), vec![0, 1]);
    assert_eq!(info.call_node_table().depth[helper], 1);
    assert_eq!(info.call_node_table().prefix[helper], Some(work));
    // the two stacks disagree on the category
    assert_eq!(info.call_node_table().category[work], DEFAULT_CATEGORY);
    assert_eq!(info.call_node_table().category[helper], 2);
    assert_eq!(info.call_node_index_from_path(&[1]), None);
}

#[test]
fn recursion_probes() {
    let t = thread(&["A;B;A 1", "C;C 1", "D_[j];x;D_[j] 1"]);
    let (a, b, c, d) = (
        func(&t, "A"),
        func(&t, "B"),
        func(&t, "C"),
        func(&t, "D_[j]"),
    );

    assert!(func_has_recursive_call(&t, a));
    assert!(!func_has_recursive_call(&t, b));
    assert!(func_has_recursive_call(&t, c));

    assert!(!func_has_direct_recursive_call(&t, ImplementationFilter::Combined, a));
    assert!(func_has_direct_recursive_call(&t, ImplementationFilter::Combined, c));
    assert!(func_has_direct_recursive_call(&t, ImplementationFilter::Js, d));
    assert!(!func_has_direct_recursive_call(&t, ImplementationFilter::Combined, d));
}
