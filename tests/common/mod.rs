#![allow(dead_code)]

use std::collections::HashSet;
use std::io::BufRead;

use pretty_assertions::assert_eq;
use profmorph::profile::folded::{self, Options};
use profmorph::profile::{CallNodeInfo, CallTree, Profile, SampleLike, Thread};

/// Category index of "Other" in profiles read from folded stacks.
pub const DEFAULT_CATEGORY: usize = 0;

pub fn profile(lines: &[&str]) -> Profile {
    folded::profile_from_lines(&Options::default(), lines.iter().copied())
}

pub fn thread(lines: &[&str]) -> Thread {
    let mut profile = profile(lines);
    profile.threads.remove(0)
}

/// The thread's samples as sorted folded lines.
pub fn folded_lines(thread: &Thread) -> Vec<String> {
    let mut out = Vec::new();
    folded::write_thread(thread, &mut out).unwrap();
    String::from_utf8(out)
        .unwrap()
        .lines()
        .map(String::from)
        .collect()
}

pub fn func(thread: &Thread, name: &str) -> usize {
    (0..thread.func_table.length)
        .find(|&func| thread.func_name(func) == name)
        .unwrap_or_else(|| panic!("no function named {}", name))
}

pub fn path(thread: &Thread, names: &[&str]) -> Vec<usize> {
    names.iter().map(|name| func(thread, name)).collect()
}

pub fn resource(thread: &Thread, name: &str) -> usize {
    (0..thread.resource_table.length)
        .find(|&resource| thread.string(thread.resource_table.name[resource]) == name)
        .unwrap_or_else(|| panic!("no resource named {}", name))
}

/// Checks that prefixes come before their stacks, that no two stacks share a prefix and frame,
/// and that samples only reference existing stacks.
pub fn assert_well_formed(thread: &Thread) {
    assert!(thread.has_valid_stack_references());
    let stack_table = &thread.stack_table;
    let mut seen = HashSet::new();
    for stack in 0..stack_table.length {
        assert!(
            seen.insert((stack_table.prefix[stack], stack_table.frame[stack])),
            "stack {} duplicates an earlier stack",
            stack
        );
        assert!(stack_table.frame[stack] < thread.frame_table.length);
    }
}

/// A call tree over a thread's call nodes, with children ordered by their total sample weight.
pub struct SampleCallTree {
    children: Vec<Vec<usize>>,
}

impl SampleCallTree {
    pub fn new(thread: &Thread, call_node_info: &CallNodeInfo) -> Self {
        let call_node_table = call_node_info.call_node_table();
        let mut totals = vec![0.0; call_node_table.length];
        for (index, stack) in thread.samples.stacks().iter().enumerate() {
            let weight = thread.samples.weight(index);
            let mut next = stack.map(|stack| call_node_info.call_node_for_stack(stack));
            while let Some(call_node) = next {
                totals[call_node] += weight;
                next = call_node_table.prefix[call_node];
            }
        }

        let mut children = vec![Vec::new(); call_node_table.length];
        for call_node in 0..call_node_table.length {
            if let Some(prefix) = call_node_table.prefix[call_node] {
                children[prefix].push(call_node);
            }
        }
        for siblings in &mut children {
            siblings.sort_by(|a, b| {
                totals[*b]
                    .partial_cmp(&totals[*a])
                    .unwrap()
                    .then(a.cmp(b))
            });
        }
        SampleCallTree { children }
    }
}

impl CallTree for SampleCallTree {
    fn children(&self, call_node: usize) -> Vec<usize> {
        self.children[call_node].clone()
    }
}

pub fn compare_results<R, E>(result: R, mut expected: E, expected_file: &str)
where
    R: BufRead,
    E: BufRead,
{
    let mut buf = String::new();
    let mut line_num = 1;
    for line in result.lines() {
        let line = line.unwrap();
        if expected.read_line(&mut buf).unwrap() == 0 {
            panic!(
                "\noutput has more lines than expected result file: {}",
                expected_file
            );
        }
        assert_eq!(line, buf.trim_end(), "\n{}:{}", expected_file, line_num);
        buf.clear();
        line_num += 1;
    }

    if expected.read_line(&mut buf).unwrap() > 0 {
        panic!(
            "\n{} has more lines than output, beginning at line: {}",
            expected_file, line_num
        )
    }
}
