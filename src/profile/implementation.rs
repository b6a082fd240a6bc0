use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{update_thread_stacks, StackIndexMap, StackTableBuilder, Thread};

/// Which kind of code a call tree should show.
///
/// Frames that do not match are hidden: their samples are attributed to the closest calling
/// frame that does match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImplementationFilter {
    /// Show everything.
    Combined,
    /// Only show native code.
    Cpp,
    /// Only show JavaScript, and native functions that are relevant to JavaScript.
    Js,
}

impl Default for ImplementationFilter {
    fn default() -> Self {
        ImplementationFilter::Combined
    }
}

impl ImplementationFilter {
    /// The name used for this filter in transform strings and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            ImplementationFilter::Combined => "combined",
            ImplementationFilter::Cpp => "cpp",
            ImplementationFilter::Js => "js",
        }
    }

    /// Returns `true` if `func` of `thread` is shown under this filter.
    pub fn matches_func(self, thread: &Thread, func: usize) -> bool {
        let func_table = &thread.func_table;
        match self {
            ImplementationFilter::Combined => true,
            ImplementationFilter::Js => func_table.is_js[func] || func_table.relevant_for_js[func],
            ImplementationFilter::Cpp => {
                if func_table.is_js[func] {
                    return false;
                }
                // JIT code has no library to come from, and is named after its address.
                let looks_jitted =
                    func_table.resource[func].is_none() && is_hex_address(thread.func_name(func));
                !looks_jitted
            }
        }
    }
}

// `0x` followed by nothing but hex digits.
fn is_hex_address(name: &str) -> bool {
    name.strip_prefix("0x").map_or(false, |digits| {
        !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_hexdigit())
    })
}

impl fmt::Display for ImplementationFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImplementationFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "combined" => Ok(ImplementationFilter::Combined),
            "cpp" => Ok(ImplementationFilter::Cpp),
            "js" => Ok(ImplementationFilter::Js),
            unknown => Err(format!("unknown implementation filter: {}", unknown)),
        }
    }
}

/// Returns a copy of `thread` where every frame that `implementation` does not show is removed
/// from the stacks. Samples that only contained such frames are dropped.
pub fn filter_thread_by_implementation(
    thread: &Thread,
    implementation: ImplementationFilter,
    default_category: usize,
) -> Thread {
    if implementation == ImplementationFilter::Combined {
        return thread.clone();
    }

    let stack_table = &thread.stack_table;
    let mut builder = StackTableBuilder::with_capacity(default_category, stack_table.length);
    let mut map = StackIndexMap::new(stack_table.length);
    for stack in 0..stack_table.length {
        let new_prefix = map.get(stack_table.prefix[stack]);
        if implementation.matches_func(thread, thread.func_for_stack(stack)) {
            let new_stack = builder.index_for_old_stack(stack_table, stack, new_prefix);
            map.set(stack, Some(new_stack));
        } else {
            map.set(stack, new_prefix);
        }
    }

    update_thread_stacks(thread, Arc::new(builder.finish()), |stack| map.get(stack))
}
