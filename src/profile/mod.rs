#[macro_use]
mod table;

mod call_node;
mod implementation;
mod samples;
mod stack_table;
mod string_table;
mod tables;

/// Reading folded stack lines into a profile, and writing a thread back out as folded stacks.
pub mod folded;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use self::call_node::{
    invert_call_node_path, CallNodeInfo, CallNodePath, CallNodeRow, CallNodeTable, CallTree,
};
pub use self::implementation::{filter_thread_by_implementation, ImplementationFilter};
pub use self::samples::{
    JsAllocationRow, JsAllocationsTable, NativeAllocationRow, NativeAllocationsTable, SampleLike,
    SamplesTable, WeightType,
};
pub use self::stack_table::{StackIndexMap, StackRow, StackTable, StackTableBuilder};
pub use self::string_table::UniqueStringArray;
pub use self::tables::{
    Category, Counter, CounterSample, CounterSamplesTable, FrameRow, FrameTable, FuncRow,
    FuncTable, Lib, MarkerRow, NativeSymbolRow, NativeSymbolTable, RawMarkerTable, ResourceRow,
    ResourceTable, ResourceType,
};

/// A single thread of a profile: its samples and the tables they point into.
///
/// Tables are reference counted so that a transformed thread can share every table it did not
/// rewrite with the thread it was derived from. Threads are never modified in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    /// Thread name.
    pub name: String,
    /// Kind of process the thread runs in.
    pub process_type: String,
    /// Process id.
    #[serde(default)]
    pub pid: Option<String>,
    /// Thread id.
    #[serde(default)]
    pub tid: Option<String>,
    /// Stack samples.
    pub samples: SamplesTable,
    /// JavaScript allocations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub js_allocations: Option<JsAllocationsTable>,
    /// Native allocations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_allocations: Option<NativeAllocationsTable>,
    /// Markers.
    #[serde(default)]
    pub markers: Arc<RawMarkerTable>,
    /// The stack trie.
    pub stack_table: Arc<StackTable>,
    /// Frames.
    pub frame_table: Arc<FrameTable>,
    /// Functions.
    pub func_table: Arc<FuncTable>,
    /// Resources.
    pub resource_table: Arc<ResourceTable>,
    /// Native symbols.
    #[serde(default)]
    pub native_symbols: Arc<NativeSymbolTable>,
    /// Every string referenced by the other tables.
    #[serde(rename = "stringArray")]
    pub string_table: Arc<UniqueStringArray>,
}

impl Thread {
    /// Creates a thread without any samples.
    pub fn new<S: Into<String>>(name: S) -> Self {
        Thread {
            name: name.into(),
            process_type: String::from("default"),
            pid: None,
            tid: None,
            samples: SamplesTable::default(),
            js_allocations: None,
            native_allocations: None,
            markers: Arc::default(),
            stack_table: Arc::default(),
            frame_table: Arc::default(),
            func_table: Arc::default(),
            resource_table: Arc::default(),
            native_symbols: Arc::default(),
            string_table: Arc::default(),
        }
    }

    /// Returns the function of the frame at the top of `stack`.
    pub fn func_for_stack(&self, stack: usize) -> usize {
        self.frame_table.func[self.stack_table.frame[stack]]
    }

    /// Returns the string at `index` of the string table.
    pub fn string(&self, index: usize) -> &str {
        self.string_table.get_string(index)
    }

    /// Returns the name of `func`.
    pub fn func_name(&self, func: usize) -> &str {
        self.string(self.func_table.name[func])
    }

    /// Returns the functions on the way from the root to `stack`, root first.
    pub fn func_path_for_stack(&self, stack: usize) -> CallNodePath {
        let mut path = Vec::new();
        let mut next = Some(stack);
        while let Some(stack) = next {
            path.push(self.func_for_stack(stack));
            next = self.stack_table.prefix[stack];
        }
        path.reverse();
        path
    }

    /// Returns `true` if the stack table is well formed and every stack referenced by samples
    /// or allocations exists.
    pub fn has_valid_stack_references(&self) -> bool {
        let len = self.stack_table.length;
        let valid = |stacks: &[Option<usize>]| {
            stacks
                .iter()
                .all(|stack| stack.map_or(true, |stack| stack < len))
        };

        self.stack_table.is_consistent()
            && self.stack_table.is_well_ordered()
            && valid(self.samples.stacks())
            && self
                .js_allocations
                .as_ref()
                .map_or(true, |table| valid(table.stacks()))
            && self
                .native_allocations
                .as_ref()
                .map_or(true, |table| valid(table.stacks()))
    }
}

/// Returns a copy of `thread` that uses `stack_table`, with every stack reference in its
/// samples and allocations rewritten through `convert`.
///
/// All other tables are shared with `thread`.
pub fn update_thread_stacks<F>(
    thread: &Thread,
    stack_table: Arc<StackTable>,
    mut convert: F,
) -> Thread
where
    F: FnMut(Option<usize>) -> Option<usize>,
{
    let mut samples = thread.samples.clone();
    samples.update_stacks(&mut convert);

    let js_allocations = thread.js_allocations.as_ref().map(|table| {
        let mut table = table.clone();
        table.update_stacks(&mut convert);
        table
    });

    let native_allocations = thread.native_allocations.as_ref().map(|table| {
        let mut table = table.clone();
        table.update_stacks(&mut convert);
        table
    });

    let new_thread = Thread {
        name: thread.name.clone(),
        process_type: thread.process_type.clone(),
        pid: thread.pid.clone(),
        tid: thread.tid.clone(),
        samples,
        js_allocations,
        native_allocations,
        markers: Arc::clone(&thread.markers),
        stack_table,
        frame_table: Arc::clone(&thread.frame_table),
        func_table: Arc::clone(&thread.func_table),
        resource_table: Arc::clone(&thread.resource_table),
        native_symbols: Arc::clone(&thread.native_symbols),
        string_table: Arc::clone(&thread.string_table),
    };
    debug_assert!(new_thread.has_valid_stack_references());
    new_thread
}

/// Global information about a profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileMeta {
    /// Sampling interval in milliseconds.
    pub interval: f64,
    /// When the profile started, in milliseconds since the epoch.
    pub start_time: f64,
    /// Name of the profiled product.
    pub product: String,
    /// The sample categories that stacks and frames refer to.
    pub categories: Vec<Category>,
}

impl ProfileMeta {
    /// Returns the category used when merged stacks disagree on their category: the first
    /// grey category, or the first category if there is no grey one.
    pub fn default_category(&self) -> usize {
        self.categories
            .iter()
            .position(|category| category.color == "grey")
            .unwrap_or(0)
    }
}

/// A profile: some global information and a number of threads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Global information.
    pub meta: ProfileMeta,
    /// Libraries that were loaded while profiling.
    #[serde(default)]
    pub libs: Vec<Lib>,
    /// The profiled threads.
    pub threads: Vec<Thread>,
    /// Counter tracks.
    #[serde(default)]
    pub counters: Vec<Counter>,
}
