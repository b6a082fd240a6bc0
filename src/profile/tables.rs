use serde::{Deserialize, Serialize};

columnar_table! {
    /// Frames: one entry per distinct code location (address or JS location) seen in a thread.
    pub struct FrameTable => FrameRow {
        /// Code address of the frame, if it is native code.
        pub address: Option<u64>,
        /// How many levels of inlining this frame sits at. Zero for non-inlined frames.
        pub inline_depth: u32,
        /// Category of the frame. Stacks inherit their prefix's category when this is absent.
        pub category: Option<usize>,
        /// Subcategory of the frame, relative to `category`.
        pub subcategory: Option<usize>,
        /// The function this frame belongs to.
        pub func: usize,
        /// Native symbol this frame was resolved to.
        pub native_symbol: Option<usize>,
        /// Inner window the frame's script belongs to.
        #[serde(rename = "innerWindowID")]
        pub inner_window_id: Option<u64>,
        /// String index of the JIT tier that executed this frame.
        pub implementation: Option<usize>,
        /// Source line.
        pub line: Option<u32>,
        /// Source column.
        pub column: Option<u32>,
    }
}

columnar_table! {
    /// Functions. Several frames can belong to the same function.
    pub struct FuncTable => FuncRow {
        /// String index of the function name.
        pub name: usize,
        /// Whether this is JavaScript code.
        #[serde(rename = "isJS")]
        pub is_js: bool,
        /// Whether this native function is still interesting when only looking at JS.
        #[serde(rename = "relevantForJS")]
        pub relevant_for_js: bool,
        /// The library, add-on or host the function comes from.
        pub resource: Option<usize>,
        /// String index of the source file.
        pub file_name: Option<usize>,
        /// First line of the function.
        pub line_number: Option<u32>,
        /// First column of the function.
        pub column_number: Option<u32>,
    }
}

/// What kind of thing a resource is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    /// No idea.
    Unknown,
    /// A native shared library or executable.
    Library,
    /// A browser add-on.
    Addon,
    /// A web host whose scripts run in the page.
    Webhost,
    /// Some other host.
    Otherhost,
    /// A plain URL.
    Url,
}

columnar_table! {
    /// Resources: the libraries, add-ons and hosts that functions come from.
    pub struct ResourceTable => ResourceRow {
        /// Index into the profile's libraries, for native resources.
        pub lib: Option<usize>,
        /// String index of the resource name.
        pub name: usize,
        /// String index of the host name, for web resources.
        pub host: Option<usize>,
        /// The kind of resource.
        #[serde(rename = "type")]
        pub resource_type: ResourceType,
    }
}

columnar_table! {
    /// Symbols of native code, as found in the debug information of a library.
    pub struct NativeSymbolTable => NativeSymbolRow {
        /// Index into the profile's libraries.
        pub lib_index: usize,
        /// Address of the symbol, relative to the library.
        pub address: u64,
        /// String index of the symbol name.
        pub name: usize,
        /// Size of the function in bytes, if known.
        pub function_size: Option<u32>,
    }
}

columnar_table! {
    /// Markers: named points or intervals in time, with optional structured payloads.
    pub struct RawMarkerTable => MarkerRow {
        /// Marker payload. Its shape depends on the marker type.
        pub data: Option<serde_json::Value>,
        /// String index of the marker name.
        pub name: usize,
        /// Start of the marker, or its instant.
        pub start_time: Option<f64>,
        /// End of the marker, for interval markers.
        pub end_time: Option<f64>,
        /// Marker phase (instant, interval, interval start or interval end).
        pub phase: u8,
        /// Category of the marker.
        pub category: usize,
    }
}

columnar_table! {
    /// Samples of a counter.
    pub struct CounterSamplesTable => CounterSample {
        /// When the counter was read.
        pub time: f64,
        /// Change in the counter since the previous sample.
        pub count: f64,
        /// Number of events that contributed to `count`.
        pub number: Option<u64>,
    }
}

/// A loaded library (or executable) that native frames may point into.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lib {
    /// CPU architecture the library was built for.
    pub arch: Option<String>,
    /// File name of the library.
    pub name: String,
    /// Full path of the library.
    pub path: String,
    /// File name of the library's debug file.
    pub debug_name: String,
    /// Full path of the library's debug file.
    pub debug_path: String,
    /// Identifier used to look up symbols on a symbol server.
    pub breakpad_id: String,
    /// Code identifier of the binary, if known.
    pub code_id: Option<String>,
    /// Start of the library's mapping.
    pub start: u64,
    /// End of the library's mapping.
    pub end: u64,
    /// Offset of the mapping into the file.
    pub offset: u64,
}

/// A sample category, such as "JavaScript" or "Layout".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Display name.
    pub name: String,
    /// Display color. The default category is the first grey one.
    pub color: String,
    /// Names of the subcategories. Subcategory 0 is the category itself.
    pub subcategories: Vec<String>,
}

/// A counter track, such as memory usage, sampled over time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Counter {
    /// Display name.
    pub name: String,
    /// Category name of the counter.
    pub category: String,
    /// Longer description.
    pub description: String,
    /// Process the counter belongs to.
    pub pid: String,
    /// Index of the main thread of that process.
    pub main_thread_index: usize,
    /// The counter's samples.
    pub samples: CounterSamplesTable,
}
