use serde::{Deserialize, Serialize};

/// What the weight of a sample measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeightType {
    /// Every sample counts once, or as often as its weight says.
    #[serde(rename = "samples")]
    Samples,
    /// Weights are durations in milliseconds, as produced by tracing.
    #[serde(rename = "tracing-ms")]
    TracingMs,
    /// Weights are sizes in bytes, as produced by allocation tracking.
    #[serde(rename = "bytes")]
    Bytes,
}

impl Default for WeightType {
    fn default() -> Self {
        WeightType::Samples
    }
}

/// A table whose rows reference stacks: samples and allocations.
///
/// Transforms only ever touch the stack column; everything else about the rows is preserved.
pub trait SampleLike {
    /// The stack of every row. `None` means the row was filtered out.
    fn stacks(&self) -> &[Option<usize>];

    /// Mutable access to the stack column.
    fn stacks_mut(&mut self) -> &mut [Option<usize>];

    /// What the weights of this table measure.
    fn weight_type(&self) -> WeightType;

    /// The weight of row `index`.
    fn weight(&self, index: usize) -> f64;

    /// Replaces every stack with `convert(stack)`.
    fn update_stacks<F>(&mut self, mut convert: F)
    where
        F: FnMut(Option<usize>) -> Option<usize>,
        Self: Sized,
    {
        for stack in self.stacks_mut() {
            *stack = convert(*stack);
        }
    }
}

/// The samples of a thread.
///
/// Unlike the other tables, the weight column is optional: without it every sample weighs 1.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplesTable {
    /// The sampled stack. `None` for samples that were filtered out.
    pub stack: Vec<Option<usize>>,
    /// When the sample was taken.
    pub time: Vec<f64>,
    /// Per-sample weight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<Vec<f64>>,
    /// What the weights measure.
    #[serde(default)]
    pub weight_type: WeightType,
    /// The number of samples.
    pub length: usize,
}

impl SamplesTable {
    /// Creates an empty samples table with the given weight type.
    pub fn new(weight_type: WeightType) -> Self {
        SamplesTable {
            weight_type,
            ..Default::default()
        }
    }

    /// Appends a sample and returns its index.
    ///
    /// The weight column is only materialized once a sample weighs something other than 1.
    pub fn push(&mut self, stack: Option<usize>, time: f64, weight: f64) -> usize {
        if self.weight.is_none() && weight != 1.0 {
            self.weight = Some(vec![1.0; self.length]);
        }
        if let Some(weights) = &mut self.weight {
            weights.push(weight);
        }
        self.stack.push(stack);
        self.time.push(time);
        self.length += 1;
        self.length - 1
    }

    /// Returns the number of samples.
    pub fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` if there are no samples.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

impl SampleLike for SamplesTable {
    fn stacks(&self) -> &[Option<usize>] {
        &self.stack
    }

    fn stacks_mut(&mut self) -> &mut [Option<usize>] {
        &mut self.stack
    }

    fn weight_type(&self) -> WeightType {
        self.weight_type
    }

    fn weight(&self, index: usize) -> f64 {
        match &self.weight {
            Some(weights) => weights[index],
            None => 1.0,
        }
    }
}

columnar_table! {
    /// JavaScript allocations, each attributed to the stack that made it.
    pub struct JsAllocationsTable => JsAllocationRow {
        /// When the allocation happened.
        pub time: f64,
        /// Class of the allocated object.
        pub class_name: String,
        /// Type of the allocated object.
        pub type_name: String,
        /// Coarse type of the allocated object.
        pub coarse_type: String,
        /// Size in bytes.
        pub weight: f64,
        /// Whether the object was allocated in the nursery.
        pub in_nursery: bool,
        /// Allocating stack.
        pub stack: Option<usize>,
    }
}

impl SampleLike for JsAllocationsTable {
    fn stacks(&self) -> &[Option<usize>] {
        &self.stack
    }

    fn stacks_mut(&mut self) -> &mut [Option<usize>] {
        &mut self.stack
    }

    fn weight_type(&self) -> WeightType {
        WeightType::Bytes
    }

    fn weight(&self, index: usize) -> f64 {
        self.weight[index]
    }
}

columnar_table! {
    /// Native allocations and deallocations. Deallocations have a negative weight.
    pub struct NativeAllocationsTable => NativeAllocationRow {
        /// When the (de)allocation happened.
        pub time: f64,
        /// Size in bytes, negative for deallocations.
        pub weight: f64,
        /// Allocating stack.
        pub stack: Option<usize>,
        /// Address of the allocated memory, to match deallocations with allocations.
        pub memory_address: Option<u64>,
    }
}

impl SampleLike for NativeAllocationsTable {
    fn stacks(&self) -> &[Option<usize>] {
        &self.stack
    }

    fn stacks_mut(&mut self) -> &mut [Option<usize>] {
        &mut self.stack
    }

    fn weight_type(&self) -> WeightType {
        WeightType::Bytes
    }

    fn weight(&self, index: usize) -> f64 {
        self.weight[index]
    }
}
