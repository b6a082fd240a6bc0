use ahash::RandomState;
use indexmap::IndexSet;

use super::tables::FrameTable;

columnar_table! {
    /// The stacks of a thread, stored as a trie of `(prefix, frame)` pairs.
    ///
    /// A stack's prefix always has a lower index than the stack itself, so a single forward pass
    /// over the table visits every parent before its children. Within a table built by a
    /// [`StackTableBuilder`], no two stacks share the same prefix and frame.
    pub struct StackTable => StackRow {
        /// The frame this stack adds on top of its prefix.
        pub frame: usize,
        /// Category of the stack, either the frame's own or inherited from the prefix.
        pub category: usize,
        /// Subcategory of the stack.
        pub subcategory: usize,
        /// The calling stack, `None` for roots.
        pub prefix: Option<usize>,
    }
}

impl StackTable {
    /// Returns `true` if every stack's prefix comes before it.
    pub fn is_well_ordered(&self) -> bool {
        self.prefix
            .iter()
            .enumerate()
            .all(|(stack, prefix)| prefix.map_or(true, |prefix| prefix < stack))
    }

    /// Returns the number of frames from the root to `stack`, starting at 0 for roots.
    pub fn depth(&self, stack: usize) -> usize {
        let mut depth = 0;
        let mut next = self.prefix[stack];
        while let Some(prefix) = next {
            depth += 1;
            next = self.prefix[prefix];
        }
        depth
    }
}

/// Builds a new [`StackTable`] one stack at a time.
///
/// Adding a `(prefix, frame)` pair that already exists returns the existing stack, and merges
/// the categories of the two: stacks that disagree on their category fall back to the default
/// category, and stacks that only disagree on their subcategory fall back to subcategory 0.
#[derive(Debug, Clone)]
pub struct StackTableBuilder {
    table: StackTable,
    // a pair's position in the set is its stack index
    index: IndexSet<(Option<usize>, usize), RandomState>,
    default_category: usize,
}

impl StackTableBuilder {
    /// Creates an empty builder. `default_category` is used when merged stacks disagree on
    /// their category.
    pub fn new(default_category: usize) -> Self {
        Self::with_capacity(default_category, 0)
    }

    /// Creates an empty builder with room for `capacity` stacks.
    pub fn with_capacity(default_category: usize, capacity: usize) -> Self {
        StackTableBuilder {
            table: StackTable::with_capacity(capacity),
            index: IndexSet::with_capacity_and_hasher(capacity, RandomState::new()),
            default_category,
        }
    }

    /// Returns the stack for `frame` called from `prefix`, adding it if needed.
    ///
    /// The category comes from the frame if it has one, otherwise from the prefix, otherwise it
    /// is the default category.
    pub fn index_for_frame(
        &mut self,
        frame_table: &FrameTable,
        prefix: Option<usize>,
        frame: usize,
    ) -> usize {
        let (category, subcategory) = match (frame_table.category[frame], prefix) {
            (Some(category), _) => (category, frame_table.subcategory[frame].unwrap_or(0)),
            (None, Some(prefix)) => (self.table.category[prefix], self.table.subcategory[prefix]),
            (None, None) => (self.default_category, 0),
        };
        self.index_for_stack(prefix, frame, category, subcategory)
    }

    /// Returns the stack for `frame` called from `prefix`, adding it with the given category if
    /// it does not exist yet, and merging the category into the existing stack otherwise.
    ///
    /// Panics if `prefix` is not a stack of this builder.
    pub fn index_for_stack(
        &mut self,
        prefix: Option<usize>,
        frame: usize,
        category: usize,
        subcategory: usize,
    ) -> usize {
        if let Some(prefix) = prefix {
            assert!(
                prefix < self.table.length,
                "prefix stack {} does not exist yet ({} stacks)",
                prefix,
                self.table.length
            );
        }

        let (stack, inserted) = self.index.insert_full((prefix, frame));
        if inserted {
            let pushed = self.table.push(StackRow {
                frame,
                category,
                subcategory,
                prefix,
            });
            debug_assert_eq!(pushed, stack);
        } else {
            self.merge_category(stack, category, subcategory);
        }
        stack
    }

    /// Re-adds `stack` of `stack_table` under `new_prefix`, keeping its frame and category.
    pub fn index_for_old_stack(
        &mut self,
        stack_table: &StackTable,
        stack: usize,
        new_prefix: Option<usize>,
    ) -> usize {
        self.index_for_stack(
            new_prefix,
            stack_table.frame[stack],
            stack_table.category[stack],
            stack_table.subcategory[stack],
        )
    }

    /// Folds `category` and `subcategory` into the category of an existing stack.
    pub fn merge_category(&mut self, stack: usize, category: usize, subcategory: usize) {
        if self.table.category[stack] != category {
            self.table.category[stack] = self.default_category;
            self.table.subcategory[stack] = 0;
        } else if self.table.subcategory[stack] != subcategory {
            self.table.subcategory[stack] = 0;
        }
    }

    /// Returns the category and subcategory of a stack added so far.
    pub fn category(&self, stack: usize) -> (usize, usize) {
        (self.table.category[stack], self.table.subcategory[stack])
    }

    /// Returns the number of stacks added so far.
    pub fn len(&self) -> usize {
        self.table.length
    }

    /// Returns `true` if no stacks were added.
    pub fn is_empty(&self) -> bool {
        self.table.length == 0
    }

    /// Returns the finished table.
    pub fn finish(self) -> StackTable {
        self.table
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Unmapped,
    Mapped(Option<usize>),
}

/// Maps the stacks of an old stack table to the stacks of a new one.
///
/// Every old stack has to be mapped before it is looked up. Mapping a stack to `None` means
/// that samples with that stack are dropped.
#[derive(Debug, Clone)]
pub struct StackIndexMap {
    slots: Vec<Slot>,
}

impl StackIndexMap {
    /// Creates a map for an old table of `old_len` stacks, with nothing mapped yet.
    pub fn new(old_len: usize) -> Self {
        StackIndexMap {
            slots: vec![Slot::Unmapped; old_len],
        }
    }

    /// Maps `old_stack` to `new_stack`.
    pub fn set(&mut self, old_stack: usize, new_stack: Option<usize>) {
        self.slots[old_stack] = Slot::Mapped(new_stack);
    }

    /// Returns the new stack for `old_stack`. `None` maps to `None`.
    ///
    /// Panics if `old_stack` was never mapped.
    pub fn get(&self, old_stack: Option<usize>) -> Option<usize> {
        let old_stack = old_stack?;
        match self.slots.get(old_stack) {
            Some(Slot::Mapped(new_stack)) => *new_stack,
            Some(Slot::Unmapped) => panic!("stack {} was never mapped", old_stack),
            None => panic!(
                "stack {} is out of range for a map of {} stacks",
                old_stack,
                self.slots.len()
            ),
        }
    }

    /// Returns the number of old stacks.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if the old table had no stacks.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
