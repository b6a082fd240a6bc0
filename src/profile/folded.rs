//! Folded stacks are the line-based format produced by inferno's collapsers (and by Brendan
//! Gregg's `stackcollapse-*` scripts): one line per distinct stack, frames separated by `;`
//! from the root to the leaf, followed by a space and a sample count.
//!
//! ```text
//! main;parse;read 3
//! main;libc.so`malloc 1
//! ```
//!
//! Every distinct frame text becomes its own function and frame. Frames written as
//! `module`function` are attributed to a library resource named after the module, and the
//! collapser annotations `_[k]` (kernel), `_[j]` (JIT-compiled JavaScript) and `_[i]` (inlined)
//! set the frame's category and flags.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::Arc;

use ahash::AHashMap;

use super::{
    Category, FrameRow, FrameTable, FuncRow, FuncTable, Lib, Profile, ProfileMeta, ResourceRow,
    ResourceTable, ResourceType, SampleLike, SamplesTable, StackTableBuilder, Thread,
    UniqueStringArray, WeightType,
};

const CATEGORY_OTHER: usize = 0;
const CATEGORY_KERNEL: usize = 1;
const CATEGORY_JAVASCRIPT: usize = 2;

/// Settings for reading folded stacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Name of the one thread of the resulting profile.
    ///
    /// Default value is `"folded"`.
    pub thread_name: String,

    /// Attribute `module`function` frames to a library resource named `module`.
    ///
    /// Default value is `true`.
    pub resources: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            thread_name: String::from("folded"),
            resources: true,
        }
    }
}

/// The categories of profiles read from folded stacks. The first one is the default category.
pub fn default_categories() -> Vec<Category> {
    let category = |name: &str, color: &str| Category {
        name: name.to_owned(),
        color: color.to_owned(),
        subcategories: vec![String::from("Other")],
    };
    vec![
        category("Other", "grey"),
        category("Kernel", "orange"),
        category("JavaScript", "yellow"),
    ]
}

/// Reads folded stack lines into a single-thread profile.
///
/// Lines without a valid sample count are skipped with a warning. Every line becomes one sample
/// whose weight is the line's count.
pub fn profile_from_lines<'a, I>(opt: &Options, lines: I) -> Profile
where
    I: IntoIterator<Item = &'a str>,
{
    let mut state = State::new(opt);
    for line in lines {
        state.on_line(line);
    }
    state.finish()
}

/// Reads folded stacks from `reader`. See [`profile_from_lines`].
pub fn profile_from_reader<R: Read>(opt: &Options, mut reader: R) -> io::Result<Profile> {
    let mut input = String::new();
    reader.read_to_string(&mut input)?;
    Ok(profile_from_lines(opt, input.lines()))
}

/// Reads folded stacks from a file, or from STDIN if `infile` is `None`.
pub fn profile_from_file<P: AsRef<Path>>(opt: &Options, infile: Option<P>) -> io::Result<Profile> {
    match infile {
        Some(path) => profile_from_reader(opt, File::open(path)?),
        None => {
            let stdin = io::stdin();
            let stdin = stdin.lock();
            profile_from_reader(opt, stdin)
        }
    }
}

/// Writes the samples of `thread` as folded stacks, one line per distinct function path,
/// sorted by path.
///
/// Weights of samples that end up on the same path are summed. Dropped samples and paths whose
/// weights add up to zero are left out.
pub fn write_thread<W: Write>(thread: &Thread, mut writer: W) -> io::Result<()> {
    let samples = &thread.samples;
    let mut stack_weights = vec![0.0; thread.stack_table.length];
    for (index, stack) in samples.stacks().iter().enumerate() {
        if let Some(stack) = *stack {
            stack_weights[stack] += samples.weight(index);
        }
    }

    let mut occurrences: AHashMap<String, f64> = AHashMap::default();
    let mut names = Vec::new();
    for (stack, &weight) in stack_weights.iter().enumerate() {
        if weight == 0.0 {
            continue;
        }
        names.clear();
        let mut next = Some(stack);
        while let Some(stack) = next {
            names.push(thread.func_name(thread.func_for_stack(stack)));
            next = thread.stack_table.prefix[stack];
        }
        names.reverse();
        *occurrences.entry(names.join(";")).or_insert(0.0) += weight;
    }

    let mut contents: Vec<_> = occurrences.into_iter().collect();
    contents.sort_by(|(a, _), (b, _)| a.cmp(b));
    for (path, weight) in contents {
        if weight != 0.0 {
            writeln!(writer, "{} {}", path, weight)?;
        }
    }
    Ok(())
}

struct State<'a> {
    opt: &'a Options,
    string_table: UniqueStringArray,
    frame_table: FrameTable,
    func_table: FuncTable,
    resource_table: ResourceTable,
    libs: Vec<Lib>,
    stacks: StackTableBuilder,
    samples: SamplesTable,

    // frame text -> frame index; every frame has its own func
    frames: AHashMap<String, usize>,

    // module name -> resource index
    resources: AHashMap<String, usize>,

    ignored: usize,
}

impl<'a> State<'a> {
    fn new(opt: &'a Options) -> Self {
        State {
            opt,
            string_table: UniqueStringArray::new(),
            frame_table: FrameTable::new(),
            func_table: FuncTable::new(),
            resource_table: ResourceTable::new(),
            libs: Vec::new(),
            stacks: StackTableBuilder::new(CATEGORY_OTHER),
            samples: SamplesTable::new(WeightType::Samples),
            frames: AHashMap::default(),
            resources: AHashMap::default(),
            ignored: 0,
        }
    }

    fn on_line(&mut self, line: &str) {
        let mut line = line.trim();
        if line.is_empty() {
            return;
        }

        let count = match parse_count(&mut line) {
            Some(count) if !line.is_empty() => count,
            _ => {
                self.ignored += 1;
                return;
            }
        };

        let mut stack = None;
        for name in line.split(';') {
            let frame = self.frame_for(name);
            stack = Some(self.stacks.index_for_frame(&self.frame_table, stack, frame));
        }

        let time = self.samples.len() as f64;
        self.samples.push(stack, time, count);
    }

    fn frame_for(&mut self, name: &str) -> usize {
        if let Some(&frame) = self.frames.get(name) {
            return frame;
        }

        let annotation = annotation(name);
        let resource = if self.opt.resources {
            module(name).map(|module| self.resource_for(module))
        } else {
            None
        };
        let func = self.func_table.push(FuncRow {
            name: self.string_table.index_for_string(name),
            is_js: annotation == Some('j'),
            relevant_for_js: false,
            resource,
            file_name: None,
            line_number: None,
            column_number: None,
        });

        let category = match annotation {
            Some('k') => Some(CATEGORY_KERNEL),
            Some('j') => Some(CATEGORY_JAVASCRIPT),
            _ => None,
        };
        let frame = self.frame_table.push(FrameRow {
            address: None,
            inline_depth: if annotation == Some('i') { 1 } else { 0 },
            category,
            subcategory: category.map(|_| 0),
            func,
            native_symbol: None,
            inner_window_id: None,
            implementation: None,
            line: None,
            column: None,
        });

        self.frames.insert(name.to_owned(), frame);
        frame
    }

    fn resource_for(&mut self, module: &str) -> usize {
        if let Some(&resource) = self.resources.get(module) {
            return resource;
        }

        let lib = self.libs.len();
        self.libs.push(Lib {
            name: module.to_owned(),
            path: module.to_owned(),
            debug_name: module.to_owned(),
            debug_path: module.to_owned(),
            ..Default::default()
        });
        let resource = self.resource_table.push(ResourceRow {
            lib: Some(lib),
            name: self.string_table.index_for_string(module),
            host: None,
            resource_type: ResourceType::Library,
        });

        self.resources.insert(module.to_owned(), resource);
        resource
    }

    fn finish(self) -> Profile {
        if self.ignored != 0 {
            warn!("Ignored {} lines with invalid format", self.ignored);
        }

        let mut thread = Thread::new(self.opt.thread_name.clone());
        thread.samples = self.samples;
        thread.stack_table = Arc::new(self.stacks.finish());
        thread.frame_table = Arc::new(self.frame_table);
        thread.func_table = Arc::new(self.func_table);
        thread.resource_table = Arc::new(self.resource_table);
        thread.string_table = Arc::new(self.string_table);

        Profile {
            meta: ProfileMeta {
                interval: 1.0,
                start_time: 0.0,
                product: self.opt.thread_name.clone(),
                categories: default_categories(),
            },
            libs: self.libs,
            threads: vec![thread],
            counters: Vec::new(),
        }
    }
}

// Parse and remove the sample count from the end of a line.
fn parse_count(line: &mut &str) -> Option<f64> {
    let counti = line.rfind(' ')?;
    let count = line[(counti + 1)..].parse::<f64>().ok()?;
    if !count.is_finite() {
        return None;
    }
    *line = line[..counti].trim_end();
    Some(count)
}

// The collapser annotation of a frame (`k`, `j` or `i`), if any.
fn annotation(name: &str) -> Option<char> {
    if name.ends_with(']') {
        if let Some(ai) = name.rfind("_[") {
            let annotation = &name[ai..];
            if annotation.len() == 4 {
                return annotation[2..3].chars().next().filter(|c| "kji".contains(*c));
            }
        }
    }
    None
}

// The module of a `module`function` frame.
fn module(name: &str) -> Option<&str> {
    match name.find('`') {
        Some(0) | None => None,
        Some(i) => Some(&name[..i]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_is_taken_from_the_end() {
        let mut line = "main;do work 4.5";
        assert_eq!(parse_count(&mut line), Some(4.5));
        assert_eq!(line, "main;do work");

        let mut line = "main;work";
        assert_eq!(parse_count(&mut line), None);

        let mut line = "main NaN";
        assert_eq!(parse_count(&mut line), None);
    }

    #[test]
    fn annotations_are_recognized() {
        assert_eq!(annotation("schedule_[k]"), Some('k'));
        assert_eq!(annotation("Interpreter_[j]"), Some('j'));
        assert_eq!(annotation("inlined_[i]"), Some('i'));
        assert_eq!(annotation("weird_[w]"), None);
        assert_eq!(annotation("array[3]"), None);
        assert_eq!(annotation("x_[kk]"), None);
    }

    #[test]
    fn modules_are_split_at_the_backtick() {
        assert_eq!(module("libc.so`malloc"), Some("libc.so"));
        assert_eq!(module("`weird"), None);
        assert_eq!(module("main"), None);
    }
}
