use criterion::*;
use profmorph::profile::folded::{self, Options};
use profmorph::profile::{ImplementationFilter, Thread};
use profmorph::transforms::{apply_transform, parse_transforms, stringify_transforms, Transform};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

const STACKS: usize = 5_000;
const MAX_DEPTH: usize = 40;

// Frame names depend on their depth, so that stacks share long prefixes the way real ones do.
// Every tenth function lives in a library.
fn synthetic_thread() -> Thread {
    let mut rng = SmallRng::seed_from_u64(0x5eed);
    let mut lines = Vec::with_capacity(STACKS);
    for _ in 0..STACKS {
        let depth = rng.gen_range(1..=MAX_DEPTH);
        let frames: Vec<String> = (0..depth)
            .map(|level| {
                let name = rng.gen_range(0..(level / 4 + 2));
                if name % 10 == 9 {
                    format!("lib{}`fn_{}_{}", level % 3, level, name)
                } else {
                    format!("fn_{}_{}", level, name)
                }
            })
            .collect();
        lines.push(format!("{} {}", frames.join(";"), rng.gen_range(1..100)));
    }
    let mut profile =
        folded::profile_from_lines(&Options::default(), lines.iter().map(String::as_str));
    profile.threads.remove(0)
}

// The path of the deepest stack, and the function and resource found most often along it.
fn targets(thread: &Thread) -> (Vec<usize>, usize, usize) {
    let deepest = (0..thread.stack_table.length)
        .max_by_key(|&stack| thread.stack_table.depth(stack))
        .unwrap_or(0);
    let path = thread.func_path_for_stack(deepest);
    let func = path[path.len() / 2];
    let resource = (0..thread.func_table.length)
        .find_map(|func| thread.func_table.resource[func])
        .unwrap_or(0);
    (path, func, resource)
}

fn transforms_benchmark(c: &mut Criterion) {
    let thread = synthetic_thread();
    let (path, func, resource) = targets(&thread);
    let implementation = ImplementationFilter::Combined;
    let transforms = vec![
        Transform::FocusSubtree {
            call_node_path: path[..path.len() / 2].to_vec(),
            implementation,
            inverted: false,
        },
        Transform::FocusSubtree {
            call_node_path: path.iter().rev().take(3).copied().collect(),
            implementation,
            inverted: true,
        },
        Transform::FocusFunction { func_index: func },
        Transform::MergeCallNode {
            call_node_path: path[..path.len() / 2].to_vec(),
            implementation,
        },
        Transform::MergeFunction { func_index: func },
        Transform::DropFunction { func_index: func },
        Transform::CollapseResource {
            resource_index: resource,
            collapsed_func_index: thread.func_table.length,
            implementation,
        },
        Transform::CollapseDirectRecursion {
            func_index: func,
            implementation,
        },
        Transform::CollapseFunctionSubtree { func_index: func },
    ];

    let mut group = c.benchmark_group("transforms");
    group.throughput(Throughput::Elements(thread.stack_table.length as u64));
    for (i, transform) in transforms.iter().enumerate() {
        let id = BenchmarkId::new(transform.kind().name(), i);
        group.bench_function(id, |b| {
            b.iter(|| apply_transform(black_box(&thread), transform, 0))
        });
    }
    group.finish();

    let stack = stringify_transforms(&transforms);
    c.bench_function("parse_transforms", |b| {
        b.iter(|| parse_transforms(black_box(&stack)))
    });
}

criterion_group!(benches, transforms_benchmark);
criterion_main!(benches);
