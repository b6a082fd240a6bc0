use log::Level;
use pretty_assertions::assert_eq;
use profmorph::profile::ImplementationFilter;
use profmorph::transforms::{parse_transforms, stringify_transforms, Transform, TransformStack};
use testing_logger::CapturedLog;

fn every_kind() -> Vec<Transform> {
    vec![
        Transform::FocusSubtree {
            call_node_path: vec![0, 1, 2],
            implementation: ImplementationFilter::Combined,
            inverted: false,
        },
        Transform::FocusSubtree {
            call_node_path: vec![5, 10],
            implementation: ImplementationFilter::Js,
            inverted: true,
        },
        Transform::FocusFunction { func_index: 3 },
        Transform::MergeCallNode {
            call_node_path: vec![1, 2, 3, 4],
            implementation: ImplementationFilter::Cpp,
        },
        Transform::MergeFunction { func_index: 12 },
        Transform::DropFunction { func_index: 0 },
        Transform::CollapseResource {
            resource_index: 1,
            collapsed_func_index: 42,
            implementation: ImplementationFilter::Combined,
        },
        Transform::CollapseDirectRecursion {
            func_index: 7,
            implementation: ImplementationFilter::Js,
        },
        Transform::CollapseFunctionSubtree { func_index: 32 },
    ]
}

const EVERY_KIND: &str = "f-combined-0w2~f-js-5a-i~ff-3~mcn-cpp-1w4~mf-12~df-0~\
                          cr-combined-1-42~rec-js-7~cfs-32";

fn warnings(logs: &[CapturedLog]) -> Vec<&CapturedLog> {
    logs.iter().filter(|log| log.level == Level::Warn).collect()
}

#[test]
fn every_kind_stringifies() {
    assert_eq!(stringify_transforms(&every_kind()), EVERY_KIND);
}

#[test]
fn every_kind_round_trips() {
    let transforms = every_kind();
    assert_eq!(
        parse_transforms(&stringify_transforms(&transforms)),
        transforms
    );
    for transform in &transforms {
        assert_eq!(
            transform.to_string().parse::<Transform>().as_ref(),
            Ok(transform)
        );
    }
}

#[test]
fn empty_string_is_an_empty_stack() {
    testing_logger::setup();
    assert_eq!(parse_transforms(""), Vec::new());
    assert_eq!(stringify_transforms(&[]), "");
    testing_logger::validate(|logs| assert!(warnings(logs).is_empty()));
}

#[test]
fn unknown_transform_is_dropped_with_one_warning() {
    testing_logger::setup();
    assert_eq!(
        parse_transforms("zz-1~mf-3"),
        vec![Transform::MergeFunction { func_index: 3 }]
    );
    testing_logger::validate(|logs| {
        let warnings = warnings(logs);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].body.starts_with("Dropping transform \"zz-1\""));
    });
}

#[test]
fn malformed_transforms_are_dropped() {
    testing_logger::setup();
    let transforms = parse_transforms("f-combined-0w2~mf-x~~cr-js-1~df-3~mcn-js-0w~ff-");
    assert_eq!(
        transforms,
        vec![
            Transform::FocusSubtree {
                call_node_path: vec![0, 1, 2],
                implementation: ImplementationFilter::Combined,
                inverted: false,
            },
            Transform::DropFunction { func_index: 3 },
        ]
    );
    testing_logger::validate(|logs| {
        let bodies: Vec<&str> = warnings(logs)
            .into_iter()
            .map(|log| log.body.as_str())
            .collect();
        assert_eq!(bodies.len(), 4);
        assert!(bodies[0].starts_with("Dropping transform \"mf-x\""));
        assert!(bodies[1].starts_with("Dropping transform \"cr-js-1\""));
        assert!(bodies[2].starts_with("Dropping transform \"mcn-js-0w\""));
        assert!(bodies[3].starts_with("Dropping transform \"ff-\""));
    });
}

#[test]
fn unknown_implementation_falls_back_to_combined() {
    let transforms = parse_transforms("mcn-wasm-3~rec-wasm-4");
    assert_eq!(
        transforms,
        vec![
            Transform::MergeCallNode {
                call_node_path: vec![3],
                implementation: ImplementationFilter::Combined,
            },
            Transform::CollapseDirectRecursion {
                func_index: 4,
                implementation: ImplementationFilter::Combined,
            },
        ]
    );
}

#[test]
fn rec_with_only_an_index_is_rejected() {
    // "rec-4" reads "4" as the implementation, and then misses the function
    let t: Result<Transform, _> = "rec-4".parse();
    assert!(t.is_err());
}

#[test]
fn transform_stack_pops_breadcrumbs() {
    let mut stack: TransformStack = EVERY_KIND.parse().unwrap();
    assert_eq!(stack.len(), 9);
    assert_eq!(stack.to_string(), EVERY_KIND);

    stack.pop_from(2);
    assert_eq!(stack.to_string(), "f-combined-0w2~f-js-5a-i");

    stack.push(Transform::DropFunction { func_index: 8 });
    assert_eq!(stack.transforms().len(), 3);
    assert_eq!(stack.to_string(), "f-combined-0w2~f-js-5a-i~df-8");

    stack.pop_from(0);
    assert!(stack.is_empty());
}
