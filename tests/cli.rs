mod common;

use std::fs::File;
use std::io::{self, BufReader, Cursor};
use std::process::{Command, Stdio};

use assert_cmd::prelude::*;

const INPUT: &str = "./tests/data/transform/nested.folded";

fn test_transform_cli(args: &[&str], expected_file: &str) {
    let output = Command::cargo_bin("profmorph-transform")
        .unwrap()
        .args(args)
        .arg(INPUT)
        .output()
        .expect("failed to execute process");
    assert!(output.status.success());
    let expected = BufReader::new(File::open(expected_file).unwrap());
    common::compare_results(Cursor::new(output.stdout), expected, expected_file);
}

#[test]
fn transform_identity() {
    test_transform_cli(&[], "./tests/data/transform/results/identity.txt");
}

#[test]
fn transform_merge_function() {
    test_transform_cli(
        &["-t", "mf-1"],
        "./tests/data/transform/results/merge-function.txt",
    );
}

#[test]
fn transform_collapse_resource() {
    test_transform_cli(
        &["-t", "cr-combined-0-9"],
        "./tests/data/transform/results/collapse-resource.txt",
    );
}

#[test]
fn transform_chain() {
    test_transform_cli(
        &["--transforms", "mf-1~cr-combined-0-9~df-8"],
        "./tests/data/transform/results/chain.txt",
    );
}

#[test]
fn transform_funcs() {
    test_transform_cli(&["--funcs"], "./tests/data/transform/results/funcs.txt");
}

#[test]
fn transform_stdin() {
    let expected_file = "./tests/data/transform/results/chain.txt";
    let mut child = Command::cargo_bin("profmorph-transform")
        .unwrap()
        .args(&["-t", "mf-1~cr-combined-0-9~df-8"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("Failed to spawn child process");
    let mut input = BufReader::new(File::open(INPUT).unwrap());
    let stdin = child.stdin.as_mut().expect("Failed to open stdin");
    io::copy(&mut input, stdin).unwrap();
    let output = child.wait_with_output().expect("Failed to read stdout");
    let expected = BufReader::new(File::open(expected_file).unwrap());
    common::compare_results(Cursor::new(output.stdout), expected, expected_file);
}

#[test]
fn transform_warns_about_dropped_transforms() {
    let output = Command::cargo_bin("profmorph-transform")
        .unwrap()
        .args(&["-t", "mf-1~bogus-3"])
        .arg(INPUT)
        .output()
        .expect("failed to execute process");
    assert!(output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Dropping transform"), "stderr: {}", stderr);

    // the valid transform still applies
    let expected_file = "./tests/data/transform/results/merge-function.txt";
    let expected = BufReader::new(File::open(expected_file).unwrap());
    common::compare_results(Cursor::new(output.stdout), expected, expected_file);
}

#[test]
fn transform_json() {
    let output = Command::cargo_bin("profmorph-transform")
        .unwrap()
        .args(&["--json", "-t", "df-8"])
        .arg(INPUT)
        .output()
        .expect("failed to execute process");
    assert!(output.status.success());
    let thread: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(thread["name"], "folded");
    assert_eq!(thread["samples"]["length"], 5);
    assert_eq!(thread["samples"]["stack"][4], serde_json::Value::Null);
}

#[test]
fn transform_missing_file() {
    Command::cargo_bin("profmorph-transform")
        .unwrap()
        .arg("./tests/data/transform/does-not-exist.folded")
        .assert()
        .failure();
}
