//! Runs the `meshconv` binary and checks exit codes and output.

use std::{
    fs,
    path::{Path, PathBuf},
    process::{Command, Output},
};


fn input(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../tests/files").join(name)
}

fn meshconv(args: &[&Path]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_meshconv"))
        .args(args)
        .output()
        .expect("failed to run meshconv")
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}


#[test]
fn cube_obj_to_stl() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("cube.stl");

    let out = meshconv(&[input("cube.obj").as_path(), target.as_path()]);
    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));

    // Silent on success
    assert!(out.stdout.is_empty());
    assert!(out.stderr.is_empty());

    let data = fs::read(&target).unwrap();
    assert_eq!(data.len(), 84 + 12 * 50);
    assert_eq!(&data[80..84], &[12, 0, 0, 0]);
}

#[test]
fn empty_txt_to_off() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("out.off");

    let out = meshconv(&[input("empty.txt").as_path(), target.as_path()]);
    assert_eq!(out.status.code(), Some(1));
    assert!(!target.exists());

    let err = stderr(&out);
    assert!(err.starts_with("[!] Invalid input: "), "stderr: {}", err);
    assert_eq!(err.lines().count(), 1);
}

#[test]
fn corrupt_input_keeps_existing_output() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("out.ply");
    fs::write(&target, "precious").unwrap();

    let out = meshconv(&[input("broken_index.obj").as_path(), target.as_path()]);
    assert_eq!(out.status.code(), Some(1));
    assert_eq!(fs::read_to_string(&target).unwrap(), "precious");
}

#[test]
fn verbose_prints_summary_and_error_once() {
    let dir = tempfile::tempdir().unwrap();

    let target = dir.path().join("cube.off");
    let out = meshconv(&[Path::new("--verbose"), input("cube.obj").as_path(), target.as_path()]);
    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Source format: OBJ"), "stdout: {}", stdout);
    assert!(stdout.contains("Target format: OFF"), "stdout: {}", stdout);
    assert!(stdout.contains("8 vertices, 12 faces"), "stdout: {}", stdout);

    let target = dir.path().join("broken.off");
    let out = meshconv(&[Path::new("-v"), input("broken_index.obj").as_path(), target.as_path()]);
    assert_eq!(out.status.code(), Some(1));
    let err = stderr(&out);
    assert!(err.starts_with("[!] Invalid input: "), "stderr: {}", err);

    // The parse error is part of the first line and not repeated.
    assert_eq!(err.lines().count(), 1, "stderr: {}", err);
    assert_eq!(err.matches("(at line 4)").count(), 1, "stderr: {}", err);
    assert!(!err.contains("... caused by: "), "stderr: {}", err);
}

#[test]
fn unknown_output_format() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("cube.xyz");

    let out = meshconv(&[input("cube.obj").as_path(), target.as_path()]);
    assert_eq!(out.status.code(), Some(3));
    assert!(stderr(&out).starts_with("[!] Could not write output: "));
    assert!(!target.exists());
}

#[test]
fn usage_errors() {
    let a = input("cube.obj");
    let a = a.as_path();

    let cases: &[&[&Path]] = &[
        &[],
        &[a],
        &[a, Path::new("b.obj"), Path::new("c.obj")],
        &[a, Path::new("")],
        &[Path::new("--frobnicate"), a, Path::new("b.obj")],
    ];

    for args in cases {
        let out = meshconv(args);
        assert_eq!(out.status.code(), Some(2), "args: {:?}", args);

        let err = stderr(&out);
        let lines = err.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2, "stderr: {}", err);
        assert!(lines[0].starts_with("[!] Usage error: "), "stderr: {}", err);
        assert_eq!(lines[1], "USAGE: meshconv [-v|--verbose] <input> <output>");
    }
}

#[test]
fn help_and_version() {
    for flag in &["--help", "--version"] {
        let out = meshconv(&[Path::new(flag)]);
        assert_eq!(out.status.code(), Some(0));
        assert!(!out.stdout.is_empty());
    }
}
