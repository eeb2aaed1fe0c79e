//! Exit codes and messages of the `img-web` binary.

use std::process::{Command, Output};
use tempfile::TempDir;

fn img_web(args: &[&str]) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_img-web"));
    cmd.args(args);
    cmd
}

fn run(cmd: &mut Command) -> Output {
    cmd.output().expect("failed to launch img-web")
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

#[test]
fn no_arguments_exits_1() {
    let out = run(&mut img_web(&[]));
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("Usage"));
}

#[test]
fn extra_positional_argument_exits_1() {
    let out = run(&mut img_web(&["a", "--force", "b"]));
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("unexpected argument"));
}

#[test]
fn help_and_version_exit_0() {
    let out = run(&mut img_web(&["--help"]));
    assert_eq!(out.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&out.stdout).contains("--force"));

    let out = run(&mut img_web(&["--version"]));
    assert_eq!(out.status.code(), Some(0));
}

#[test]
fn missing_tools_exit_1_before_any_work() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.png"), b"x").unwrap();

    let out = run(img_web(&[dir.path().to_str().unwrap()]).env("PATH", ""));
    assert_eq!(out.status.code(), Some(1));

    let err = stderr(&out);
    assert!(err.contains("Required tools are missing"));
    assert!(err.contains("magick"));
    assert!(err.contains("ffmpeg"));
    // reported once, not echoed by the console log layer
    assert_eq!(err.matches("Required tools are missing").count(), 1);
    assert!(!err.contains("Run aborted"));

    assert!(!String::from_utf8_lossy(&out.stdout).contains("Total files to process"));
    assert!(!dir.path().join("a.jxl").exists());
}
