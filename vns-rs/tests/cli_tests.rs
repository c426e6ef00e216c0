//! Smoke tests for the `vns` binary.
//!
//! Every run passes `-f` so a `vnsrc` on the test machine cannot change the
//! outcome.  Output is piped, so key waits auto-advance and colour is off.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_vns"))
}

fn script_file(dir: &Path, src: &str) -> PathBuf {
    let path = dir.join("scene.vns");
    std::fs::write(&path, src).expect("write script");
    path
}

fn run(args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(binary())
        .args(args)
        .env_remove("VNSRC")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn vns");
    // The child may exit before reading stdin; a broken pipe is fine.
    let _ = child.stdin.take().expect("stdin").write_all(stdin.as_bytes());
    child.wait_with_output().expect("wait for vns")
}

fn stdout(o: &Output) -> String {
    String::from_utf8_lossy(&o.stdout).into_owned()
}

fn stderr(o: &Output) -> String {
    String::from_utf8_lossy(&o.stderr).into_owned()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[test]
fn runs_script_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = script_file(dir.path(), "[var n=6]Hello[r]n*7=[embed exp=\"n*7\"][l]");
    let out = run(&["-f", path.to_str().unwrap()], "");
    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out), "Hello\nn*7=42");
}

#[test]
fn reads_script_from_stdin() {
    let out = run(&["-f", "-"], "from stdin[r]");
    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out), "from stdin\n");
}

#[test]
fn dump_lists_commands() {
    let out = run(&["-f", "--dump", "-"], ":top\nHello[r][jump target=top]");
    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
    let listing = stdout(&out);
    assert!(listing.contains("#1  text \"Hello\""), "{listing}");
    assert!(listing.contains("newline"), "{listing}");
    assert!(listing.contains("label \"top\" -> #0"), "{listing}");
}

#[test]
fn missing_script_is_usage_error() {
    let out = run(&[], "");
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("Usage: vns"));
}

#[test]
fn unreadable_script_fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.vns");
    let out = run(&["-f", missing.to_str().unwrap()], "");
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn syntax_error_exit_status() {
    let out = run(&["-f", "-"], "[wait time=1");
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("tag is not closed"), "{}", stderr(&out));
}

#[test]
fn strict_flag_rejects_errors() {
    let src = "[jump target=nowhere]text";

    let lenient = run(&["-f", "-"], src);
    assert_eq!(lenient.status.code(), Some(0));
    assert_eq!(stdout(&lenient), "text");
    assert!(stderr(&lenient).contains("jump target 'nowhere' is not defined"));

    let strict = run(&["-s", "-f", "-"], src);
    assert_eq!(strict.status.code(), Some(1));
    assert_eq!(stdout(&strict), "");
    assert!(stderr(&strict).contains("script rejected"));
}

#[test]
fn explicit_config_file_applies() {
    let dir = tempfile::tempdir().unwrap();
    let rc = dir.path().join("vnsrc");
    std::fs::write(&rc, "strict = true\nindent_width = 3\n").unwrap();
    let flag = format!("-f{}", rc.display());

    let out = run(&[&flag, "-"], "[indent]x[jump target=gone]");
    assert_eq!(out.status.code(), Some(1));

    let out = run(&[&flag, "-"], "[indent]x");
    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out), "   x");
}

#[test]
fn missing_explicit_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let flag = format!("-f{}", dir.path().join("absent").display());
    let out = run(&[&flag, "-"], "x");
    assert_eq!(out.status.code(), Some(1));
}
