// Process-level tests driving the built `czar` binary directly, covering
// the CLI-level exit-code contract (language spec §7): exit 0 on success,
// exit 1 on any compile/validation error, no output files written on error.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};

fn czar_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_czar"))
}

fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .to_path_buf()
}

fn cc_available() -> bool {
    let cc = std::env::var("CZAR_CC").unwrap_or_else(|_| "cc".to_string());
    Command::new(&cc)
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

static COUNTER: AtomicUsize = AtomicUsize::new(0);

/// A unique scratch `.cz` path under the workspace's target dir, avoiding
/// collisions between tests running in parallel.
fn scratch_path(stem: &str) -> PathBuf {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    project_root()
        .join("target")
        .join(format!("cli-test-{stem}-{n}.cz"))
}

fn write_source(path: &Path, src: &str) {
    std::fs::write(path, src).expect("failed to write scratch source");
}

fn cleanup(path: &Path) {
    let stem = path.with_extension("");
    for candidate in [
        path.with_extension("c"),
        path.with_extension("s"),
        stem.clone(),
        path.parent().unwrap().join("cz.h"),
        path.parent().unwrap().join("cz.c"),
    ] {
        let _ = std::fs::remove_file(candidate);
    }
    let _ = std::fs::remove_file(path);
}

#[test]
fn compile_valid_source_exits_zero_and_writes_c_file() {
    let path = scratch_path("valid");
    write_source(&path, "fn main() -> i32 { return 0; }");

    let output = Command::new(czar_binary())
        .arg("compile")
        .arg(&path)
        .output()
        .expect("failed to run czar");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let c_path = path.with_extension("c");
    assert!(c_path.exists(), "{} should exist", c_path.display());
    let contents = std::fs::read_to_string(&c_path).unwrap();
    assert!(contents.contains("int main ( void )"), "{contents}");

    cleanup(&path);
}

#[test]
fn compile_invalid_source_exits_nonzero_and_writes_nothing() {
    // Uninitialized local declaration violates P2 (language spec §4.2.1).
    let path = scratch_path("invalid");
    write_source(&path, "fn f() -> void { i32 x; }");

    let output = Command::new(czar_binary())
        .arg("compile")
        .arg(&path)
        .output()
        .expect("failed to run czar");

    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(1));
    assert!(!String::from_utf8_lossy(&output.stderr).is_empty());
    assert!(!path.with_extension("c").exists());

    cleanup(&path);
}

#[test]
fn compile_invalid_source_json_diagnostics_are_well_formed() {
    let path = scratch_path("invalid-json");
    write_source(&path, "fn f() -> void { i32 x; }");

    let output = Command::new(czar_binary())
        .arg("--diagnostic-format")
        .arg("json")
        .arg("compile")
        .arg(&path)
        .output()
        .expect("failed to run czar");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    let parsed: serde_json::Value =
        serde_json::from_str(stderr.trim()).expect("stderr should be valid JSON");
    assert!(parsed.is_array(), "{stderr}");

    cleanup(&path);
}

#[test]
fn format_reserializes_with_canonical_whitespace_and_runs_no_passes() {
    let path = scratch_path("format");
    // Deliberately invalid under P2 (no initializer) — `format` must still
    // succeed, since it only re-serializes the lexed token stream.
    write_source(&path, "fn f ( ) -> void { i32   x ; }");

    let output = Command::new(czar_binary())
        .arg("format")
        .arg(&path)
        .output()
        .expect("failed to run czar");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("fn f ( ) -> void { i32 x ; }"), "{stdout}");

    cleanup(&path);
}

#[test]
fn clean_removes_generated_artifacts() {
    let path = scratch_path("clean");
    write_source(&path, "fn main() -> i32 { return 0; }");

    let compile = Command::new(czar_binary())
        .arg("compile")
        .arg(&path)
        .output()
        .expect("failed to run czar compile");
    assert!(compile.status.success());
    assert!(path.with_extension("c").exists());

    let clean = Command::new(czar_binary())
        .arg("clean")
        .arg(&path)
        .output()
        .expect("failed to run czar clean");
    assert!(clean.status.success());
    assert!(!path.with_extension("c").exists());

    cleanup(&path);
}

#[test]
fn run_builds_and_executes_forwarding_exit_code() {
    if !cc_available() {
        eprintln!("SKIP: no C compiler found");
        return;
    }
    let path = scratch_path("run");
    write_source(&path, "fn main() -> i32 { return 7; }");

    let output = Command::new(czar_binary())
        .arg("run")
        .arg(&path)
        .output()
        .expect("failed to run czar run");
    assert_eq!(output.status.code(), Some(7));

    cleanup(&path);
}
