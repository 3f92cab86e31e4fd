//! Drives the built `libnfio_errors.so` through LD_PRELOAD in a small C host
//! (tests/c/host.c), one process per scenario.
#![cfg(all(
    target_os = "linux",
    target_env = "gnu",
    any(target_arch = "x86_64", target_arch = "aarch64")
))]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::OnceLock;

const HOST_SOURCE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/c/host.c");

/// The cdylib sits next to the `deps/` directory holding this test binary.
fn preload_library() -> PathBuf {
    let exe = std::env::current_exe().unwrap();
    let profile_dir = exe.parent().and_then(Path::parent).unwrap();
    let lib = profile_dir.join("libnfio_errors.so");
    assert!(
        lib.exists(),
        "{} missing; build nfio-errors-preload first",
        lib.display()
    );
    lib
}

fn host_binary() -> &'static Path {
    static HOST: OnceLock<PathBuf> = OnceLock::new();
    HOST.get_or_init(|| {
        let out = Path::new(env!("CARGO_TARGET_TMPDIR")).join("nfio_preload_host");
        let cc = std::env::var("CC").unwrap_or_else(|_| "cc".to_string());
        let status = Command::new(cc)
            .args(["-O0", "-o"])
            .arg(&out)
            .arg(HOST_SOURCE)
            .status()
            .unwrap();
        assert!(status.success(), "compiling {HOST_SOURCE} failed");
        out
    })
}

fn run_host(mode: &str, env: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(host_binary());
    cmd.arg(mode)
        .env("LD_PRELOAD", preload_library())
        .env("LC_ALL", "C")
        .env("HOME", env!("CARGO_TARGET_TMPDIR"));
    for (key, _) in std::env::vars() {
        if key.starts_with("NFIO_ERRORS") {
            cmd.env_remove(key);
        }
    }
    cmd.envs(env.iter().copied());
    cmd.output().unwrap()
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_strerror_family_under_preload() {
    let output = run_host("strerror", &[]);
    assert!(output.status.success(), "{output:?}");
    assert_eq!(
        stdout_of(&output),
        "Failed to execute command in VNF\nFailed to stop VNF\nNo such file or directory\n"
    );
}

#[test]
fn test_threshold_from_environment() {
    let output = run_host("strerror", &[("NFIO_ERRORS_THRESHOLD", "800")]);
    assert!(output.status.success(), "{output:?}");
    let stdout = stdout_of(&output);
    assert_eq!(stdout.lines().next(), Some("Unknown error 703"));
}

#[test]
fn test_long_message_is_bounded() {
    let output = run_host("long", &[]);
    assert!(output.status.success(), "{output:?}");
    assert_eq!(stdout_of(&output), "returned\n");

    // 1024-byte render buffer: 1023 bytes of text plus the NUL
    let stderr = stderr_of(&output);
    let kept = "a".repeat(1023);
    assert!(
        stderr.ends_with(&format!(": {kept}: Failed to deploy VNF\n")),
        "{stderr}"
    );
    assert!(!stderr.contains(&"a".repeat(1024)));
}

#[test]
fn test_reserved_error_returns_despite_status() {
    let output = run_host("reserved-status", &[]);
    assert!(output.status.success(), "{output:?}");
    assert_eq!(stdout_of(&output), "returned count=1\n");
    let stderr = stderr_of(&output);
    assert!(
        stderr.ends_with("nfio_preload_host: deploying web-01: Failed to create VNF\n"),
        "{stderr}"
    );
}

#[test]
fn test_echo_calls_from_environment() {
    let output = run_host("reserved-status", &[("NFIO_ERRORS_DEBUG", "1")]);
    assert!(output.status.success(), "{output:?}");
    assert_eq!(
        stdout_of(&output),
        "error: 1 704 deploying web-01\nreturned count=1\n"
    );
}

#[test]
fn test_error_at_line_one_per_line() {
    let output = run_host("one-per-line", &[]);
    assert!(output.status.success(), "{output:?}");
    assert_eq!(stdout_of(&output), "count=2\n");
    let stderr = stderr_of(&output);
    let lines: Vec<_> = stderr.lines().collect();
    assert_eq!(lines.len(), 2, "{stderr}");
    assert!(lines[0].ends_with(":deploy.c:42: first: VNF image name is missing"));
    assert!(lines[1].ends_with(":deploy.c:43: next: VNF image name is missing"));
}

#[test]
fn test_native_codes_reach_glibc() {
    let output = run_host("delegate", &[]);
    // glibc's own error() exits with the nonzero status
    assert_eq!(output.status.code(), Some(3), "{output:?}");
    assert_eq!(stdout_of(&output), "");
    let stderr = stderr_of(&output);
    let lines: Vec<_> = stderr.lines().collect();
    assert_eq!(lines.len(), 2, "{stderr}");
    assert!(lines[0].ends_with(": disk 100% full: No such file or directory"));
    assert!(lines[1].ends_with(": giving up: Input/output error"));
}
