use std::env;
use std::process::Command;

/// Packagers building from a tarball can pin the version explicitly.
const VERSION_OVERRIDE: &str = "TASKLOG_BUILD_VERSION";

fn git_describe() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let described = String::from_utf8(output.stdout).ok()?;
    let described = described.trim().trim_start_matches('v');
    (!described.is_empty()).then(|| described.to_string())
}

fn main() {
    let version = env::var(VERSION_OVERRIDE)
        .ok()
        .filter(|v| !v.is_empty())
        .or_else(git_describe)
        .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());

    println!("cargo:rustc-env=TASKLOG_VERSION={}", version);
    println!("cargo:rerun-if-env-changed={}", VERSION_OVERRIDE);
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/tags");
}
