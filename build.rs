//! Build script for persona-switcher
//!
//! Embeds git revision, build timestamp and toolchain details so that
//! `persona-switcher version` can report exactly what is running.

use std::env;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");

    let git_hash = run("git", &["rev-parse", "--short=8", "HEAD"]);
    let git_dirty = git_dirty();
    let rustc_version = run("rustc", &["--version"]);

    let build_timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();
    let target = env::var("TARGET").unwrap_or_else(|_| "unknown".to_string());
    let profile = env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    let vars = [
        ("PERSONA_SWITCHER_GIT_HASH", git_hash),
        ("PERSONA_SWITCHER_GIT_DIRTY", git_dirty.to_string()),
        ("PERSONA_SWITCHER_BUILD_TIMESTAMP", build_timestamp),
        ("PERSONA_SWITCHER_TARGET", target),
        ("PERSONA_SWITCHER_PROFILE", profile),
        ("PERSONA_SWITCHER_RUSTC_VERSION", rustc_version),
    ];
    for (key, value) in vars {
        println!("cargo:rustc-env={}={}", key, value);
    }
}

/// Run a command and return its trimmed stdout, or "unknown" on any failure
fn run(program: &str, args: &[&str]) -> String {
    Command::new(program)
        .args(args)
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// "true" when the working tree has uncommitted changes
fn git_dirty() -> &'static str {
    Command::new("git")
        .args(["status", "--porcelain"])
        .output()
        .ok()
        .map(|output| {
            if output.status.success() && !output.stdout.is_empty() {
                "true"
            } else {
                "false"
            }
        })
        .unwrap_or("unknown")
}
