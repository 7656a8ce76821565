//! Build script for bertram
//!
//! Records the compiler version and the git revision so `bertram --version`
//! identifies the exact build a crash report came from. Neither is required:
//! builds outside a git checkout report `unknown`.

use std::process::Command;

fn main()
{
    let rustc = match rustc_version::version_meta() {
        Ok(meta) => format!("rustc {}", meta.semver),
        Err(_) => {
            println!("cargo:warning=could not determine the Rust version");
            "rustc unknown".to_string()
        }
    };
    println!("cargo:rustc-env=BERTRAM_RUSTC_VERSION={rustc}");

    let git_hash = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|hash| hash.trim().to_string())
        .filter(|hash| !hash.is_empty())
        .unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=BERTRAM_GIT_HASH={git_hash}");

    println!("cargo:rerun-if-changed=build.rs");
}
