//! Stamps the binary with the commit it was built from and the build date.

use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=.git/HEAD");

    let commit = match git(&["rev-parse", "--short", "HEAD"]) {
        Some(hash) if git(&["status", "--porcelain"]).is_some_and(|s| !s.is_empty()) => {
            format!("{hash}+dirty")
        }
        Some(hash) => hash,
        None => "unknown".to_string(),
    };
    println!("cargo:rustc-env=SUBTRACK_COMMIT={commit}");

    let built_on = chrono::Utc::now().format("%Y-%m-%d");
    println!("cargo:rustc-env=SUBTRACK_BUILD_DATE={built_on}");
}

/// Trimmed stdout of a successful git invocation.
fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|text| text.trim().to_string())
}
