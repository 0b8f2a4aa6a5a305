use std::process::Command;

/// Resolves the build identifier shown on the landing page and by `--version`.
///
/// `PSCLOUD_BUILD` wins when set (release pipelines build from tarballs without
/// a `.git` directory); otherwise the short SHA of `HEAD` is used.
fn build_id() -> String {
    if let Ok(id) = std::env::var("PSCLOUD_BUILD")
        && !id.trim().is_empty()
    {
        return id.trim().to_string();
    }

    Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".into())
}

fn main() {
    println!("cargo:rustc-env=GIT_SHA={}", build_id());

    println!("cargo:rerun-if-env-changed=PSCLOUD_BUILD");
    println!("cargo:rerun-if-changed=../../.git/HEAD");
    println!("cargo:rerun-if-changed=../../.git/refs/");
}
