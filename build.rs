use std::process::Command;

fn main() {
    let git_hash = Command::new("git")
        .args(&["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|hash| hash.trim().to_string())
        .unwrap_or_else(|| String::from("NOCOMMITHASH"));
    println!("cargo:rustc-env=GIT_HASH={}", git_hash);
}
