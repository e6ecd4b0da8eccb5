fn main() {
    // HEAD が動いたらバージョン文字列を作り直す
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");

    let described = std::process::Command::new("git")
        .args(["describe", "--always", "--dirty", "--tags"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .filter(|s| !s.is_empty());

    // git が無い環境（crate 配布物など）ではパッケージ版だけ
    let pkg = std::env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".to_string());
    let version = match described {
        Some(rev) => format!("{}+{}", pkg, rev),
        None => pkg,
    };

    println!("cargo:rustc-env=MOTION_RIG_VERSION={}", version);
}
