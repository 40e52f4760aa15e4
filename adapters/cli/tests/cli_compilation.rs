use std::process::Command;

#[test]
fn cli_compiles_without_warnings() {
    let output = Command::new(env!("CARGO"))
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .args([
            "check",
            "--bin",
            "hive-invasion",
            "--message-format",
            "short",
        ])
        .output()
        .expect("failed to invoke cargo check for hive-invasion CLI binary");

    let diagnostics = String::from_utf8_lossy(&output.stderr);
    assert!(
        output.status.success(),
        "cargo check --bin hive-invasion should succeed:\n{diagnostics}"
    );
    assert!(
        !diagnostics.lines().any(|line| line.contains("warning")),
        "hive-invasion should build without warnings:\n{diagnostics}"
    );
}
