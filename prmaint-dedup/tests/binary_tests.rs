//! Runs the built prmaint-dedup binary to check startup behavior that only
//! shows up once the tracing subscriber is live. Relies on `XDG_CONFIG_HOME`
//! steering the platform config directory, so Linux only.

#![cfg(target_os = "linux")]

use prmaint_common::snapshot::write_snapshot;
use prmaint_common::PullRequest;
use std::process::Command;
use tempfile::TempDir;

fn dedup_command(config_home: &TempDir) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_prmaint-dedup"));
    command
        .env_remove("PRMAINT_CONFIG")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1")
        .env("HOME", config_home.path())
        .env("XDG_CONFIG_HOME", config_home.path());
    command
}

#[test]
fn test_broken_platform_config_warning_reaches_stderr() {
    let config_home = TempDir::new().unwrap();
    let config_dir = config_home.path().join("prmaint");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.toml"), "[dedup\nbroken").unwrap();

    let input = config_home.path().join("pull_requests.json");
    write_snapshot(&input, &[PullRequest::new(1, "Add release notes")]).unwrap();

    let output = dedup_command(&config_home)
        .args(["validate", "--input"])
        .arg(&input)
        .output()
        .unwrap();

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "stderr: {}", stderr);
    assert!(stderr.contains("Ignoring config file"), "stderr: {}", stderr);
    assert!(stderr.contains("using compiled defaults"), "stderr: {}", stderr);
}

#[test]
fn test_platform_config_is_announced_on_startup() {
    let config_home = TempDir::new().unwrap();
    let config_dir = config_home.path().join("prmaint");
    std::fs::create_dir_all(&config_dir).unwrap();
    let config_path = config_dir.join("config.toml");
    std::fs::write(&config_path, "[logging]\nlevel = \"info\"\n").unwrap();

    let input = config_home.path().join("pull_requests.json");
    write_snapshot(&input, &[PullRequest::new(1, "Add release notes")]).unwrap();

    let output = dedup_command(&config_home)
        .args(["validate", "--input"])
        .arg(&input)
        .output()
        .unwrap();

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "stderr: {}", stderr);
    assert!(!stderr.contains("Ignoring config file"), "stderr: {}", stderr);
    assert!(
        stderr.contains(&format!("Configuration: {}", config_path.display())),
        "stderr: {}",
        stderr
    );
}
