//! CLI interaction tests
//!
//! Help, version and rejected configuration terminate on their own. A
//! running monitor is stopped with SIGINT on Unix.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
#[cfg(unix)]
use std::process::Stdio;
#[cfg(unix)]
use std::time::{Duration, Instant};
use tempfile::TempDir;

const ENV_VARS: &[&str] = &[
    "WAN_MONITOR_PORT",
    "WAN_MONITOR_INTERVAL_SPEEDTEST",
    "WAN_MONITOR_INTERVAL_LATENCY",
    "WAN_MONITOR_SERVER_REFRESH_INTERVAL",
    "WAN_MONITOR_PING_HOSTS",
    "WAN_MONITOR_PING_COUNT",
    "WAN_MONITOR_SPEEDTEST_SERVERS_URL",
];

/// Command running in an empty directory with a clean environment
fn create_test_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("wan-monitor").unwrap();
    cmd.current_dir(dir.path());
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_help_lists_options() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--verbose"))
        .stdout(predicate::str::contains("--port"))
        .stdout(predicate::str::contains("--interval-speedtest"))
        .stdout(predicate::str::contains("--interval-latency"))
        .stdout(predicate::str::contains("--speedtest-server-refresh-interval"))
        .stdout(predicate::str::contains("--ping-host"));
}

#[test]
fn test_version() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("wan-monitor {}", env!("CARGO_PKG_VERSION"))));
}

#[test]
fn test_zero_interval_rejected() {
    let dir = TempDir::new().unwrap();
    for flag in ["--interval-latency", "--interval-speedtest", "--speedtest-server-refresh-interval"] {
        create_test_cmd(&dir)
            .args([flag, "0"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("greater than 0"));
    }
}

#[test]
fn test_malformed_values_rejected() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir).args(["--interval-latency", "ten"]).assert().failure();
    create_test_cmd(&dir).args(["--port", "70000"]).assert().failure();
    create_test_cmd(&dir).args(["--ping-count", "-1"]).assert().failure();
    create_test_cmd(&dir).arg("--no-such-flag").assert().failure();
}

#[test]
fn test_invalid_env_exits_with_config_code() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .env("WAN_MONITOR_PING_COUNT", "0")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_invalid_dotenv_exits_with_config_code() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(".env"), "WAN_MONITOR_INTERVAL_LATENCY=0\n").unwrap();

    create_test_cmd(&dir)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("WAN_MONITOR_INTERVAL_LATENCY"));
}

#[test]
fn test_out_of_range_ping_count_flag() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .args(["--ping-count", "101"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration error"));
}

#[cfg(unix)]
fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

#[test]
#[cfg(unix)]
fn test_interrupt_exits_cleanly() {
    let dir = TempDir::new().unwrap();
    let mut child = create_test_cmd(&dir)
        .args(["--port", &free_port().to_string()])
        .args(["--speedtest-servers-url", "http://127.0.0.1:9/servers"])
        .args(["--ping-host", "127.0.0.1", "--ping-count", "1"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    std::thread::sleep(Duration::from_millis(1_500));
    assert!(child.try_wait().unwrap().is_none(), "monitor exited before the interrupt");

    let sent = Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(sent.success());

    let deadline = Instant::now() + Duration::from_secs(20);
    let status = loop {
        if let Some(status) = child.try_wait().unwrap() {
            break status;
        }
        if Instant::now() > deadline {
            child.kill().unwrap();
            panic!("monitor did not stop after SIGINT");
        }
        std::thread::sleep(Duration::from_millis(50));
    };
    assert_eq!(status.code(), Some(0));
}
