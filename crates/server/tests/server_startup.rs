use std::io::Write;
use std::net::TcpListener;
use std::time::Duration;

use reqwest::Client;
use tempfile::NamedTempFile;
use tokio::time::{sleep, timeout};

/// Find an available port
fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Create a minimal valid config
fn minimal_config(port: u16, api_token: &str) -> String {
    format!(
        r#"
[server]
host = "127.0.0.1"
port = {}

[auth]
api_token = "{}"

[clients.default]
host = "127.0.0.1"
port = 1
pre_import_path = "/tmp/packlink-pre-import"
"#,
        port, api_token
    )
}

fn write_config(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

/// Spawn the server and return a handle
async fn spawn_server(config_path: &std::path::Path) -> tokio::process::Child {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_packlink"))
        .arg("start")
        .env("PACKLINK_CONFIG", config_path)
        .env("RUST_LOG", "error") // Quiet logs during tests
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn server")
}

/// Wait for server to be ready
async fn wait_for_server(port: u16, max_attempts: u32) -> bool {
    let client = Client::new();
    for _ in 0..max_attempts {
        if client
            .get(format!("http://127.0.0.1:{}/api/healthz/liveness", port))
            .send()
            .await
            .is_ok()
        {
            return true;
        }
        sleep(Duration::from_millis(50)).await;
    }
    false
}

#[tokio::test]
async fn test_liveness_endpoint() {
    let port = get_available_port();
    let temp_file = write_config(&minimal_config(port, ""));

    let mut server = spawn_server(temp_file.path()).await;

    assert!(
        wait_for_server(port, 40).await,
        "Server did not start in time"
    );

    let response = Client::new()
        .get(format!("http://127.0.0.1:{}/api/healthz/liveness", port))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    assert_eq!(response.text().await.unwrap(), "OK");

    server.kill().await.ok();
}

#[tokio::test]
async fn test_pack_requires_configured_token() {
    let port = get_available_port();
    let temp_file = write_config(&minimal_config(port, "secret-token"));

    let mut server = spawn_server(temp_file.path()).await;

    assert!(
        wait_for_server(port, 40).await,
        "Server did not start in time"
    );

    let response = Client::new()
        .post(format!("http://127.0.0.1:{}/api/pack", port))
        .json(&serde_json::json!({ "name": "Series.S01.1080p.WEB-DL.H.264-RlsGrp" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status().as_u16(), 401);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_gen_token_prints_token() {
    let output = timeout(
        Duration::from_secs(5),
        tokio::process::Command::new(env!("CARGO_BIN_EXE_packlink"))
            .arg("gen-token")
            .output(),
    )
    .await
    .expect("Command timed out")
    .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("API Token: "));
}

#[tokio::test]
async fn test_version_prints_package_version() {
    let output = timeout(
        Duration::from_secs(5),
        tokio::process::Command::new(env!("CARGO_BIN_EXE_packlink"))
            .arg("version")
            .output(),
    )
    .await
    .expect("Command timed out")
    .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        format!("packlink {}", env!("CARGO_PKG_VERSION"))
    );
}

#[tokio::test]
async fn test_missing_config_file_exits_with_error() {
    let result = timeout(
        Duration::from_secs(5),
        tokio::process::Command::new(env!("CARGO_BIN_EXE_packlink"))
            .env("PACKLINK_CONFIG", "/nonexistent/config.toml")
            .env("RUST_LOG", "error")
            .output(),
    )
    .await
    .expect("Command timed out")
    .expect("Failed to execute command");

    assert!(!result.status.success());
}

#[tokio::test]
async fn test_config_without_clients_exits_with_error() {
    let temp_file = write_config(
        r#"
[server]
port = 8080
"#,
    );

    let result = timeout(
        Duration::from_secs(5),
        tokio::process::Command::new(env!("CARGO_BIN_EXE_packlink"))
            .env("PACKLINK_CONFIG", temp_file.path())
            .env("RUST_LOG", "error")
            .output(),
    )
    .await
    .expect("Command timed out")
    .expect("Failed to execute command");

    assert!(!result.status.success());
}
