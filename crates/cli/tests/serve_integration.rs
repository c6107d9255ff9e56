//! Integration tests for the `sitelog serve` HTTP API.
//!
//! Each test starts the server as a child process on a unique port with its
//! own token file, makes raw HTTP requests, and verifies the responses.

use std::io::Read;
use std::net::TcpStream;
use std::process::{Child, Command};
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

/// Atomic port counter to avoid port conflicts between parallel tests.
/// Base port is derived from process ID so parallel `cargo test --workspace`
/// runs (separate test binaries) don't collide on the same port range.
static NEXT_PORT: AtomicU16 = AtomicU16::new(0);
static PORT_INIT: std::sync::Once = std::sync::Once::new();

fn next_port() -> u16 {
    PORT_INIT.call_once(|| {
        let base = 21000 + (std::process::id() as u16 % 20000);
        NEXT_PORT.store(base, Ordering::SeqCst);
    });
    NEXT_PORT.fetch_add(1, Ordering::SeqCst)
}

const TOKENS_TOML: &str = "[tokens]\n\"ana-token\" = 7\n\"rui-token\" = 9\n";

/// Helper: start the sitelog serve process on the given port with the
/// standard two-owner token file. The TempDir must outlive the child.
fn start_server(port: u16) -> (Child, tempfile::TempDir) {
    start_server_with_env(port, &[])
}

/// Helper: start the server with extra environment variables set.
fn start_server_with_env(port: u16, env: &[(&str, &str)]) -> (Child, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let tokens_path = dir.path().join("tokens.toml");
    std::fs::write(&tokens_path, TOKENS_TOML).expect("write token file");

    let mut cmd = Command::new(env!("CARGO_BIN_EXE_sitelog"));
    cmd.arg("serve")
        .arg("--port")
        .arg(port.to_string())
        .arg("--tokens")
        .arg(&tokens_path);
    for (name, value) in env {
        cmd.env(name, value);
    }
    // Redirect stdout/stderr to avoid blocking
    cmd.stdout(std::process::Stdio::piped());
    cmd.stderr(std::process::Stdio::piped());

    let child = cmd.spawn().expect("failed to start sitelog serve");
    // Wait for server to be ready by polling the port
    for _ in 0..50 {
        if TcpStream::connect(format!("127.0.0.1:{}", port)).is_ok() {
            return (child, dir);
        }
        std::thread::sleep(Duration::from_millis(100));
    }
    (child, dir)
}

/// Helper: make an HTTP request and return (status, body).
fn http_request(
    port: u16,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<&str>,
) -> (u16, String) {
    let mut stream = TcpStream::connect(format!("127.0.0.1:{}", port)).expect("failed to connect");
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();

    let mut headers = String::new();
    if let Some(token) = token {
        headers.push_str(&format!("Authorization: Bearer {}\r\n", token));
    }
    let body = body.unwrap_or("");
    if !body.is_empty() {
        headers.push_str("Content-Type: application/json\r\n");
    }
    headers.push_str(&format!("Content-Length: {}\r\n", body.len()));

    let request = format!(
        "{} {} HTTP/1.1\r\nHost: localhost:{}\r\n{}Connection: close\r\n\r\n{}",
        method, path, port, headers, body
    );
    std::io::Write::write_all(&mut stream, request.as_bytes()).expect("failed to write");

    let mut response = String::new();
    let _ = stream.read_to_string(&mut response);

    parse_http_response(&response)
}

/// Parse an HTTP response into (status_code, body).
fn parse_http_response(response: &str) -> (u16, String) {
    let (headers, body) = match response.split_once("\r\n\r\n") {
        Some((h, b)) => (h, b.to_string()),
        None => (response, String::new()),
    };

    let status = headers
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(0);

    // Handle chunked transfer encoding
    let body = if headers.contains("Transfer-Encoding: chunked") {
        decode_chunked(&body)
    } else {
        body
    };

    (status, body)
}

/// Decode chunked transfer encoding.
fn decode_chunked(data: &str) -> String {
    let mut result = String::new();
    let mut remaining = data;

    while let Some(line_end) = remaining.find("\r\n") {
        let size = match usize::from_str_radix(remaining[..line_end].trim(), 16) {
            Ok(s) => s,
            Err(_) => break,
        };
        if size == 0 {
            break;
        }
        let chunk_start = line_end + 2;
        let chunk_end = chunk_start + size;
        if chunk_end > remaining.len() {
            result.push_str(&remaining[chunk_start..]);
            break;
        }
        result.push_str(&remaining[chunk_start..chunk_end]);
        remaining = if chunk_end + 2 <= remaining.len() {
            &remaining[chunk_end + 2..]
        } else {
            ""
        };
    }

    result
}

fn json_body(body: &str) -> serde_json::Value {
    serde_json::from_str(body).unwrap_or_else(|e| panic!("invalid JSON ({e}): {body}"))
}

#[test]
fn health_returns_200_without_auth() {
    let port = next_port();
    let (mut child, _dir) = start_server(port);

    let (status, body) = http_request(port, "GET", "/health", None, None);
    child.kill().ok();
    child.wait().ok();

    assert_eq!(status, 200);
    let json = json_body(&body);
    assert_eq!(json["status"], "ok");
    assert!(
        json.get("sitelog_version").is_some(),
        "sitelog_version field must be present"
    );
}

#[test]
fn draft_without_token_is_unauthorized() {
    let port = next_port();
    let (mut child, _dir) = start_server(port);

    let (status, _) = http_request(port, "GET", "/draft?month=3&year=2024", None, None);
    child.kill().ok();
    child.wait().ok();

    assert_eq!(status, 401);
}

#[test]
fn draft_with_unknown_token_is_forbidden() {
    let port = next_port();
    let (mut child, _dir) = start_server(port);

    let (status, _) = http_request(
        port,
        "GET",
        "/draft?month=3&year=2024",
        Some("not-a-token"),
        None,
    );
    child.kill().ok();
    child.wait().ok();

    assert_eq!(status, 403);
}

#[test]
fn save_load_replace_delete_scenario() {
    let port = next_port();
    let (mut child, _dir) = start_server(port);

    // Save a draft with one processed entry.
    let (status, body) = http_request(
        port,
        "POST",
        "/draft",
        Some("ana-token"),
        Some(r#"{"month":3,"year":2024,"processed_entries":[{"day":1,"hours":8}]}"#),
    );
    assert_eq!(status, 200, "save failed: {body}");
    let json = json_body(&body);
    assert_eq!(json["success"], true);
    assert_eq!(json["record"]["owner_id"], 7);
    assert_eq!(json["record"]["processed_entries"][0]["hours"], 8);
    assert_eq!(
        json["record"]["manually_edited_days"]
            .as_array()
            .map(Vec::len),
        Some(0)
    );

    // Load it back.
    let (status, body) = http_request(
        port,
        "GET",
        "/draft?month=3&year=2024",
        Some("ana-token"),
        None,
    );
    assert_eq!(status, 200);
    let json = json_body(&body);
    assert_eq!(json["success"], true);
    assert_eq!(json["record"]["processed_entries"][0]["day"], 1);

    // Save again with only manually_edited_days: replace, not merge.
    let (status, body) = http_request(
        port,
        "POST",
        "/draft",
        Some("ana-token"),
        Some(r#"{"month":3,"year":2024,"manually_edited_days":[1]}"#),
    );
    assert_eq!(status, 200);
    let json = json_body(&body);
    assert_eq!(json["record"]["manually_edited_days"][0], 1);
    assert_eq!(
        json["record"]["processed_entries"].as_array().map(Vec::len),
        Some(0),
        "processed_entries must be replaced by the second save"
    );

    // Delete it.
    let (status, body) = http_request(
        port,
        "DELETE",
        "/draft?month=3&year=2024",
        Some("ana-token"),
        None,
    );
    assert_eq!(status, 200);
    let json = json_body(&body);
    assert_eq!(json["success"], true);
    assert_eq!(json["deleted_count"], 1);

    // Load after delete: success with null record.
    let (status, body) = http_request(
        port,
        "GET",
        "/draft?month=3&year=2024",
        Some("ana-token"),
        None,
    );
    assert_eq!(status, 200);
    let json = json_body(&body);
    assert_eq!(json["success"], true);
    assert!(json["record"].is_null());

    // Second delete succeeds with count 0.
    let (status, body) = http_request(
        port,
        "DELETE",
        "/draft?month=3&year=2024",
        Some("ana-token"),
        None,
    );
    child.kill().ok();
    child.wait().ok();

    assert_eq!(status, 200);
    let json = json_body(&body);
    assert_eq!(json["success"], true);
    assert_eq!(json["deleted_count"], 0);
}

#[test]
fn owners_never_observe_each_others_drafts() {
    let port = next_port();
    let (mut child, _dir) = start_server(port);

    let (status, _) = http_request(
        port,
        "POST",
        "/draft",
        Some("ana-token"),
        Some(r#"{"month":3,"year":2024,"processed_entries":[{"day":1,"hours":8}]}"#),
    );
    assert_eq!(status, 200);

    // Same period, other owner: no draft.
    let (status, body) = http_request(
        port,
        "GET",
        "/draft?month=3&year=2024",
        Some("rui-token"),
        None,
    );
    assert_eq!(status, 200);
    let json = json_body(&body);
    assert_eq!(json["success"], true);
    assert!(json["record"].is_null());

    // Other owner's delete removes nothing.
    let (status, body) = http_request(
        port,
        "DELETE",
        "/draft?month=3&year=2024",
        Some("rui-token"),
        None,
    );
    assert_eq!(status, 200);
    assert_eq!(json_body(&body)["deleted_count"], 0);

    // The original draft is still there.
    let (status, body) = http_request(
        port,
        "GET",
        "/draft?month=3&year=2024",
        Some("ana-token"),
        None,
    );
    child.kill().ok();
    child.wait().ok();

    assert_eq!(status, 200);
    let json = json_body(&body);
    assert_eq!(json["record"]["owner_id"], 7);
}

#[test]
fn malformed_month_behaves_as_no_draft() {
    let port = next_port();
    let (mut child, _dir) = start_server(port);

    let (status, _) = http_request(
        port,
        "POST",
        "/draft",
        Some("ana-token"),
        Some(r#"{"month":3,"year":2024,"processed_entries":[{"day":1,"hours":8}]}"#),
    );
    assert_eq!(status, 200);

    let (status, body) = http_request(
        port,
        "GET",
        "/draft?month=march&year=2024",
        Some("ana-token"),
        None,
    );
    assert_eq!(status, 200);
    let json = json_body(&body);
    assert_eq!(json["success"], true);
    assert!(json["record"].is_null());

    let (status, body) = http_request(
        port,
        "DELETE",
        "/draft?month=march&year=2024",
        Some("ana-token"),
        None,
    );
    child.kill().ok();
    child.wait().ok();

    assert_eq!(status, 200);
    let json = json_body(&body);
    assert_eq!(json["success"], true);
    assert_eq!(json["deleted_count"], 0);
}

#[test]
fn missing_period_params_behave_as_no_draft() {
    let port = next_port();
    let (mut child, _dir) = start_server(port);

    let (status, body) = http_request(port, "GET", "/draft", Some("ana-token"), None);
    child.kill().ok();
    child.wait().ok();

    assert_eq!(status, 200);
    let json = json_body(&body);
    assert_eq!(json["success"], true);
    assert!(json["record"].is_null());
}

#[test]
fn rate_limited_request_gets_error_envelope() {
    let port = next_port();
    let (mut child, _dir) = start_server_with_env(port, &[("SITELOG_RATE_LIMIT", "2")]);

    for _ in 0..2 {
        let (status, _) = http_request(
            port,
            "GET",
            "/draft?month=3&year=2024",
            Some("ana-token"),
            None,
        );
        assert_eq!(status, 200);
    }

    let (status, body) = http_request(
        port,
        "GET",
        "/draft?month=3&year=2024",
        Some("ana-token"),
        None,
    );

    // The limit is per owner: the other owner is still served.
    let (rui_status, _) = http_request(
        port,
        "GET",
        "/draft?month=3&year=2024",
        Some("rui-token"),
        None,
    );
    child.kill().ok();
    child.wait().ok();

    assert_eq!(status, 429);
    let json = json_body(&body);
    assert_eq!(json["error"], "rate limit exceeded");
    assert!(
        json.get("retry_after").is_some(),
        "retry_after field must be present"
    );
    assert_eq!(rui_status, 200);
}

#[test]
fn unknown_route_is_404() {
    let port = next_port();
    let (mut child, _dir) = start_server(port);

    let (status, _) = http_request(port, "GET", "/drafts", Some("ana-token"), None);
    child.kill().ok();
    child.wait().ok();

    assert_eq!(status, 404);
}
