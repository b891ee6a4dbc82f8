//! Exercises `VaultClient` against a minimal in-process HTTP responder.

use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use vault_client::{SecretStore, VaultClient, VaultError, TOKEN_HEADER};

const GOOD_TOKEN: &str = "test-token";

/// Answers every request from `route(path, token)` until the test ends.
async fn spawn_vault<F>(route: F) -> SocketAddr
where
    F: Fn(&str, Option<&str>) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let route = std::sync::Arc::new(route);

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let route = route.clone();
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = socket.read(&mut chunk).await.unwrap();
                    if n == 0 {
                        return;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                }
                let request = String::from_utf8_lossy(&buf).to_string();
                let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();
                let token = request.lines().find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case(TOKEN_HEADER).then(|| value.trim().to_string())
                });

                let (status, body) = route(&path, token.as_deref());
                let response = format!(
                    "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

fn standard_route(path: &str, token: Option<&str>) -> (u16, String) {
    if token != Some(GOOD_TOKEN) {
        return (403, r#"{"errors":["permission denied"]}"#.to_string());
    }
    match path {
        "/v1/auth/token/lookup-self" => (200, r#"{"data":{"ttl":3600}}"#.to_string()),
        "/v1/secret/data/secret/database/postgresql" => (
            200,
            r#"{"data":{"data":{"host":"vault-host.com","port":"5432","database":"vaultdb","username":"vaultuser","password":"vaultpass"},"metadata":{"version":3}}}"#
                .to_string(),
        ),
        "/v1/secret/data/broken" => (200, r#"{"data":null}"#.to_string()),
        "/v1/secret/data/unavailable" => (503, r#"{"errors":["Vault is sealed"]}"#.to_string()),
        _ => (404, r#"{"errors":[]}"#.to_string()),
    }
}

#[tokio::test]
async fn valid_token_is_authenticated() {
    let addr = spawn_vault(standard_route).await;
    let client = VaultClient::new(&format!("http://{addr}"), GOOD_TOKEN).unwrap();
    assert!(client.is_authenticated().await.unwrap());
}

#[tokio::test]
async fn rejected_token_is_not_authenticated() {
    let addr = spawn_vault(standard_route).await;
    let client = VaultClient::new(&format!("http://{addr}"), "wrong").unwrap();
    assert!(!client.is_authenticated().await.unwrap());
}

#[tokio::test]
async fn reads_kv_v2_secret_data() {
    let addr = spawn_vault(standard_route).await;
    let client = VaultClient::new(&format!("http://{addr}"), GOOD_TOKEN).unwrap();

    let secret = client.read_secret("secret/database/postgresql").await.unwrap();
    assert_eq!(secret["host"], "vault-host.com");
    assert_eq!(secret["port"], "5432");
    assert_eq!(secret["password"], "vaultpass");
    assert!(!secret.contains_key("ssl_mode"));
}

#[tokio::test]
async fn missing_secret_is_reported_by_path() {
    let addr = spawn_vault(standard_route).await;
    let client = VaultClient::new(&format!("http://{addr}"), GOOD_TOKEN).unwrap();

    let err = client.read_secret("nothing/here").await.unwrap_err();
    assert!(matches!(err, VaultError::SecretNotFound(ref p) if p == "nothing/here"));
}

#[tokio::test]
async fn forbidden_read_is_an_authentication_error() {
    let addr = spawn_vault(standard_route).await;
    let client = VaultClient::new(&format!("http://{addr}"), "wrong").unwrap();

    let err = client.read_secret("secret/database/postgresql").await.unwrap_err();
    assert!(matches!(err, VaultError::Authentication));
}

#[tokio::test]
async fn malformed_payload_and_server_errors_are_distinguished() {
    let addr = spawn_vault(standard_route).await;
    let client = VaultClient::new(&format!("http://{addr}"), GOOD_TOKEN).unwrap();

    let err = client.read_secret("broken").await.unwrap_err();
    assert!(matches!(err, VaultError::Deserialization(_)));

    let err = client.read_secret("unavailable").await.unwrap_err();
    match err {
        VaultError::Api(status, message) => {
            assert_eq!(status, 503);
            assert_eq!(message, "Vault is sealed");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    // Bind and immediately drop a listener to obtain a port nothing serves.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = VaultClient::new(&format!("http://{addr}"), GOOD_TOKEN).unwrap();
    let err = client.is_authenticated().await.unwrap_err();
    assert!(matches!(err, VaultError::Transport(_)));
}
