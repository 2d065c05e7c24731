use super::*;
use serde_json::Value;
use crate::test_server::{serve_once, NO_CONTENT, OK_JSON};
use tokio::net::TcpListener;

fn session(base_url: &str, context: SessionContext, timeout: Duration) -> SessionClient {
    let client = Client::builder().no_proxy().timeout(timeout).build().unwrap();
    SessionClient::with_client(client, base_url, context)
}

#[test]
fn test_context_authorization_header() {
    assert_eq!(SessionContext::anonymous().authorization(), None);
    let ctx = SessionContext::with_credential("abc");
    assert_eq!(ctx.authorization().as_deref(), Some("Token abc"));
    assert!(ctx.is_authenticated());
    assert!(!ctx.sign_out().is_authenticated());
    assert!(!SessionContext::with_credential("").is_authenticated());
}

#[test]
fn test_context_from_store() {
    let mut store = CredentialStore::new(std::path::PathBuf::from("/tmp/cinestack-session-test"));
    assert!(!SessionContext::from_store(&store).is_authenticated());
    store.set_api_token("tok".to_string(), "neo");
    assert_eq!(SessionContext::from_store(&store).authorization().as_deref(), Some("Token tok"));
}

#[tokio::test]
async fn test_credential_attached_when_present() {
    let (base, handle) = serve_once(OK_JSON).await;
    let client = session(&base, SessionContext::with_credential("secret"), Duration::from_secs(5));

    let body: Value = client.get("/api/playlists/", &[]).await.unwrap();
    assert_eq!(body["ok"], true);

    let request = handle.await.unwrap();
    assert!(request.starts_with("get /api/playlists/ "));
    assert!(request.contains("authorization: token secret"));
}

#[tokio::test]
async fn test_no_header_without_credential() {
    let (base, handle) = serve_once(OK_JSON).await;
    let client = session(&base, SessionContext::anonymous(), Duration::from_secs(5));

    let _: Value = client.get("api/tmdb/popular/", &[("page", "2".to_string())]).await.unwrap();

    let request = handle.await.unwrap();
    assert!(request.contains("/api/tmdb/popular/?page=2"));
    assert!(!request.contains("authorization:"));
}

#[tokio::test]
async fn test_post_json_success_decodes_body() {
    let (base, handle) = serve_once(OK_JSON).await;
    let client = session(&base, SessionContext::with_credential("secret"), Duration::from_secs(5));

    let body: Value = client.post("/api/playlists/", &serde_json::json!({"title": "Heist"})).await.unwrap();
    assert_eq!(body["ok"], true);

    let request = handle.await.unwrap();
    assert!(request.starts_with("post /api/playlists/ "));
    assert!(request.ends_with("{\"title\":\"heist\"}"));
}

#[tokio::test]
async fn test_unit_calls_accept_empty_success() {
    let (base, handle) = serve_once(NO_CONTENT).await;
    let client = session(&base, SessionContext::with_credential("secret"), Duration::from_secs(5));

    client
        .patch_unit("/api/playlists/3/update_item_status/9/", &serde_json::json!({"status": "watched"}))
        .await
        .unwrap();

    let request = handle.await.unwrap();
    assert!(request.starts_with("patch /api/playlists/3/update_item_status/9/ "));
    assert!(request.contains("\"status\":\"watched\""));
}

#[tokio::test]
async fn test_401_is_auth_expired_and_credential_kept() {
    let (base, _handle) =
        serve_once("HTTP/1.1 401 Unauthorized\r\ncontent-length: 0\r\nconnection: close\r\n\r\n").await;
    let client = session(&base, SessionContext::with_credential("stale"), Duration::from_secs(5));

    let err = client.get::<Value>("/api/playlists/", &[]).await.unwrap_err();
    assert_eq!(err, ApiError::AuthExpired);
    assert!(client.context().is_authenticated());
}

#[tokio::test]
async fn test_server_error_classified() {
    let (base, _handle) =
        serve_once("HTTP/1.1 502 Bad Gateway\r\ncontent-length: 4\r\nconnection: close\r\n\r\ndown").await;
    let client = session(&base, SessionContext::anonymous(), Duration::from_secs(5));

    let err = client.delete("/api/playlists/1/").await.unwrap_err();
    assert_eq!(err, ApiError::ServerError { status: 502, body: "down".to_string() });
}

#[tokio::test]
async fn test_connection_refused_is_network_unavailable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = session(&format!("http://{}", addr), SessionContext::anonymous(), Duration::from_secs(5));
    let err = client.get::<Value>("/api/playlists/", &[]).await.unwrap_err();
    assert!(matches!(err, ApiError::NetworkUnavailable(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_silent_server_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let _server = tokio::spawn(async move {
        let (_socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
    });

    let client = session(&format!("http://{}", addr), SessionContext::anonymous(), Duration::from_millis(200));
    let err = client.get::<Value>("/api/playlists/", &[]).await.unwrap_err();
    assert_eq!(err, ApiError::Timeout);
}
