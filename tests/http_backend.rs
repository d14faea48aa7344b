use axum::body::{ Body, Bytes };
use axum::extract::State;
use axum::http::{ header, HeaderMap, StatusCode };
use axum::routing::{ get, post };
use axum::{ Json, Router };
use claims_chat::backend::http::HttpBackend;
use claims_chat::backend::{ ClaimsBackend, UploadFile };
use claims_chat::config::ClientConfig;
use claims_chat::models::chat::Role;
use claims_chat::session::{ SendOutcome, SessionController, SessionEvent, ToastLevel };
use claims_chat::ClientError;
use futures::stream;
use serde_json::{ json, Value };
use std::convert::Infallible;
use std::sync::{ Arc, Mutex };
use std::time::Duration;
use url::Url;

type Received = Arc<Mutex<Vec<String>>>;

/// Body pieces deliberately cut through the middle of JSON documents.
const PIECES: [&str; 4] = [
    r#"{"type":"final_summary_chunk","con"#,
    "tent\":\"There were \"}\n{\"type\":\"final_summary_chunk\",\"content\":\"42 cl",
    "aims.\"}\n",
    "{\"type\":\"done\",\"content\":\"There were 42 claims.\"}\n",
];

async fn chat(State(received): State<Received>, Json(body): Json<Value>) -> Body {
    let query = body["query"].as_str().unwrap_or_default().to_string();
    received.lock().unwrap().push(query);

    let pieces = stream::unfold(0usize, |i| async move {
        if i >= PIECES.len() {
            return None;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        Some((Ok::<_, Infallible>(Bytes::from_static(PIECES[i].as_bytes())), i + 1))
    });
    Body::from_stream(pieces)
}

async fn upload(headers: HeaderMap, body: Bytes) -> (StatusCode, Json<Value>) {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !content_type.starts_with("multipart/form-data") {
        return (StatusCode::BAD_REQUEST, Json(json!({ "detail": "expected multipart" })));
    }
    let text = String::from_utf8_lossy(&body);
    let files = text.matches("name=\"files\"").count();
    let csv_parts = text.matches("text/csv").count();
    (StatusCode::OK, Json(json!({ "message": format!("received {} files, {} csv", files, csv_parts) })))
}

async fn clear() -> Json<Value> {
    Json(json!({ "message": "Successfully deleted 3 records and cleared knowledge base." }))
}

async fn root() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn plain_root() -> &'static str {
    "claims assistant is running"
}

async fn broken() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

async fn spawn_backend(app: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Url::parse(&format!("http://{}/", addr)).unwrap()
}

async fn healthy_backend() -> (Url, Received) {
    let received = Received::default();
    let app = Router::new()
        .route("/", get(root))
        .route("/api/chat", post(chat))
        .route("/api/upload", post(upload))
        .route("/api/data/clear", post(clear))
        .with_state(received.clone());
    (spawn_backend(app).await, received)
}

fn http_session(url: Url) -> (SessionController, Arc<HttpBackend>) {
    let backend = Arc::new(HttpBackend::from_config(&ClientConfig::new(url)).unwrap());
    (SessionController::new(backend.clone()), backend)
}

#[tokio::test]
async fn streams_split_events_over_http() {
    let (url, received) = healthy_backend().await;
    let (session, _) = http_session(url);

    let outcome = session.send_query("How many claims in March?").await;

    assert_eq!(outcome, SendOutcome::Completed);
    assert_eq!(received.lock().unwrap().as_slice(), ["How many claims in March?"]);
    let messages = session.messages().await;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].role, Role::Assistant);
    assert_eq!(messages[1].content, "There were 42 claims.");
    assert!(!messages[1].is_streaming);
}

#[tokio::test]
async fn server_error_drops_pending_reply() {
    let app = Router::new().route("/api/chat", post(broken));
    let (session, _) = http_session(spawn_backend(app).await);
    let mut events = session.subscribe();

    let outcome = session.send_query("anything").await;

    assert!(matches!(outcome, SendOutcome::ConnectionFailed(ref e) if e.contains("500")));
    let messages = session.messages().await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].role, Role::User);

    let mut saw_error_toast = false;
    while let Ok(event) = events.try_recv() {
        if let SessionEvent::Toast(toast) = event {
            saw_error_toast |= toast.level == ToastLevel::Error;
        }
    }
    assert!(saw_error_toast);
}

#[tokio::test]
async fn unreachable_backend_is_a_connection_failure() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let (session, _) = http_session(Url::parse(&format!("http://{}/", addr)).unwrap());

    assert!(matches!(session.send_query("hello?").await, SendOutcome::ConnectionFailed(_)));
    assert_eq!(session.messages().await.len(), 1);
    assert!(!session.check_health().await);
}

#[tokio::test]
async fn upload_sends_every_file_as_multipart() {
    let (url, _) = healthy_backend().await;
    let (_, backend) = http_session(url);

    let reply = backend
        .upload_files(vec![
            UploadFile::new("march.csv", "claim_id,claim_amount\nC1,100\n"),
            UploadFile::new("april.csv", "claim_id,claim_amount\nC2,250\n"),
        ])
        .await
        .unwrap();

    assert_eq!(reply.message.as_deref(), Some("received 2 files, 2 csv"));
}

#[tokio::test]
async fn clear_and_health_round_trip() {
    let (url, _) = healthy_backend().await;
    let (session, backend) = http_session(url);

    let reply = backend.clear_data().await.unwrap();
    assert_eq!(reply.message.as_deref(), Some("Successfully deleted 3 records and cleared knowledge base."));
    assert!(session.clear_data().await);
    assert!(backend.health().await.unwrap());
}

#[tokio::test]
async fn health_reply_that_is_not_json_is_an_error() {
    let app = Router::new().route("/", get(plain_root));
    let (session, backend) = http_session(spawn_backend(app).await);
    let mut rx = session.subscribe();

    assert!(matches!(backend.health().await, Err(ClientError::Json(_))));
    assert!(!session.check_health().await);
    match rx.try_recv() {
        Ok(SessionEvent::Toast(toast)) => assert_eq!(toast.level, ToastLevel::Error),
        other => panic!("expected an error toast, got {:?}", other),
    }
}

#[tokio::test]
async fn upload_file_from_disk_keeps_name() {
    let path = std::env::temp_dir().join(format!("claims-chat-{}.csv", std::process::id()));
    tokio::fs::write(&path, "claim_id\nC9\n").await.unwrap();

    let file = UploadFile::from_path(&path).await.unwrap();
    tokio::fs::remove_file(&path).await.unwrap();

    assert_eq!(file.name, path.file_name().unwrap().to_string_lossy());
    assert_eq!(file.bytes, b"claim_id\nC9\n");
}
