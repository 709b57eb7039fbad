use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use ecosystem_log::firestore_store::FirestoreStore;
use ecosystem_log::{
    EcosystemLogger, LogContext, LogRecord, MemorySink, RemoteHandle, RemoteStore,
    RemoteStoreError, Level, LOG_COLLECTION,
};

/// Answer exactly one HTTP request with a canned response and hand back
/// the raw request text.
fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub server");
    let addr = listener.local_addr().unwrap();

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept connection");
        let request = read_request(&mut stream);
        let response = format!(
            "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).unwrap();
        request
    });

    (format!("http://{addr}"), handle)
}

fn read_request(stream: &mut TcpStream) -> String {
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut head = String::new();
    let mut content_length = 0usize;

    loop {
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        if line == "\r\n" || line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap();
            }
        }
        head.push_str(&line);
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).unwrap();
    head + "\r\n" + &String::from_utf8(body).unwrap()
}

fn sample_document() -> ecosystem_log::Document {
    LogRecord::error(
        "exec",
        "order rejected",
        Some("insufficient margin".into()),
        LogContext::new().with_trade("T-42"),
    )
    .unwrap()
    .to_document()
    .unwrap()
}

#[test]
fn append_posts_typed_fields_with_bearer_token() {
    let (base_url, server) = serve_once("HTTP/1.1 200 OK", "{}");
    let store =
        FirestoreStore::with_base_url(&base_url, "demo", "test-token", Duration::from_secs(5))
            .unwrap();

    store.append(LOG_COLLECTION, &sample_document()).unwrap();

    let request = server.join().unwrap();
    let lowered = request.to_lowercase();
    assert!(request.starts_with("POST /v1/projects/demo/databases/"));
    assert!(request.contains("/documents/ecosystem_logs HTTP/1.1"));
    assert!(lowered.contains("authorization: bearer test-token"));
    assert!(request.contains(r#""message":{"stringValue":"order rejected"}"#));
    assert!(request.contains(r#""trade_id":{"stringValue":"T-42"}"#));
    assert!(request.contains(r#""level":{"stringValue":"ERROR"}"#));
}

#[test]
fn non_success_status_becomes_status_error() {
    let (base_url, server) = serve_once("HTTP/1.1 503 Service Unavailable", r#"{"error":"busy"}"#);
    let store =
        FirestoreStore::with_base_url(&base_url, "demo", "test-token", Duration::from_secs(5))
            .unwrap();

    let err = store.append(LOG_COLLECTION, &sample_document()).unwrap_err();
    server.join().unwrap();

    match err {
        RemoteStoreError::Status { status, body } => {
            assert_eq!(status, 503);
            assert!(body.contains("busy"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[test]
fn unreachable_endpoint_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let store = FirestoreStore::with_base_url(
        &format!("http://{addr}"),
        "demo",
        "test-token",
        Duration::from_secs(2),
    )
    .unwrap();

    let err = store.append(LOG_COLLECTION, &sample_document()).unwrap_err();
    assert!(matches!(err, RemoteStoreError::Transport(_)));
}

#[test]
fn logger_survives_a_failing_firestore() {
    let (base_url, server) = serve_once("HTTP/1.1 500 Internal Server Error", "{}");
    let store: RemoteHandle = Arc::new(
        FirestoreStore::with_base_url(&base_url, "demo", "test-token", Duration::from_secs(5))
            .unwrap(),
    );
    let sink = Arc::new(MemorySink::new());
    let logger = EcosystemLogger::builder("exec")
        .sink(sink.clone())
        .remote_store(store)
        .build()
        .unwrap();

    logger
        .log(Level::Critical, "venue disconnected", LogContext::new())
        .unwrap();
    server.join().unwrap();

    let lines = sink.lines();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with(" - exec - CRITICAL - venue disconnected"));
    assert!(lines[1].contains("remote log delivery failed: remote store returned 500"));
}
