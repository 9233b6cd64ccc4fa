use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use http::{Method, Request, Response, StatusCode, header};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use tokio::net::TcpListener;

use client::ClientError;
use client::http::{Backend, HttpBackend};
use client::storage::{MemoryTokenStore, TokenStore};
use shared::types::{AliasType, PostAlias, PutAlias};

// ---------------------------------------------------------------------------
// In-process backend
// ---------------------------------------------------------------------------

/// One request as the fake backend saw it.
#[derive(Debug, Clone)]
struct Seen {
    method: Method,
    path_and_query: String,
    authorization: Option<String>,
    body: Bytes,
}

type Log = Arc<Mutex<Vec<Seen>>>;

fn json(status: StatusCode, body: serde_json::Value) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}

fn empty(status: StatusCode) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .body(Full::new(Bytes::new()))
        .unwrap()
}

async fn handle(req: Request<Incoming>, log: Log) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path_and_query = req
        .uri()
        .path_and_query()
        .map(|p| p.to_string())
        .unwrap_or_default();
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = req.into_body().collect().await.unwrap().to_bytes();

    log.lock().unwrap().push(Seen {
        method: method.clone(),
        path_and_query: path_and_query.clone(),
        authorization,
        body: body.clone(),
    });

    let path = path_and_query.split('?').next().unwrap_or_default();

    let response = match (method, path) {
        (Method::GET, "/alias") => json(
            StatusCode::OK,
            serde_json::json!([
                { "name": "cat", "content": "meow", "type": "text", "author": "alice" },
                { "name": "lol", "value": "https://x.test/lol.png", "type": "image" },
            ]),
        ),
        (Method::POST, "/alias") => {
            let form: serde_json::Value = serde_json::from_slice(&body).unwrap();
            if form["name"] == "quiet" {
                empty(StatusCode::OK)
            } else {
                let mut stored = form.clone();
                stored["author"] = "alice".into();
                stored["createdAt"] = 1_700_000_000u64.into();
                json(StatusCode::CREATED, stored)
            }
        }
        (Method::PUT, "/alias/cat") | (Method::PUT, "/alias/funny%20cat") => {
            empty(StatusCode::NO_CONTENT)
        }
        (Method::PUT, _) => json(
            StatusCode::NOT_FOUND,
            serde_json::json!({ "message": "Alias not found" }),
        ),
        (Method::DELETE, "/alias/locked") => Response::builder()
            .status(StatusCode::INTERNAL_SERVER_ERROR)
            .body(Full::new(Bytes::from_static(b"<h1>oops</h1>")))
            .unwrap(),
        (Method::DELETE, _) => empty(StatusCode::NO_CONTENT),
        (Method::GET, "/account/login") => Response::builder()
            .status(StatusCode::FOUND)
            .header(header::LOCATION, "http://idp.test/login?app=aliases")
            .body(Full::new(Bytes::new()))
            .unwrap(),
        (Method::GET, "/auth/authorize") => Response::builder()
            .status(StatusCode::FOUND)
            .header(header::LOCATION, "/")
            .body(Full::new(Bytes::new()))
            .unwrap(),
        (Method::POST, "/auth/logout") => empty(StatusCode::NO_CONTENT),
        _ => empty(StatusCode::NOT_FOUND),
    };

    Ok(response)
}

/// Serve the fake backend on an ephemeral port.
async fn spawn_backend() -> (SocketAddr, Log) {
    let listener = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let log: Log = Arc::default();

    let server_log = log.clone();
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            let io = TokioIo::new(stream);
            let log = server_log.clone();
            tokio::spawn(async move {
                let service = service_fn(move |req| handle(req, log.clone()));
                let _ = http1::Builder::new()
                    .timer(TokioTimer::new())
                    .serve_connection(io, service)
                    .await;
            });
        }
    });

    (addr, log)
}

fn backend_for(addr: SocketAddr, tokens: Arc<dyn TokenStore>) -> HttpBackend {
    HttpBackend::new(
        &format!("http://{}/", addr),
        Duration::from_secs(5),
        tokens,
    )
}

fn last(log: &Log) -> Seen {
    log.lock().unwrap().last().cloned().unwrap()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_list_sends_bearer_token() {
    let (addr, log) = spawn_backend().await;
    let backend = backend_for(addr, Arc::new(MemoryTokenStore::with_token("a.b.c")));

    let aliases = backend.list_aliases().await.unwrap();

    assert_eq!(aliases.len(), 2);
    assert_eq!(aliases[0].author.as_deref(), Some("alice"));
    assert_eq!(aliases[1].content, "https://x.test/lol.png");
    assert_eq!(aliases[1].kind, AliasType::Image);

    let seen = last(&log);
    assert_eq!(seen.method, Method::GET);
    assert_eq!(seen.path_and_query, "/alias");
    assert_eq!(seen.authorization.as_deref(), Some("Bearer a.b.c"));
}

#[tokio::test]
async fn test_no_token_no_authorization_header() {
    let (addr, log) = spawn_backend().await;
    let backend = backend_for(addr, Arc::new(MemoryTokenStore::new()));

    backend.list_aliases().await.unwrap();

    assert_eq!(last(&log).authorization, None);
}

#[tokio::test]
async fn test_create_returns_stored_alias() {
    let (addr, log) = spawn_backend().await;
    let backend = backend_for(addr, Arc::new(MemoryTokenStore::new()));

    let created = backend
        .create_alias(&PostAlias::new("foo", AliasType::Text, "bar"))
        .await
        .unwrap();

    assert_eq!(created.name, "foo");
    assert_eq!(created.created_at, Some(1_700_000_000));

    let sent: serde_json::Value = serde_json::from_slice(&last(&log).body).unwrap();
    assert_eq!(sent["type"], "text");
    assert_eq!(sent["content"], "bar");
}

#[tokio::test]
async fn test_create_falls_back_to_form_on_empty_body() {
    let (addr, _log) = spawn_backend().await;
    let backend = backend_for(addr, Arc::new(MemoryTokenStore::new()));

    let created = backend
        .create_alias(&PostAlias::new("quiet", AliasType::Emote, "shh"))
        .await
        .unwrap();

    assert_eq!(created.name, "quiet");
    assert_eq!(created.content, "shh");
    assert_eq!(created.author, None);
}

#[tokio::test]
async fn test_update_encodes_name() {
    let (addr, log) = spawn_backend().await;
    let backend = backend_for(addr, Arc::new(MemoryTokenStore::new()));

    backend
        .update_alias("funny cat", &PutAlias::content("purr"))
        .await
        .unwrap();

    let seen = last(&log);
    assert_eq!(seen.method, Method::PUT);
    assert_eq!(seen.path_and_query, "/alias/funny%20cat");
}

#[tokio::test]
async fn test_rejection_carries_backend_message() {
    let (addr, _log) = spawn_backend().await;
    let backend = backend_for(addr, Arc::new(MemoryTokenStore::new()));

    let err = backend
        .update_alias("ghost", &PutAlias::content("boo"))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(404));
    assert_eq!(err.to_string(), "Alias not found");
}

#[tokio::test]
async fn test_rejection_without_json_uses_reason() {
    let (addr, _log) = spawn_backend().await;
    let backend = backend_for(addr, Arc::new(MemoryTokenStore::new()));

    let err = backend.delete_alias("locked").await.unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert_eq!(err.to_string(), "Internal Server Error");
}

#[tokio::test]
async fn test_login_redirect_reads_location() {
    let (addr, _log) = spawn_backend().await;
    let backend = backend_for(addr, Arc::new(MemoryTokenStore::new()));

    let location = backend.login_redirect().await.unwrap();

    assert_eq!(
        location.as_deref(),
        Some("http://idp.test/login?app=aliases")
    );
}

#[tokio::test]
async fn test_authorize_encodes_query() {
    let (addr, log) = spawn_backend().await;
    let backend = backend_for(addr, Arc::new(MemoryTokenStore::new()));

    backend.authorize("/", "a.b.c").await.unwrap();

    assert_eq!(
        last(&log).path_and_query,
        "/auth/authorize?redirect_uri=%2F&token=a.b.c"
    );
}

#[tokio::test]
async fn test_logout_posts() {
    let (addr, log) = spawn_backend().await;
    let backend = backend_for(addr, Arc::new(MemoryTokenStore::with_token("a.b.c")));

    backend.logout().await.unwrap();

    let seen = last(&log);
    assert_eq!(seen.method, Method::POST);
    assert_eq!(seen.path_and_query, "/auth/logout");
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    let listener = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let backend = backend_for(addr, Arc::new(MemoryTokenStore::new()));
    let err = backend.list_aliases().await.unwrap_err();

    assert!(matches!(err, ClientError::Transport(_)));
}

#[tokio::test]
async fn test_silent_backend_times_out() {
    let listener = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();

    // Accept and hold connections without ever answering.
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });

    let backend = HttpBackend::new(
        &format!("http://{}", addr),
        Duration::from_millis(200),
        Arc::new(MemoryTokenStore::new()),
    );
    let err = backend.list_aliases().await.unwrap_err();

    assert!(matches!(err, ClientError::Transport(_)));
    assert!(err.to_string().contains("timed out"));
}
