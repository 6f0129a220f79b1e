use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use sqlx::sqlite::SqlitePoolOptions;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use todo_backend::api::router;
use todo_backend::client::{ClientError, ExecutionContext, RetryPolicy, TodoClient, UNAVAILABLE_MESSAGE};
use todo_backend::db::SqliteTodoStore;
use todo_backend::models::UpdateTodoRequest;
use todo_backend::state::AppState;

const FAST_RETRY: RetryPolicy = RetryPolicy {
    max_retries: 2,
    base_delay: Duration::from_millis(10),
};

async fn todo_app() -> Router {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    router(AppState::new(Arc::new(SqliteTodoStore::new(pool))))
}

async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn client() -> TodoClient {
    let base_url = serve(todo_app().await).await;
    TodoClient::with_base_url(base_url)
        .unwrap()
        .with_read_policy(FAST_RETRY)
}

/// Fails the first `failures` requests with a 500, then answers.
fn flaky_app(failures: usize, hits: Arc<AtomicUsize>) -> Router {
    async fn handler(State((failures, hits)): State<(usize, Arc<AtomicUsize>)>) -> (StatusCode, Json<Value>) {
        if hits.fetch_add(1, Ordering::SeqCst) < failures {
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "Failed to fetch todos"})))
        } else {
            (StatusCode::OK, Json(json!([])))
        }
    }

    Router::new()
        .route("/todos", get(handler).post(handler))
        .with_state((failures, hits))
}

#[tokio::test]
async fn create_list_toggle_delete_round_trip() {
    let client = client().await;

    let todo = client.create("  Buy milk ").await.unwrap();
    assert_eq!(todo.title, "Buy milk");
    assert!(!todo.completed);

    let todos = client.list().await.unwrap();
    assert_eq!(todos, vec![todo.clone()]);

    let toggled = client.toggle(todo.id, todo.completed).await.unwrap();
    assert!(toggled.completed);
    assert_eq!(toggled.created_at, todo.created_at);

    let renamed = client
        .update(
            todo.id,
            &UpdateTodoRequest {
                title: Some("Buy oat milk".to_string()),
                completed: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.title, "Buy oat milk");
    assert!(renamed.completed);

    client.delete(todo.id).await.unwrap();
    assert!(client.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn second_delete_reports_not_found() {
    let client = client().await;
    let todo = client.create("once").await.unwrap();
    client.delete(todo.id).await.unwrap();

    let err = client.delete(todo.id).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    assert_eq!(err.user_message(), "Todo not found");
    assert!(!err.is_network());
}

#[tokio::test]
async fn api_errors_carry_status_and_message() {
    let client = client().await;
    let todo = client.create("task").await.unwrap();

    let err = client
        .update(
            todo.id,
            &UpdateTodoRequest {
                title: Some("   ".to_string()),
                completed: None,
            },
        )
        .await
        .unwrap_err();

    match err {
        ClientError::Api { status, message } => {
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(message, "Title must be a non-empty string");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn list_retries_failed_reads() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base_url = serve(flaky_app(2, hits.clone())).await;
    let client = TodoClient::with_base_url(base_url).unwrap().with_read_policy(FAST_RETRY);

    let todos = client.list().await.unwrap();
    assert!(todos.is_empty());
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn list_gives_up_after_two_retries() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base_url = serve(flaky_app(usize::MAX, hits.clone())).await;
    let client = TodoClient::with_base_url(base_url).unwrap().with_read_policy(FAST_RETRY);

    let err = client.list().await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    assert_eq!(err.user_message(), "Failed to fetch todos");
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn writes_are_sent_once() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base_url = serve(flaky_app(usize::MAX, hits.clone())).await;
    let client = TodoClient::with_base_url(base_url).unwrap().with_read_policy(FAST_RETRY);

    let err = client.create("only once").await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unreachable_service_is_a_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = TodoClient::with_base_url(format!("http://{}", addr))
        .unwrap()
        .with_read_policy(FAST_RETRY);

    let err = client.list().await.unwrap_err();
    assert!(err.is_network(), "{err:?}");
    assert_eq!(err.status(), None);
    assert_eq!(err.user_message(), UNAVAILABLE_MESSAGE);
}

/// Raw listener that answers every request with headers promising a
/// 100-byte JSON body, writes one byte of it, then either stalls or hangs up.
async fn truncated_body_server(hang_up: bool) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let (mut socket, _) = listener.accept().await.unwrap();
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let head = "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 100\r\n\r\n[";
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.flush().await;
                if !hang_up {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                }
            });
        }
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn timeout_while_reading_body_is_a_network_error() {
    let base_url = truncated_body_server(false).await;
    let client = TodoClient::with_base_url(base_url)
        .unwrap()
        .with_read_policy(RetryPolicy::none())
        .with_timeout(Duration::from_millis(300))
        .unwrap();

    let err = client.list().await.unwrap_err();
    assert!(err.is_network(), "{err:?}");
    assert_eq!(err.user_message(), UNAVAILABLE_MESSAGE);
}

#[tokio::test]
async fn connection_dropped_mid_body_is_a_network_error() {
    let base_url = truncated_body_server(true).await;
    let client = TodoClient::with_base_url(base_url)
        .unwrap()
        .with_read_policy(RetryPolicy::none());

    let err = client.list().await.unwrap_err();
    assert!(err.is_network(), "{err:?}");
    assert_eq!(err.user_message(), UNAVAILABLE_MESSAGE);
}

#[tokio::test]
async fn malformed_success_body_is_a_decode_error() {
    async fn not_a_list() -> Json<Value> {
        Json(json!({"unexpected": true}))
    }
    let base_url = serve(Router::new().route("/todos", get(not_a_list))).await;
    let client = TodoClient::with_base_url(base_url)
        .unwrap()
        .with_read_policy(RetryPolicy::none());

    let err = client.list().await.unwrap_err();
    assert!(matches!(err, ClientError::Decode(_)), "{err:?}");
    assert!(!err.is_network());
}

#[tokio::test]
async fn browser_context_goes_through_api_prefix() {
    let origin = serve(Router::new().nest("/api", todo_app().await)).await;
    let client = TodoClient::new(&ExecutionContext::Browser { origin: origin.clone() }).unwrap();
    assert_eq!(client.base_url(), format!("{}/api", origin));

    let todo = client.create("via proxy").await.unwrap();
    assert_eq!(client.list().await.unwrap(), vec![todo]);
}

#[tokio::test]
async fn health_reports_status() {
    let client = client().await;
    let health = client.health().await.unwrap();
    assert_eq!(health.status, "ok");
    assert!(health.uptime >= 0.0);
}
