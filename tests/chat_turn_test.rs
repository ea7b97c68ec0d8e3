// tests/chat_turn_test.rs — End-to-end chat turns against stub inference servers

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use url::Url;

use counselbot::backend::{build_backend, CounselBackend, JobPoller, QueuedBackend};
use counselbot::core::{ChatSession, SubmitOutcome};
use counselbot::history::HistoryStore;
use counselbot::infra::config::{BackendMode, Config};
use counselbot::infra::storage::{MemoryStorage, Storage, HISTORY_KEY};

// ---------- Stub server plumbing ----------

async fn spawn_stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn open(backend: Arc<dyn CounselBackend>) -> (ChatSession, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    let session = ChatSession::open(backend, HistoryStore::new(storage.clone())).unwrap();
    (session, storage)
}

// ---------- Direct mode ----------

#[derive(Default)]
struct DirectStub {
    counsel_requests: Mutex<Vec<Value>>,
    clears: AtomicU32,
    fail_counsel: bool,
}

fn direct_router(stub: Arc<DirectStub>) -> Router {
    Router::new()
        .route(
            "/analyze/sentiment",
            post(|| async {
                Json(json!({"sentiment": "negative", "probabilities": {"negative": 0.8, "neutral": 0.2}}))
            }),
        )
        .route(
            "/analyze/mental-health",
            post(|| async {
                Json(json!({"condition": "anxiety", "probabilities": {"anxiety": 0.7}}))
            }),
        )
        .route(
            "/generate/counsel",
            post(
                |State(stub): State<Arc<DirectStub>>, Json(body): Json<Value>| async move {
                    stub.counsel_requests.lock().unwrap().push(body);
                    if stub.fail_counsel {
                        return Err((StatusCode::INTERNAL_SERVER_ERROR, "model crashed"));
                    }
                    Ok(Json(json!({
                        "response": "That sounds hard. What usually helps you wind down?",
                        "key_points": ["acknowledge stress", "find coping habits"]
                    })))
                },
            ),
        )
        .route(
            "/clear/history",
            post(|State(stub): State<Arc<DirectStub>>| async move {
                stub.clears.fetch_add(1, Ordering::SeqCst);
                Json(json!({"status": "success"}))
            }),
        )
        .route("/health", get(|| async { Json(json!({"status": "healthy"})) }))
        .with_state(stub)
}

async fn direct_backend(stub: Arc<DirectStub>) -> Arc<dyn CounselBackend> {
    let base = spawn_stub(direct_router(stub)).await;
    let mut config = Config::default();
    config.backend.api_url = base;
    let mode = config.resolve_backend().unwrap();
    assert_eq!(mode.label(), "direct");
    build_backend(&mode)
}

#[tokio::test]
async fn test_direct_turn_records_analysis_and_reply() {
    let stub = Arc::new(DirectStub::default());
    let (session, storage) = open(direct_backend(stub.clone()).await);

    let outcome = session.submit("  I can't sleep before exams  ").await;
    let (user, assistant) = match outcome {
        SubmitOutcome::Replied { user, assistant } => (user, assistant),
        other => panic!("expected reply, got {other:?}"),
    };

    assert_eq!(user.message, "I can't sleep before exams");
    let analysis = user.analysis.unwrap();
    assert_eq!(analysis.sentiment.unwrap().sentiment, "negative");
    assert_eq!(analysis.mental_health.unwrap().condition, "anxiety");
    assert!(assistant.message.starts_with("That sounds hard"));
    assert_eq!(assistant.key_points.unwrap().len(), 2);

    // Counsel request carries the session and never asks for a reset.
    let requests = stub.counsel_requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["prompt"], "I can't sleep before exams");
    assert_eq!(requests[0]["clear_history"], false);
    assert_eq!(requests[0]["session_id"], session.session_id().as_str());

    // Both entries were persisted.
    let saved = storage.get(HISTORY_KEY).unwrap().unwrap();
    let saved: Vec<Value> = serde_json::from_str(&saved).unwrap();
    assert_eq!(saved.len(), 2);
    assert_eq!(saved[0]["isUser"], true);
    assert_eq!(saved[1]["isUser"], false);
}

#[tokio::test]
async fn test_direct_server_error_yields_failed_turn() {
    let stub = Arc::new(DirectStub {
        fail_counsel: true,
        ..Default::default()
    });
    let (session, storage) = open(direct_backend(stub).await);

    let outcome = session.submit("hello").await;
    match outcome {
        SubmitOutcome::Failed { error } => assert!(error.contains("500"), "{error}"),
        other => panic!("expected failure, got {other:?}"),
    }

    // The user entry stays visible in memory but nothing was saved.
    let history = session.history();
    assert_eq!(history.len(), 1);
    assert!(history[0].is_user);
    assert!(storage.get(HISTORY_KEY).unwrap().is_none());
    assert!(!session.is_busy());
}

#[tokio::test]
async fn test_direct_clear_and_health() {
    let stub = Arc::new(DirectStub::default());
    let backend = direct_backend(stub.clone()).await;
    assert_eq!(backend.health().await.unwrap().as_deref(), Some("healthy"));

    let (session, _storage) = open(backend);
    let before = session.session_id().clone();
    session.submit("first").await;
    session.clear().await.unwrap();

    assert!(session.history().is_empty());
    assert_eq!(stub.clears.load(Ordering::SeqCst), 1);
    assert_eq!(session.session_id(), &before);
}

// ---------- Queued mode ----------

struct QueueStub {
    /// Statuses returned by successive status calls; the last one repeats.
    script: Vec<&'static str>,
    status_calls: AtomicU32,
    auth: Mutex<Option<String>>,
    submitted: Mutex<Option<Value>>,
}

impl QueueStub {
    fn new(script: Vec<&'static str>) -> Arc<Self> {
        Arc::new(Self {
            script,
            status_calls: AtomicU32::new(0),
            auth: Mutex::new(None),
            submitted: Mutex::new(None),
        })
    }
}

fn completed_output() -> Value {
    json!({
        "status": "success",
        "data": {
            "response": "Let's take this one step at a time.",
            "sentiment": {"sentiment": "neutral", "probabilities": {"neutral": 0.6}},
            "mental_health": {"condition": "stress", "probabilities": {"stress": 0.5}},
            "key_points": ["one step at a time"]
        }
    })
}

fn queue_router(stub: Arc<QueueStub>) -> Router {
    Router::new()
        .route(
            "/run",
            post(
                |State(stub): State<Arc<QueueStub>>, headers: HeaderMap, Json(body): Json<Value>| async move {
                    *stub.auth.lock().unwrap() = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(String::from);
                    *stub.submitted.lock().unwrap() = Some(body);
                    Json(json!({"id": "job-42", "status": "IN_QUEUE"}))
                },
            ),
        )
        .route(
            "/status/{id}",
            get(
                |State(stub): State<Arc<QueueStub>>, Path(id): Path<String>| async move {
                    let call = stub.status_calls.fetch_add(1, Ordering::SeqCst) as usize;
                    let status = stub.script[call.min(stub.script.len() - 1)];
                    let body = match status {
                        "COMPLETED" => json!({"id": id, "status": status, "output": completed_output()}),
                        "FAILED" => json!({"id": id, "status": status, "error": "CUDA out of memory"}),
                        _ => json!({"id": id, "status": status}),
                    };
                    Json(body)
                },
            ),
        )
        .with_state(stub)
}

async fn queued_backend(stub: Arc<QueueStub>, attempts: u32) -> Arc<dyn CounselBackend> {
    let base = spawn_stub(queue_router(stub)).await;
    Arc::new(QueuedBackend::new(
        Url::parse(&format!("{base}/run")).unwrap(),
        Url::parse(&format!("{base}/status")).unwrap(),
        Some("secret-key".into()),
        JobPoller::new(attempts, Duration::from_millis(5)),
    ))
}

#[tokio::test]
async fn test_queued_turn_polls_until_completed() {
    let stub = QueueStub::new(vec!["IN_QUEUE", "IN_PROGRESS", "COMPLETED"]);
    let (session, _storage) = open(queued_backend(stub.clone(), 10).await);

    let outcome = session.submit("work is overwhelming").await;
    let (user, assistant) = match outcome {
        SubmitOutcome::Replied { user, assistant } => (user, assistant),
        other => panic!("expected reply, got {other:?}"),
    };

    assert_eq!(stub.status_calls.load(Ordering::SeqCst), 3);
    assert_eq!(assistant.message, "Let's take this one step at a time.");
    assert_eq!(
        user.analysis.unwrap().mental_health.unwrap().condition,
        "stress"
    );

    assert_eq!(stub.auth.lock().unwrap().as_deref(), Some("Bearer secret-key"));
    let submitted = stub.submitted.lock().unwrap().clone().unwrap();
    assert_eq!(submitted["input"]["endpoint"], "all");
    assert_eq!(submitted["input"]["prompt"], "work is overwhelming");
    assert_eq!(submitted["input"]["session_id"], session.session_id().as_str());
}

#[tokio::test]
async fn test_queued_failed_job_stops_polling() {
    let stub = QueueStub::new(vec!["IN_PROGRESS", "FAILED", "COMPLETED"]);
    let (session, storage) = open(queued_backend(stub.clone(), 10).await);

    match session.submit("hello").await {
        SubmitOutcome::Failed { error } => assert!(error.contains("CUDA out of memory"), "{error}"),
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(stub.status_calls.load(Ordering::SeqCst), 2);
    assert!(storage.get(HISTORY_KEY).unwrap().is_none());
}

#[tokio::test]
async fn test_queued_poll_gives_up_after_max_attempts() {
    let stub = QueueStub::new(vec!["IN_PROGRESS"]);
    let (session, _storage) = open(queued_backend(stub.clone(), 3).await);

    assert!(matches!(
        session.submit("anyone there?").await,
        SubmitOutcome::Failed { .. }
    ));
    assert_eq!(stub.status_calls.load(Ordering::SeqCst), 3);
    assert_eq!(session.history().len(), 1);
}

#[tokio::test]
async fn test_remote_host_resolves_to_queued_mode() {
    let mut config = Config::default();
    config.backend.api_url = "https://api.example.com/v2/abc/run".into();
    let mode = config.resolve_backend().unwrap();
    match &mode {
        BackendMode::Queued { status_url, .. } => {
            assert_eq!(status_url.as_str(), "https://api.example.com/v2/abc/status");
        }
        other => panic!("expected queued mode, got {other:?}"),
    }
    assert_eq!(build_backend(&mode).mode(), "queued");
}
