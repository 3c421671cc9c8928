use axum::{
    body::Body,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use futures_util::stream;
use futures_util::StreamExt;
use serde_json::{json, Value};
use sm_core::{BookmarkEntry, PageRecord, Step, StreamEvent, UploadFlag, GENERIC_ERROR_MESSAGE};
use sm_inference::stream::TIMEOUT_MESSAGE;
use sm_inference::{ClientConfig, RemoteClient};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

#[derive(Clone, Default)]
struct Captured {
    uploads: Arc<Mutex<Vec<Value>>>,
    searches: Arc<Mutex<Vec<Value>>>,
}

const FRAMES: &[&str] = &[
    "data: {\"step\":\"retrieved_parents\",\"data\":{\"count\":2}}\n\n",
    "data: {\"step\":\"llm_response\",\"data\":{\"text\":\"The crab 🦀",
    " page\"}}\n\ndata: {broken}\n\n",
    "data: {\"step\":\"output_parser\",\"data\":{\"format\":{\"url\":\"https://a.test\"}}}\n\n",
    "data: {\"step\":\"post_processing\",\"data\":{\"validated_docs\":1}}\n\n",
    "data: {\"step\":\"final\",\"data\":{\"docs\":[{\"metadata\":{\"source\":\"https://a.test\",\"title\":\"A\",\"date\":\"Mon, Oct 19, 2026\"}}],\"result\":\"Found it\"}}\n\n",
];

async fn save_data(State(captured): State<Captured>, Json(body): Json<Value>) -> Response {
    let reject = body["data"][0]["url"] == "https://reject.test";
    captured.uploads.lock().unwrap().push(body);
    if reject {
        return Json(json!({"success": false})).into_response();
    }
    Json(json!({"success": true})).into_response()
}

async fn search_stream(State(captured): State<Captured>, Json(body): Json<Value>) -> Response {
    let query = body["query"].as_str().unwrap_or_default().to_string();
    captured.searches.lock().unwrap().push(body);

    match query.as_str() {
        "fail" => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        "slow" => {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Body::from(FRAMES[FRAMES.len() - 1]).into_response()
        }
        "hang" => {
            let first = stream::iter(vec![Ok::<_, std::io::Error>(FRAMES[0].to_string())]);
            Body::from_stream(first.chain(stream::pending())).into_response()
        }
        "silent" => Body::from_stream(stream::iter(vec![Ok::<_, std::io::Error>(
            "data: {\"step\":\"llm_response\",\"data\":{\"text\":\"cut".to_string(),
        )]))
        .into_response(),
        _ => {
            let chunks: Vec<_> = FRAMES
                .iter()
                .map(|frame| Ok::<_, std::io::Error>(frame.as_bytes().to_vec()))
                .collect();
            Body::from_stream(stream::iter(chunks)).into_response()
        }
    }
}

async fn spawn_server() -> (String, Captured) {
    let captured = Captured::default();
    let router = Router::new()
        .route("/save-data", post(save_data))
        .route("/search-stream", post(search_stream))
        .with_state(captured.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{}", addr), captured)
}

fn client(host: &str) -> RemoteClient {
    RemoteClient::new(
        ClientConfig::default()
            .with_host(host)
            .with_idle_timeout(Duration::from_millis(500)),
    )
    .unwrap()
}

async fn collect(client: &RemoteClient, query: &str) -> Vec<StreamEvent> {
    client
        .search_stream("user-1", query, UploadFlag::History, CancellationToken::new())
        .await
        .into_stream()
        .collect()
        .await
}

#[tokio::test]
async fn test_upload_history() {
    let (host, captured) = spawn_server().await;
    let records = vec![PageRecord::new("https://a.test", "A", "A a", "Mon, Oct 19, 2026")];

    client(&host).upload(&records, "user-1", UploadFlag::History).await.unwrap();

    let uploads = captured.uploads.lock().unwrap();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0]["userId"], "user-1:h");
    assert_eq!(uploads[0]["flag"], "history");
    assert_eq!(uploads[0]["data"][0]["date"], "Mon, Oct 19, 2026");
}

#[tokio::test]
async fn test_upload_bookmarks_rejected() {
    let (host, captured) = spawn_server().await;
    let bookmarks = vec![BookmarkEntry {
        url: "https://reject.test".to_string(),
        content: "Rejected".to_string(),
    }];

    let result = client(&host).upload(&bookmarks, "user-1", UploadFlag::Bookmark).await;
    assert!(matches!(result, Err(sm_core::Error::Upload(_))));
    assert_eq!(captured.uploads.lock().unwrap()[0]["userId"], "user-1:b");
}

#[tokio::test]
async fn test_upload_to_unreachable_host() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let host = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let records = vec![PageRecord::new("https://a.test", "A", "A", "d")];
    let result = client(&host).upload(&records, "user-1", UploadFlag::History).await;
    assert!(matches!(result, Err(sm_core::Error::Http(_))));
}

#[tokio::test]
async fn test_search_stream_full_sequence() {
    let (host, captured) = spawn_server().await;
    let events = collect(&client(&host), "crab").await;

    let steps: Vec<_> = events.iter().map(|e| e.step).collect();
    assert_eq!(
        steps,
        vec![
            Step::RetrievedParents,
            Step::LlmResponse,
            Step::OutputParser,
            Step::PostProcessing,
            Step::Final
        ]
    );
    assert_eq!(events[1].text("text"), Some("The crab 🦀 page"));
    assert_eq!(events[4].text("result"), Some("Found it"));

    let searches = captured.searches.lock().unwrap();
    assert_eq!(searches[0], json!({"userId": "user-1:h", "query": "crab", "flag": "history"}));
}

#[tokio::test]
async fn test_search_stream_error_status() {
    let (host, _) = spawn_server().await;
    let events = collect(&client(&host), "fail").await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].step, Step::Error);
    assert_eq!(events[0].text("message"), Some(GENERIC_ERROR_MESSAGE));
}

#[tokio::test]
async fn test_search_stream_unreachable() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let host = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let events = collect(&client(&host), "crab").await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].step, Step::Error);
}

#[tokio::test]
async fn test_search_stream_idle_timeout() {
    let (host, _) = spawn_server().await;
    let events = collect(&client(&host), "hang").await;
    let steps: Vec<_> = events.iter().map(|e| e.step).collect();
    assert_eq!(steps, vec![Step::RetrievedParents, Step::Error]);
    assert_eq!(events[1].text("message"), Some(TIMEOUT_MESSAGE));
}

#[tokio::test]
async fn test_search_stream_closed_mid_frame() {
    let (host, _) = spawn_server().await;
    let events = collect(&client(&host), "silent").await;
    assert!(events.is_empty());
}

#[tokio::test]
async fn test_cancel_while_waiting_for_headers() {
    let (host, _) = spawn_server().await;
    let client = RemoteClient::new(
        ClientConfig::default()
            .with_host(host)
            .with_idle_timeout(Duration::from_secs(30)),
    )
    .unwrap();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let mut reader = client
        .search_stream("user-1", "slow", UploadFlag::History, cancel)
        .await;
    assert!(reader.next_event().await.is_none());
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_cancelled_token_opens_nothing() {
    let (host, _) = spawn_server().await;
    let cancel = CancellationToken::new();
    cancel.cancel();

    let events: Vec<StreamEvent> = client(&host)
        .search_stream("user-1", "crab", UploadFlag::History, cancel)
        .await
        .into_stream()
        .collect()
        .await;
    assert!(events.is_empty());
}
