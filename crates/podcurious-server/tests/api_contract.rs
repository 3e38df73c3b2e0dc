use axum::body::Body;
use axum::extract::Query;
use axum::http::{Request, StatusCode};
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use podcurious_pipeline::{Relay, RelayConfig};
use podcurious_server::{app, AppState};
use serde_json::Value;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;
use tower::ServiceExt;

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

const EPISODE_PAGE: &str = r#"<html><head><title>ignored</title>
<meta property="og:site_name" content="Hard Fork">
<meta property="og:title" content="Robots Everywhere">
<meta property="og:description" content="Kevin &amp; Casey on robots &#39;n&#39; AI.">
<meta property="og:image" content="https://img/hf.jpg">
</head><body></body></html>"#;

const SHELL_PAGE: &str = "<html><head><title>Spotify</title></head></html>";

const ANALYSIS_IN_PROSE: &str = "Sure! Here it is:\n```json\n{\"summary\":\"Two hosts on robots.\",\"guest\":null,\"topics\":[\"robots\",\"ai\"],\"tone\":\"casual\",\"suggestedPrompt\":\"More tech banter? How long?\"}\n```";

const PLAYLIST: &str = r#"{
  "playlistTitle": "Robots, briefly",
  "playlistDescription": "From hype to hardware",
  "targetMinutes": 60,
  "episodes": [
    {"podcast": "Hard Fork", "episode": "Robots Everywhere", "guest": null, "duration": 40, "year": "2024", "description": "d", "searchQuery": "hard fork robots"},
    {"podcast": "Obscure Show", "episode": "Gears", "guest": "Ann", "duration": 20, "year": 2021, "description": "d", "searchQuery": "gears"}
  ],
  "totalMinutes": 60,
  "note": "Starts light"
}"#;

/// Answers `/v1/messages` by looking at what kind of prompt arrived.
fn anthropic(analysis: &'static str, playlist: &'static str) -> Router {
    Router::new().route(
        "/v1/messages",
        post(move |Json(body): Json<Value>| async move {
            let last = body["messages"]
                .as_array()
                .and_then(|m| m.last())
                .and_then(|m| m["content"].as_str())
                .unwrap_or("")
                .to_string();
            let text = if last.starts_with("Analyze this podcast episode") {
                analysis.to_string()
            } else if last.contains("generate a podcast playlist") {
                playlist.to_string()
            } else {
                format!("You said: {last}")
            };
            Json(serde_json::json!({ "content": [{ "type": "text", "text": text }] }))
        }),
    )
}

fn listen_notes() -> Router {
    Router::new().route(
        "/api/v2/search",
        get(|Query(q): Query<HashMap<String, String>>| async move {
            let query = q.get("q").cloned().unwrap_or_default();
            let results = if query.starts_with("Hard Fork") {
                serde_json::json!([{
                    "id": "hf-robots",
                    "title_original": "Robots Everywhere",
                    "podcast": { "title_original": "Hard Fork" },
                    "listennotes_url": "https://www.listennotes.com/e/hf-robots",
                    "audio": "https://audio/hf-robots.mp3",
                    "image": "",
                    "thumbnail": "https://thumb/hf-robots.jpg"
                }])
            } else {
                serde_json::json!([])
            };
            Json(serde_json::json!({ "results": results }))
        }),
    )
}

fn pages() -> Router {
    Router::new()
        .route("/episode", get(|| async { Html(EPISODE_PAGE) }))
        .route("/shell", get(|| async { Html(SHELL_PAGE) }))
}

struct Harness {
    router: Router,
    pages: SocketAddr,
    _static_root: tempfile::TempDir,
}

async fn harness(analysis: &'static str, playlist: &'static str) -> Harness {
    let llm = serve(anthropic(analysis, playlist)).await;
    let ln = serve(listen_notes()).await;
    let pages = serve(pages()).await;

    let static_root = tempfile::tempdir().unwrap();
    std::fs::write(static_root.path().join("index.html"), "<h1>Pod Curious</h1>").unwrap();
    std::fs::write(static_root.path().join("app.js"), "console.log(1)").unwrap();

    let config = RelayConfig {
        anthropic_api_key: Some("test-key".to_string()),
        listen_notes_key: Some("ln-key".to_string()),
        anthropic_base_url: format!("http://{llm}"),
        listen_notes_base_url: format!("http://{ln}"),
        fetch_timeout: Duration::from_secs(5),
        ..RelayConfig::default()
    };
    let relay = Relay::from_config(config).unwrap();
    Harness {
        router: app(AppState::new(relay, static_root.path())),
        pages,
        _static_root: static_root,
    }
}

async fn call(router: &Router, req: Request<Body>) -> (StatusCode, HashMap<String, String>, Vec<u8>) {
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp
        .headers()
        .iter()
        .map(|(k, v)| (k.as_str().to_string(), v.to_str().unwrap_or("").to_string()))
        .collect();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();
    (status, headers, body)
}

fn post_json(path: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn json(body: &[u8]) -> Value {
    serde_json::from_slice(body).expect("json body")
}

#[tokio::test]
async fn analyze_recovers_json_from_prose_and_decodes_entities() {
    let h = harness(ANALYSIS_IN_PROSE, PLAYLIST).await;
    let req = post_json(
        "/api/analyze",
        &serde_json::json!({ "url": format!("http://{}/episode", h.pages) }).to_string(),
    );
    let (status, headers, body) = call(&h.router, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["access-control-allow-origin"], "*");
    let v = json(&body);
    assert_eq!(v["podcast"], "Hard Fork");
    assert_eq!(v["episode"], "Robots Everywhere");
    assert_eq!(v["description"], "Kevin & Casey on robots 'n' AI.");
    assert_eq!(v["image"], "https://img/hf.jpg");
    assert_eq!(v["analysis"]["summary"], "Two hosts on robots.");
    assert_eq!(v["analysis"]["topics"], serde_json::json!(["robots", "ai"]));
}

#[tokio::test]
async fn analyze_rejects_missing_url_and_placeholder_pages() {
    let h = harness(ANALYSIS_IN_PROSE, PLAYLIST).await;

    let (status, _, body) = call(&h.router, post_json("/api/analyze", "{}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"], "Missing URL");

    let req = post_json(
        "/api/analyze",
        &serde_json::json!({ "url": format!("http://{}/shell", h.pages) }).to_string(),
    );
    let (status, _, body) = call(&h.router, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json(&body)["error"],
        podcurious_pipeline::resolve::UNIDENTIFIED_EPISODE
    );
}

#[tokio::test]
async fn analyze_upstream_failure_is_a_prefixed_500() {
    let h = harness("no json here, sorry", PLAYLIST).await;
    let req = post_json(
        "/api/analyze",
        &serde_json::json!({ "url": format!("http://{}/episode", h.pages) }).to_string(),
    );
    let (status, _, body) = call(&h.router, req).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json(&body)["error"],
        "Failed to analyze: Could not parse analysis. Please try again."
    );
}

#[tokio::test]
async fn chat_relays_reply_and_rejects_empty_history() {
    let h = harness(ANALYSIS_IN_PROSE, PLAYLIST).await;

    let (status, _, body) = call(
        &h.router,
        post_json(
            "/api/chat",
            r#"{"messages":[{"role":"user","content":"make it calmer"}]}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["reply"], "You said: make it calmer");

    for empty in [r#"{"messages":[]}"#, "{}", ""] {
        let (status, _, body) = call(&h.router, post_json("/api/chat", empty)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {empty:?}");
        assert_eq!(json(&body)["error"], "No messages");
    }
}

#[tokio::test]
async fn playlist_end_to_end_enriches_and_keeps_totals() {
    let h = harness(ANALYSIS_IN_PROSE, PLAYLIST).await;
    let (status, _, body) = call(
        &h.router,
        post_json(
            "/api/playlist",
            r#"{"prompt":"robots, upbeat","durationMinutes":60}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let v = json(&body);
    let episodes = v["episodes"].as_array().unwrap();
    assert!(!episodes.is_empty());
    for ep in episodes {
        for key in ["podcast", "episode", "duration", "description", "searchQuery"] {
            assert!(ep.get(key).is_some(), "missing {key}");
        }
    }
    let sum: u64 = episodes.iter().map(|e| e["duration"].as_u64().unwrap()).sum();
    assert_eq!(v["totalMinutes"].as_u64(), Some(sum));

    let first = &episodes[0];
    assert_eq!(first["listenNotesId"], "hf-robots");
    assert_eq!(first["listenNotesUrl"], "https://www.listennotes.com/e/hf-robots");
    assert_eq!(first["listenNotesImage"], "https://thumb/hf-robots.jpg");
    // No hit for the second episode: link fields are absent, not null.
    assert!(episodes[1].get("listenNotesUrl").is_none());
    assert_eq!(episodes[1]["year"], "2021");
}

#[tokio::test]
async fn playlist_is_parsed_strictly() {
    let h = harness(ANALYSIS_IN_PROSE, "Here's your playlist!\n{\"episodes\":[]}").await;
    let (status, _, body) = call(
        &h.router,
        post_json("/api/playlist", r#"{"prompt":"anything"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let msg = json(&body)["error"].as_str().unwrap().to_string();
    assert!(msg.starts_with("Failed to generate playlist: "), "{msg}");

    let (status, _, body) = call(&h.router, post_json("/api/playlist", r#"{"durationMinutes":30}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"], "Missing prompt");
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let h = harness(ANALYSIS_IN_PROSE, PLAYLIST).await;
    let (status, _, body) = call(&h.router, post_json("/api/analyze", "{\"url\":")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"], "Invalid JSON");
}

#[tokio::test]
async fn options_anywhere_is_a_204_preflight() {
    let h = harness(ANALYSIS_IN_PROSE, PLAYLIST).await;
    for path in ["/api/analyze", "/api/playlist", "/whatever"] {
        let req = Request::builder()
            .method("OPTIONS")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let (status, headers, body) = call(&h.router, req).await;
        assert_eq!(status, StatusCode::NO_CONTENT, "{path}");
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert_eq!(headers["access-control-allow-methods"], "GET, POST, OPTIONS");
        assert_eq!(headers["access-control-allow-headers"], "Content-Type");
        assert!(body.is_empty());
    }
}

#[tokio::test]
async fn static_root_serves_index_and_404s_the_rest() {
    let h = harness(ANALYSIS_IN_PROSE, PLAYLIST).await;
    let get_req = |path: &str| {
        Request::builder()
            .uri(path)
            .body(Body::empty())
            .unwrap()
    };

    let (status, headers, body) = call(&h.router, get_req("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers["content-type"].starts_with("text/html"));
    assert_eq!(body, b"<h1>Pod Curious</h1>");

    let (status, headers, _) = call(&h.router, get_req("/app.js")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers["content-type"].contains("javascript"));

    let (status, _, body) = call(&h.router, get_req("/missing.css")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, b"Not found");

    // GET on an API path is just another static lookup.
    let (status, _, _) = call(&h.router, get_req("/api/chat")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
