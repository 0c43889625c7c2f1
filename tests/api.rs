//! Black-box tests of the HTTP surface: auth gating, the editor API
//! round trip, upload validation, and the rendered pages.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use flatsite::config::SiteConfig;
use flatsite::server::{AppState, router};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

const TOKEN: &str = "test-secret";

/// A complete 1x1 transparent PNG.
const PNG_BYTES: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// Router over a fresh temp tree. Background commits are off so tests
/// never touch the surrounding repository.
fn test_app(tmp: &TempDir) -> Router {
    let mut config = SiteConfig {
        content_dir: tmp.path().join("content"),
        media_dir: tmp.path().join("media"),
        assets_dir: tmp.path().join("assets"),
        ..SiteConfig::default()
    };
    config.auth.refresh_token = Some(TOKEN.to_string());
    config.git.auto_commit = false;
    router(AppState::new(config))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

fn save_request(filename: &str, content: &str, token: Option<&str>) -> Request<Body> {
    let body = serde_json::json!({ "content": content }).to_string();
    let mut builder = Request::builder()
        .method("POST")
        .uri(format!("/api/content/{filename}"))
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header("X-Refresh-Token", token);
    }
    builder.body(Body::from(body)).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn multipart_upload(token: Option<&str>, mime: &str, bytes: &[u8]) -> Request<Body> {
    let boundary = "test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"image\"; \
             filename=\"photo.png\"\r\nContent-Type: {mime}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(
        format!(
            "\r\n--{boundary}\r\nContent-Disposition: form-data; name=\"alt\"\r\n\r\n\
             A test photo\r\n--{boundary}--\r\n"
        )
        .as_bytes(),
    );

    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/upload-image")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        );
    if let Some(token) = token {
        builder = builder.header("X-Refresh-Token", token);
    }
    builder.body(Body::from(body)).unwrap()
}

// ============================================================================
// Health and listings
// ============================================================================

#[tokio::test]
async fn health_reports_ok() {
    let tmp = TempDir::new().unwrap();
    let app = test_app(&tmp);

    let (status, body) = send_json(&app, get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert!(body["ts"].is_i64());
}

#[tokio::test]
async fn empty_store_lists_no_files() {
    let tmp = TempDir::new().unwrap();
    let app = test_app(&tmp);

    let (status, body) = send_json(&app, get("/api/content/list")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["files"].as_array().unwrap().len(), 0);
}

// ============================================================================
// Auth gating
// ============================================================================

#[tokio::test]
async fn save_without_token_is_rejected_and_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let app = test_app(&tmp);

    let (status, body) = send_json(&app, save_request("page.md", "# Hi", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert!(!tmp.path().join("content/page.md").exists());
}

#[tokio::test]
async fn wrong_token_is_rejected_on_every_mutating_endpoint() {
    let tmp = TempDir::new().unwrap();
    let app = test_app(&tmp);

    let requests = vec![
        save_request("page.md", "x", Some("wrong")),
        Request::builder()
            .method("DELETE")
            .uri("/api/content/page.md")
            .header("X-Refresh-Token", "wrong")
            .body(Body::empty())
            .unwrap(),
        multipart_upload(Some("wrong"), "image/png", PNG_BYTES),
        Request::builder()
            .method("POST")
            .uri("/refreshcontent")
            .header("X-Refresh-Token", "wrong")
            .body(Body::empty())
            .unwrap(),
        Request::builder()
            .method("POST")
            .uri("/api/push-to-github")
            .header("X-Refresh-Token", "wrong")
            .body(Body::empty())
            .unwrap(),
    ];
    for request in requests {
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
    assert!(!tmp.path().join("content").exists());
    assert!(!tmp.path().join("media").exists());
}

#[tokio::test]
async fn token_accepted_via_query_parameter() {
    let tmp = TempDir::new().unwrap();
    let app = test_app(&tmp);

    let request = Request::builder()
        .method("POST")
        .uri(format!("/refreshcontent?token={TOKEN}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send_json(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

// ============================================================================
// Editor round trip
// ============================================================================

#[tokio::test]
async fn save_read_list_round_trip() {
    let tmp = TempDir::new().unwrap();
    let app = test_app(&tmp);

    let (status, body) = send_json(&app, save_request("my-page.md", "# Hi", Some(TOKEN))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["path"], "/content/md/my-page.md");

    let (status, body) = send_json(&app, get("/api/content/my-page.md")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "# Hi");

    let (_, body) = send_json(&app, get("/api/content")).await;
    let files = body["files"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["filename"], "my-page.md");
    assert_eq!(files[0]["kind"], "markdown");
    assert_eq!(files[0]["public_path"], "/content/md/my-page.md");
    assert_eq!(files[0]["name"], "my page");
}

#[tokio::test]
async fn traversal_filename_is_confined_to_the_store() {
    let tmp = TempDir::new().unwrap();
    let app = test_app(&tmp);

    let (status, _) =
        send_json(&app, save_request("..%2F..%2Fescape.md", "x", Some(TOKEN))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(tmp.path().join("content/escape.md").is_file());
    assert!(!tmp.path().join("escape.md").exists());
}

#[tokio::test]
async fn delete_then_read_is_not_found() {
    let tmp = TempDir::new().unwrap();
    let app = test_app(&tmp);

    send_json(&app, save_request("gone.md", "x", Some(TOKEN))).await;

    let request = Request::builder()
        .method("DELETE")
        .uri("/api/content/gone.md")
        .header("X-Refresh-Token", TOKEN)
        .body(Body::empty())
        .unwrap();
    let (status, _) = send_json(&app, request).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send_json(&app, get("/api/content/gone.md")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_missing_file_is_not_found() {
    let tmp = TempDir::new().unwrap();
    let app = test_app(&tmp);

    let request = Request::builder()
        .method("DELETE")
        .uri("/api/content/never-existed.md")
        .header("X-Refresh-Token", TOKEN)
        .body(Body::empty())
        .unwrap();
    let (status, body) = send_json(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

// ============================================================================
// Uploads
// ============================================================================

#[tokio::test]
async fn upload_round_trip_returns_snippets() {
    let tmp = TempDir::new().unwrap();
    let app = test_app(&tmp);

    let (status, body) =
        send_json(&app, multipart_upload(Some(TOKEN), "image/png", PNG_BYTES)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let filename = body["filename"].as_str().unwrap();
    assert!(filename.starts_with("img_"));
    assert_eq!(body["url"], format!("/media/{filename}"));
    assert_eq!(body["alt"], "A test photo");
    assert_eq!(
        body["markdown"],
        format!("![A test photo](/media/{filename})")
    );
    assert!(tmp.path().join("media").join(filename).is_file());

    let (_, body) = send_json(&app, get("/api/images")).await;
    assert_eq!(body["images"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn upload_with_non_image_mime_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let app = test_app(&tmp);

    let (status, body) = send_json(
        &app,
        multipart_upload(Some(TOKEN), "application/pdf", b"%PDF-1.4"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(!tmp.path().join("media").exists());
}

// ============================================================================
// Rendered pages and raw serving
// ============================================================================

#[tokio::test]
async fn homepage_lists_saved_content() {
    let tmp = TempDir::new().unwrap();
    let app = test_app(&tmp);

    send_json(
        &app,
        save_request("hello.md", "<!-- content-name: Hello World -->\n# Hi", Some(TOKEN)),
    )
    .await;

    let (status, body) = send(&app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains("Hello World"));
    assert!(html.contains("/content/md/hello.md"));
}

#[tokio::test]
async fn markdown_renders_to_html() {
    let tmp = TempDir::new().unwrap();
    let app = test_app(&tmp);

    send_json(&app, save_request("post.md", "# Big News", Some(TOKEN))).await;

    let (status, body) = send(&app, get("/content/md/post.md")).await;
    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains("<h1>Big News</h1>"));
}

#[tokio::test]
async fn markdown_render_of_missing_file_is_not_found() {
    let tmp = TempDir::new().unwrap();
    let app = test_app(&tmp);

    let (status, _) = send(&app, get("/content/md/nope.md")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn html_content_is_served_raw() {
    let tmp = TempDir::new().unwrap();
    let app = test_app(&tmp);

    send_json(
        &app,
        save_request("about.html", "<h1>About</h1>", Some(TOKEN)),
    )
    .await;

    let response = app
        .clone()
        .oneshot(get("/content/about.html"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("text/html"));
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"<h1>About</h1>");
}

#[tokio::test]
async fn gallery_page_renders() {
    let tmp = TempDir::new().unwrap();
    let app = test_app(&tmp);

    let (status, body) = send(&app, get("/gallery")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(body).unwrap().contains("No images yet."));
}
