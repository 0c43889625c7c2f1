//! HTTP surface: routing, auth, and the editor API.
//!
//! The server wires the stores to the outside world. Read endpoints are
//! open; every mutating endpoint is gated by a single shared-secret token
//! compared by equality, accepted from the `X-Refresh-Token` header or a
//! `?token=` query parameter. There are no sessions and no per-user
//! identity.
//!
//! Mutating requests follow one shape: authorize, persist, spawn the
//! best-effort git work, respond. The spawned work never gates the
//! response — once the file write has succeeded the client hears success,
//! whatever the repository thinks about it.
//!
//! Responses use the editor client's envelope: `{"success": true, ...}` on
//! the happy path, `{"success": false, "error": ...}` with a matching
//! status code otherwise.

use crate::config::SiteConfig;
use crate::media::{MediaError, MediaStore};
use crate::pages;
use crate::reload;
use crate::store::{ContentKind, ContentStore, StoreError};
use crate::vcs::{self, CommitIdentity};
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Request body ceiling. Phone photos routinely exceed axum's 2 MB
/// default; this bounds uploads instead of rejecting them.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid bind address: {0}")]
    BindAddr(String),
}

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<SiteConfig>,
    pub content: ContentStore,
    pub media: MediaStore,
}

impl AppState {
    pub fn new(config: SiteConfig) -> Self {
        let content = ContentStore::new(&config.content_dir);
        let media = MediaStore::new(&config.media_dir);
        Self {
            config: Arc::new(config),
            content,
            media,
        }
    }

    /// Working directory for git invocations. The server runs from the
    /// site repository root, as the editor deployment always has.
    fn repo_dir(&self) -> PathBuf {
        PathBuf::from(".")
    }

    fn identity(&self) -> CommitIdentity {
        CommitIdentity {
            name: self.config.git.default_user_name.clone(),
            email: self.config.git.default_user_email.clone(),
        }
    }

    /// Spawn the post-mutation git chain: commit, optionally push.
    fn spawn_commit(&self, paths: Vec<PathBuf>, message: String) {
        if !self.config.git.auto_commit {
            return;
        }
        let repo = self.repo_dir();
        let identity = self.identity();
        let push_after = self.config.git.push_on_save;
        tokio::spawn(async move {
            vcs::commit_paths(&repo, &identity, &paths, &message).await;
            if push_after {
                vcs::push(&repo).await;
            }
        });
    }
}

/// API failure carrying the status code and the envelope message.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: "invalid refresh token".to_string(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "success": false, "error": self.message }));
        (self.status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        let status = match &err {
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::InvalidName(_) | StoreError::UnsupportedType(_) => StatusCode::BAD_REQUEST,
            StoreError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<MediaError> for ApiError {
    fn from(err: MediaError) -> Self {
        let status = match &err {
            MediaError::NotImage(_) | MediaError::UnrecognizedFormat => StatusCode::BAD_REQUEST,
            MediaError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AuthParams {
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SaveBody {
    content: String,
}

/// Check the shared secret. Header wins over query parameter; a server
/// with no configured secret rejects everything.
fn require_token(
    state: &AppState,
    headers: &HeaderMap,
    query_token: Option<&str>,
) -> Result<(), ApiError> {
    let Some(expected) = state.config.auth.refresh_token.as_deref() else {
        return Err(ApiError::unauthorized());
    };
    let presented = headers
        .get("x-refresh-token")
        .and_then(|v| v.to_str().ok())
        .or(query_token);
    match presented {
        Some(token) if token == expected => Ok(()),
        _ => Err(ApiError::unauthorized()),
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/", get(home))
        .route("/gallery", get(gallery))
        .route("/content/md/{filename}", get(rendered_markdown))
        .route("/content/{filename}", get(raw_content))
        .route("/api/health", get(health))
        .route("/api/content", get(list_content))
        .route("/api/content/list", get(list_content))
        .route(
            "/api/content/{filename}",
            get(get_content).post(save_content).delete(delete_content),
        )
        .route("/api/upload-image", post(upload_image))
        .route("/api/images", get(list_images))
        .route("/api/push-to-github", post(push_to_remote))
        .route("/refreshcontent", post(refresh_content))
        .nest_service("/media", ServeDir::new(state.media.root()));

    // Static assets are optional; only mount the service when the
    // directory is actually there.
    if state.config.assets_dir.is_dir() {
        app = app.nest_service("/assets", ServeDir::new(&state.config.assets_dir));
    }

    app.layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until shutdown.
pub async fn serve(config: SiteConfig) -> Result<(), ServeError> {
    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port)
        .parse()
        .map_err(|_| ServeError::BindAddr(config.server.bind.clone()))?;
    let state = AppState::new(config);
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}

// ============================================================================
// Page handlers
// ============================================================================

async fn home(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let items = state.content.list_items()?;
    Ok(Html(pages::render_home(&items).into_string()))
}

async fn gallery(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let assets = state.media.list_assets()?;
    Ok(Html(pages::render_gallery(&assets).into_string()))
}

async fn rendered_markdown(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Html<String>, ApiError> {
    if ContentKind::from_filename(&filename) != Some(ContentKind::Markdown) {
        return Err(ApiError::not_found(format!("not found: {filename}")));
    }
    let content = state.content.read_item(&filename)?;
    let title = crate::metadata::extract_display_name(&content)
        .unwrap_or_else(|| crate::metadata::fallback_from_filename(&filename));
    Ok(Html(
        pages::render_markdown_page(&title, &content).into_string(),
    ))
}

async fn raw_content(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let kind = ContentKind::from_filename(&filename)
        .ok_or_else(|| ApiError::not_found(format!("not found: {filename}")))?;
    let content = state.content.read_item(&filename)?;
    Ok(([(header::CONTENT_TYPE, kind.content_type())], content).into_response())
}

// ============================================================================
// Content API
// ============================================================================

async fn health() -> Json<Value> {
    Json(json!({ "ok": true, "ts": chrono::Utc::now().timestamp_millis() }))
}

async fn list_content(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let items = state.content.list_items()?;
    Ok(Json(json!({ "success": true, "files": items })))
}

async fn get_content(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let content = state.content.read_item(&filename)?;
    Ok(Json(
        json!({ "success": true, "filename": filename, "content": content }),
    ))
}

async fn save_content(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    Query(auth): Query<AuthParams>,
    headers: HeaderMap,
    Json(body): Json<SaveBody>,
) -> Result<Json<Value>, ApiError> {
    require_token(&state, &headers, auth.token.as_deref())?;

    let item = state.content.save_item(&filename, &body.content)?;
    if let Ok(path) = state.content.path_of(&item.filename) {
        state.spawn_commit(vec![path], format!("save {}", item.filename));
    }
    Ok(Json(json!({
        "success": true,
        "filename": item.filename,
        "path": item.public_path,
    })))
}

async fn delete_content(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    Query(auth): Query<AuthParams>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    require_token(&state, &headers, auth.token.as_deref())?;

    let path = state.content.path_of(&filename)?;
    state.content.delete_item(&filename)?;
    state.spawn_commit(vec![path], format!("delete {filename}"));
    Ok(Json(json!({ "success": true })))
}

// ============================================================================
// Media API
// ============================================================================

async fn upload_image(
    State(state): State<AppState>,
    Query(auth): Query<AuthParams>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    require_token(&state, &headers, auth.token.as_deref())?;

    let mut upload: Option<(Vec<u8>, String, String)> = None;
    let mut alt: Option<String> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::bad_request("malformed multipart body"))?
    {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("image") => {
                let name = field.file_name().unwrap_or("upload").to_string();
                let mime = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|_| ApiError::bad_request("malformed multipart body"))?;
                upload = Some((bytes.to_vec(), name, mime));
            }
            Some("alt") => alt = field.text().await.ok(),
            _ => {}
        }
    }

    let (bytes, name, mime) = upload.ok_or_else(|| ApiError::bad_request("no image uploaded"))?;
    let stored = state.media.store_upload(&bytes, &name, &mime, alt.as_deref())?;
    state.spawn_commit(
        vec![state.media.path_of(&stored.filename)],
        format!("add image {}", stored.filename),
    );

    Ok(Json(json!({
        "success": true,
        "filename": stored.filename,
        "url": stored.url,
        "alt": stored.alt,
        "markdown": stored.markdown,
        "html": stored.html,
    })))
}

async fn list_images(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let assets = state.media.list_assets()?;
    Ok(Json(json!({ "success": true, "images": assets })))
}

// ============================================================================
// Revision trigger
// ============================================================================

async fn push_to_remote(
    State(state): State<AppState>,
    Query(auth): Query<AuthParams>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    require_token(&state, &headers, auth.token.as_deref())?;

    let repo = state.repo_dir();
    tokio::spawn(async move {
        vcs::push(&repo).await;
    });
    Ok(Json(json!({ "success": true, "message": "push started" })))
}

/// Pull and reload. The ack goes out before any of the work starts: if
/// the reload restarts this very process, the client must already have
/// its response.
async fn refresh_content(
    State(state): State<AppState>,
    Query(auth): Query<AuthParams>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    require_token(&state, &headers, auth.token.as_deref())?;

    let repo = state.repo_dir();
    let processes = state.config.reload.processes.clone();
    tokio::spawn(async move {
        vcs::pull(&repo).await;
        reload::restart_server(&processes).await;
    });
    Ok(Json(json!({ "success": true, "message": "refresh started" })))
}
