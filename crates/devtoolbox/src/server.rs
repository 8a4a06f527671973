//! HTTP API.
//!
//! Every tool in the [`ToolRegistry`](crate::traits::ToolRegistry) is served
//! through one `POST /tools/{name}` handler. Account features (bookmarks,
//! feedback, tool requests) and the favicon generator get their own routes.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/tools/list` | List all registered tools with schemas |
//! | `POST` | `/tools/{name}` | Call a tool by name |
//! | `GET`  | `/users/{uid}/bookmarks` | Bookmarks, newest first |
//! | `POST` | `/users/{uid}/bookmarks` | Add or replace a bookmark |
//! | `DELETE` | `/users/{uid}/bookmarks/{id}` | Remove a bookmark |
//! | `POST` | `/feedback` | Submit feedback |
//! | `POST` | `/tool-requests` | Request a new tool |
//! | `POST` | `/favicon` | Raw image body in, zip archive out |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "invalid JSON: expected value at line 1 column 1" } }
//! ```
//!
//! Error codes: `bad_request` (400), `forbidden` (403), `not_found` (404),
//! `unavailable` (503), `tool_error` (500).

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use devtoolbox_core::error::{
    ConvertError, LoremError, RegexCompileError, ServiceError, TimestampError,
};
use devtoolbox_core::models::{Bookmark, Feedback, ToolRequest};
use devtoolbox_core::services::{NewBookmark, NewFeedback, NewToolRequest};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use crate::app::AppContext;
use crate::favicon;
use crate::traits::{InvalidParams, ToolInfo};

/// Build the router without binding. Tests serve it on their own listener.
pub fn router(app: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let body_limit = app.config.server.max_upload_bytes;

    Router::new()
        .route("/health", get(handle_health))
        .route("/tools/list", get(handle_list_tools))
        .route("/tools/{name}", post(handle_tool_call))
        .route(
            "/users/{uid}/bookmarks",
            get(handle_list_bookmarks).post(handle_add_bookmark),
        )
        .route("/users/{uid}/bookmarks/{id}", delete(handle_remove_bookmark))
        .route("/feedback", post(handle_feedback))
        .route("/tool-requests", post(handle_tool_request))
        .route("/favicon", post(handle_favicon))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(app)
}

/// Bind to `[server] bind` and serve until the process is terminated.
pub async fn run_server(app: AppContext) -> anyhow::Result<()> {
    let bind_addr = app.config.server.bind.clone();

    for t in app.tools.tools() {
        tracing::debug!(tool = t.name(), builtin = t.is_builtin(), "registered tool");
    }

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, tools = app.tools.len(), "server listening");
    println!("DevToolBox listening on http://{}", bind_addr);

    axum::serve(listener, router(app)).await?;
    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

#[derive(Debug)]
struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError::new(StatusCode::BAD_REQUEST, "bad_request", message)
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError::new(StatusCode::NOT_FOUND, "not_found", message)
}

fn forbidden(message: impl Into<String>) -> AppError {
    AppError::new(StatusCode::FORBIDDEN, "forbidden", message)
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::UserInputMissing(_) => bad_request(err.to_string()),
            ServiceError::CollaboratorUnavailable(_) => {
                AppError::new(StatusCode::SERVICE_UNAVAILABLE, "unavailable", err.to_string())
            }
        }
    }
}

/// Map an error to a status by its concrete type. User-correctable input
/// problems are 400; anything unrecognized is a 500 `tool_error`.
fn classify(context: &str, err: anyhow::Error) -> AppError {
    let message = format!("{}: {:#}", context, err);
    if let Some(service) = err.downcast_ref::<ServiceError>() {
        let mut e = AppError::from(service.clone());
        e.message = message;
        return e;
    }
    let user_error = err.is::<InvalidParams>()
        || err.is::<ConvertError>()
        || err.is::<RegexCompileError>()
        || err.is::<LoremError>()
        || err.is::<TimestampError>();
    if user_error {
        bad_request(message)
    } else {
        tracing::error!(context, error = %format!("{:#}", err), "request failed");
        AppError::new(StatusCode::INTERNAL_SERVER_ERROR, "tool_error", message)
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ============ Tools ============

#[derive(Serialize)]
struct ToolListResponse {
    tools: Vec<ToolInfo>,
}

async fn handle_list_tools(State(app): State<AppContext>) -> Json<ToolListResponse> {
    Json(ToolListResponse {
        tools: app.tools.infos(),
    })
}

async fn handle_tool_call(
    State(app): State<AppContext>,
    Path(name): Path<String>,
    Json(params): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, AppError> {
    let ctx = app.tool_context();
    let result = app
        .tools
        .call(&name, &params, &ctx)
        .await
        .map_err(|e| classify(&name, e))?
        .ok_or_else(|| not_found(format!("no tool registered with name: {}", name)))?;

    Ok(Json(serde_json::json!({ "result": result })))
}

// ============ Bookmarks ============

/// Only the signed-in user may touch their own bookmarks.
fn require_user(app: &AppContext, uid: &str) -> Result<(), AppError> {
    match app.auth.current_user() {
        Some(user) if user.uid == uid => Ok(()),
        Some(_) => Err(forbidden(format!("bookmarks of '{}' belong to another user", uid))),
        None => Err(forbidden("sign in to use bookmarks")),
    }
}

#[derive(Serialize)]
struct BookmarkListResponse {
    bookmarks: Vec<Bookmark>,
}

async fn handle_list_bookmarks(
    State(app): State<AppContext>,
    Path(uid): Path<String>,
) -> Result<Json<BookmarkListResponse>, AppError> {
    require_user(&app, &uid)?;
    let bookmarks = app.bookmarks().list(&uid).await?;
    Ok(Json(BookmarkListResponse { bookmarks }))
}

async fn handle_add_bookmark(
    State(app): State<AppContext>,
    Path(uid): Path<String>,
    Json(new): Json<NewBookmark>,
) -> Result<(StatusCode, Json<Bookmark>), AppError> {
    require_user(&app, &uid)?;
    let bookmark = app.bookmarks().add(&uid, new).await?;
    Ok((StatusCode::CREATED, Json(bookmark)))
}

async fn handle_remove_bookmark(
    State(app): State<AppContext>,
    Path((uid, id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    require_user(&app, &uid)?;
    app.bookmarks().remove(&uid, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============ Feedback ============

async fn handle_feedback(
    State(app): State<AppContext>,
    Json(new): Json<NewFeedback>,
) -> Result<(StatusCode, Json<Feedback>), AppError> {
    let feedback = app.feedback().submit_feedback(new).await?;
    Ok((StatusCode::CREATED, Json(feedback)))
}

async fn handle_tool_request(
    State(app): State<AppContext>,
    Json(new): Json<NewToolRequest>,
) -> Result<(StatusCode, Json<ToolRequest>), AppError> {
    let request = app.feedback().submit_tool_request(new).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

// ============ POST /favicon ============

/// Per-request overrides of the `[favicon]` config.
#[derive(Debug, Default, Deserialize)]
struct FaviconQuery {
    app_name: Option<String>,
    short_name: Option<String>,
    theme_color: Option<String>,
    background_color: Option<String>,
}

async fn handle_favicon(
    State(app): State<AppContext>,
    Query(query): Query<FaviconQuery>,
    body: Bytes,
) -> Result<Response, AppError> {
    let mut options = app.config.favicon.clone();
    if let Some(name) = query.app_name {
        options.app_name = name;
    }
    if query.short_name.is_some() {
        options.short_name = query.short_name;
    }
    if let Some(color) = query.theme_color {
        options.theme_color = color;
    }
    if let Some(color) = query.background_color {
        options.background_color = color;
    }
    options
        .validate()
        .map_err(|e| bad_request(format!("{:#}", e)))?;

    // Decoding and resizing are CPU-bound.
    let archive = tokio::task::spawn_blocking(move || favicon::generate_zip(&body, &options))
        .await
        .map_err(|e| classify("favicon", e.into()))?
        .map_err(|e| classify("favicon", e))?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"favicons.zip\"",
            ),
        ],
        archive,
    )
        .into_response())
}
