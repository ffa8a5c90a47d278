//! Log delivery endpoints
//!
//! Tail and download work against the rolling file on disk; the stream is the
//! in-process broadcast feed. The daily appender rotates file names, so path
//! resolution prefers the configured file and falls back to the most recently
//! modified rotation match.

use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tokio::fs;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

use super::AppState;
use crate::logging;

#[derive(Debug, Deserialize)]
pub struct TailParams {
    pub lines: Option<usize>,
}

fn plain_text(body: String) -> Response {
    let mut resp = Response::new(body.into());
    resp.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    resp
}

fn log_file_missing() -> Response {
    (StatusCode::NOT_FOUND, "Log file not available").into_response()
}

/// Last N lines of the current log file
async fn logs_tail(State(state): State<AppState>, Query(params): Query<TailParams>) -> Response {
    let max_lines = params.lines.unwrap_or(200).min(10_000);
    let Some(path) = resolve_log_file_path(&state.ctx.config.logging.file).await else {
        return log_file_missing();
    };
    match fs::read_to_string(&path).await {
        Ok(contents) => {
            let mut lines: Vec<&str> = contents.lines().collect();
            if lines.len() > max_lines {
                lines = lines.split_off(lines.len() - max_lines);
            }
            plain_text(lines.join("\n"))
        }
        Err(_) => log_file_missing(),
    }
}

async fn logs_download(State(state): State<AppState>) -> Response {
    let Some(path) = resolve_log_file_path(&state.ctx.config.logging.file).await else {
        return log_file_missing();
    };
    match fs::read(&path).await {
        Ok(bytes) => {
            let mut resp = Response::new(bytes.into());
            resp.headers_mut().insert(
                header::CONTENT_TYPE,
                header::HeaderValue::from_static("application/octet-stream"),
            );
            resp
        }
        Err(_) => log_file_missing(),
    }
}

/// Live log lines over SSE, filtered by the runtime web level
async fn logs_stream() -> impl IntoResponse {
    let rx = logging::subscribe_log_lines();
    let stream = BroadcastStream::new(rx).filter_map(|res| match res {
        Ok(line) if logging::should_emit_to_web(&line) => Some(Ok::<Event, Infallible>(
            Event::default().event("log").data(line),
        )),
        _ => None,
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[derive(Debug, Deserialize)]
struct LevelQuery {
    level: String,
}

async fn set_stream_level(Query(q): Query<LevelQuery>) -> impl IntoResponse {
    match logging::set_web_log_level_str(&q.level) {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({"ok": true, "level": q.level})),
        ),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"ok": false, "error": e.to_string()})),
        ),
    }
}

async fn get_stream_level() -> impl IntoResponse {
    let level = logging::get_web_log_level();
    Json(serde_json::json!({"level": level.to_string()}))
}

fn name_matches(file_name: &str, prefix: &str, suffix: &str) -> bool {
    if file_name == format!("{}.{}", prefix, suffix) {
        return true;
    }
    (file_name.starts_with(prefix) && file_name.ends_with(&format!(".{suffix}")))
        || (file_name.starts_with(&format!("{}.", prefix))
            && file_name.contains(&format!(".{suffix}.")))
}

fn derive_search_spec(configured: &Path) -> (PathBuf, String, String) {
    if configured.extension().is_some() {
        let dir = configured.parent().unwrap_or_else(|| Path::new("."));
        let stem = configured
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("formentor")
            .to_string();
        let ext = configured
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("log")
            .to_string();
        (dir.to_path_buf(), stem, ext)
    } else {
        (
            configured.to_path_buf(),
            "formentor".to_string(),
            "log".to_string(),
        )
    }
}

async fn configured_file_if_exists(configured: &Path) -> Option<PathBuf> {
    if let Ok(md) = fs::metadata(configured).await
        && md.is_file()
    {
        Some(configured.to_path_buf())
    } else {
        None
    }
}

async fn find_latest_matching(search_dir: &Path, prefix: &str, suffix: &str) -> Option<PathBuf> {
    let mut best_path: Option<PathBuf> = None;
    let mut best_mtime: SystemTime = SystemTime::UNIX_EPOCH;
    let mut stack: Vec<PathBuf> = vec![search_dir.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let mut rd = match fs::read_dir(&dir).await {
            Ok(v) => v,
            Err(_) => continue,
        };
        while let Ok(Some(entry)) = rd.next_entry().await {
            let ft = match entry.file_type().await {
                Ok(v) => v,
                Err(_) => continue,
            };
            if ft.is_file() {
                if let Some(name) = entry.file_name().to_str()
                    && name_matches(name, prefix, suffix)
                    && let Ok(md) = entry.metadata().await
                    && let Ok(modified) = md.modified()
                    && modified > best_mtime
                {
                    best_mtime = modified;
                    best_path = Some(entry.path());
                }
            } else if ft.is_dir() {
                stack.push(entry.path());
            }
        }
    }
    best_path
}

// The configured path wins when it exists; otherwise pick the most recently
// modified rotation sibling under the same directory.
async fn resolve_log_file_path(configured_path: &str) -> Option<PathBuf> {
    let configured = Path::new(configured_path);
    if let Some(p) = configured_file_if_exists(configured).await {
        return Some(p);
    }
    let (search_dir, prefix, suffix) = derive_search_spec(configured);
    find_latest_matching(&search_dir, &prefix, &suffix).await
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/logs/tail", get(logs_tail))
        .route("/api/logs/download", get(logs_download))
        .route("/api/logs/stream", get(logs_stream))
        .route(
            "/api/logs/level",
            post(set_stream_level).get(get_stream_level),
        )
}
