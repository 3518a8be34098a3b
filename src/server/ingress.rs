//! Diagnostic ingress: browser log events and the hot-reload poll
//!
//! The body of `POST /log` is taken as a raw string and parsed manually so a
//! malformed payload becomes a reported client error instead of a handler
//! rejection the operator never sees.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use colored::{ColoredString, Colorize};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use super::AppState;
use crate::console::{timestamp, timestamp_millis};

/// Severity of a browser-originated log event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Log,
}

impl LogLevel {
    fn label(self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Log => "LOG",
        }
    }

    fn paint(self, line: &str) -> ColoredString {
        match self {
            LogLevel::Error => line.red(),
            LogLevel::Warn => line.yellow(),
            LogLevel::Info => line.blue(),
            LogLevel::Debug => line.magenta(),
            LogLevel::Log => line.green(),
        }
    }
}

/// A log event posted by the served page. Rendered once, never stored.
#[derive(Debug, Deserialize)]
pub struct LogEvent {
    #[serde(default)]
    pub level: LogLevel,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub source: Option<String>,
}

impl LogEvent {
    /// Print the event as a level-colored operator line.
    pub fn render(&self) {
        let line = format!(
            "[{}] BROWSER {}: {}",
            timestamp_millis(),
            self.level.label(),
            self.message
        );
        println!("{}", self.level.paint(&line));
        if let Some(source) = &self.source {
            println!("  └─ Source: {source}");
        }
    }
}

/// `POST /log`
pub async fn ingest_log(body: String) -> Response {
    match serde_json::from_str::<LogEvent>(&body) {
        Ok(event) => {
            event.render();
            (StatusCode::OK, Json(json!({"status": "logged"}))).into_response()
        }
        Err(_) => {
            println!(
                "{}",
                format!("[{}] ERROR: invalid JSON in log request", timestamp()).red()
            );
            (StatusCode::BAD_REQUEST, Json(json!({"error": "Invalid JSON"}))).into_response()
        }
    }
}

/// `GET /reload-check`
///
/// Answers whether the content-hash detector saw any change since the
/// previous call; checking updates its snapshot as a side effect.
pub async fn reload_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let reload = match state.watcher.lock() {
        Ok(mut watcher) => watcher.check(),
        Err(_) => false,
    };
    Json(json!({"reload": reload}))
}
