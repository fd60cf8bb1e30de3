pub mod chat;
pub mod health;
pub mod history;

use crate::error::ApiError;
use crate::state::AppState;
use axum::body::Bytes;
use axum::routing::{get, post};
use axum::Router;
use serde::de::DeserializeOwned;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// 组装全部路由
///
/// 路径保留结尾的 `/`，与现有前端保持一致。
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/chat/", post(chat::chat_reply).get(chat::chat_usage))
        .route("/health/", get(health::health_check))
        .route("/history/", get(history::get_chat_history))
        .route("/clear/", post(history::clear_chat))
        .route("/sessions/", get(history::get_sessions))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 解析 JSON 请求体；空请求体视为 `{}`
pub(crate) fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))
}

/// 缺失或空字符串时使用默认值
pub(crate) fn or_default(value: Option<String>, default: &str) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
