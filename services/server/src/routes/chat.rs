use super::{or_default, parse_body};
use crate::error::ApiError;
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, warn};
use tutor_core::{ConversationTurn, DEFAULT_SESSION_ID, DEFAULT_USER_ID};
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub reply: String,
    pub selected_model: Option<String>,
}

/// GET /chat/
pub async fn chat_usage() -> Json<Value> {
    Json(json!({ "message": "Send a POST request with a prompt." }))
}

/// POST /chat/
///
/// 1. 检查存储可达 (不可达直接 503)
/// 2. 校验 prompt
/// 3. 保存用户消息 (失败只记日志)
/// 4. 调用生成接口并提取文本
/// 5. 保存 AI 回复 (失败只记日志)
pub async fn chat_reply(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ChatReply>, ApiError> {
    let trace_id = Uuid::new_v4();

    if let Err(e) = state.store.ping().await {
        error!(%trace_id, "Database connection failed: {}", e);
        return Err(ApiError::StoreUnavailable);
    }

    let request: ChatRequest = parse_body(&body)?;
    let prompt = request.prompt.unwrap_or_default();
    let user_id = or_default(request.user_id, DEFAULT_USER_ID);
    let session_id = or_default(request.session_id, DEFAULT_SESSION_ID);

    info!(%trace_id, %user_id, %session_id, "Received prompt: {}", prompt);

    if prompt.trim().is_empty() {
        return Err(ApiError::BadRequest("Prompt is required.".to_string()));
    }

    // 用户消息：尽力保存，失败不影响回复
    match state
        .store
        .append(&ConversationTurn::user(&user_id, &session_id, prompt.as_str()))
        .await
    {
        Ok(id) => info!(%trace_id, "Saved user message to DB: {}", id),
        Err(e) => warn!(%trace_id, "Failed to save user message: {}", e),
    }

    let reply = match state.tutor.answer(&prompt).await {
        Ok(reply) => reply,
        Err(e) => {
            error!(%trace_id, "Error calling generateContent: {}", e);
            return Err(ApiError::from_generation(e, state.selected_model()));
        }
    };

    match state
        .store
        .append(&ConversationTurn::assistant(&user_id, &session_id, reply.as_str()))
        .await
    {
        Ok(id) => info!(%trace_id, "Saved AI response to DB: {}", id),
        Err(e) => warn!(%trace_id, "Failed to save AI response: {}", e),
    }

    Ok(Json(ChatReply {
        reply,
        selected_model: state.selected_model().map(str::to_string),
    }))
}
