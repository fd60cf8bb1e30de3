use super::{or_default, parse_body};
use crate::error::ApiError;
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use tutor_core::{SenderRole, DEFAULT_SESSION_ID, DEFAULT_USER_ID};

#[derive(Debug, Default, Deserialize)]
pub struct SessionQuery {
    pub user_id: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HistoryItem {
    /// 前端按字符串处理 ID
    pub id: String,
    pub text: String,
    pub sender: SenderRole,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub messages: Vec<HistoryItem>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub status: &'static str,
    pub deleted_count: u64,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SessionItem {
    pub session_id: String,
    pub created_at: String,
    pub message_count: i64,
}

#[derive(Debug, Serialize)]
pub struct SessionsResponse {
    pub sessions: Vec<SessionItem>,
    pub count: usize,
}

/// 读类接口共用：先确认存储可达
async fn ensure_store(state: &AppState) -> Result<(), ApiError> {
    state.store.ping().await.map_err(|e| {
        error!("Database connection failed: {}", e);
        ApiError::StoreUnavailable
    })
}

/// GET /history/?user_id=&session_id=
pub async fn get_chat_history(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let user_id = or_default(query.user_id, DEFAULT_USER_ID);
    let session_id = or_default(query.session_id, DEFAULT_SESSION_ID);
    ensure_store(&state).await?;

    let messages: Vec<HistoryItem> = state
        .store
        .history(&user_id, &session_id)
        .await?
        .into_iter()
        .map(|m| HistoryItem {
            id: m.id.to_string(),
            text: m.text,
            sender: m.sender,
            timestamp: m.timestamp.to_rfc3339(),
        })
        .collect();

    Ok(Json(HistoryResponse {
        count: messages.len(),
        messages,
    }))
}

/// POST /clear/  body: {user_id?, session_id?}
pub async fn clear_chat(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ClearResponse>, ApiError> {
    let request: SessionQuery = parse_body(&body)?;
    let user_id = or_default(request.user_id, DEFAULT_USER_ID);
    let session_id = or_default(request.session_id, DEFAULT_SESSION_ID);
    ensure_store(&state).await?;

    let deleted_count = state.store.clear(&user_id, &session_id).await?;
    info!(
        "Cleared {} messages for user {}, session {}",
        deleted_count, user_id, session_id
    );

    Ok(Json(ClearResponse {
        status: "success",
        deleted_count,
        message: format!("Cleared {} messages", deleted_count),
    }))
}

/// GET /sessions/?user_id=
pub async fn get_sessions(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> Result<Json<SessionsResponse>, ApiError> {
    let user_id = or_default(query.user_id, DEFAULT_USER_ID);
    ensure_store(&state).await?;

    let sessions: Vec<SessionItem> = state
        .store
        .sessions(&user_id)
        .await?
        .into_iter()
        .map(|s| SessionItem {
            session_id: s.session_id,
            created_at: s.created_at.to_rfc3339(),
            message_count: s.message_count,
        })
        .collect();

    Ok(Json(SessionsResponse {
        count: sessions.len(),
        sessions,
    }))
}
