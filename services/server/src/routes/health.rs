use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};
use tracing::warn;

/// GET /health/
///
/// 存储可达返回 200，否则 503；同时回显启动时选定的模型。
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let (connected, message) = match state.store.ping().await {
        Ok(()) => (true, "Database connection successful".to_string()),
        Err(e) => {
            warn!("Health check failed: {}", e);
            (false, format!("Database connection failed: {}", e))
        }
    };

    let status = if connected {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = json!({
        "status": if connected { "healthy" } else { "unhealthy" },
        "database": {
            "connected": connected,
            "message": message,
        },
        "selected_model": state.selected_model(),
        "model_source": state.tutor.model_source(),
        "timestamp": Utc::now().to_rfc3339(),
    });

    (status, Json(body))
}
