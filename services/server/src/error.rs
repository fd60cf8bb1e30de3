use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use tutor_core::TutorError;

pub const DB_UNAVAILABLE: &str = "Database connection failed";

/// HTTP 层错误
///
/// 每个变体对应一个固定的状态码和 JSON 形状，handler 直接 `?` 返回即可。
#[derive(Debug)]
pub enum ApiError {
    /// 400
    BadRequest(String),
    /// 503，存储不可达或存储操作失败
    StoreUnavailable,
    /// 502，远端生成接口失败，诊断信息原样带回
    Upstream {
        error: String,
        status_code: Option<u16>,
        body: Value,
        selected_model: Option<String>,
    },
    /// 500
    Internal(String),
}

impl ApiError {
    /// 生成阶段的错误分类，附带当前选中的模型
    pub fn from_generation(err: TutorError, selected_model: Option<&str>) -> Self {
        let selected_model = selected_model.map(str::to_string);
        match err {
            TutorError::RemoteServiceError { status, body } => ApiError::Upstream {
                error: "HTTPError calling generateContent".to_string(),
                status_code: Some(status),
                // 远端通常返回 JSON，能解析就按 JSON 回显，否则原样文本
                body: serde_json::from_str(&body).unwrap_or(Value::String(body)),
                selected_model,
            },
            TutorError::ConnectivityError(msg) => ApiError::Upstream {
                error: "Connectivity error calling generateContent".to_string(),
                status_code: None,
                body: Value::String(msg),
                selected_model,
            },
            other => ApiError::from(other),
        }
    }
}

impl From<TutorError> for ApiError {
    fn from(err: TutorError) -> Self {
        match err {
            e if e.is_persistence() => ApiError::StoreUnavailable,
            TutorError::ConfigError(msg) => ApiError::Internal(msg),
            TutorError::InvalidRequest(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::StoreUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "error": DB_UNAVAILABLE }),
            ),
            ApiError::Upstream {
                error,
                status_code,
                body,
                selected_model,
            } => (
                StatusCode::BAD_GATEWAY,
                json!({
                    "error": error,
                    "status_code": status_code,
                    "body": body,
                    "selected_model": selected_model,
                }),
            ),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": msg }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_body_is_echoed_as_json_when_possible() {
        let err = TutorError::RemoteServiceError {
            status: 429,
            body: r#"{"error":{"code":429}}"#.to_string(),
        };
        match ApiError::from_generation(err, Some("models/gemini-1.5-flash")) {
            ApiError::Upstream {
                status_code, body, selected_model, ..
            } => {
                assert_eq!(status_code, Some(429));
                assert_eq!(body["error"]["code"], 429);
                assert_eq!(selected_model.as_deref(), Some("models/gemini-1.5-flash"));
            }
            other => panic!("unexpected: {other:?}"),
        }

        let err = TutorError::RemoteServiceError {
            status: 500,
            body: "plain text".to_string(),
        };
        match ApiError::from_generation(err, None) {
            ApiError::Upstream { body, .. } => assert_eq!(body, Value::String("plain text".into())),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::StoreUnavailable, StatusCode::SERVICE_UNAVAILABLE),
            (
                ApiError::from(TutorError::ConfigError("no model".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::from_generation(TutorError::ConnectivityError("dns".into()), None),
                StatusCode::BAD_GATEWAY,
            ),
            (
                ApiError::from(TutorError::PersistenceError("down".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
