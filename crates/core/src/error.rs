use thiserror::Error;

/// 统一的 Tutor 系统错误定义
/// 使用 `thiserror` 宏自动生成 Display 和 Error trait
#[derive(Error, Debug)]
pub enum TutorError {
    // =================================================================
    // 1. 系统与配置类 (System & Config)
    // =================================================================
    /// 缺少 API Key、没有可用模型等。启动阶段致命，请求阶段映射为 500
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // =================================================================
    // 2. 远程生成服务 (Remote Generation API)
    // =================================================================
    /// 传输层失败：超时、DNS、连接被拒
    #[error("Connectivity error: {0}")]
    ConnectivityError(String),

    /// 远端返回了非 2xx 状态码，status 和 body 原样带回给调用方
    #[error("Remote service error: status {status}, body: {body}")]
    RemoteServiceError { status: u16, body: String },

    #[error("Failed to serialize/deserialize data: {0}")]
    SerializationError(String),

    // =================================================================
    // 3. 基础设施类 (Infrastructure)
    // =================================================================
    #[error("Database storage error: {0}")]
    StorageError(#[from] sqlx::Error),

    /// 非 SQL 的存储失败 (例如内存存储被标记为不可用)
    #[error("Persistence error: {0}")]
    PersistenceError(String),
}

impl TutorError {
    /// 是否属于持久化层的错误
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            TutorError::StorageError(_) | TutorError::PersistenceError(_)
        )
    }
}

impl From<serde_json::Error> for TutorError {
    fn from(err: serde_json::Error) -> Self {
        TutorError::SerializationError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TutorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_display_carries_status_and_body() {
        let err = TutorError::RemoteServiceError {
            status: 429,
            body: "quota".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Remote service error: status 429, body: quota"
        );
        assert!(!err.is_persistence());
    }

    #[test]
    fn test_persistence_classification() {
        assert!(TutorError::PersistenceError("down".into()).is_persistence());
        assert!(TutorError::StorageError(sqlx::Error::PoolTimedOut).is_persistence());
    }
}
