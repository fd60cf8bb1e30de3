// crates/core/src/conversation.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

pub const DEFAULT_USER_ID: &str = "anonymous";
pub const DEFAULT_SESSION_ID: &str = "default";

/// 消息发送方
///
/// 数据库和前端都使用 "user" / "ai"，解析时也接受 "assistant"。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum SenderRole {
    #[serde(rename = "user")]
    #[strum(to_string = "user")]
    User,
    #[serde(rename = "ai", alias = "assistant")]
    #[strum(to_string = "ai", serialize = "assistant")]
    Assistant,
}

impl TryFrom<String> for SenderRole {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// 对话中的一轮消息 (待写入)
///
/// 对应数据库表: `chat_messages`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub user_id: String,
    pub session_id: String,
    pub sender: SenderRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn new(
        user_id: impl Into<String>,
        session_id: impl Into<String>,
        sender: SenderRole,
        text: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: session_id.into(),
            sender,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(user_id: &str, session_id: &str, text: impl Into<String>) -> Self {
        Self::new(user_id, session_id, SenderRole::User, text)
    }

    pub fn assistant(user_id: &str, session_id: &str, text: impl Into<String>) -> Self {
        Self::new(user_id, session_id, SenderRole::Assistant, text)
    }
}

/// 已持久化的消息 (历史记录视图)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    /// 数据库物理主键 (自增 ID)
    pub id: i64,
    pub text: String,
    pub sender: SenderRole,
    pub timestamp: DateTime<Utc>,
}

/// 会话概览：首条消息时间 + 消息条数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub message_count: i64,
}
