pub mod chat_repo;
pub mod common;
pub mod memory;

use async_trait::async_trait;
use tutor_core::{ConversationTurn, Result, SessionSummary, StoredMessage};

/// 对话存储接口
///
/// 该接口定义了如何持久化对话消息。
/// 任何实现该接口的结构体（如 MySQL 的 ChatRepository、内存版 MemoryStore）
/// 都可以被注入到 HTTP 服务的共享状态中。
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// 连通性检查 (`SELECT 1`)
    async fn ping(&self) -> Result<()>;

    /// 追加一条消息，返回新记录的 ID
    async fn append(&self, turn: &ConversationTurn) -> Result<i64>;

    /// 读取某个会话的全部消息，按时间升序
    async fn history(&self, user_id: &str, session_id: &str) -> Result<Vec<StoredMessage>>;

    /// 清空某个会话，返回删除的条数
    async fn clear(&self, user_id: &str, session_id: &str) -> Result<u64>;

    /// 列出某个用户的全部会话，最近活跃的在前
    ///
    /// # 返回
    /// * 每个会话一条：首条消息时间 (created_at) + 消息条数
    async fn sessions(&self, user_id: &str) -> Result<Vec<SessionSummary>>;
}
