use sqlx::MySqlPool;
use std::sync::Arc;

// 声明子模块
pub mod db;
pub mod repository;

pub use repository::chat_repo::ChatRepository;
pub use repository::memory::MemoryStore;
pub use repository::ConversationStore;

/// 存储层容器
#[derive(Clone)]
pub struct Storage {
    pub conversations: Arc<dyn ConversationStore>,
}

impl Storage {
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            conversations: Arc::new(ChatRepository::new(pool)),
        }
    }
}
