use std::sync::Arc;
use tutor_llm::Tutor;
use tutor_storage::ConversationStore;

/// 所有 handler 共享的只读状态
///
/// 选中的模型保存在 `Tutor` 里，启动后不再变化。
#[derive(Clone)]
pub struct AppState {
    pub tutor: Arc<Tutor>,
    pub store: Arc<dyn ConversationStore>,
}

impl AppState {
    pub fn new(tutor: Arc<Tutor>, store: Arc<dyn ConversationStore>) -> Self {
        Self { tutor, store }
    }

    pub fn selected_model(&self) -> Option<&str> {
        self.tutor.selected_model()
    }
}
