use async_trait::async_trait;
use serde_json::Value;
use tutor_core::{GenerationRequest, ModelDescriptor, Result};

pub mod gemini;

/// 模型后端抽象接口 (ModelBackend)
///
/// 该 Trait 定义了与远程生成服务交互的两个动作：拉取模型目录、发起一次生成。
///
/// # 线程安全
/// 该 Trait 继承了 `Send + Sync`，这样可以通过 `Arc<dyn ModelBackend>` 放进 Axum 的共享状态里。
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// 拉取模型目录 (ListModels)
    ///
    /// 单次请求，不重试。
    ///
    /// # 返回值 (Returns)
    ///
    /// * `Ok(Vec<ModelDescriptor>)` - 远端返回的模型列表，可能为空。
    /// * `Err(TutorError::RemoteServiceError)` - 非 2xx，携带状态码和响应体。
    /// * `Err(TutorError::ConnectivityError)` - 超时、DNS 失败等传输层错误。
    async fn list_models(&self) -> Result<Vec<ModelDescriptor>>;

    /// 对指定模型发起一次生成请求 (generateContent)，返回原始 JSON
    ///
    /// # 参数 (Arguments)
    ///
    /// * `model_id` - 模型标识，允许带 `models/` 前缀。
    /// * `request` - 提示词 + 生成参数 (token 上限、温度)。
    async fn generate(&self, model_id: &str, request: &GenerationRequest) -> Result<Value>;
}
