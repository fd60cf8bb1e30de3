use crate::extract::extract_text;
use crate::llm::ModelBackend;
use crate::prompt::PromptConfig;
use crate::selector::{rank_models, select_model};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use tutor_core::{GenerationRequest, Result, TutorError};

pub const NO_MODEL_MESSAGE: &str =
    "No model selected on startup. Check server logs or set FALLBACK_MODEL.";

/// 选中模型的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelSource {
    /// 目录拉取成功并打分选出
    Catalog,
    /// 目录为空 / 拉取失败，使用 FALLBACK_MODEL
    Fallback,
    /// 没有任何可用模型，生成请求会直接失败
    Unavailable,
}

/// 生成参数
#[derive(Debug, Clone)]
pub struct TutorOptions {
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub prompts: PromptConfig,
}

impl Default for TutorOptions {
    fn default() -> Self {
        Self {
            max_output_tokens: GenerationRequest::DEFAULT_MAX_OUTPUT_TOKENS,
            temperature: GenerationRequest::DEFAULT_TEMPERATURE,
            prompts: PromptConfig::default(),
        }
    }
}

/// AI 导师 (Tutor)
///
/// 持有进程生命周期内固定的模型标识。启动时选定一次，之后所有请求复用，不会中途重选。
/// 放在 `Arc` 里共享给所有 handler，内部没有可变状态，因此不需要加锁。
pub struct Tutor {
    backend: Arc<dyn ModelBackend>,
    selected_model: Option<String>,
    source: ModelSource,
    options: TutorOptions,
}

impl Tutor {
    /// 直接指定模型 (测试或已知模型时使用)
    pub fn with_model(
        backend: Arc<dyn ModelBackend>,
        selected_model: Option<String>,
        options: TutorOptions,
    ) -> Self {
        let source = if selected_model.is_some() {
            ModelSource::Fallback
        } else {
            ModelSource::Unavailable
        };
        Self {
            backend,
            selected_model,
            source,
            options,
        }
    }

    /// 启动流程：拉取目录 -> 打分选模 -> 兜底
    ///
    /// 永不失败。拉取失败或没有候选时使用 `fallback_model`，两者都没有则标记为无可用模型。
    pub async fn bootstrap(
        backend: Arc<dyn ModelBackend>,
        fallback_model: Option<String>,
        options: TutorOptions,
    ) -> Self {
        let fallback_model = fallback_model.filter(|m| !m.trim().is_empty());

        info!("Listing available models from Google Generative API...");
        let (selected_model, source) = match backend.list_models().await {
            Ok(models) => {
                info!("Found {} models.", models.len());
                let ranked = rank_models(&models);
                for (i, candidate) in ranked.iter().take(3).enumerate() {
                    info!(
                        "  #{} {} (score: {}, generate: {}, experimental: {})",
                        i + 1,
                        candidate.identifier,
                        candidate.score,
                        candidate.supports_generate,
                        candidate.is_experimental
                    );
                }

                let selection = select_model(&models);
                match (selection.identifier, fallback_model) {
                    (Some(best), _) => {
                        info!("✅ Selected model: {} (score: {})", best, selection.score);
                        (Some(best), ModelSource::Catalog)
                    }
                    (None, Some(fallback)) => {
                        warn!(
                            "No suitable model chosen from ListModels; using FALLBACK_MODEL: {}",
                            fallback
                        );
                        (Some(fallback), ModelSource::Fallback)
                    }
                    (None, None) => {
                        warn!("No model selected. Set FALLBACK_MODEL or ensure models list contains usable models.");
                        (None, ModelSource::Unavailable)
                    }
                }
            }
            Err(e) => {
                error!("Failed to list/select models on startup: {}", e);
                match fallback_model {
                    Some(fallback) => {
                        info!("Using FALLBACK_MODEL due to list failure: {}", fallback);
                        (Some(fallback), ModelSource::Fallback)
                    }
                    None => (None, ModelSource::Unavailable),
                }
            }
        };

        Self {
            backend,
            selected_model,
            source,
            options,
        }
    }

    pub fn selected_model(&self) -> Option<&str> {
        self.selected_model.as_deref()
    }

    pub fn model_source(&self) -> ModelSource {
        self.source
    }

    /// 回答一个问题：渲染 tutor 模板 -> generateContent -> 提取文本
    ///
    /// 没有可用模型时在发起任何网络请求之前返回 `ConfigError`；
    /// 问题为空时返回 `InvalidRequest`。
    pub async fn answer(&self, question: &str) -> Result<String> {
        let model_id = self
            .selected_model
            .as_deref()
            .ok_or_else(|| TutorError::ConfigError(NO_MODEL_MESSAGE.to_string()))?;

        if question.trim().is_empty() {
            return Err(TutorError::InvalidRequest("Prompt is required.".to_string()));
        }

        let request = GenerationRequest::new(self.options.prompts.render_tutor(question))
            .with_max_output_tokens(self.options.max_output_tokens)
            .with_temperature(self.options.temperature);

        let raw = self.backend.generate(model_id, &request).await?;
        info!("Received response from model {}", model_id);

        Ok(extract_text(&raw))
    }
}

// ==========================================
// 单元测试
// ==========================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tutor_core::ModelDescriptor;

    /// 模拟后端 (Mock Backend)
    struct MockBackend {
        catalog: Result<Vec<ModelDescriptor>>,
        generate_calls: AtomicUsize,
        last_request: Mutex<Option<(String, GenerationRequest)>>,
    }

    impl MockBackend {
        fn new(catalog: Result<Vec<ModelDescriptor>>) -> Arc<Self> {
            Arc::new(Self {
                catalog,
                generate_calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl ModelBackend for MockBackend {
        async fn list_models(&self) -> Result<Vec<ModelDescriptor>> {
            match &self.catalog {
                Ok(models) => Ok(models.clone()),
                Err(e) => Err(TutorError::ConnectivityError(e.to_string())),
            }
        }

        async fn generate(&self, model_id: &str, request: &GenerationRequest) -> Result<Value> {
            self.generate_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some((model_id.to_string(), request.clone()));
            Ok(json!({"candidates":[{"content":{"parts":[{"text":"4"}]}}]}))
        }
    }

    fn catalog() -> Vec<ModelDescriptor> {
        vec![
            ModelDescriptor::new("models/embedding-001", ["embedContent"]),
            ModelDescriptor::new("models/gemini-1.5-flash", ["generateContent"]),
        ]
    }

    #[tokio::test]
    async fn test_bootstrap_selects_from_catalog() {
        let backend = MockBackend::new(Ok(catalog()));
        let tutor = Tutor::bootstrap(backend, Some("fallback".into()), TutorOptions::default()).await;
        assert_eq!(tutor.selected_model(), Some("models/gemini-1.5-flash"));
        assert_eq!(tutor.model_source(), ModelSource::Catalog);
    }

    #[tokio::test]
    async fn test_bootstrap_uses_fallback_on_failure_or_empty_catalog() {
        let backend = MockBackend::new(Err(TutorError::ConnectivityError("dns".into())));
        let tutor =
            Tutor::bootstrap(backend, Some("gemini-2.5-flash".into()), TutorOptions::default())
                .await;
        assert_eq!(tutor.selected_model(), Some("gemini-2.5-flash"));
        assert_eq!(tutor.model_source(), ModelSource::Fallback);

        let backend = MockBackend::new(Ok(vec![]));
        let tutor =
            Tutor::bootstrap(backend, Some("gemini-2.5-flash".into()), TutorOptions::default())
                .await;
        assert_eq!(tutor.model_source(), ModelSource::Fallback);
    }

    #[tokio::test]
    async fn test_no_model_fails_fast_without_network_call() {
        let backend = MockBackend::new(Err(TutorError::ConnectivityError("down".into())));
        let tutor = Tutor::bootstrap(backend.clone(), Some("  ".into()), TutorOptions::default()).await;
        assert_eq!(tutor.selected_model(), None);
        assert_eq!(tutor.model_source(), ModelSource::Unavailable);

        let err = tutor.answer("2+2?").await.unwrap_err();
        assert!(matches!(err, TutorError::ConfigError(ref m) if m == NO_MODEL_MESSAGE));
        assert_eq!(backend.generate_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_answer_renders_prompt_and_extracts_text() {
        let backend = MockBackend::new(Ok(catalog()));
        let options = TutorOptions {
            max_output_tokens: 128,
            temperature: 0.3,
            ..TutorOptions::default()
        };
        let tutor = Tutor::bootstrap(backend.clone(), None, options).await;

        let reply = tutor.answer("2+2?").await.unwrap();
        assert_eq!(reply, "4");

        let (model, request) = backend.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(model, "models/gemini-1.5-flash");
        assert!(request.prompt_text.contains("Question: 2+2?"));
        assert_eq!(request.max_output_tokens, 128);
    }

    #[tokio::test]
    async fn test_blank_question_is_rejected_before_generation() {
        let backend = MockBackend::new(Ok(catalog()));
        let tutor = Tutor::bootstrap(backend.clone(), None, TutorOptions::default()).await;

        let err = tutor.answer("   ").await.unwrap_err();
        assert!(matches!(err, TutorError::InvalidRequest(_)));
        assert_eq!(backend.generate_calls.load(Ordering::SeqCst), 0);
    }
}
