use crate::llm::ModelBackend;
use async_trait::async_trait;
use reqwest::header;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;
use tutor_core::{GenerationRequest, ModelDescriptor, Result, TutorError};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

// ==========================================
// 1. ListModels 响应结构
// ==========================================

#[derive(Debug, Deserialize)]
struct ListModelsResponse {
    // 对应 JSON 中的 "models"，缺失时视为空目录
    // 逐条宽松解析，单条记录格式异常不影响其他记录
    #[serde(default)]
    models: Vec<Value>,
}

/// 目录中的一条原始记录
///
/// 不同 API 版本字段名不一样，这里把已知写法都列成显式的可选字段。
/// 字段值保持为 `Value`，类型不对也不会让整条记录解析失败。
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CatalogEntry {
    name: Option<Value>,
    model: Option<Value>,
    #[serde(rename = "modelId")]
    model_id: Option<Value>,
    #[serde(rename = "supportedGenerationMethods")]
    supported_generation_methods: Option<Value>,
    #[serde(rename = "supportedMethods")]
    supported_methods_camel: Option<Value>,
    #[serde(rename = "supported_methods")]
    supported_methods_snake: Option<Value>,
}

impl CatalogEntry {
    /// 没有可用标识的记录返回 `None`
    fn into_descriptor(self) -> Option<ModelDescriptor> {
        let identifier = [self.name, self.model, self.model_id]
            .into_iter()
            .flatten()
            .find_map(|v| match v {
                Value::String(s) if !s.is_empty() => Some(s),
                _ => None,
            })?;

        // 取第一个非空的方法列表
        let methods = [
            self.supported_generation_methods,
            self.supported_methods_camel,
            self.supported_methods_snake,
        ]
        .into_iter()
        .flatten()
        .find(is_present)
        .map(method_strings)
        .unwrap_or_default();

        Some(ModelDescriptor::new(identifier, methods))
    }
}

/// 解析单条目录记录
fn catalog_descriptor(entry: &Value) -> Option<ModelDescriptor> {
    let descriptor = CatalogEntry::deserialize(entry)
        .ok()
        .and_then(CatalogEntry::into_descriptor);
    if descriptor.is_none() {
        debug!("Skipping catalog entry without usable identifier: {}", entry);
    }
    descriptor
}

/// null / false / 0 / 空字符串 / 空数组 / 空对象 视为缺失
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// 列表逐项转字符串；其他形状整体转成一条文本
fn method_strings(value: Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.into_iter().map(value_text).collect(),
        other => vec![value_text(other)],
    }
}

fn value_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

// ==========================================
// 2. Gemini Backend 配置
// ==========================================

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: String,
    pub base_url: String,
    /// ListModels 超时，默认 15 秒
    pub catalog_timeout: Duration,
    /// generateContent 超时，默认 30 秒
    pub generation_timeout: Duration,
}

impl GeminiSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            catalog_timeout: Duration::from_secs(15),
            generation_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

// ==========================================
// 3. 实现 Gemini Backend
// ==========================================

pub struct GeminiBackend {
    settings: GeminiSettings,
    client: reqwest::Client,
}

impl GeminiBackend {
    /// 创建一个新的 Gemini 实例
    pub fn new(settings: GeminiSettings) -> Result<Self> {
        if settings.api_key.trim().is_empty() {
            return Err(TutorError::ConfigError(
                "GOOGLE_API_KEY must not be empty".to_string(),
            ));
        }

        // 构建默认 Header，API Key 走 x-goog-api-key，不拼进 URL
        let mut headers = header::HeaderMap::new();
        let key = header::HeaderValue::from_str(&settings.api_key)
            .map_err(|e| TutorError::ConfigError(format!("Invalid GOOGLE_API_KEY: {}", e)))?;
        headers.insert("x-goog-api-key", key);
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| TutorError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { settings, client })
    }

    /// generateContent 的完整 URL，去掉 `models/` 前缀
    pub fn generate_url(&self, model_id: &str) -> String {
        let model_id = model_id.strip_prefix("models/").unwrap_or(model_id);
        format!(
            "{}/models/{}:generateContent",
            self.settings.base_url, model_id
        )
    }

    fn catalog_url(&self) -> String {
        format!("{}/models", self.settings.base_url)
    }

    /// 发送请求并检查状态码，成功时返回响应体文本
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String> {
        let res = request.send().await.map_err(connectivity)?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(TutorError::RemoteServiceError {
                status: status.as_u16(),
                body,
            });
        }

        res.text().await.map_err(connectivity)
    }
}

/// 生成接口的请求体
pub fn generation_payload(request: &GenerationRequest) -> Value {
    json!({
        "contents": [{
            "parts": [{ "text": request.prompt_text }]
        }],
        "generationConfig": {
            "maxOutputTokens": request.max_output_tokens,
            "temperature": request.temperature
        }
    })
}

fn connectivity(err: reqwest::Error) -> TutorError {
    if err.is_timeout() {
        TutorError::ConnectivityError(format!("Request timed out: {}", err))
    } else {
        TutorError::ConnectivityError(err.to_string())
    }
}

#[async_trait]
impl ModelBackend for GeminiBackend {
    async fn list_models(&self) -> Result<Vec<ModelDescriptor>> {
        let body = self
            .send(
                self.client
                    .get(self.catalog_url())
                    .timeout(self.settings.catalog_timeout),
            )
            .await?;

        let parsed: ListModelsResponse = serde_json::from_str(&body)?;
        Ok(parsed.models.iter().filter_map(catalog_descriptor).collect())
    }

    async fn generate(&self, model_id: &str, request: &GenerationRequest) -> Result<Value> {
        let url = self.generate_url(model_id);
        debug!("POST {}", url);

        let body = self
            .send(
                self.client
                    .post(&url)
                    .json(&generation_payload(request))
                    .timeout(self.settings.generation_timeout),
            )
            .await?;

        Ok(serde_json::from_str(&body)?)
    }
}

// ==========================================
// 4. 单元测试
// ==========================================
