use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// 远程模型目录中的一条模型描述
///
/// 启动时从 ListModels 接口拉取一次，之后不可变。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// 模型标识 (e.g. "models/gemini-1.5-flash-001")
    pub identifier: String,

    /// 支持的生成方法 (e.g. "generateContent", "countTokens")
    pub supported_capabilities: BTreeSet<String>,
}

impl ModelDescriptor {
    pub fn new<I, S>(identifier: impl Into<String>, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            identifier: identifier.into(),
            supported_capabilities: capabilities.into_iter().map(Into::into).collect(),
        }
    }
}

/// 选模结果
///
/// `identifier == None` 表示目录里没有合适的模型，由调用方决定是否使用 FALLBACK_MODEL。
/// 这是一个合法结果，不是错误。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionResult {
    pub identifier: Option<String>,
    pub score: i32,
}

impl SelectionResult {
    pub fn none() -> Self {
        Self {
            identifier: None,
            score: 0,
        }
    }

    pub fn is_none(&self) -> bool {
        self.identifier.is_none()
    }
}

/// 单次生成请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt_text: String,
    pub max_output_tokens: u32,
    /// 采样温度，交互式回复默认 0.7
    pub temperature: f32,
}

impl GenerationRequest {
    pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 512;
    pub const DEFAULT_TEMPERATURE: f32 = 0.7;

    pub fn new(prompt_text: impl Into<String>) -> Self {
        Self {
            prompt_text: prompt_text.into(),
            max_output_tokens: Self::DEFAULT_MAX_OUTPUT_TOKENS,
            temperature: Self::DEFAULT_TEMPERATURE,
        }
    }

    /// 连通性探测用的短请求：低温度、少 token
    pub fn probe(prompt_text: impl Into<String>) -> Self {
        Self {
            prompt_text: prompt_text.into(),
            max_output_tokens: 50,
            temperature: 0.1,
        }
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}
