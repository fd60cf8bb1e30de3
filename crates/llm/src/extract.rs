//! 把各版本 generateContent 返回的不同 JSON 结构统一成一段纯文本。
//!
//! 每一种已知结构都用一个显式的 serde 结构体描述，按固定顺序尝试解码，
//! 第一个命中的结构胜出；全部落空时返回整个 JSON 的字符串形式，永不报错。

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

// ==========================================
// 1. 已知的响应结构
// ==========================================

/// `candidates[0].content.parts`
#[derive(Debug, Deserialize)]
struct PartsCandidate {
    content: PartsContent,
}

#[derive(Debug, Deserialize)]
struct PartsContent {
    parts: Vec<Value>,
}

/// 候选上直接挂的字符串字段，按 content / output / message / text 顺序检查
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FlatCandidate {
    content: Option<Value>,
    output: Option<Value>,
    message: Option<Value>,
    text: Option<Value>,
}

/// 旧版顶层 `{"text": "..."}`
#[derive(Debug, Deserialize)]
struct LegacyText {
    text: String,
}

/// `{"output": [...]}` 或 `{"outputs": [...]}`
#[derive(Debug, Deserialize)]
struct OutputEnvelope {
    #[serde(default)]
    output: Option<Vec<Value>>,
    #[serde(default)]
    outputs: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    content: OutputContent,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OutputContent {
    Text(String),
    Items(Vec<Value>),
    Parts(PartsContent),
}

/// `{"message": {"content": "..."}}`
#[derive(Debug, Deserialize)]
struct MessageEnvelope {
    message: serde_json::Map<String, Value>,
}

// ==========================================
// 2. 结构识别
// ==========================================

/// 识别出的响应结构 (按优先级排列)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseShape {
    CandidateParts(Vec<String>),
    CandidateText(String),
    LegacyText(String),
    OutputParts(Vec<String>),
    Message(String),
    Raw(String),
}

impl ResponseShape {
    pub fn detect(resp: &Value) -> Self {
        if !resp.is_object() {
            return ResponseShape::Raw(resp.to_string());
        }

        if let Some(first) = first_candidate(resp) {
            if let Some(texts) = candidate_parts(first) {
                return ResponseShape::CandidateParts(texts);
            }
            if let Some(text) = candidate_text(first) {
                return ResponseShape::CandidateText(text);
            }
        }

        if let Ok(legacy) = LegacyText::deserialize(resp) {
            return ResponseShape::LegacyText(legacy.text);
        }

        if let Some(texts) = output_parts(resp) {
            return ResponseShape::OutputParts(texts);
        }

        if let Ok(envelope) = MessageEnvelope::deserialize(resp) {
            let content = envelope
                .message
                .get("content")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            return ResponseShape::Message(content);
        }

        ResponseShape::Raw(resp.to_string())
    }

    pub fn into_text(self) -> String {
        match self {
            ResponseShape::CandidateParts(texts) | ResponseShape::OutputParts(texts) => {
                texts.join("\n")
            }
            ResponseShape::CandidateText(text)
            | ResponseShape::LegacyText(text)
            | ResponseShape::Message(text)
            | ResponseShape::Raw(text) => text,
        }
    }
}

/// 从任意响应中提取文本，永不失败
pub fn extract_text(resp: &Value) -> String {
    let shape = ResponseShape::detect(resp);
    if let ResponseShape::Raw(raw) = &shape {
        warn!("Could not extract text from response: {}", raw);
    }
    shape.into_text()
}

// ==========================================
// 3. 辅助函数
// ==========================================

/// `{"candidates": [...]}`，只关心第一个候选，且它必须是对象
fn first_candidate(resp: &Value) -> Option<&Value> {
    resp.get("candidates")?
        .as_array()?
        .first()
        .filter(|c| c.is_object())
}

fn candidate_parts(candidate: &Value) -> Option<Vec<String>> {
    let parsed = PartsCandidate::deserialize(candidate).ok()?;
    non_empty(collect_texts(&parsed.content.parts))
}

fn candidate_text(candidate: &Value) -> Option<String> {
    let flat = FlatCandidate::deserialize(candidate).ok()?;
    [flat.content, flat.output, flat.message, flat.text]
        .into_iter()
        .flatten()
        .find_map(|v| v.as_str().map(str::to_string))
}

fn output_parts(resp: &Value) -> Option<Vec<String>> {
    let envelope = OutputEnvelope::deserialize(resp).ok()?;
    // 空的 output 视为缺失，继续看 outputs
    let items = envelope
        .output
        .filter(|v| !v.is_empty())
        .or(envelope.outputs)?;
    let item = OutputItem::deserialize(items.first()?).ok()?;
    match item.content {
        OutputContent::Text(text) => Some(vec![text]),
        OutputContent::Items(items) => non_empty(collect_texts(&items)),
        OutputContent::Parts(content) => non_empty(collect_texts(&content.parts)),
    }
}

/// part 可能是 `{"text": "..."}`，也可能直接是字符串
fn collect_texts(parts: &[Value]) -> Vec<String> {
    parts
        .iter()
        .filter_map(|part| match part {
            Value::String(s) => Some(s.clone()),
            Value::Object(map) => map.get("text").and_then(Value::as_str).map(str::to_string),
            _ => None,
        })
        .collect()
}

fn non_empty(texts: Vec<String>) -> Option<Vec<String>> {
    if texts.is_empty() {
        None
    } else {
        Some(texts)
    }
}
