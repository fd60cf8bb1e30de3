use config::{Config, Environment};
use serde::Deserialize;
use std::time::Duration;
use tutor_core::{Result, TutorError};
use tutor_llm::llm::gemini::DEFAULT_BASE_URL;
use tutor_llm::{GeminiSettings, TutorOptions};

/// 服务配置
///
/// 来源优先级：进程环境变量 (含 .env) > 默认值。
/// 环境变量名即字段名的大写形式，例如 `GOOGLE_API_KEY`、`BIND_ADDR`。
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Google Generative Language API Key (必填)
    #[serde(rename = "google_api_key")]
    pub api_key: String,

    /// 目录拉取失败 / 没有合适模型时使用的模型，例如 "gemini-2.5-flash"
    #[serde(default)]
    pub fallback_model: Option<String>,

    pub database_url: String,
    pub bind_addr: String,
    pub gemini_base_url: String,
    pub catalog_timeout_secs: u64,
    pub generation_timeout_secs: u64,
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub log_dir: String,
}

impl ServerConfig {
    /// 从进程环境加载 (先读取 .env)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::load(None)
    }

    /// 从给定的变量表加载；`None` 表示读取进程环境
    pub fn load(vars: Option<config::Map<String, String>>) -> Result<Self> {
        let settings = Config::builder()
            .set_default("bind_addr", "0.0.0.0:8000")
            .and_then(|b| b.set_default("gemini_base_url", DEFAULT_BASE_URL))
            .and_then(|b| b.set_default("catalog_timeout_secs", 15_i64))
            .and_then(|b| b.set_default("generation_timeout_secs", 30_i64))
            .and_then(|b| b.set_default("max_output_tokens", 512_i64))
            .and_then(|b| b.set_default("temperature", 0.7_f64))
            .and_then(|b| b.set_default("log_dir", "logs"))
            .map_err(config_error)?
            .add_source(Environment::default().source(vars))
            .build()
            .map_err(config_error)?;

        // 先单独检查必填项，报错信息比 serde 的 "missing field" 更直观
        for key in ["google_api_key", "database_url"] {
            let present = settings
                .get_string(key)
                .map(|v| !v.trim().is_empty())
                .unwrap_or(false);
            if !present {
                return Err(TutorError::ConfigError(format!(
                    "Set {} in your environment (.env) before running.",
                    key.to_uppercase()
                )));
            }
        }

        settings.try_deserialize().map_err(config_error)
    }

    /// 空字符串视为未配置
    pub fn fallback_model(&self) -> Option<String> {
        self.fallback_model
            .as_ref()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
    }

    pub fn gemini_settings(&self) -> GeminiSettings {
        let mut settings =
            GeminiSettings::new(self.api_key.clone()).with_base_url(self.gemini_base_url.clone());
        settings.catalog_timeout = Duration::from_secs(self.catalog_timeout_secs);
        settings.generation_timeout = Duration::from_secs(self.generation_timeout_secs);
        settings
    }

    pub fn tutor_options(&self) -> TutorOptions {
        TutorOptions {
            max_output_tokens: self.max_output_tokens,
            temperature: self.temperature,
            ..TutorOptions::default()
        }
    }
}

fn config_error(err: config::ConfigError) -> TutorError {
    TutorError::ConfigError(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Option<config::Map<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_defaults_apply() {
        let cfg = ServerConfig::load(vars(&[
            ("GOOGLE_API_KEY", "abc"),
            ("DATABASE_URL", "mysql://root@localhost/chatbot_db"),
        ]))
        .unwrap();

        assert_eq!(cfg.api_key, "abc");
        assert_eq!(cfg.bind_addr, "0.0.0.0:8000");
        assert_eq!(cfg.gemini_base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.catalog_timeout_secs, 15);
        assert_eq!(cfg.generation_timeout_secs, 30);
        assert_eq!(cfg.max_output_tokens, 512);
        assert!((cfg.temperature - 0.7).abs() < 1e-6);
        assert_eq!(cfg.fallback_model(), None);
    }

    #[test]
    fn test_overrides_from_environment() {
        let cfg = ServerConfig::load(vars(&[
            ("GOOGLE_API_KEY", "abc"),
            ("DATABASE_URL", "mysql://db"),
            ("FALLBACK_MODEL", "gemini-2.5-flash"),
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("GENERATION_TIMEOUT_SECS", "5"),
            ("TEMPERATURE", "0.1"),
        ]))
        .unwrap();

        assert_eq!(cfg.fallback_model().as_deref(), Some("gemini-2.5-flash"));
        assert_eq!(cfg.bind_addr, "127.0.0.1:9000");
        assert_eq!(
            cfg.gemini_settings().generation_timeout,
            Duration::from_secs(5)
        );
        assert!((cfg.tutor_options().temperature - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let err = ServerConfig::load(vars(&[("DATABASE_URL", "mysql://db")])).unwrap_err();
        match err {
            TutorError::ConfigError(msg) => assert!(msg.contains("GOOGLE_API_KEY")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_blank_fallback_is_none() {
        let cfg = ServerConfig::load(vars(&[
            ("GOOGLE_API_KEY", "abc"),
            ("DATABASE_URL", "mysql://db"),
            ("FALLBACK_MODEL", "   "),
        ]))
        .unwrap();
        assert_eq!(cfg.fallback_model(), None);
    }
}
