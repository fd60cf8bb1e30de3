/// --- Prompt 配置中心 ---
/// 编译时加载 crates/llm/prompts/ 下的 Markdown 文件
#[derive(Debug, Clone)]
pub struct PromptConfig {
    pub tutor_prompt: String,
}

const QUESTION_PLACEHOLDER: &str = "{question}";

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            // 路径是相对于当前 rust 源文件的
            tutor_prompt: include_str!("../prompts/tutor_prompt_template.md")
                .trim()
                .to_string(),
        }
    }
}

impl PromptConfig {
    /// 把用户问题填进 tutor 模板
    pub fn render_tutor(&self, question: &str) -> String {
        self.tutor_prompt.replace(QUESTION_PLACEHOLDER, question)
    }
}
