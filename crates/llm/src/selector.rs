use tutor_core::{ModelDescriptor, SelectionResult};

/// "generateContent" 能力的同义写法 (统一按小写子串匹配)
const GENERATE_SYNONYMS: [&str; 2] = ["generatecontent", "generate_content"];

/// 实验性 / 测试版模型的标记
const EXPERIMENTAL_MARKERS: [&str; 3] = ["exp", "experimental", "beta"];

/// 打分后的候选模型
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredModel {
    pub identifier: String,
    pub score: i32,
    pub supports_generate: bool,
    pub is_experimental: bool,
}

/// 给单个模型打分
///
/// | 条件 | 分值 |
/// |---|---|
/// | 支持 generateContent | +10 |
/// | 名称含 gemini | +5 |
/// | flash / pro / 001 / latest | +3 / +2 / +2 / +1 |
/// | exp / experimental / beta | -5 |
pub fn score_model(model: &ModelDescriptor) -> ScoredModel {
    let name = model.identifier.to_lowercase();

    let supports_generate = model.supported_capabilities.iter().any(|cap| {
        let cap = cap.to_lowercase();
        GENERATE_SYNONYMS.iter().any(|syn| cap.contains(syn))
    });
    let is_experimental = EXPERIMENTAL_MARKERS.iter().any(|m| name.contains(m));

    let mut score = 0;
    if supports_generate {
        score += 10;
    }
    if name.contains("gemini") {
        score += 5;
    }
    if name.contains("flash") {
        score += 3;
    }
    if name.contains("pro") {
        score += 2;
    }
    if name.contains("001") {
        score += 2;
    }
    if name.contains("latest") {
        score += 1;
    }
    if is_experimental {
        score -= 5;
    }

    ScoredModel {
        identifier: model.identifier.clone(),
        score,
        supports_generate,
        is_experimental,
    }
}

/// 对整个目录打分并排序
///
/// 分数高者优先；同分时非实验模型优先；仍然相同则保持输入顺序 (稳定排序)。
/// 空标识的条目在打分前丢弃。
pub fn rank_models(models: &[ModelDescriptor]) -> Vec<ScoredModel> {
    let mut ranked: Vec<ScoredModel> = models
        .iter()
        .filter(|m| !m.identifier.is_empty())
        .map(score_model)
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.is_experimental.cmp(&b.is_experimental))
    });
    ranked
}

/// 从目录中挑出最佳模型，没有候选时返回 `SelectionResult::none()`
pub fn select_model(models: &[ModelDescriptor]) -> SelectionResult {
    match rank_models(models).into_iter().next() {
        Some(best) => SelectionResult {
            identifier: Some(best.identifier),
            score: best.score,
        },
        None => SelectionResult::none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(name: &str, methods: &[&str]) -> ModelDescriptor {
        ModelDescriptor::new(name, methods.iter().copied())
    }

    #[test]
    fn test_score_table() {
        let m = model("models/gemini-1.5-flash-001", &["generateContent"]);
        // 10 + 5 + 3 + 2
        assert_eq!(score_model(&m).score, 20);

        let m = model("models/gemini-pro-latest", &["countTokens"]);
        // 5 + 2 + 1
        assert_eq!(score_model(&m).score, 8);

        let m = model("models/gemini-2.0-flash-exp", &["generateContent"]);
        // 10 + 5 + 3 - 5
        let scored = score_model(&m);
        assert_eq!(scored.score, 13);
        assert!(scored.is_experimental);
    }

    #[test]
    fn test_capability_match_is_case_insensitive() {
        let m = model("models/text-bison", &["GENERATE_CONTENT"]);
        assert!(score_model(&m).supports_generate);
        let m = model("models/text-bison", &["GenerateContent"]);
        assert!(score_model(&m).supports_generate);
    }

    #[test]
    fn test_generate_flash_beats_others_in_any_order() {
        let flash = model("models/gemini-1.5-flash", &["generateContent"]);
        let others = vec![
            model("models/gemini-1.5-pro-001-latest", &["embedContent"]),
            model("models/embedding-001", &["embedContent"]),
            model("models/aqa", &[]),
        ];

        for pos in 0..=others.len() {
            let mut list = others.clone();
            list.insert(pos, flash.clone());
            let result = select_model(&list);
            assert_eq!(result.identifier.as_deref(), Some("models/gemini-1.5-flash"));
        }
    }

    #[test]
    fn test_all_experimental_still_selects_best() {
        let list = vec![
            model("models/beta-thing", &[]),
            model("models/gemini-exp-1206", &[]),
        ];
        let result = select_model(&list);
        assert_eq!(result.identifier.as_deref(), Some("models/gemini-exp-1206"));
        assert_eq!(result.score, 0);

        let list = vec![model("models/beta-thing", &[])];
        let result = select_model(&list);
        assert_eq!(result.identifier.as_deref(), Some("models/beta-thing"));
        assert_eq!(result.score, -5);
    }

    #[test]
    fn test_empty_list_returns_none() {
        assert!(select_model(&[]).is_none());
        assert!(select_model(&[model("", &["generateContent"])]).is_none());
    }

    #[test]
    fn test_ties_prefer_non_experimental_then_input_order() {
        // gemini-beta: 10 + 5 - 5 = 10; first-stable / second-stable: 10
        let list = vec![
            model("models/gemini-beta", &["generateContent"]),
            model("models/first-stable", &["generateContent"]),
            model("models/second-stable", &["generateContent"]),
        ];
        let ranked = rank_models(&list);
        assert_eq!(ranked[0].identifier, "models/first-stable");
        assert_eq!(ranked[1].identifier, "models/second-stable");
        assert_eq!(ranked[2].identifier, "models/gemini-beta");
    }
}
