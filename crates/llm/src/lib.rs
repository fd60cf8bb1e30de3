pub mod extract;
pub mod llm;
pub mod prompt;
pub mod selector;
pub mod tutor;

pub use extract::extract_text;
pub use llm::gemini::{GeminiBackend, GeminiSettings};
pub use llm::ModelBackend;
pub use selector::{rank_models, score_model, select_model, ScoredModel};
pub use tutor::{ModelSource, Tutor, TutorOptions, NO_MODEL_MESSAGE};
