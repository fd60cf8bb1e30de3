pub mod conversation;
pub mod error;
pub mod model;

// 导出让外部使用
pub use conversation::*;
pub use error::{Result, TutorError};
pub use model::*;
