pub mod models;
mod session;

pub use models::{Content, FunctionDeclaration};
pub use session::{system_instruction, ChatModel, GeminiClient, ModelReply, ModelSession};
