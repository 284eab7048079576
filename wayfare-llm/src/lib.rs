pub mod client;
pub mod schemas;
pub mod types;

pub use client::{ChatClient, LlmConfig, LlmError};
pub use types::{ChatCompletion, ChatMessage, FunctionCall, FunctionSchema, LlmTurn, Role};
