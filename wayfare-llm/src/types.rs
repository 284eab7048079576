use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::client::LlmError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Function,
}

/// One entry of the chat transcript sent to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Set on `function` role messages: the name of the executed function.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: Some(content.into()),
            name: None,
            function_call: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(content.into()),
            name: None,
            function_call: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: Some(content.into()),
            name: None,
            function_call: None,
        }
    }

    /// The assistant turn that requested a function call, echoed back
    /// in history so the follow-up call has the full exchange.
    pub fn assistant_call(call: FunctionCall) -> Self {
        Self {
            role: Role::Assistant,
            content: None,
            name: None,
            function_call: Some(call),
        }
    }

    /// The result of an executed function, fed back for summarization.
    pub fn function_result(name: impl Into<String>, payload: &serde_json::Value) -> Self {
        Self {
            role: Role::Function,
            content: Some(payload.to_string()),
            name: Some(name.into()),
            function_call: None,
        }
    }
}

/// Structured operation request emitted by the model: a name plus
/// JSON-encoded arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

/// Schema advertised to the model for one callable function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionSchema {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// What a single model turn produced.
#[derive(Debug, Clone)]
pub enum LlmTurn {
    Content(String),
    Call(FunctionCall),
}

/// Seam over the chat-completion endpoint so orchestration logic can be
/// exercised against scripted turns.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        functions: &[FunctionSchema],
    ) -> Result<LlmTurn, LlmError>;
}
