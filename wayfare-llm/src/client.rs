use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use wayfare_http::{HttpCallError, ResilientClient};

use crate::types::{ChatCompletion, ChatMessage, FunctionCall, FunctionSchema, LlmTurn};

pub const SERVICE_NAME: &str = "openai";

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error(transparent)]
    Http(#[from] HttpCallError),

    #[error("openai returned a malformed completion: {0}")]
    Malformed(String),
}

impl LlmError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, LlmError::Http(err) if err.is_configuration())
    }
}

/// Settings for the chat-completion endpoint, built once from the
/// process configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    functions: Option<&'a [FunctionSchema]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_call: Option<&'a str>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    function_call: Option<FunctionCall>,
}

/// Chat-completion client over the resilient HTTP wrapper. The model
/// may answer with free text or a structured function call.
pub struct ChatClient {
    config: LlmConfig,
    http: ResilientClient,
}

impl ChatClient {
    pub fn new(config: LlmConfig, http: ResilientClient) -> Self {
        Self { config, http }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChatCompletion for ChatClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        functions: &[FunctionSchema],
    ) -> Result<LlmTurn, LlmError> {
        let request = CompletionRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            functions: if functions.is_empty() { None } else { Some(functions) },
            function_call: if functions.is_empty() { None } else { Some("auto") },
        };

        let url = self.endpoint();
        let response = self
            .http
            .execute(SERVICE_NAME, |http| {
                http.post(&url)
                    .bearer_auth(&self.config.api_key)
                    .json(&request)
            })
            .await?;

        let body: CompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Malformed(e.to_string()))?;

        into_turn(body)
    }
}

fn into_turn(body: CompletionResponse) -> Result<LlmTurn, LlmError> {
    let message = body
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .ok_or_else(|| LlmError::Malformed("no choices in completion".to_string()))?;

    if let Some(call) = message.function_call {
        return Ok(LlmTurn::Call(call));
    }
    match message.content {
        Some(content) => Ok(LlmTurn::Content(content)),
        None => Err(LlmError::Malformed(
            "completion had neither content nor function_call".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_call_takes_precedence() {
        let body: CompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"content":null,"function_call":{"name":"search_flights","arguments":"{\"origin\":\"IAH\"}"}}}]}"#,
        )
        .unwrap();
        match into_turn(body).unwrap() {
            LlmTurn::Call(call) => {
                assert_eq!(call.name, "search_flights");
                assert!(call.arguments.contains("IAH"));
            }
            LlmTurn::Content(_) => panic!("expected a function call"),
        }
    }

    #[test]
    fn test_plain_content_turn() {
        let body: CompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"content":"Hello there"}}]}"#,
        )
        .unwrap();
        match into_turn(body).unwrap() {
            LlmTurn::Content(text) => assert_eq!(text, "Hello there"),
            LlmTurn::Call(_) => panic!("expected content"),
        }
    }

    #[test]
    fn test_empty_completion_is_malformed() {
        let body: CompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(into_turn(body), Err(LlmError::Malformed(_))));

        let body: CompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{}}]}"#).unwrap();
        assert!(matches!(into_turn(body), Err(LlmError::Malformed(_))));
    }

    #[test]
    fn test_request_serialization_omits_functions_when_absent() {
        let messages = vec![ChatMessage::user("hi")];
        let request = CompletionRequest {
            model: "gpt-4o-mini",
            messages: &messages,
            temperature: 0.7,
            max_tokens: 500,
            functions: None,
            function_call: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("functions").is_none());
        assert!(json.get("function_call").is_none());
    }
}
