use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use wayfare_core::conversation::{MessageRole, NewMessage};
use wayfare_core::repository::ConversationRepository;
use wayfare_http::{retry_async, RetryPolicy};
use wayfare_llm::schemas::{all_schemas, CREATE_FLIGHT_BOOKING, SEARCH_FLIGHTS};
use wayfare_llm::{ChatCompletion, ChatMessage, LlmError, LlmTurn};

use crate::dispatcher::{DispatchOutcome, FunctionDispatcher};
use crate::error::{categorize_failure, ErrorReport, CONFIGURATION_REPORT};
use crate::prompts::system_prompt;

/// How many stored messages are replayed to the model per turn.
const HISTORY_LIMIT: usize = 20;

/// Conversation titles derive from the first message, truncated.
const TITLE_LIMIT: usize = 60;

#[derive(Debug, Clone)]
pub struct ChatTurnRequest {
    pub message: String,
    pub conversation_id: Option<Uuid>,
    pub user_id: String,
}

/// Always-200 response envelope: the chat UI renders `response` either
/// way and uses the error fields only for styling and retries.
#[derive(Debug, Clone, Serialize)]
pub struct ChatTurnResponse {
    pub response: String,
    #[serde(rename = "conversationId")]
    pub conversation_id: Uuid,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub error: bool,
    #[serde(rename = "errorType", skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
}

/// Internal failure carried to the single catch-all. The detail string
/// is what the keyword categorizer inspects.
struct TurnFailure {
    conversation_id: Option<Uuid>,
    configuration: bool,
    detail: String,
}

impl TurnFailure {
    fn report(&self) -> ErrorReport {
        if self.configuration {
            CONFIGURATION_REPORT
        } else {
            categorize_failure(&self.detail)
        }
    }
}

/// Entry point for one inbound chat turn: loads or creates the
/// conversation, appends the user message, drives the model through
/// the function-calling protocol, and persists the assistant reply.
/// This is the only place a catch-all exists; it always produces a
/// response.
pub struct Orchestrator {
    llm: Arc<dyn ChatCompletion>,
    dispatcher: FunctionDispatcher,
    conversations: Arc<dyn ConversationRepository>,
    storage_retry: RetryPolicy,
    // Serializes turns per conversation; two racing requests against
    // the same log would scramble ordering and the booking cache scan.
    locks: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
}

impl Orchestrator {
    pub fn new(
        llm: Arc<dyn ChatCompletion>,
        dispatcher: FunctionDispatcher,
        conversations: Arc<dyn ConversationRepository>,
        storage_retry: RetryPolicy,
    ) -> Self {
        Self {
            llm,
            dispatcher,
            conversations,
            storage_retry,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub async fn handle_message(&self, request: ChatTurnRequest) -> ChatTurnResponse {
        let requested = request.conversation_id;
        match self.process(&request).await {
            Ok((conversation_id, reply)) => ChatTurnResponse {
                response: reply,
                conversation_id,
                error: false,
                error_type: None,
            },
            Err(failure) => {
                let report = failure.report();
                tracing::error!("chat turn failed ({}): {}", report.error_type, failure.detail);
                let conversation_id = failure
                    .conversation_id
                    .or(requested)
                    .unwrap_or_else(Uuid::new_v4);
                if failure.conversation_id.is_some() {
                    self.persist_assistant(conversation_id, report.message).await;
                }
                ChatTurnResponse {
                    response: report.message.to_string(),
                    conversation_id,
                    error: true,
                    error_type: Some(report.error_type.to_string()),
                }
            }
        }
    }

    async fn process(&self, request: &ChatTurnRequest) -> Result<(Uuid, String), TurnFailure> {
        let today = Utc::now().date_naive();

        let conversation_id = self.resolve_conversation(request).await?;

        let lock = self.conversation_lock(conversation_id);
        let _guard = lock.lock().await;

        let user_message = NewMessage {
            conversation_id,
            role: MessageRole::User,
            content: request.message.clone(),
            metadata: None,
        };
        retry_async(
            &self.storage_retry,
            "user message write",
            || self.conversations.append_message(&user_message),
            |_| true,
        )
        .await
        .map_err(|e| storage_failure(Some(conversation_id), e))?;

        let history = self
            .conversations
            .list_messages(conversation_id)
            .await
            .map_err(|e| storage_failure(Some(conversation_id), e))?;

        // Sentinel cache rows never reach the model.
        let visible: Vec<_> = history
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .collect();
        let start = visible.len().saturating_sub(HISTORY_LIMIT);

        let mut transcript = vec![ChatMessage::system(system_prompt(today))];
        transcript.extend(visible[start..].iter().map(|m| match m.role {
            MessageRole::User => ChatMessage::user(m.content.clone()),
            _ => ChatMessage::assistant(m.content.clone()),
        }));

        let schemas = all_schemas();
        let turn = self
            .llm
            .complete(&transcript, &schemas)
            .await
            .map_err(|e| llm_failure(Some(conversation_id), e))?;

        let reply = match turn {
            LlmTurn::Content(text) => text,
            LlmTurn::Call(call) => {
                let outcome = self
                    .dispatcher
                    .dispatch(conversation_id, &request.user_id, &call, today)
                    .await;
                match outcome {
                    DispatchOutcome::Reply(text) => text,
                    DispatchOutcome::FunctionResult { name, payload } => {
                        // Second model call turns the raw result into a
                        // user-facing summary. The side effect already
                        // happened, so a summarization failure degrades
                        // to a templated summary instead of erroring
                        // the whole turn.
                        let mut follow_up = transcript.clone();
                        follow_up.push(ChatMessage::assistant_call(call.clone()));
                        follow_up.push(ChatMessage::function_result(name, &payload));

                        match self.llm.complete(&follow_up, &schemas).await {
                            Ok(LlmTurn::Content(text)) => text,
                            Ok(LlmTurn::Call(_)) => fallback_summary(name, &payload),
                            Err(err) => {
                                tracing::warn!("summary call failed, using template: {}", err);
                                fallback_summary(name, &payload)
                            }
                        }
                    }
                }
            }
        };

        self.persist_assistant(conversation_id, &reply).await;

        Ok((conversation_id, reply))
    }

    /// Load the requested conversation or lazily create one titled
    /// after the first message.
    async fn resolve_conversation(&self, request: &ChatTurnRequest) -> Result<Uuid, TurnFailure> {
        if let Some(id) = request.conversation_id {
            match self
                .conversations
                .get_conversation(id)
                .await
                .map_err(|e| storage_failure(None, e))?
            {
                Some(conversation) => return Ok(conversation.id),
                None => {
                    tracing::info!("conversation {} not found, starting a new one", id);
                }
            }
        }

        let title: String = request.message.chars().take(TITLE_LIMIT).collect();
        let conversation = retry_async(
            &self.storage_retry,
            "conversation create",
            || {
                self.conversations
                    .create_conversation(Some(request.user_id.as_str()), &title)
            },
            |_| true,
        )
        .await
        .map_err(|e| storage_failure(None, e))?;

        Ok(conversation.id)
    }

    fn conversation_lock(&self, conversation_id: Uuid) -> Arc<tokio::sync::Mutex<()>> {
        match self.locks.lock() {
            Ok(mut map) => map
                .entry(conversation_id)
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone(),
            Err(poisoned) => {
                tracing::error!("conversation lock map poisoned, serialization degraded");
                poisoned
                    .into_inner()
                    .entry(conversation_id)
                    .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                    .clone()
            }
        }
    }

    async fn persist_assistant(&self, conversation_id: Uuid, text: &str) {
        let assistant_message = NewMessage {
            conversation_id,
            role: MessageRole::Assistant,
            content: text.to_string(),
            metadata: None,
        };
        let write = retry_async(
            &self.storage_retry,
            "assistant message write",
            || self.conversations.append_message(&assistant_message),
            |_| true,
        )
        .await;
        if let Err(err) = write {
            // The reply still goes out; the transcript just loses it.
            tracing::error!("failed to persist assistant message: {}", err);
        }
    }
}

fn storage_failure(
    conversation_id: Option<Uuid>,
    err: Box<dyn std::error::Error + Send + Sync>,
) -> TurnFailure {
    TurnFailure {
        conversation_id,
        configuration: false,
        detail: format!("conversation storage: {}", err),
    }
}

fn llm_failure(conversation_id: Option<Uuid>, err: LlmError) -> TurnFailure {
    TurnFailure {
        conversation_id,
        configuration: err.is_configuration(),
        detail: format!("openai: {}", err),
    }
}

/// Templated summary used when the follow-up model call cannot produce
/// one. The executed side effect must still be reported to the user.
fn fallback_summary(name: &str, payload: &serde_json::Value) -> String {
    match name {
        SEARCH_FLIGHTS => {
            let count = payload["results_count"].as_u64().unwrap_or(0);
            format!(
                "I found {} flight option(s) from {} to {} on {}. Let me know which one you'd like to book.",
                count,
                payload["origin"].as_str().unwrap_or("?"),
                payload["destination"].as_str().unwrap_or("?"),
                payload["departure_date"].as_str().unwrap_or("?")
            )
        }
        CREATE_FLIGHT_BOOKING => format!(
            "Your booking is confirmed. Reference: {}. Total: {} {}.",
            payload["booking_reference"].as_str().unwrap_or("?"),
            payload["total_amount"].as_f64().unwrap_or(0.0),
            payload["currency"].as_str().unwrap_or("")
        ),
        _ => "Done.".to_string(),
    }
}
