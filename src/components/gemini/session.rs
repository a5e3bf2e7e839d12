use super::models::{
    Content, FunctionDeclaration, GenerateContentRequest, GenerateContentResponse,
    GenerationConfig, SystemInstruction, ToolConfig,
};
use crate::config::Config;
use crate::error::{gemini_error, AgentResult};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Sampling temperature for function selection
const TEMPERATURE: f32 = 0.2;

/// System instruction for the calendar agent persona
///
/// `{now}` is replaced with the current datetime in the configured
/// timezone so the model can resolve "today", "tomorrow", etc.
const SYSTEM_INSTRUCTION_TEMPLATE: &str = "You are an intelligent, helpful, and concise \
Calendar Agent. Your goal is to translate requests (like creating or deleting events) into \
precise function calls. You MUST parse all necessary date/time/location data from the user's \
input before calling 'create_event'. Current date is {now}; use this as the reference point \
when resolving dates from user input like 'today' or 'tomorrow'. End time for event creation \
is optional. At the end of each operation, get back to the user with a confirmation or error \
message. Try to create events with as little information as possible: don't ask for the end \
time if not provided, and don't ask for the year because you already have it ({now}).";

/// Render the system instruction against the current datetime
pub fn system_instruction(current_datetime: &str) -> String {
    SYSTEM_INSTRUCTION_TEMPLATE.replace("{now}", current_datetime)
}

/// A conversational model that turns a history into the next model turn
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn generate(&self, contents: &[Content]) -> AgentResult<Content>;
}

/// Gemini `generateContent` client configured with the function registry
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    system_instruction: SystemInstruction,
    tools: Vec<ToolConfig>,
}

impl GeminiClient {
    pub fn new(
        config: &Config,
        system_instruction: String,
        declarations: Vec<FunctionDeclaration>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
            system_instruction: SystemInstruction::from_text(&system_instruction),
            tools: vec![ToolConfig {
                function_declarations: declarations,
            }],
        }
    }
}

#[async_trait]
impl ChatModel for GeminiClient {
    async fn generate(&self, contents: &[Content]) -> AgentResult<Content> {
        let request = GenerateContentRequest {
            contents: contents.to_vec(),
            system_instruction: Some(self.system_instruction.clone()),
            tools: self.tools.clone(),
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
            },
        };

        let url = format!("{}/models/{}:generateContent", API_BASE, self.model);
        debug!(model = %self.model, turns = contents.len(), "Calling Gemini");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| gemini_error(&format!("Request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| gemini_error(&format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(gemini_error(&format!("HTTP {} - {}", status, text)));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text)
            .map_err(|e| gemini_error(&format!("Failed to parse response: {}\nRaw body: {}", e, text)))?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .ok_or_else(|| gemini_error(&format!("No candidates in response.\nRaw body: {}", text)))
    }
}

/// What the model asked for on this turn
#[derive(Debug, Clone, PartialEq)]
pub enum ModelReply {
    /// Free text to show the user
    Text(String),
    /// A proposed function call to validate, confirm, and execute
    FunctionCall { name: String, args: serde_json::Value },
}

/// Conversation state for one agent process
///
/// Owns the full history; every turn resends it, per the hosted API's
/// stateless contract.
pub struct ModelSession {
    model: Arc<dyn ChatModel>,
    history: Vec<Content>,
}

impl ModelSession {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self {
            model,
            history: Vec::new(),
        }
    }

    /// Forward a user message and interpret the model's turn
    pub async fn send_user(&mut self, text: &str) -> AgentResult<ModelReply> {
        self.exchange(Content::user_text(text)).await
    }

    /// Report a function result (success text or remote error) to the model
    pub async fn send_function_result(&mut self, name: &str, result: &str) -> AgentResult<ModelReply> {
        self.exchange(Content::function_response(name, json!({ "result": result })))
            .await
    }

    /// Close out a pending function call without asking the model for
    /// another turn
    ///
    /// A model function-call turn must be followed by a function
    /// response in the history, or the hosted API rejects every later
    /// request in the session.
    pub fn record_function_result(&mut self, name: &str, result: &str) {
        self.history
            .push(Content::function_response(name, json!({ "result": result })));
    }

    async fn exchange(&mut self, content: Content) -> AgentResult<ModelReply> {
        self.history.push(content);
        let reply = self.model.generate(&self.history).await?;
        self.history.push(reply.clone());
        Ok(Self::interpret(reply))
    }

    /// The first function call wins; otherwise all text parts are joined
    fn interpret(content: Content) -> ModelReply {
        for part in &content.parts {
            if let Some(call) = &part.function_call {
                return ModelReply::FunctionCall {
                    name: call.name.clone(),
                    args: call.args.clone(),
                };
            }
        }

        let text = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n");
        ModelReply::Text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::gemini::models::{FunctionCallPart, Part};
    use std::sync::Mutex;

    struct ScriptedModel {
        replies: Mutex<Vec<Content>>,
        seen_turns: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn generate(&self, contents: &[Content]) -> AgentResult<Content> {
            self.seen_turns.lock().unwrap().push(contents.len());
            Ok(self.replies.lock().unwrap().remove(0))
        }
    }

    fn model_text(text: &str) -> Content {
        Content {
            role: "model".to_string(),
            parts: vec![Part {
                text: Some(text.to_string()),
                ..Default::default()
            }],
        }
    }

    #[tokio::test]
    async fn session_accumulates_history() {
        let model = Arc::new(ScriptedModel {
            replies: Mutex::new(vec![model_text("hi"), model_text("bye")]),
            seen_turns: Mutex::new(Vec::new()),
        });
        let mut session = ModelSession::new(model.clone());

        let first = session.send_user("hello").await.unwrap();
        assert_eq!(first, ModelReply::Text("hi".to_string()));

        let second = session.send_user("goodbye").await.unwrap();
        assert_eq!(second, ModelReply::Text("bye".to_string()));

        // 1 turn on the first call, 3 on the second (user, model, user)
        assert_eq!(*model.seen_turns.lock().unwrap(), vec![1, 3]);
    }

    #[tokio::test]
    async fn function_call_part_takes_precedence_over_text() {
        let reply = Content {
            role: "model".to_string(),
            parts: vec![
                Part {
                    text: Some("Let me create that.".to_string()),
                    ..Default::default()
                },
                Part {
                    function_call: Some(FunctionCallPart {
                        name: "create_event".to_string(),
                        args: json!({"summary": "Supo"}),
                    }),
                    ..Default::default()
                },
            ],
        };
        let model = Arc::new(ScriptedModel {
            replies: Mutex::new(vec![reply]),
            seen_turns: Mutex::new(Vec::new()),
        });
        let mut session = ModelSession::new(model);

        match session.send_user("make an event").await.unwrap() {
            ModelReply::FunctionCall { name, args } => {
                assert_eq!(name, "create_event");
                assert_eq!(args["summary"], "Supo");
            }
            other => panic!("expected function call, got {:?}", other),
        }
    }

    #[test]
    fn system_instruction_embeds_current_datetime() {
        let rendered = system_instruction("2025-03-03T12:00:00");
        assert!(rendered.contains("2025-03-03T12:00:00"));
        assert!(!rendered.contains("{now}"));
    }
}
