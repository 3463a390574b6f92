use super::*;
use crate::RagError;
use std::sync::Mutex;

/// Completion client that records every conversation and replies with a fixed answer
#[derive(Default)]
struct RecordingClient {
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ChatCompletion for RecordingClient {
    fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        self.calls.lock().expect("lock").push(messages.to_vec());
        Ok("The Orders table stores customer orders.".to_string())
    }
}

struct RateLimitedClient;

impl ChatCompletion for RateLimitedClient {
    fn complete(&self, _messages: &[ChatMessage]) -> Result<String> {
        Err(RagError::RateLimit("slow down".to_string()))
    }
}

#[test]
fn system_prompt_embeds_context_verbatim() {
    let agent = RagAgent::with_instruction(RecordingClient::default(), "You are helpful.");
    let context = "Table Orders: stores customer orders\n- id (int): order id";

    assert_eq!(
        agent.system_prompt(context),
        "You are helpful.\n\nContext:\nTable Orders: stores customer orders\n- id (int): order id\n"
    );
}

#[test]
fn default_instruction_is_used() {
    let agent = RagAgent::new(RecordingClient::default());
    assert_eq!(agent.instruction(), DEFAULT_INSTRUCTION);
    assert!(agent.system_prompt("ctx").starts_with(DEFAULT_INSTRUCTION));
}

#[test]
fn answer_sends_system_then_user() {
    let agent = RagAgent::new(RecordingClient::default());

    let answer = agent
        .answer("What does the Orders table store?", "Table Orders: stores orders")
        .expect("answer");
    assert_eq!(answer, "The Orders table stores customer orders.");

    let calls = agent.client().calls.lock().expect("lock");
    assert_eq!(calls.len(), 1);
    let messages = &calls[0];
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::System);
    assert!(messages[0].content.contains("Table Orders: stores orders"));
    assert_eq!(messages[1], ChatMessage::user("What does the Orders table store?"));
}

#[test]
fn empty_context_still_builds_prompt() {
    let agent = RagAgent::with_instruction(RecordingClient::default(), "I");
    assert_eq!(agent.system_prompt(""), "I\n\nContext:\n\n");
}

#[test]
fn completion_errors_propagate() {
    let agent = RagAgent::new(RateLimitedClient);
    let result = agent.answer("q", "c");
    assert!(matches!(result, Err(RagError::RateLimit(_))));
}

#[test]
fn roles_serialize_lowercase() {
    let json = serde_json::to_string(&ChatMessage::system("x")).expect("serialize");
    assert_eq!(json, r#"{"role":"system","content":"x"}"#);
}

#[test]
fn boxed_client_delegates() {
    let boxed: Box<dyn ChatCompletion> = Box::new(RateLimitedClient);
    let agent = RagAgent::new(boxed);
    assert!(agent.answer("q", "c").is_err());
}
