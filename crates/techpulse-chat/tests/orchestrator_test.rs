use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use techpulse_chat::{ChatError, ChatOrchestrator, TurnRequest};
use techpulse_llm::{ChatClient, ChatRequest, ChatResponse, TokenUsage};
use techpulse_persist::{
    InMemoryStore, KnowledgeSnippet, MessageRole, StaticKnowledgeBase, ThreadStore,
};

/// Chat client double that records every request it receives.
struct MockChatClient {
    reply: Option<String>,
    fail: bool,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockChatClient {
    fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            fail: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    fn failing() -> Self {
        Self {
            reply: None,
            fail: true,
            requests: Mutex::new(Vec::new()),
        }
    }

    fn empty_reply() -> Self {
        Self {
            reply: None,
            fail: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    fn captured(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatClient for MockChatClient {
    async fn chat(&self, request: ChatRequest) -> anyhow::Result<ChatResponse> {
        self.requests.lock().unwrap().push(request);
        if self.fail {
            anyhow::bail!("OpenAI API error (500): upstream exploded");
        }
        Ok(ChatResponse {
            content: self.reply.clone(),
            usage: Some(TokenUsage {
                input_tokens: 10,
                output_tokens: 20,
                total_tokens: 30,
            }),
            finish_reason: Some("stop".to_string()),
            raw: serde_json::Value::Null,
        })
    }
}

fn orchestrator(
    store: Arc<InMemoryStore>,
    llm: Arc<MockChatClient>,
    snippets: Vec<KnowledgeSnippet>,
) -> ChatOrchestrator {
    ChatOrchestrator::new(store, Arc::new(StaticKnowledgeBase::new(snippets)), llm)
}

#[tokio::test]
async fn first_turn_creates_thread_with_message_title() {
    let store = Arc::new(InMemoryStore::new());
    let llm = Arc::new(MockChatClient::replying("Check the gas cap first."));
    let orch = orchestrator(store.clone(), llm, Vec::new());

    let outcome = orch
        .handle_turn(TurnRequest::text("user-1", "My check engine light is on"))
        .await
        .unwrap();

    assert_eq!(outcome.user_message.content, "My check engine light is on");
    assert_eq!(outcome.user_message.role, MessageRole::User);
    assert_eq!(outcome.assistant_message.role, MessageRole::Assistant);
    assert_eq!(outcome.response, "Check the gas cap first.");

    let thread = store.get_thread(&outcome.thread_id).await.unwrap().unwrap();
    // 28 chars: no truncation, no ellipsis
    assert_eq!(thread.title, "My check engine light is on");
    assert_eq!(thread.ai_response, "Check the gas cap first.");
}

#[tokio::test]
async fn long_first_message_truncates_title() {
    let store = Arc::new(InMemoryStore::new());
    let llm = Arc::new(MockChatClient::replying("ok"));
    let orch = orchestrator(store.clone(), llm, Vec::new());

    let message = "x".repeat(80);
    let outcome = orch
        .handle_turn(TurnRequest::text("user-1", message.clone()))
        .await
        .unwrap();

    let thread = store.get_thread(&outcome.thread_id).await.unwrap().unwrap();
    assert_eq!(thread.title.len(), 53);
    assert!(thread.title.ends_with("..."));
    assert_eq!(thread.content, message);
}

#[tokio::test]
async fn identical_turns_create_distinct_threads() {
    let store = Arc::new(InMemoryStore::new());
    let llm = Arc::new(MockChatClient::replying("ok"));
    let orch = orchestrator(store.clone(), llm, Vec::new());

    let first = orch
        .handle_turn(TurnRequest::text("user-1", "same message"))
        .await
        .unwrap();
    let second = orch
        .handle_turn(TurnRequest::text("user-1", "same message"))
        .await
        .unwrap();

    assert_ne!(first.thread_id, second.thread_id);
    for outcome in [&first, &second] {
        let messages = store.list_messages(&outcome.thread_id).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::User);
        assert_eq!(messages[1].role, MessageRole::Assistant);
    }
}

#[tokio::test]
async fn blank_message_without_voice_is_rejected() {
    let store = Arc::new(InMemoryStore::new());
    let llm = Arc::new(MockChatClient::replying("ok"));
    let orch = orchestrator(store, llm.clone(), Vec::new());

    let err = orch
        .handle_turn(TurnRequest::text("user-1", "   "))
        .await
        .unwrap_err();

    assert!(matches!(err, ChatError::Validation(_)));
    assert!(llm.captured().is_empty());
}

#[tokio::test]
async fn blank_message_with_voice_is_accepted() {
    let store = Arc::new(InMemoryStore::new());
    let llm = Arc::new(MockChatClient::replying("heard you"));
    let orch = orchestrator(store, llm, Vec::new());

    let mut req = TurnRequest::text("user-1", "");
    req.has_voice = true;

    let outcome = orch.handle_turn(req).await.unwrap();
    assert!(outcome.user_message.metadata.has_voice);
}

#[tokio::test]
async fn missing_user_id_is_rejected() {
    let store = Arc::new(InMemoryStore::new());
    let llm = Arc::new(MockChatClient::replying("ok"));
    let orch = orchestrator(store, llm, Vec::new());

    let err = orch
        .handle_turn(TurnRequest::text("", "hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::Validation(_)));
}

#[tokio::test]
async fn upstream_failure_preserves_user_message() {
    let store = Arc::new(InMemoryStore::new());
    let llm = Arc::new(MockChatClient::failing());
    let orch = orchestrator(store.clone(), llm, Vec::new());

    // Seed a thread through a working turn first.
    let seed = Arc::new(MockChatClient::replying("ok"));
    let seeded = orchestrator(store.clone(), seed, Vec::new())
        .handle_turn(TurnRequest::text("user-1", "seed"))
        .await
        .unwrap();

    let err = orch
        .handle_turn(TurnRequest::text("user-1", "follow up").in_thread(&seeded.thread_id))
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::Upstream(_)));

    // The failed turn's user message survives: seed pair + new user message.
    let messages = store.list_messages(&seeded.thread_id).await.unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[2].content, "follow up");
    assert_eq!(messages[2].role, MessageRole::User);
}

#[tokio::test]
async fn foreign_thread_fails_closed_as_not_found() {
    let store = Arc::new(InMemoryStore::new());
    let llm = Arc::new(MockChatClient::replying("ok"));
    let orch = orchestrator(store.clone(), llm, Vec::new());

    let theirs = orch
        .handle_turn(TurnRequest::text("owner", "private thread"))
        .await
        .unwrap();

    let err = orch
        .handle_turn(TurnRequest::text("intruder", "let me in").in_thread(&theirs.thread_id))
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::ThreadNotFound(_)));

    // Nothing was appended to the foreign thread.
    let messages = store.list_messages(&theirs.thread_id).await.unwrap();
    assert_eq!(messages.len(), 2);
}

#[tokio::test]
async fn prompt_contains_system_history_and_incoming_in_order() {
    let store = Arc::new(InMemoryStore::new());
    let llm = Arc::new(MockChatClient::replying("ok"));
    let snippets = vec![KnowledgeSnippet::new("Battery", "Check the terminals")];
    let orch = orchestrator(store.clone(), llm.clone(), snippets);

    let first = orch
        .handle_turn(TurnRequest::text("user-1", "my battery died"))
        .await
        .unwrap();
    orch.handle_turn(
        TurnRequest::text("user-1", "the battery is still dead").in_thread(&first.thread_id),
    )
    .await
    .unwrap();

    let requests = llm.captured();
    let prompt = &requests[1].messages;

    // Snippets match against the incoming message, so both turns see it.
    assert_eq!(prompt[0].role(), "system");
    assert!(prompt[0].text().unwrap().contains("- Battery: Check the terminals"));
    // History: first turn's pair, then the incoming message once.
    assert_eq!(prompt[1].text(), Some("my battery died"));
    assert_eq!(prompt[2].role(), "assistant");
    assert_eq!(prompt[3].text(), Some("the battery is still dead"));
    assert_eq!(prompt.len(), 4);
}

#[tokio::test]
async fn history_window_is_capped_at_ten_messages() {
    let store = Arc::new(InMemoryStore::new());
    let llm = Arc::new(MockChatClient::replying("ok"));
    let orch = orchestrator(store.clone(), llm.clone(), Vec::new());

    let first = orch
        .handle_turn(TurnRequest::text("user-1", "turn 0"))
        .await
        .unwrap();
    for i in 1..8 {
        orch.handle_turn(TurnRequest::text("user-1", format!("turn {i}")).in_thread(&first.thread_id))
            .await
            .unwrap();
    }

    // 8 turns stored = 16 messages; the 8th request saw 14 of history.
    let requests = llm.captured();
    let last_prompt = &requests[7].messages;
    // system + 10 history + incoming
    assert_eq!(last_prompt.len(), 12);
    assert_eq!(last_prompt[11].text(), Some("turn 7"));
}

#[tokio::test]
async fn empty_model_content_falls_back_to_apology() {
    let store = Arc::new(InMemoryStore::new());
    let llm = Arc::new(MockChatClient::empty_reply());
    let orch = orchestrator(store.clone(), llm, Vec::new());

    let outcome = orch
        .handle_turn(TurnRequest::text("user-1", "anyone there?"))
        .await
        .unwrap();

    assert_eq!(outcome.response, "Sorry, I could not generate a response.");
    assert_eq!(outcome.assistant_message.content, outcome.response);
}

#[tokio::test]
async fn assistant_message_carries_model_metadata() {
    let store = Arc::new(InMemoryStore::new());
    let llm = Arc::new(MockChatClient::replying("ok"));
    let orch = orchestrator(store, llm, Vec::new());

    let outcome = orch
        .handle_turn(TurnRequest::text("user-1", "hello"))
        .await
        .unwrap();

    assert_eq!(outcome.assistant_message.sender_id, "system");
    assert_eq!(outcome.assistant_message.metadata.model.as_deref(), Some("gpt-4"));
    assert_eq!(outcome.assistant_message.metadata.tokens, Some(30));
}
