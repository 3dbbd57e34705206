use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use techpulse_audio::{
    AudioBuffer, AudioError, MockCapture, RecordingSession, TranscriptionBackend,
    TranscriptionClient, TranscriptionResult,
};
use techpulse_client::{
    ChatApi, ChatController, ClientError, SendMessagePayload, SendMessageReply,
};
use techpulse_client::wire::CreateThreadPayload;
use techpulse_persist::{
    Message, MessageMetadata, MessageRole, MessageType, Thread, ThreadMetadata,
};

fn message(id: &str, thread_id: &str, role: MessageRole, content: &str) -> Message {
    Message {
        id: id.to_string(),
        thread_id: thread_id.to_string(),
        sender_id: if role == MessageRole::Assistant {
            "system".to_string()
        } else {
            "user-1".to_string()
        },
        role,
        message_type: MessageType::Text,
        content: content.to_string(),
        metadata: MessageMetadata::default(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn thread(id: &str, title: &str) -> Thread {
    Thread {
        id: id.to_string(),
        user_id: "user-1".to_string(),
        title: title.to_string(),
        content: title.to_string(),
        ai_response: "ok".to_string(),
        confidence_score: 0.9,
        metadata: ThreadMetadata::default(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Scripted API double recording the payloads it receives.
struct MockApi {
    send_status: Option<u16>,
    threads: Vec<Thread>,
    thread_messages: Vec<Message>,
    sent: Mutex<Vec<SendMessagePayload>>,
    deleted: Mutex<Vec<String>>,
}

impl MockApi {
    fn healthy() -> Self {
        Self {
            send_status: None,
            threads: vec![thread("t1", "My check engine light is on")],
            thread_messages: Vec::new(),
            sent: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
        }
    }

    fn failing(status: u16) -> Self {
        Self {
            send_status: Some(status),
            ..Self::healthy()
        }
    }

    fn with_thread_messages(mut self, messages: Vec<Message>) -> Self {
        self.thread_messages = messages;
        self
    }

    fn sent(&self) -> Vec<SendMessagePayload> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatApi for MockApi {
    async fn send_message(
        &self,
        payload: SendMessagePayload,
    ) -> Result<SendMessageReply, ClientError> {
        self.sent.lock().unwrap().push(payload.clone());
        if let Some(status) = self.send_status {
            return Err(ClientError::Api {
                status,
                message: "scripted failure".to_string(),
            });
        }
        let thread_id = payload.thread_id.unwrap_or_else(|| "t1".to_string());
        Ok(SendMessageReply {
            success: true,
            thread_id: thread_id.clone(),
            user_message: message("m1", &thread_id, MessageRole::User, &payload.message),
            assistant_message: message("m2", &thread_id, MessageRole::Assistant, "answer"),
            response: "answer".to_string(),
        })
    }

    async fn get_threads(&self, _user_id: &str) -> Result<Vec<Thread>, ClientError> {
        Ok(self.threads.clone())
    }

    async fn get_thread_messages(
        &self,
        _thread_id: &str,
        _user_id: &str,
    ) -> Result<Vec<Message>, ClientError> {
        Ok(self.thread_messages.clone())
    }

    async fn create_thread(&self, payload: CreateThreadPayload) -> Result<Thread, ClientError> {
        Ok(thread("t-new", payload.title.as_deref().unwrap_or("New Chat")))
    }

    async fn delete_thread(&self, thread_id: &str, user_id: &str) -> Result<(), ClientError> {
        self.deleted
            .lock()
            .unwrap()
            .push(format!("{thread_id}:{user_id}"));
        Ok(())
    }
}

fn controller(api: Arc<MockApi>) -> ChatController {
    let session = RecordingSession::new(Box::new(MockCapture::new()));
    ChatController::new(api, "user-1", session)
}

/// Transcription backend double returning a fixed transcript.
struct FixedTranscriber(&'static str);

#[async_trait]
impl TranscriptionBackend for FixedTranscriber {
    async fn transcribe(
        &self,
        _buffer: &AudioBuffer,
    ) -> Result<TranscriptionResult, AudioError> {
        Ok(TranscriptionResult {
            text: self.0.to_string(),
            language: Some("en".to_string()),
            duration: Some(2.0),
        })
    }
}

/// Controller whose recording session holds a finished transcript.
async fn voiced_controller(api: Arc<MockApi>, transcript: &'static str) -> ChatController {
    let mut ctrl = controller(api);
    ctrl.recording_mut().start().unwrap();
    ctrl.recording_mut().stop().unwrap();
    let client = TranscriptionClient::new(Box::new(FixedTranscriber(transcript)));
    let text = ctrl.recording_mut().transcribe(&client).await;
    assert_eq!(text.as_deref(), Some(transcript));
    ctrl
}

#[tokio::test]
async fn submit_appends_both_messages_in_order() {
    let api = Arc::new(MockApi::healthy());
    let mut ctrl = controller(api.clone());

    ctrl.submit("My check engine light is on").await.unwrap();

    let messages = ctrl.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, MessageRole::User);
    assert_eq!(messages[0].content, "My check engine light is on");
    assert_eq!(messages[1].role, MessageRole::Assistant);
    assert_eq!(ctrl.current_thread_id(), Some("t1"));
    // Thread list refreshed after the turn.
    assert_eq!(ctrl.threads().len(), 1);
}

#[tokio::test]
async fn empty_submission_is_rejected_without_a_call() {
    let api = Arc::new(MockApi::healthy());
    let mut ctrl = controller(api.clone());

    let err = ctrl.submit("   ").await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
    assert!(api.sent().is_empty());
}

#[tokio::test]
async fn voice_only_submission_sends_the_transcript() {
    let api = Arc::new(MockApi::healthy());
    let mut ctrl = voiced_controller(api.clone(), "my brakes are squealing").await;

    ctrl.submit("").await.unwrap();

    let sent = api.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].message, "my brakes are squealing");
    assert!(sent[0].metadata.has_voice);
    // Consumed on success: nothing left to ride the next turn.
    assert!(ctrl.recording_mut().transcript().is_none());
}

#[tokio::test]
async fn typed_text_carries_the_transcript_along() {
    let api = Arc::new(MockApi::healthy());
    let mut ctrl = voiced_controller(api.clone(), "rattle at idle").await;

    ctrl.submit("Also the AC is weak").await.unwrap();

    let sent = api.sent();
    assert_eq!(sent[0].message, "Also the AC is weak\n\nrattle at idle");
    assert!(sent[0].metadata.has_voice);
}

#[tokio::test]
async fn in_flight_submission_blocks_a_second_one() {
    let api = Arc::new(MockApi::healthy());
    let mut ctrl = controller(api.clone());

    // Another callback holds the in-flight token.
    let flight = ctrl.flight();
    let token = flight.acquire().unwrap();

    let err = ctrl.submit("hello").await.unwrap_err();
    assert!(matches!(err, ClientError::Busy));
    assert!(api.sent().is_empty());

    flight.release(token);
    ctrl.submit("hello").await.unwrap();
    assert_eq!(api.sent().len(), 1);
}

#[tokio::test]
async fn failed_submission_becomes_an_error_bubble() {
    let api = Arc::new(MockApi::failing(500));
    let mut ctrl = controller(api.clone());

    ctrl.submit("hello").await.unwrap();

    let messages = ctrl.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].is_error);
    assert_eq!(messages[0].role, MessageRole::Assistant);
    assert!(messages[0].content.contains("Server error"));
    // The guard is released for the retry.
    assert!(!ctrl.flight().is_busy());
}

#[tokio::test]
async fn auth_failure_gets_login_guidance() {
    let api = Arc::new(MockApi::failing(401));
    let mut ctrl = controller(api);

    ctrl.submit("hello").await.unwrap();
    assert!(ctrl.messages()[0].content.contains("Authentication"));
}

#[tokio::test]
async fn select_thread_replaces_local_messages_wholesale() {
    let api = Arc::new(
        MockApi::healthy().with_thread_messages(vec![
            message("a1", "t9", MessageRole::User, "old question"),
            message("a2", "t9", MessageRole::Assistant, "old answer"),
        ]),
    );
    let mut ctrl = controller(api);

    ctrl.submit("something else").await.unwrap();
    assert_eq!(ctrl.messages().len(), 2);

    ctrl.select_thread("t9").await.unwrap();
    assert_eq!(ctrl.messages().len(), 2);
    assert_eq!(ctrl.messages()[0].content, "old question");
    assert_eq!(ctrl.current_thread_id(), Some("t9"));
}

#[tokio::test]
async fn new_chat_clears_state_and_recording() {
    let api = Arc::new(MockApi::healthy());
    let mut ctrl = controller(api);

    ctrl.submit("hello").await.unwrap();
    ctrl.recording_mut().start().unwrap();

    ctrl.new_chat();
    assert!(ctrl.messages().is_empty());
    assert_eq!(ctrl.current_thread_id(), None);
    assert_eq!(
        ctrl.recording_mut().state(),
        techpulse_audio::RecordingState::Idle
    );
}

#[tokio::test]
async fn deleting_the_active_thread_clears_local_state() {
    let api = Arc::new(MockApi::healthy());
    let mut ctrl = controller(api.clone());

    ctrl.submit("hello").await.unwrap();
    assert_eq!(ctrl.current_thread_id(), Some("t1"));

    ctrl.delete_thread("t1").await.unwrap();
    assert!(ctrl.messages().is_empty());
    assert_eq!(ctrl.current_thread_id(), None);
    // The delete is scoped to the caller's user id.
    assert_eq!(*api.deleted.lock().unwrap(), vec!["t1:user-1".to_string()]);
}

#[tokio::test]
async fn follow_up_rides_the_active_thread() {
    let api = Arc::new(MockApi::healthy());
    let mut ctrl = controller(api.clone());

    ctrl.submit("first").await.unwrap();
    ctrl.submit("second").await.unwrap();

    let sent = api.sent();
    assert_eq!(sent[0].thread_id, None);
    assert_eq!(sent[1].thread_id.as_deref(), Some("t1"));
    assert_eq!(ctrl.messages().len(), 4);
}
