use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use techpulse_audio::RecordingSession;
use techpulse_persist::{Message, MessageRole, Thread};

use crate::api::ChatApi;
use crate::error::{ClientError, Result};
use crate::wire::{SendMessagePayload, SendMetadata};

/// Proof that the holder is the one in-flight submission. Exactly one
/// token exists per guard; it moves out on acquire and back on release,
/// so overlap is impossible by construction.
pub struct FlightToken {
    _priv: (),
}

/// Mutual exclusion for submissions. Cloned handles share the same slot.
#[derive(Clone)]
pub struct SingleFlight {
    slot: Arc<Mutex<Option<FlightToken>>>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(FlightToken { _priv: () }))),
        }
    }

    pub fn acquire(&self) -> Option<FlightToken> {
        self.slot.lock().ok()?.take()
    }

    pub fn release(&self, token: FlightToken) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(token);
        }
    }

    pub fn is_busy(&self) -> bool {
        self.slot.lock().map(|slot| slot.is_none()).unwrap_or(true)
    }
}

impl Default for SingleFlight {
    fn default() -> Self {
        Self::new()
    }
}

/// A message as displayed in the conversation view. Error bubbles are
/// local-only: they never exist in the store.
#[derive(Debug, Clone)]
pub struct LocalMessage {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub has_voice: bool,
    pub is_error: bool,
}

impl From<Message> for LocalMessage {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            role: message.role,
            content: message.content,
            created_at: message.created_at,
            has_voice: message.metadata.has_voice,
            is_error: false,
        }
    }
}

/// Drives one active conversation: submits turns, reconciles the local
/// message list with the server's, and owns the recording session whose
/// transcript feeds the outgoing message.
pub struct ChatController {
    api: Arc<dyn ChatApi>,
    user_id: String,
    flight: SingleFlight,
    messages: Vec<LocalMessage>,
    threads: Vec<Thread>,
    current_thread_id: Option<String>,
    recording: RecordingSession,
}

impl ChatController {
    pub fn new(api: Arc<dyn ChatApi>, user_id: impl Into<String>, recording: RecordingSession) -> Self {
        Self {
            api,
            user_id: user_id.into(),
            flight: SingleFlight::new(),
            messages: Vec::new(),
            threads: Vec::new(),
            current_thread_id: None,
            recording,
        }
    }

    pub fn messages(&self) -> &[LocalMessage] {
        &self.messages
    }

    pub fn threads(&self) -> &[Thread] {
        &self.threads
    }

    pub fn current_thread_id(&self) -> Option<&str> {
        self.current_thread_id.as_deref()
    }

    /// Shared handle to the submission guard, for UI code that needs to
    /// disable the send control while a turn is in flight.
    pub fn flight(&self) -> SingleFlight {
        self.flight.clone()
    }

    pub fn recording_mut(&mut self) -> &mut RecordingSession {
        &mut self.recording
    }

    /// Submit one turn. The recording transcript, when present, becomes
    /// the outgoing message (or is appended to the typed text). Rejects
    /// empty text with no transcript, and refuses to overlap an in-flight
    /// submission. An API failure becomes a local error bubble rather
    /// than a lost turn.
    pub async fn submit(&mut self, text: &str) -> Result<()> {
        let transcript = self.recording.transcript().map(str::to_string);
        let has_voice = transcript.is_some();
        if text.trim().is_empty() && !has_voice {
            return Err(ClientError::Validation(
                "Message cannot be empty".to_string(),
            ));
        }

        let message = match transcript {
            Some(spoken) if text.trim().is_empty() => spoken,
            Some(spoken) => format!("{}\n\n{spoken}", text.trim()),
            None => text.to_string(),
        };

        let Some(token) = self.flight.acquire() else {
            return Err(ClientError::Busy);
        };

        let payload = SendMessagePayload {
            message,
            thread_id: self.current_thread_id.clone(),
            user_id: self.user_id.clone(),
            metadata: SendMetadata {
                has_voice,
                attachments: Vec::new(),
            },
        };

        let outcome = self.api.send_message(payload).await;
        self.flight.release(token);

        match outcome {
            Ok(reply) => {
                if self.current_thread_id.is_none() {
                    self.current_thread_id = Some(reply.thread_id.clone());
                }
                self.messages.push(LocalMessage::from(reply.user_message));
                self.messages.push(LocalMessage::from(reply.assistant_message));

                // The consumed transcript must not ride along on the
                // next submission.
                if has_voice {
                    self.recording.clear();
                }

                if let Err(e) = self.refresh_threads().await {
                    tracing::warn!(error = %e, "thread list refresh failed after send");
                }
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "send failed");
                self.messages.push(error_bubble(&e));
                Ok(())
            }
        }
    }

    /// Switch the active thread. The local message list is replaced
    /// wholesale with the server's view, never merged.
    pub async fn select_thread(&mut self, thread_id: &str) -> Result<()> {
        let fetched = self.api.get_thread_messages(thread_id, &self.user_id).await?;
        self.messages = fetched.into_iter().map(LocalMessage::from).collect();
        self.current_thread_id = Some(thread_id.to_string());
        Ok(())
    }

    /// Start over: no messages, no active thread, no recording.
    pub fn new_chat(&mut self) {
        self.messages.clear();
        self.current_thread_id = None;
        self.recording.clear();
    }

    pub async fn refresh_threads(&mut self) -> Result<()> {
        self.threads = self.api.get_threads(&self.user_id).await?;
        Ok(())
    }

    pub async fn delete_thread(&mut self, thread_id: &str) -> Result<()> {
        self.api.delete_thread(thread_id, &self.user_id).await?;
        if self.current_thread_id.as_deref() == Some(thread_id) {
            self.messages.clear();
            self.current_thread_id = None;
        }
        if let Err(e) = self.refresh_threads().await {
            tracing::warn!(error = %e, "thread list refresh failed after delete");
        }
        Ok(())
    }
}

/// Short human-readable assistant bubble for a failed turn. Raw detail
/// goes to the log, not the user.
fn error_bubble(error: &ClientError) -> LocalMessage {
    let content = match error {
        ClientError::Api { status: 401, .. } | ClientError::Api { status: 403, .. } => {
            "Authentication error. Please try logging in again.".to_string()
        }
        ClientError::Api { status: 500.., .. } => {
            "Server error occurred. Please try again later.".to_string()
        }
        _ => "I'm having trouble reaching the assistant right now. Please try again.".to_string(),
    };
    LocalMessage {
        id: format!("local-{}", Utc::now().timestamp_millis()),
        role: MessageRole::Assistant,
        content,
        created_at: Utc::now(),
        has_voice: false,
        is_error: true,
    }
}
