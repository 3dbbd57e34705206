//! Request and response envelopes shared between the chat API server and
//! its clients. Field casing follows the JSON contract (camelCase
//! envelopes around snake_case persisted records).

use serde::{Deserialize, Serialize};

use techpulse_persist::{Message, Thread};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    pub user_id: String,
    #[serde(default)]
    pub metadata: SendMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMetadata {
    #[serde(default)]
    pub has_voice: bool,
    #[serde(default)]
    pub attachments: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageReply {
    pub success: bool,
    pub thread_id: String,
    pub user_message: Message,
    pub assistant_message: Message,
    pub response: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadsReply {
    pub success: bool,
    pub threads: Vec<Thread>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesReply {
    pub success: bool,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateThreadPayload {
    pub user_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub initial_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadReply {
    pub success: bool,
    pub thread: Thread,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckReply {
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReply {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_payload_uses_camel_case_envelope() {
        let payload = SendMessagePayload {
            message: "hello".to_string(),
            thread_id: Some("t1".to_string()),
            user_id: "u1".to_string(),
            metadata: SendMetadata {
                has_voice: true,
                attachments: vec!["invoice.pdf".to_string()],
            },
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["threadId"], "t1");
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["metadata"]["hasVoice"], true);
    }

    #[test]
    fn send_payload_omits_absent_thread_id() {
        let payload = SendMessagePayload {
            message: "hello".to_string(),
            thread_id: None,
            user_id: "u1".to_string(),
            metadata: SendMetadata::default(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("threadId").is_none());
    }
}
