use serde::{Deserialize, Serialize};
use super::content::Content;

/// Provider-agnostic chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    /// System prompt (instructions)
    System {
        content: Content,

        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },

    /// User/Human message
    #[serde(rename = "user")]
    Human {
        content: Content,

        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },

    /// Assistant/AI message
    #[serde(rename = "assistant")]
    AI {
        content: Content,

        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
}

impl Message {
    /// Create system message
    pub fn system(content: impl Into<Content>) -> Self {
        Self::System {
            content: content.into(),
            name: None,
        }
    }

    /// Create human message
    pub fn human(content: impl Into<Content>) -> Self {
        Self::Human {
            content: content.into(),
            name: None,
        }
    }

    /// Create AI message with text
    pub fn ai(content: impl Into<Content>) -> Self {
        Self::AI {
            content: content.into(),
            name: None,
        }
    }

    /// Get role as string
    pub fn role(&self) -> &str {
        match self {
            Self::System { .. } => "system",
            Self::Human { .. } => "user",
            Self::AI { .. } => "assistant",
        }
    }

    /// Get content text (if plain text)
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::System { content, .. }
            | Self::Human { content, .. }
            | Self::AI { content, .. } => content.as_text(),
        }
    }
}
