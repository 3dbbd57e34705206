use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Database-agnostic conversation thread model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub user_id: String,
    /// Human title, derived from the first message (truncated)
    pub title: String,
    /// The first message that opened the thread
    pub content: String,
    /// Cached text of the most recent assistant response
    pub ai_response: String,
    pub confidence_score: f64,
    pub metadata: ThreadMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ThreadMetadata {
    pub source: Option<String>,
    pub user_id: Option<String>,
    pub tags: Vec<String>,
}

/// Truncate a first message into a thread title: at most `max` characters,
/// with a trailing ellipsis only when something was actually cut.
pub fn derive_title(message: &str, max: usize) -> String {
    let chars: Vec<char> = message.chars().collect();
    if chars.len() > max {
        let mut title: String = chars[..max].iter().collect();
        title.push_str("...");
        title
    } else {
        message.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_message_is_the_whole_title() {
        assert_eq!(
            derive_title("My check engine light is on", 50),
            "My check engine light is on"
        );
    }

    #[test]
    fn long_message_is_truncated_with_ellipsis() {
        let message = "a".repeat(80);
        let title = derive_title(&message, 50);
        assert_eq!(title.len(), 53);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn exact_length_message_gets_no_ellipsis() {
        let message = "b".repeat(50);
        assert_eq!(derive_title(&message, 50), message);
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let message = "é".repeat(60);
        let title = derive_title(&message, 50);
        assert_eq!(title.chars().count(), 53);
    }
}
